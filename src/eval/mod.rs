//! The tree-walking evaluator: walks the syntax tree produced by
//! [`crate::parser`] against a chain of [`crate::env::Environment`]s.
//!
//! Control flow (`break`/`continue`/`return`) and `throw`/`rethrow` are
//! threaded as an explicit [`Signal`] returned from statement evaluation
//! (spec.md §9's recommended rewrite of the original's exception-based
//! approach) rather than unwound through Rust panics. Ordinary fallible
//! operations -- type errors, division by zero, out-of-bounds subscripts --
//! propagate as plain `Result<_, EvalError>` and are treated exactly like a
//! `Signal::Throw` the moment they reach a `try` boundary (see
//! [`Evaluator::eval_try`]): both channels represent "an exception is in
//! flight", they just arise from different places in the tree.

pub mod error;

pub use error::{EvalError, EvalErrorKind, Signal};

use std::rc::Rc;

use crate::env::Environment;
use crate::location::Span;
use crate::syntax::{
    AssignOp, BinOp, CatchClause, Expr, ExprKind, FuncBody, FuncDecl, Stmt, StmtKind, UnOp,
};
use crate::value::array::Array;
use crate::value::dict::{Dict, DictKey};
use crate::value::function::{CaptureEnv, Function};
use crate::value::lvalue::{self, LValueHandle};
use crate::value::string::SharedStr;
use crate::value::Value;

/// Runs a complete program against a fresh evaluator rooted at `root_scope`,
/// matching the core's external entry point (spec.md §6: `evaluate(root_block,
/// root_scope) -> unit`). `root_scope` should already be a child of the
/// const-eval environment the parser built its constants in (the caller
/// that threads a [`crate::value::Builtin`] table through `parse` is
/// expected to install it once more here, or reuse the same root).
pub fn evaluate(program: &[Stmt], root_scope: &Environment) -> Result<(), EvalError> {
    let mut evaluator = Evaluator::new(root_scope);
    for stmt in program {
        match evaluator.eval_stmt(stmt, root_scope)? {
            Signal::Throw(err) => return Err(err),
            _ => continue,
        }
    }
    Ok(())
}

/// The evaluator's own state across a run: the two environments every
/// closure's capture root is anchored to, how deep inside a `pure`
/// function's call we currently are (so an undefined-variable error can be
/// flagged accordingly), and the exception currently being handled by the
/// innermost active `catch`, for `rethrow`.
pub struct Evaluator {
    const_root: Environment,
    global_scope: Environment,
    pure_depth: usize,
    catch_stack: Vec<EvalError>,
}

impl Evaluator {
    pub fn new(root_scope: &Environment) -> Self {
        Self {
            const_root: root_scope.root_ancestor(),
            global_scope: root_scope.clone(),
            pure_depth: 0,
            catch_stack: Vec::new(),
        }
    }

    // -- statements -----------------------------------------------------

    pub fn eval_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Signal, EvalError> {
        match &stmt.kind {
            StmtKind::Nop => Ok(Signal::Normal),
            StmtKind::Expr(e) => {
                self.eval_rvalue(e, env)?;
                Ok(Signal::Normal)
            }
            StmtKind::VarDecl { name, init } => {
                let value = match init {
                    Some(e) => self.eval_rvalue(e, env)?,
                    None => Value::None,
                };
                if !env.declare(name, value, false) {
                    return Err(EvalError::already_defined(name.clone(), stmt.span));
                }
                Ok(Signal::Normal)
            }
            StmtKind::ConstDecl { name, init } => {
                let value = self.eval_rvalue(init, env)?;
                if !env.declare(name, value, true) {
                    return Err(EvalError::already_defined(name.clone(), stmt.span));
                }
                Ok(Signal::Normal)
            }
            StmtKind::Block(stmts) => self.eval_block(stmts, env),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let c = self.eval_rvalue(cond, env)?;
                if c.is_true() {
                    self.eval_stmt(then_branch, env)
                } else if let Some(e) = else_branch {
                    self.eval_stmt(e, env)
                } else {
                    Ok(Signal::Normal)
                }
            }
            StmtKind::While { cond, body } => self.eval_while(cond, body, env),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.eval_for(init, cond, step, body, env),
            StmtKind::Foreach {
                idents,
                indexed,
                iter,
                body,
            } => self.eval_foreach(idents, *indexed, iter, body, env),
            StmtKind::Break => Ok(Signal::Break),
            StmtKind::Continue => Ok(Signal::Continue),
            StmtKind::Return(value) => {
                let v = match value {
                    Some(e) => self.eval_rvalue(e, env)?,
                    None => Value::None,
                };
                Ok(Signal::Return(v))
            }
            StmtKind::Throw(e) => {
                let v = self.eval_rvalue(e, env)?;
                match v {
                    Value::Exception(exc) => {
                        log::debug!("throw '{}'", exc.name());
                        Ok(Signal::Throw(EvalError::user(exc, stmt.span)))
                    }
                    _ => Err(EvalError::type_error(e.span)),
                }
            }
            StmtKind::Rethrow => match self.catch_stack.last() {
                Some(current) => {
                    let mut err = current.clone();
                    err.span = Some(stmt.span);
                    Ok(Signal::Throw(err))
                }
                None => {
                    log::warn!("rethrow outside of a catch body; treated as a no-op");
                    Ok(Signal::Normal)
                }
            },
            StmtKind::TryCatchFinally {
                try_block,
                catches,
                finally,
            } => self.eval_try(try_block, catches, finally, env),
            StmtKind::FuncDecl(decl) => {
                let f = self.make_closure(decl.clone(), env);
                let name = decl.name.as_ref().expect("statement-form func always has a name");
                if !env.declare(name, Value::Function(f), false) {
                    return Err(EvalError::already_defined(name.clone(), stmt.span));
                }
                Ok(Signal::Normal)
            }
        }
    }

    fn eval_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<Signal, EvalError> {
        let child = Environment::child(env);
        for s in stmts {
            let sig = self.eval_stmt(s, &child)?;
            if !matches!(sig, Signal::Normal) {
                return Ok(sig);
            }
        }
        Ok(Signal::Normal)
    }

    fn eval_while(&mut self, cond: &Expr, body: &Stmt, env: &Environment) -> Result<Signal, EvalError> {
        loop {
            let c = self.eval_rvalue(cond, env)?;
            if !c.is_true() {
                break;
            }
            match self.eval_stmt(body, env)? {
                Signal::Break => break,
                Signal::Continue | Signal::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::Normal)
    }

    fn eval_for(
        &mut self,
        init: &Option<Box<Stmt>>,
        cond: &Option<Expr>,
        step: &Option<Expr>,
        body: &Stmt,
        env: &Environment,
    ) -> Result<Signal, EvalError> {
        let loop_env = Environment::child(env);
        if let Some(i) = init {
            self.eval_stmt(i, &loop_env)?;
        }
        loop {
            let should_continue = match cond {
                Some(c) => self.eval_rvalue(c, &loop_env)?.is_true(),
                None => true,
            };
            if !should_continue {
                break;
            }
            match self.eval_stmt(body, &loop_env)? {
                Signal::Break => break,
                Signal::Continue | Signal::Normal => {}
                other => return Ok(other),
            }
            if let Some(s) = step {
                self.eval_rvalue(s, &loop_env)?;
            }
        }
        Ok(Signal::Normal)
    }

    fn eval_foreach(
        &mut self,
        idents: &[String],
        indexed: bool,
        iter: &Expr,
        body: &Stmt,
        env: &Environment,
    ) -> Result<Signal, EvalError> {
        let iter_val = self.eval_rvalue(iter, env)?;
        let components: Vec<Vec<Value>> = match &iter_val {
            Value::Array(a) => a.values().into_iter().map(|v| vec![v]).collect(),
            Value::Str(s) => (0..s.len() as i64)
                .map(|i| vec![Value::Str(s.subscript(i).expect("i is in range"))])
                .collect(),
            Value::Dict(d) => d
                .entries()
                .into_iter()
                .map(|(k, v)| vec![k.to_value(), v])
                .collect(),
            _ => return Err(EvalError::type_error(iter.span)),
        };

        for (index, comps) in components.into_iter().enumerate() {
            let loop_env = Environment::child(env);
            let mut comp_iter = comps.into_iter();
            let mut names = idents.iter();
            if indexed {
                if let Some(first) = names.next() {
                    loop_env.declare(first, Value::Int(index as i64), false);
                }
            }
            for name in names {
                let v = comp_iter.next().unwrap_or(Value::None);
                loop_env.declare(name, v, false);
            }
            match self.eval_stmt(body, &loop_env)? {
                Signal::Break => break,
                Signal::Continue | Signal::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Signal::Normal)
    }

    /// `finally` runs on every exit path (spec.md §4.5/§8.7): the `try`
    /// block's outcome and any matching catch's outcome are first collapsed
    /// into a single `Result<Signal, EvalError>`, `finally` then always
    /// runs, and only overrides that outcome if it itself exits abnormally
    /// (a `return`/`throw`/`break`/`continue` from inside `finally`, or its
    /// own propagated error). Nested `try`s naturally run innermost-first:
    /// an inner `try`'s `finally` is part of evaluating its own `eval_try`
    /// call, which completes before the outer `try` ever sees its result.
    fn eval_try(
        &mut self,
        try_block: &Stmt,
        catches: &[CatchClause],
        finally: &Option<Box<Stmt>>,
        env: &Environment,
    ) -> Result<Signal, EvalError> {
        let outcome: Result<Signal, EvalError> = match self.eval_stmt(try_block, env) {
            Ok(Signal::Throw(e)) => Err(e),
            Ok(other) => Ok(other),
            Err(e) => Err(e),
        };

        let mut result: Result<Signal, EvalError> = match outcome {
            Ok(sig) => Ok(sig),
            Err(err) => {
                let mut handled = None;
                for catch in catches {
                    if !catch_matches(catch, &err) {
                        continue;
                    }
                    let child = Environment::child(env);
                    if let Some(bind) = &catch.bind {
                        child.declare(bind, err.to_exception_value(), false);
                    }
                    self.catch_stack.push(err.clone());
                    let r = self.eval_stmt(&catch.body, &child);
                    self.catch_stack.pop();
                    handled = Some(match r {
                        Ok(Signal::Throw(e2)) => Err(e2),
                        Ok(other) => Ok(other),
                        Err(e2) => Err(e2),
                    });
                    break;
                }
                handled.unwrap_or(Err(err))
            }
        };

        if let Some(fin) = finally {
            match self.eval_stmt(fin, env) {
                Ok(Signal::Normal) => {}
                Ok(other) => result = Ok(other),
                Err(e) => result = Err(e),
            }
        }

        result
    }

    // -- expressions ------------------------------------------------------

    /// Evaluates `expr`, resolving an `L`-value or a pending
    /// undefined-identifier sentinel to a plain value (spec.md §4.5: "any
    /// read that is not a pending assignment target converts the sentinel
    /// to `undefined-variable` error").
    pub(crate) fn eval_rvalue(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        let v = self.eval_expr(expr, env)?;
        self.to_rvalue(v, expr.span)
    }

    pub(crate) fn to_rvalue(&self, v: Value, span: Span) -> Result<Value, EvalError> {
        match v {
            Value::LValue(cell) => {
                let inner = cell.borrow().value.clone();
                self.to_rvalue(inner, span)
            }
            Value::UndefinedId(name) => {
                let err = EvalError::undefined_variable(name, span);
                Err(if self.pure_depth > 0 {
                    err.mark_in_pure_function()
                } else {
                    err
                })
            }
            other => Ok(other),
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Int(i) => Ok(Value::Int(*i)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Bool(b) => Ok(Value::bool(*b)),
            ExprKind::None => Ok(Value::None),
            ExprKind::Str(s) => Ok(Value::Str(SharedStr::new(s.clone()))),
            ExprKind::ArrayLit(elems) => {
                let mut values = Vec::with_capacity(elems.len());
                for e in elems {
                    values.push(self.eval_rvalue(e, env)?);
                }
                Ok(Value::Array(Array::from_values(values)))
            }
            ExprKind::DictLit(pairs) => {
                let dict = Dict::new();
                for (k, v) in pairs {
                    let key_val = self.eval_rvalue(k, env)?;
                    let val = self.eval_rvalue(v, env)?;
                    let key = key_val
                        .dict_key()
                        .ok_or_else(|| EvalError::type_error(k.span))?;
                    dict.set(key, val);
                }
                Ok(Value::Dict(dict))
            }
            ExprKind::Ident(name) => match env.lookup(name) {
                Some(handle) => Ok(Value::LValue(handle)),
                None => Ok(Value::UndefinedId(name.clone())),
            },
            ExprKind::Member(base, id) => {
                let base_val = self.eval_rvalue(base, env)?;
                base_val.subscript(&Value::Str(SharedStr::new(id.clone())), expr.span)
            }
            ExprKind::Index(base, idx) => {
                let base_val = self.eval_rvalue(base, env)?;
                let idx_val = self.eval_rvalue(idx, env)?;
                base_val.subscript(&idx_val, expr.span)
            }
            ExprKind::Slice(base, start, end) => {
                let base_val = self.eval_rvalue(base, env)?;
                let start_val = start
                    .as_ref()
                    .map(|e| self.eval_rvalue(e, env))
                    .transpose()?;
                let end_val = end.as_ref().map(|e| self.eval_rvalue(e, env)).transpose()?;
                base_val.slice(start_val.as_ref(), end_val.as_ref(), expr.span)
            }
            ExprKind::Call(callee, args) => self.eval_call(callee, args, env, expr.span),
            ExprKind::Unary(op, operand) => {
                let v = self.eval_rvalue(operand, env)?;
                match op {
                    UnOp::Neg => v.neg(expr.span),
                    UnOp::Not => Ok(v.not()),
                }
            }
            ExprKind::Binary(op, lhs, rhs) => self.eval_binary(*op, lhs, rhs, env, expr.span),
            ExprKind::Assign { target, op, value } => self.eval_assign(target, *op, value, env, expr.span),
            ExprKind::MultiAssign { targets, op, value } => {
                self.eval_multi_assign(targets, *op, value, env, expr.span)
            }
            ExprKind::FuncExpr(decl) => Ok(Value::Function(self.make_closure(decl.clone(), env))),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        env: &Environment,
        span: Span,
    ) -> Result<Value, EvalError> {
        match op {
            BinOp::And => {
                let l = self.eval_rvalue(lhs, env)?;
                if !l.is_true() {
                    return Ok(Value::bool(false));
                }
                let r = self.eval_rvalue(rhs, env)?;
                Ok(Value::bool(r.is_true()))
            }
            BinOp::Or => {
                let l = self.eval_rvalue(lhs, env)?;
                if l.is_true() {
                    return Ok(Value::bool(true));
                }
                let r = self.eval_rvalue(rhs, env)?;
                Ok(Value::bool(r.is_true()))
            }
            _ => {
                let l = self.eval_rvalue(lhs, env)?;
                let r = self.eval_rvalue(rhs, env)?;
                apply_binop(op, &l, &r, span)
            }
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        env: &Environment,
        span: Span,
    ) -> Result<Value, EvalError> {
        let callee_val = self.eval_rvalue(callee, env)?;
        match callee_val {
            Value::Builtin(b) => (b.func)(self, env, args),
            Value::Function(f) => {
                let mut arg_values = Vec::with_capacity(args.len());
                for a in args {
                    arg_values.push(self.eval_rvalue(a, env)?);
                }
                self.call_function(&f, arg_values, span)
            }
            _ => Err(EvalError::not_callable(span)),
        }
    }

    /// Calls a user-defined function with already-evaluated arguments --
    /// the single call path shared by ordinary `Call` expressions and
    /// built-ins that invoke a callback value themselves (e.g. a sort
    /// comparator).
    pub fn call_function(
        &mut self,
        f: &Function,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, EvalError> {
        let decl = f.decl();
        if decl.params.len() != args.len() {
            return Err(EvalError::invalid_argument(
                format!(
                    "expected {} argument(s), got {}",
                    decl.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        let call_env = Environment::child(&f.capture().root);
        for (name, handle) in &f.capture().symbols {
            call_env.declare_cell(name, handle.clone());
        }
        for (param, value) in decl.params.iter().zip(args) {
            call_env.declare(param, value, false);
        }

        if f.is_pure() {
            self.pure_depth += 1;
        }
        log::trace!(
            "calling {}",
            decl.name.as_deref().unwrap_or("<anonymous>")
        );
        let result = match &decl.body {
            FuncBody::Expr(e) => self.eval_rvalue(e, &call_env),
            FuncBody::Block(stmts) => {
                let mut outcome: Result<Signal, EvalError> = Ok(Signal::Normal);
                for s in stmts {
                    outcome = self.eval_stmt(s, &call_env);
                    match &outcome {
                        Ok(Signal::Normal) => continue,
                        _ => break,
                    }
                }
                match outcome {
                    Ok(Signal::Return(v)) => Ok(v),
                    Ok(Signal::Throw(e)) => Err(e),
                    Ok(_) => Ok(Value::None),
                    Err(e) => Err(e),
                }
            }
        };
        if f.is_pure() {
            self.pure_depth -= 1;
        }
        result
    }

    fn make_closure(&self, decl: Rc<FuncDecl>, env: &Environment) -> Function {
        let root = if decl.is_pure {
            self.const_root.clone()
        } else {
            self.global_scope.clone()
        };
        let mut symbols = Vec::new();
        if let Some(names) = &decl.captures {
            for name in names {
                if let Some(handle) = env.lookup(name) {
                    let snapshot = handle.borrow().value.clone();
                    symbols.push((name.clone(), lvalue::new_lvalue(snapshot, false)));
                }
            }
        }
        Function::new(decl, CaptureEnv { root, symbols })
    }

    /// Resolves an assignment target to the [`LValueHandle`] a write should
    /// land on, implicitly declaring a bare identifier that isn't bound
    /// anywhere yet (spec.md §4.5: "a missing name produces an
    /// undefined-identifier sentinel... assignment may define it").
    fn target_handle(
        &mut self,
        target: &Expr,
        env: &Environment,
    ) -> Result<(LValueHandle, Option<String>), EvalError> {
        match &target.kind {
            ExprKind::Ident(name) => {
                let handle = match env.lookup(name) {
                    Some(h) => h,
                    None => {
                        env.declare(name, Value::None, false);
                        env.lookup(name).expect("just declared")
                    }
                };
                Ok((handle, Some(name.clone())))
            }
            ExprKind::Member(_, _) | ExprKind::Index(_, _) => {
                let v = self.eval_expr(target, env)?;
                match v {
                    Value::LValue(h) => Ok((h, None)),
                    Value::UndefinedId(name) => Err(EvalError::undefined_variable(name, target.span)),
                    _ => Err(EvalError::not_an_lvalue(target.span)),
                }
            }
            _ => Err(EvalError::not_an_lvalue(target.span)),
        }
    }

    fn eval_assign(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value: &Expr,
        env: &Environment,
        span: Span,
    ) -> Result<Value, EvalError> {
        let (handle, name) = self.target_handle(target, env)?;
        if handle.borrow().is_const {
            return Err(match name {
                Some(n) => EvalError::cannot_rebind(n, span),
                None => EvalError::cannot_change_const(span),
            });
        }

        let rhs = self.eval_rvalue(value, env)?;
        let new_value = match op.binary_op() {
            None => rhs,
            Some(binop) => {
                let current = handle.borrow().value.clone();
                let current = self.to_rvalue(current, target.span)?;
                apply_binop(binop, &current, &rhs, span)?
            }
        };
        lvalue::put(&handle, new_value.clone());
        Ok(new_value)
    }

    fn eval_multi_assign(
        &mut self,
        targets: &[String],
        op: AssignOp,
        value: &Expr,
        env: &Environment,
        span: Span,
    ) -> Result<Value, EvalError> {
        let rhs = self.eval_rvalue(value, env)?;
        let per_target: Vec<Value> = match &rhs {
            Value::Array(a) => {
                let values = a.values();
                (0..targets.len())
                    .map(|i| values.get(i).cloned().unwrap_or(Value::None))
                    .collect()
            }
            other => vec![other.clone(); targets.len()],
        };

        let mut last = Value::None;
        for (name, val) in targets.iter().zip(per_target) {
            let handle = match env.lookup(name) {
                Some(h) => h,
                None => {
                    env.declare(name, Value::None, false);
                    env.lookup(name).expect("just declared")
                }
            };
            if handle.borrow().is_const {
                return Err(EvalError::cannot_rebind(name.clone(), span));
            }
            let new_value = match op.binary_op() {
                None => val,
                Some(binop) => {
                    let current = handle.borrow().value.clone();
                    let current = self.to_rvalue(current, span)?;
                    apply_binop(binop, &current, &val, span)?
                }
            };
            lvalue::put(&handle, new_value.clone());
            last = new_value;
        }
        Ok(last)
    }
}

fn apply_binop(op: BinOp, l: &Value, r: &Value, span: Span) -> Result<Value, EvalError> {
    match op {
        BinOp::Add => l.add(r, span),
        BinOp::Sub => l.sub(r, span),
        BinOp::Mul => l.mul(r, span),
        BinOp::Div => l.div(r, span),
        BinOp::Mod => l.modulo(r, span),
        BinOp::Lt => l.lt(r, span),
        BinOp::Gt => l.gt(r, span),
        BinOp::Le => l.le(r, span),
        BinOp::Ge => l.ge(r, span),
        BinOp::Eq => Ok(l.eq_value(r)),
        BinOp::NotEq => Ok(l.noteq_value(r)),
        BinOp::And | BinOp::Or => unreachable!("short-circuited in eval_binary"),
    }
}

fn catch_matches(catch: &CatchClause, err: &EvalError) -> bool {
    match &catch.names {
        None => true,
        Some(names) => names.iter().any(|n| n == &err.exception_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::BuiltinTable;
    use crate::lexer::lex_source;
    use crate::parser::parse;

    fn run(src: &str) -> (Environment, Result<(), EvalError>) {
        let builtins = BuiltinTable::reference();
        let tokens = lex_source(src).expect("lex");
        let program = parse(tokens, true, &builtins).expect("parse");
        let const_root = Environment::root();
        builtins.install(&const_root);
        let root_scope = Environment::child(&const_root);
        let result = evaluate(&program, &root_scope);
        (root_scope, result)
    }

    fn get(env: &Environment, name: &str) -> Value {
        env.lookup(name).unwrap().borrow().value.clone()
    }

    #[test]
    fn precedence_scenario() {
        let (_env, result) = run("var r = 2 * -3 + 1 < 0 && 2 >= 1;");
        assert!(result.is_ok());
    }

    #[test]
    fn slice_append_independence() {
        let (env, result) = run(
            "var s = [1,2,3]; var sub = s[1:]; sub = sub + [99,100]; var a1 = sub; var a2 = s;",
        );
        result.unwrap();
        assert_eq!(get(&env, "a1"), Value::Array(Array::from_values(vec![
            Value::Int(2), Value::Int(3), Value::Int(99), Value::Int(100)
        ])));
        assert_eq!(get(&env, "a2"), Value::Array(Array::from_values(vec![
            Value::Int(1), Value::Int(2), Value::Int(3)
        ])));
    }

    #[test]
    fn try_finally_runs_on_return() {
        let (env, result) = run(
            "var g = 0; func f() { try { return 42; } finally { g = 1; } } var r = f();",
        );
        result.unwrap();
        assert_eq!(get(&env, "r"), Value::Int(42));
        assert_eq!(get(&env, "g"), Value::Int(1));
    }

    #[test]
    fn custom_exception_with_payload() {
        let (env, result) = run(
            r#"var got = 0; try { throw exception("myerr", 1234); } catch (myerr as e) { got = exdata(e); }"#,
        );
        result.unwrap();
        assert_eq!(get(&env, "got"), Value::Int(1234));
    }

    #[test]
    fn undefined_read_is_an_error() {
        let (_env, result) = run("var x = y;");
        assert!(matches!(
            result.unwrap_err().kind,
            EvalErrorKind::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn pure_function_cannot_see_mutable_globals() {
        let (_env, result) = run("var g = 1; pure func f() => g; var r = f();");
        match result {
            Err(e) => assert!(matches!(
                e.kind,
                EvalErrorKind::UndefinedVariable { in_pure_function: true, .. }
            )),
            Ok(()) => panic!("expected an undefined-variable error"),
        }
    }
}
