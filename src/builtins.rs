//! The reference built-in table (spec.md's "Reference BuiltinTable"):
//! `print, assert, len, append, pop, clone, dict, sort, exception, exdata,
//! exname, defined, str, int, float, array`.
//!
//! A [`BuiltinTable`] is just a named collection of [`Builtin`] values; it is
//! installed twice per run -- once into the parser's const-eval environment
//! and once into the evaluator's actual root scope -- rather than living
//! behind a single process-global static, so an embedder can hand different
//! programs different built-in sets. The const-eval environment installation
//! only makes a builtin's *name* resolvable as a constant lookup target
//! (`try_fold` has no `Call` arm); a call like `len([1,2])` is never folded
//! at parse time and always runs through the evaluator.

use std::rc::Rc;

use crate::env::Environment;
use crate::eval::{EvalError, Evaluator};
use crate::syntax::Expr;
use crate::value::array::Array;
use crate::value::dict::Dict;
use crate::value::exception::ExceptionObject;
use crate::value::string::SharedStr;
use crate::value::{Builtin, Value};

pub struct BuiltinTable {
    entries: Vec<Rc<Builtin>>,
}

impl BuiltinTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&mut Evaluator, &Environment, &[Expr]) -> Result<Value, EvalError> + 'static,
    {
        self.entries.push(Rc::new(Builtin {
            name: name.to_string(),
            func: Box::new(func),
        }));
    }

    /// Declares every built-in as a `const` binding in `env`. Installed into
    /// a fresh const-root environment before each run (and, separately, into
    /// the parser's own const-eval environment), never shared globally.
    pub fn install(&self, env: &Environment) {
        for entry in &self.entries {
            env.declare(&entry.name, Value::Builtin(entry.clone()), true);
        }
    }

    pub fn reference() -> Self {
        let mut t = Self::new();
        t.register("print", builtin_print);
        t.register("assert", builtin_assert);
        t.register("len", builtin_len);
        t.register("append", builtin_append);
        t.register("pop", builtin_pop);
        t.register("clone", builtin_clone);
        t.register("dict", builtin_dict);
        t.register("sort", builtin_sort);
        t.register("exception", builtin_exception);
        t.register("exdata", builtin_exdata);
        t.register("exname", builtin_exname);
        t.register("defined", builtin_defined);
        t.register("str", builtin_str);
        t.register("int", builtin_int);
        t.register("float", builtin_float);
        t.register("array", builtin_array);
        t
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_one(ev: &mut Evaluator, env: &Environment, args: &[Expr], i: usize) -> Result<Value, EvalError> {
    match args.get(i) {
        Some(e) => ev.eval_rvalue(e, env),
        None => Ok(Value::None),
    }
}

fn builtin_print(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let mut parts = Vec::with_capacity(args.len());
    for a in args {
        parts.push(ev.eval_rvalue(a, env)?.to_string_value());
    }
    println!("{}", parts.join(" "));
    Ok(Value::None)
}

fn builtin_assert(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let cond = eval_one(ev, env, args, 0)?;
    if cond.is_true() {
        return Ok(Value::None);
    }
    let message = match args.get(1) {
        Some(e) => Some(ev.eval_rvalue(e, env)?.to_string_value()),
        None => None,
    };
    Err(EvalError::assertion_failure(message, span))
}

fn builtin_len(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let v = eval_one(ev, env, args, 0)?;
    Ok(Value::Int(v.len(span)?))
}

/// Resolves `args[0]` to the array it names, returning both the live array
/// handle (so the mutation below lands on the shared backing) and the
/// L-value handle to write the post-mutation view back into, when the
/// target is itself an assignable place (a plain identifier, or a
/// subscript/member expression). A literal or call-result argument has
/// nothing to write back to; the mutation then only affects that transient
/// value, which is fine since nothing else could observe it anyway.
fn target_array(
    ev: &mut Evaluator,
    env: &Environment,
    expr: &Expr,
) -> Result<(Array, Option<crate::value::lvalue::LValueHandle>), EvalError> {
    let raw = ev.eval_expr(expr, env)?;
    let handle = match &raw {
        Value::LValue(h) => Some(h.clone()),
        _ => None,
    };
    let v = ev.to_rvalue(raw, expr.span)?;
    match v {
        Value::Array(a) => Ok((a, handle)),
        _ => Err(EvalError::type_error(expr.span)),
    }
}

fn builtin_append(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::invalid_argument(
            "append expects at least an array argument",
            crate::location::Span::default(),
        ));
    }
    let (array, handle) = target_array(ev, env, &args[0])?;
    for extra in &args[1..] {
        let v = ev.eval_rvalue(extra, env)?;
        array.push(v);
    }
    if let Some(h) = handle {
        crate::value::lvalue::put(&h, Value::Array(array));
    }
    Ok(Value::None)
}

fn builtin_pop(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::invalid_argument(
            "pop expects an array argument",
            crate::location::Span::default(),
        ));
    }
    let (array, handle) = target_array(ev, env, &args[0])?;
    let removed = array.pop().ok_or_else(|| EvalError::out_of_bounds(args[0].span))?;
    if let Some(h) = handle {
        crate::value::lvalue::put(&h, Value::Array(array));
    }
    Ok(removed)
}

fn builtin_clone(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let v = eval_one(ev, env, args, 0)?;
    Ok(v.deep_clone())
}

/// `dict()` builds an empty dict; `dict(pairs)` builds one from an array of
/// `[key, value]` two-element arrays (spec.md §8 scenario 6: `dict(sort(out,
/// ...)) == d` reassembles a dict from the `[k, v]` pairs a `foreach` over
/// another dict produced).
fn builtin_dict(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let d = Dict::new();
    if let Some(arg) = args.first() {
        let v = ev.eval_rvalue(arg, env)?;
        let pairs = match v {
            Value::Array(a) => a.values(),
            _ => return Err(EvalError::type_error(arg.span)),
        };
        for pair in pairs {
            let entry = match pair {
                Value::Array(p) if p.len() == 2 => p.values(),
                _ => return Err(EvalError::type_error(arg.span)),
            };
            let key = entry[0]
                .dict_key()
                .ok_or_else(|| EvalError::type_error(arg.span))?;
            d.set(key, entry[1].clone());
        }
    }
    Ok(Value::Dict(d))
}

/// `sort(arr)` / `sort(arr, comparator)`: returns a new array, leaving the
/// argument untouched (mirroring `clone`/`str`-style pure helpers rather
/// than the in-place mutators `append`/`pop`). With no comparator, elements
/// compare via the ordinary `<` used for `if`/`while` conditions; with one,
/// `comparator(a, b)` is called and must return a truthy value exactly when
/// `a` should sort before `b`.
fn builtin_sort(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::invalid_argument(
            "sort expects an array argument",
            crate::location::Span::default(),
        ));
    }
    let span = args[0].span;
    let v = ev.eval_rvalue(&args[0], env)?;
    let mut values = match v {
        Value::Array(a) => a.values(),
        _ => return Err(EvalError::type_error(span)),
    };

    match args.get(1) {
        None => {
            let mut err = None;
            values.sort_by(|a, b| {
                if err.is_some() {
                    return std::cmp::Ordering::Equal;
                }
                match a.lt(b, span) {
                    Ok(v) => {
                        if v.is_true() {
                            std::cmp::Ordering::Less
                        } else {
                            std::cmp::Ordering::Greater
                        }
                    }
                    Err(e) => {
                        err = Some(e);
                        std::cmp::Ordering::Equal
                    }
                }
            });
            if let Some(e) = err {
                return Err(e);
            }
        }
        Some(cmp_expr) => {
            let cmp_val = ev.eval_rvalue(cmp_expr, env)?;
            let f = match cmp_val {
                Value::Function(f) => f,
                _ => return Err(EvalError::type_error(cmp_expr.span)),
            };
            let mut err = None;
            values.sort_by(|a, b| {
                if err.is_some() {
                    return std::cmp::Ordering::Equal;
                }
                match ev.call_function(&f, vec![a.clone(), b.clone()], cmp_expr.span) {
                    Ok(r) => {
                        if r.is_true() {
                            std::cmp::Ordering::Less
                        } else {
                            std::cmp::Ordering::Greater
                        }
                    }
                    Err(e) => {
                        err = Some(e);
                        std::cmp::Ordering::Equal
                    }
                }
            });
            if let Some(e) = err {
                return Err(e);
            }
        }
    }
    Ok(Value::Array(Array::from_values(values)))
}

fn builtin_exception(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let name_val = eval_one(ev, env, args, 0)?;
    let name = match name_val {
        Value::Str(s) => s.as_str().to_string(),
        _ => return Err(EvalError::type_error(span)),
    };
    let payload = eval_one(ev, env, args, 1)?;
    Ok(Value::Exception(ExceptionObject::new(name, payload)))
}

fn builtin_exdata(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let v = eval_one(ev, env, args, 0)?;
    match v {
        Value::Exception(e) => Ok(e.payload().clone()),
        _ => Err(EvalError::type_error(span)),
    }
}

fn builtin_exname(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let v = eval_one(ev, env, args, 0)?;
    match v {
        Value::Exception(e) => Ok(Value::Str(SharedStr::new(e.name().to_string()))),
        _ => Err(EvalError::type_error(span)),
    }
}

/// `defined(x)`: the one built-in that must not evaluate its argument as an
/// ordinary R-value when it names an identifier, since the entire point is
/// to ask "is this name bound" without tripping the undefined-variable
/// error that reading it normally would.
fn builtin_defined(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let arg = match args.first() {
        Some(e) => e,
        None => return Ok(Value::bool(false)),
    };
    let v = ev.eval_expr(arg, env)?;
    Ok(Value::bool(!matches!(v, Value::UndefinedId(_))))
}

fn builtin_str(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let v = eval_one(ev, env, args, 0)?;
    Ok(Value::Str(SharedStr::new(v.to_string_value())))
}

fn builtin_int(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let v = eval_one(ev, env, args, 0)?;
    match v {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Float(f) => Ok(Value::Int(f as i64)),
        Value::Str(s) => s
            .as_str()
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::invalid_argument(format!("cannot parse '{}' as int", s.as_str()), span)),
        _ => Err(EvalError::type_error(span)),
    }
}

fn builtin_float(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let v = eval_one(ev, env, args, 0)?;
    match v {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Str(s) => s
            .as_str()
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::invalid_argument(format!("cannot parse '{}' as float", s.as_str()), span)),
        _ => Err(EvalError::type_error(span)),
    }
}

/// `array(n)` / `array(n, fill)`: a fresh array of `n` `none`s, or `n`
/// copies of `fill` (spec.md's "array-of-none construction" scenario is the
/// zero-argument-fill case).
fn builtin_array(ev: &mut Evaluator, env: &Environment, args: &[Expr]) -> Result<Value, EvalError> {
    let span = args
        .first()
        .map(|e| e.span)
        .unwrap_or(crate::location::Span::default());
    let n_val = eval_one(ev, env, args, 0)?;
    let n = match n_val {
        Value::Int(i) if i >= 0 => i as usize,
        _ => return Err(EvalError::invalid_argument("array length must be a non-negative int", span)),
    };
    let fill = eval_one(ev, env, args, 1)?;
    Ok(Value::Array(Array::from_values(vec![fill; n])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex_source;
    use crate::parser::parse;

    fn run(src: &str) -> (Environment, Result<(), EvalError>) {
        let builtins = BuiltinTable::reference();
        let tokens = lex_source(src).expect("lex");
        let program = parse(tokens, true, &builtins).expect("parse");
        let const_root = Environment::root();
        builtins.install(&const_root);
        let root_scope = Environment::child(&const_root);
        let result = crate::eval::evaluate(&program, &root_scope);
        (root_scope, result)
    }

    fn get(env: &Environment, name: &str) -> Value {
        env.lookup(name).unwrap().borrow().value.clone()
    }

    #[test]
    fn len_and_str_and_int() {
        let (env, result) = run(
            "var a = len([1,2,3]); var b = str(42); var c = int(\"7\");",
        );
        result.unwrap();
        assert_eq!(get(&env, "a"), Value::Int(3));
        assert_eq!(get(&env, "b"), Value::Str(SharedStr::new("42".into())));
        assert_eq!(get(&env, "c"), Value::Int(7));
    }

    #[test]
    fn append_through_a_slice_detaches() {
        let (env, result) = run(
            "var base = [1,2,3]; var sub = base[1:]; append(sub, 99); var r1 = sub; var r2 = base;",
        );
        result.unwrap();
        assert_eq!(
            get(&env, "r1"),
            Value::Array(Array::from_values(vec![Value::Int(2), Value::Int(3), Value::Int(99)]))
        );
        assert_eq!(
            get(&env, "r2"),
            Value::Array(Array::from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn sort_with_custom_comparator() {
        let (env, result) = run(
            "var xs = sort([3,1,2], func(a, b) => a > b);",
        );
        result.unwrap();
        assert_eq!(
            get(&env, "xs"),
            Value::Array(Array::from_values(vec![Value::Int(3), Value::Int(2), Value::Int(1)]))
        );
    }

    #[test]
    fn defined_does_not_evaluate_undefined_names() {
        let (env, result) = run("var ok = defined(nope);");
        result.unwrap();
        assert_eq!(get(&env, "ok"), Value::bool(false));
    }

    #[test]
    fn array_of_none() {
        let (env, result) = run("var xs = array(3);");
        result.unwrap();
        assert_eq!(
            get(&env, "xs"),
            Value::Array(Array::from_values(vec![Value::None, Value::None, Value::None]))
        );
    }
}
