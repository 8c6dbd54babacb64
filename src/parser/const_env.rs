//! Parse-time constant folding.
//!
//! The parser keeps a chain of [`Environment`]s in lockstep with the block
//! structure it's descending through, populated only with `const`
//! declarations (and builtins the embedder marks const). After parsing a
//! subexpression the parser calls [`try_fold`]; on success the caller
//! replaces the just-parsed subtree with the corresponding literal node
//! (spec.md §4.3). This is a restricted evaluator, not the full
//! [`crate::eval::Evaluator`]: it has no notion of statements, calls,
//! assignment or control flow, because none of those can appear in a
//! const-foldable expression in the first place.

use crate::env::Environment;
use crate::location::Span;
use crate::syntax::{BinOp, Expr, ExprKind, UnOp};
use crate::value::string::SharedStr;
use crate::value::Value;

/// Attempts to evaluate `expr` purely from `env`'s const bindings. Returns
/// `None` (rather than propagating a type error) whenever the expression
/// cannot be resolved at parse time -- including a genuine type error in
/// an operand, since an unfoldable expression just stays a normal subtree
/// and gets its chance to raise that same error at runtime.
pub fn try_fold(env: &Environment, expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::Int(i) => Some(Value::Int(*i)),
        ExprKind::Float(f) => Some(Value::Float(*f)),
        ExprKind::Bool(b) => Some(Value::bool(*b)),
        ExprKind::None => Some(Value::None),
        ExprKind::Str(s) => Some(Value::Str(SharedStr::new(s.clone()))),
        ExprKind::Ident(name) => env.lookup(name).map(|cell| cell.borrow().value.clone()),
        ExprKind::Unary(op, inner) => {
            let v = try_fold(env, inner)?;
            match op {
                UnOp::Neg => v.neg(expr.span).ok(),
                UnOp::Not => Some(v.not()),
            }
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let l = try_fold(env, lhs)?;
            let r = try_fold(env, rhs)?;
            fold_binary(*op, &l, &r, expr.span)
        }
        _ => None,
    }
}

fn fold_binary(op: BinOp, l: &Value, r: &Value, span: Span) -> Option<Value> {
    match op {
        BinOp::Add => l.add(r, span).ok(),
        BinOp::Sub => l.sub(r, span).ok(),
        BinOp::Mul => l.mul(r, span).ok(),
        BinOp::Div => l.div(r, span).ok(),
        BinOp::Mod => l.modulo(r, span).ok(),
        BinOp::Lt => l.lt(r, span).ok(),
        BinOp::Gt => l.gt(r, span).ok(),
        BinOp::Le => l.le(r, span).ok(),
        BinOp::Ge => l.ge(r, span).ok(),
        BinOp::Eq => Some(l.eq_value(r)),
        BinOp::NotEq => Some(l.noteq_value(r)),
        BinOp::And => Some(Value::bool(l.is_true() && r.is_true())),
        BinOp::Or => Some(Value::bool(l.is_true() || r.is_true())),
    }
}

/// Element-wise folding of an array/dict literal used as a `const`
/// initializer -- the one place spec.md §4.3 has container literals fold
/// at all ("Arrays and dictionaries fold element-wise only inside const
/// declarations").
pub fn try_fold_container(env: &Environment, expr: &Expr) -> Option<Value> {
    match &expr.kind {
        ExprKind::ArrayLit(elems) => {
            let mut values = Vec::with_capacity(elems.len());
            for e in elems {
                values.push(try_fold_container(env, e).or_else(|| try_fold(env, e))?);
            }
            Some(Value::Array(crate::value::array::Array::from_values(values)))
        }
        ExprKind::DictLit(pairs) => {
            let dict = crate::value::dict::Dict::new();
            for (k, v) in pairs {
                let key_val = try_fold_container(env, k).or_else(|| try_fold(env, k))?;
                let val = try_fold_container(env, v).or_else(|| try_fold(env, v))?;
                let key = key_val.dict_key()?;
                dict.set(key, val);
            }
            Some(Value::Dict(dict))
        }
        _ => try_fold(env, expr),
    }
}
