//! The value model: a tagged union over trivial scalars and reference
//! counted shared containers, plus the per-variant operation dispatch table
//! described as "type descriptors" in the design this crate is based on.
//!
//! Rather than a type-descriptor vtable, dispatch is a plain `match` over
//! the `Value` enum with one method per operation family
//! (`add`/`eq`/`is_true`/...), each implemented as an inherent method. This
//! keeps the hot evaluator loop free of indirect calls and lets the
//! compiler see every case.

pub mod array;
pub mod dict;
pub mod exception;
pub mod function;
pub mod lvalue;
pub mod string;

use std::rc::Rc;

use array::Array;
use dict::{Dict, DictKey};
use exception::ExceptionObject;
use function::Function;
use lvalue::LValueHandle;
use string::SharedStr;

use crate::eval::{EvalError, Evaluator};
use crate::location::Span;
use crate::syntax::Expr;

/// An externally supplied built-in: receives the evaluator, the calling
/// environment and the *unevaluated* argument expressions, so it can
/// control whether and how many of them get evaluated (`defined(x)` must
/// not evaluate `x` at all if it's unbound).
pub type BuiltinFn =
    dyn Fn(&mut Evaluator, &crate::env::Environment, &[Expr]) -> Result<Value, EvalError>;

pub struct Builtin {
    pub name: String,
    pub func: Box<BuiltinFn>,
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

/// A dynamically-typed value: the trivial tags copy cheaply; the shared
/// tags (`Str`/`Array`/`Dict`/`Function`/`Exception`) are reference-counted
/// and cloning them shares the underlying storage (subject to each type's
/// own copy-on-write rules).
#[derive(Clone, Debug)]
pub enum Value {
    None,
    Int(i64),
    Float(f64),
    Builtin(Rc<Builtin>),
    /// An assignable storage cell. Reading one in a value position produces
    /// an `R`-value copy of whatever it currently holds; see [`Value::rvalue`].
    LValue(LValueHandle),
    /// The sentinel produced by looking up a name not bound in any scope.
    /// Assigning to it defines the name; reading it in any other position
    /// is an `undefined-variable` error.
    UndefinedId(String),
    Str(SharedStr),
    Array(Array),
    Dict(Dict),
    Function(Function),
    Exception(ExceptionObject),
}

macro_rules! type_error {
    ($span:expr) => {
        Err(EvalError::type_error($span))
    };
}

impl Value {
    pub fn bool(b: bool) -> Value {
        Value::Int(if b { 1 } else { 0 })
    }

    /// Dereferences an `LValue` to the value it currently holds; a no-op for
    /// every other variant. Every binary/unary operation below should be
    /// called with R-values (the evaluator is responsible for calling this
    /// at expression boundaries).
    pub fn rvalue(&self) -> Value {
        match self {
            Value::LValue(cell) => cell.borrow().value.rvalue(),
            other => other.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Builtin(_) => "builtin",
            Value::LValue(_) => "lvalue",
            Value::UndefinedId(_) => "undefined",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Exception(_) => "exception",
        }
    }

    /// Per-variant truthiness: `none` and numeric zero are false, empty
    /// containers are false, everything else (including functions and
    /// exceptions) is true.
    pub fn is_true(&self) -> bool {
        match self.rvalue() {
            Value::None => false,
            Value::Int(i) => i != 0,
            Value::Float(f) => f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::Builtin(_) | Value::Function(_) | Value::Exception(_) => true,
            Value::LValue(_) | Value::UndefinedId(_) => unreachable!("rvalue() strips these"),
        }
    }

    pub fn to_string_value(&self) -> String {
        match self.rvalue() {
            Value::None => "none".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Builtin(b) => format!("<builtin {}>", b.name),
            Value::Str(s) => s.as_str().to_string(),
            Value::Array(a) => {
                let items: Vec<String> = a.values().iter().map(|v| v.to_string_value()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Dict(d) => {
                let items: Vec<String> = d
                    .entries()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.to_value().to_string_value(), v.to_string_value()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
            Value::Function(_) => "<function>".to_string(),
            Value::Exception(e) => format!("<Exception({})>", e.name()),
            Value::LValue(_) | Value::UndefinedId(_) => unreachable!("rvalue() strips these"),
        }
    }

    pub fn len(&self, span: Span) -> Result<i64, EvalError> {
        match self.rvalue() {
            Value::Str(s) => Ok(s.len() as i64),
            Value::Array(a) => Ok(a.len() as i64),
            Value::Dict(d) => Ok(d.len() as i64),
            _ => Err(EvalError::type_error(span)),
        }
    }

    pub fn use_count(&self) -> i64 {
        match self.rvalue() {
            Value::Str(s) => s.use_count() as i64,
            Value::Array(a) => a.use_count() as i64,
            Value::Dict(d) => d.use_count() as i64,
            Value::Function(f) => f.use_count() as i64,
            Value::Exception(e) => e.use_count() as i64,
            _ => 1,
        }
    }

    pub fn is_slice(&self) -> bool {
        match self.rvalue() {
            Value::Str(s) => s.is_slice(),
            Value::Array(a) => a.is_slice(),
            _ => false,
        }
    }

    /// Identity of the backing storage, for debugging/`intptr` parity
    /// checks (`intptr(a) == intptr(a[:])` until a divergent mutation).
    pub fn intptr(&self) -> Option<usize> {
        match self.rvalue() {
            Value::Str(s) => Some(s.intptr()),
            Value::Array(a) => Some(a.intptr()),
            Value::Dict(d) => Some(d.intptr()),
            Value::Function(f) => Some(f.intptr()),
            Value::Exception(e) => Some(e.intptr()),
            _ => None,
        }
    }

    /// `clone()`: a deep-ish copy matching each type's own notion of
    /// duplication (strings are immutable so cloning is a no-op; arrays and
    /// non-empty dicts/functions allocate a fresh backing; `none`/numbers
    /// copy trivially).
    pub fn deep_clone(&self) -> Value {
        match self.rvalue() {
            Value::Array(a) => Value::Array(Array::from_values(a.values())),
            Value::Dict(d) => Value::Dict(d.deep_clone()),
            Value::Function(f) => Value::Function(f.deep_clone()),
            other => other,
        }
    }

    pub fn dict_key(&self) -> Option<DictKey> {
        DictKey::from_value(&self.rvalue())
    }

    fn as_int(&self) -> Option<i64> {
        match self.rvalue() {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self.rvalue() {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn add(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => match rhs.as_int() {
                Some(b) => Ok(Value::Int(a.wrapping_add(b))),
                None => type_error!(span),
            },
            Value::Float(a) => {
                let b = rhs.as_float().or_else(|| rhs.as_int().map(|i| i as f64));
                match b {
                    Some(b) => Ok(Value::Float(a + b)),
                    None => type_error!(span),
                }
            }
            Value::Str(a) => {
                let mut a = a;
                match rhs.rvalue() {
                    Value::Str(b) => a.append(b.as_str()),
                    other => a.append(&other.to_string_value()),
                }
                Ok(Value::Str(a))
            }
            Value::Array(a) => match rhs.rvalue() {
                Value::Array(b) => Ok(Value::Array(a.concat(&b))),
                _ => type_error!(span),
            },
            _ => type_error!(span),
        }
    }

    pub fn sub(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => match rhs.as_int() {
                Some(b) => Ok(Value::Int(a.wrapping_sub(b))),
                None => type_error!(span),
            },
            Value::Float(a) => {
                let b = rhs.as_float().or_else(|| rhs.as_int().map(|i| i as f64));
                match b {
                    Some(b) => Ok(Value::Float(a - b)),
                    None => type_error!(span),
                }
            }
            _ => type_error!(span),
        }
    }

    pub fn mul(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => match rhs.as_int() {
                Some(b) => Ok(Value::Int(a.wrapping_mul(b))),
                None => type_error!(span),
            },
            Value::Float(a) => {
                let b = rhs.as_float().or_else(|| rhs.as_int().map(|i| i as f64));
                match b {
                    Some(b) => Ok(Value::Float(a * b)),
                    None => type_error!(span),
                }
            }
            Value::Str(a) => match rhs.as_int() {
                Some(n) => Ok(Value::Str(a.repeat(n))),
                None => type_error!(span),
            },
            _ => type_error!(span),
        }
    }

    pub fn div(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => match rhs.as_int() {
                Some(0) => Err(EvalError::division_by_zero(span)),
                Some(b) => Ok(Value::Int(a.wrapping_div(b))),
                None => type_error!(span),
            },
            Value::Float(a) => {
                let b = rhs.as_float().or_else(|| rhs.as_int().map(|i| i as f64));
                match b {
                    Some(b) => Ok(Value::Float(a / b)),
                    None => type_error!(span),
                }
            }
            _ => type_error!(span),
        }
    }

    pub fn modulo(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => match rhs.as_int() {
                Some(0) => Err(EvalError::division_by_zero(span)),
                Some(b) => Ok(Value::Int(a.wrapping_rem(b))),
                None => type_error!(span),
            },
            _ => type_error!(span),
        }
    }

    pub fn neg(&self, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Int(a) => Ok(Value::Int(-a)),
            Value::Float(a) => Ok(Value::Float(-a)),
            _ => type_error!(span),
        }
    }

    pub fn not(&self) -> Value {
        Value::bool(!self.is_true())
    }

    pub fn eq_value(&self, rhs: &Value) -> Value {
        Value::bool(self.equals(rhs))
    }

    pub fn noteq_value(&self, rhs: &Value) -> Value {
        Value::bool(!self.equals(rhs))
    }

    /// `==` semantics: `none` equals only `none`; dissimilar types compare
    /// unequal rather than erroring (matching every type's `eq` override in
    /// the original, none of which throw on a type mismatch).
    fn equals(&self, rhs: &Value) -> bool {
        match (self.rvalue(), rhs.rvalue()) {
            (Value::None, Value::None) => true,
            (Value::None, _) | (_, Value::None) => false,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (a as f64) == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => a == b,
            _ => false,
        }
    }

    pub fn lt(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        self.compare(rhs, span, |o| o == std::cmp::Ordering::Less)
    }

    pub fn gt(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        self.compare(rhs, span, |o| o == std::cmp::Ordering::Greater)
    }

    pub fn le(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        self.compare(rhs, span, |o| o != std::cmp::Ordering::Greater)
    }

    pub fn ge(&self, rhs: &Value, span: Span) -> Result<Value, EvalError> {
        self.compare(rhs, span, |o| o != std::cmp::Ordering::Less)
    }

    fn compare(
        &self,
        rhs: &Value,
        span: Span,
        accept: impl Fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, EvalError> {
        match (self.rvalue(), rhs.rvalue()) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::bool(accept(a.cmp(&b)))),
            (Value::Float(a), Value::Float(b)) => match a.partial_cmp(&b) {
                Some(o) => Ok(Value::bool(accept(o))),
                None => Ok(Value::bool(false)),
            },
            (Value::Int(a), Value::Float(b)) => match (a as f64).partial_cmp(&b) {
                Some(o) => Ok(Value::bool(accept(o))),
                None => Ok(Value::bool(false)),
            },
            (Value::Str(a), Value::Str(b)) => Ok(Value::bool(accept(a.cmp(&b)))),
            _ => type_error!(span),
        }
    }

    /// `subscript`: always returns a fresh `LValue` wrapping a snapshot of
    /// the element's current value plus a container back-link, so that an
    /// assignment through it can drive the container's own mutation
    /// protocol (see [`crate::eval::assign`]). Reading it just derefs the
    /// snapshot.
    pub fn subscript(&self, index: &Value, span: Span) -> Result<Value, EvalError> {
        match self.rvalue() {
            Value::Array(a) => {
                let idx = index.as_int().ok_or_else(|| EvalError::type_error(span))?;
                let len = a.len() as i64;
                let real = if idx < 0 { idx + len } else { idx };
                if real < 0 || real >= len {
                    return Err(EvalError::out_of_bounds(span));
                }
                let cell = a.cell_at(real as usize).unwrap();
                let current = cell.borrow().value.clone();
                Ok(Value::LValue(lvalue::new_lvalue_with_container(
                    current,
                    false,
                    lvalue::ContainerBackLink::Array {
                        array: a,
                        index: real as usize,
                    },
                )))
            }
            Value::Str(s) => {
                let idx = index.as_int().ok_or_else(|| EvalError::type_error(span))?;
                match s.subscript(idx) {
                    Some(sliced) => Ok(Value::Str(sliced)),
                    None => Err(EvalError::out_of_bounds(span)),
                }
            }
            Value::Dict(d) => {
                let key = index
                    .dict_key()
                    .ok_or_else(|| EvalError::type_error(span))?;
                let cell = d.subscript_or_insert(key.clone());
                let current = cell.borrow().value.clone();
                Ok(Value::LValue(lvalue::new_lvalue_with_container(
                    current,
                    false,
                    lvalue::ContainerBackLink::Dict { dict: d, key },
                )))
            }
            _ => type_error!(span),
        }
    }

    pub fn slice(&self, start: Option<&Value>, end: Option<&Value>, span: Span) -> Result<Value, EvalError> {
        let start = start.map(|v| v.as_int()).transpose();
        let end = end.map(|v| v.as_int()).transpose();
        let (start, end) = match (start, end) {
            (Ok(s), Ok(e)) => (s, e),
            _ => return type_error!(span),
        };
        match self.rvalue() {
            Value::Str(s) => Ok(Value::Str(s.slice(start.flatten(), end.flatten()))),
            Value::Array(a) => {
                let len = a.len() as i64;
                let mut start = start.flatten().unwrap_or(0);
                if start < 0 {
                    start += len;
                    if start < 0 {
                        start = 0;
                    }
                }
                if start >= len {
                    return Ok(Value::Array(Array::empty()));
                }
                let mut end = end.flatten().unwrap_or(len);
                if end < 0 {
                    end += len;
                }
                if end <= start {
                    return Ok(Value::Array(Array::empty()));
                }
                if end > len {
                    end = len;
                }
                Ok(Value::Array(a.slice_view(start as usize, (end - start) as usize)))
            }
            _ => type_error!(span),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}
