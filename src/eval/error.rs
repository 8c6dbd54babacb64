//! Evaluator errors: the runtime half of the error taxonomy in spec.md §7.
//! Parse-time errors live in [`crate::parser::ParseError`]; lexer errors in
//! [`crate::lexer::LexError`]. All three implement [`crate::error::SourceError`]
//! so a driver can ask any of them for a location uniformly.

use std::error::Error;
use std::fmt::{self, Display};

use crate::error::SourceError;
use crate::location::Span;
use crate::value::exception::ExceptionObject;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalErrorKind {
    UndefinedVariable { name: String, in_pure_function: bool },
    TypeError,
    DivisionByZero,
    OutOfBounds,
    NotAnLValue,
    NotCallable,
    AlreadyDefined { name: String },
    CannotRebindConstOrBuiltin { name: String },
    CannotChangeConst,
    InvalidArgument { message: String },
    AssertionFailure { message: Option<String> },
    /// Reserved for the ownership pitfall spec.md §7 calls out ("Cannot
    /// bind pure-function to const"); see DESIGN.md for why this crate's
    /// `Rc`-based function ownership makes the scenario unreachable while
    /// the variant is kept for taxonomy completeness.
    CannotBindPureFunctionToConst,
    /// Raised by `throw`; carries the exception object so `try`/`catch` can
    /// match it by name and `rethrow` can re-raise it unchanged.
    User(ExceptionObject),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    pub fn type_error(span: Span) -> Self {
        Self::new(EvalErrorKind::TypeError, span)
    }

    pub fn division_by_zero(span: Span) -> Self {
        Self::new(EvalErrorKind::DivisionByZero, span)
    }

    pub fn out_of_bounds(span: Span) -> Self {
        Self::new(EvalErrorKind::OutOfBounds, span)
    }

    pub fn not_an_lvalue(span: Span) -> Self {
        Self::new(EvalErrorKind::NotAnLValue, span)
    }

    pub fn not_callable(span: Span) -> Self {
        Self::new(EvalErrorKind::NotCallable, span)
    }

    pub fn already_defined(name: impl Into<String>, span: Span) -> Self {
        Self::new(EvalErrorKind::AlreadyDefined { name: name.into() }, span)
    }

    pub fn cannot_rebind(name: impl Into<String>, span: Span) -> Self {
        Self::new(
            EvalErrorKind::CannotRebindConstOrBuiltin { name: name.into() },
            span,
        )
    }

    pub fn cannot_change_const(span: Span) -> Self {
        Self::new(EvalErrorKind::CannotChangeConst, span)
    }

    pub fn invalid_argument(message: impl Into<String>, span: Span) -> Self {
        Self::new(
            EvalErrorKind::InvalidArgument {
                message: message.into(),
            },
            span,
        )
    }

    pub fn assertion_failure(message: Option<String>, span: Span) -> Self {
        Self::new(EvalErrorKind::AssertionFailure { message }, span)
    }

    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        Self::new(
            EvalErrorKind::UndefinedVariable {
                name: name.into(),
                in_pure_function: false,
            },
            span,
        )
    }

    /// Flags an already-constructed undefined-variable error as having
    /// occurred inside a pure function's body, per spec.md §4.3.
    pub fn mark_in_pure_function(mut self) -> Self {
        if let EvalErrorKind::UndefinedVariable {
            in_pure_function, ..
        } = &mut self.kind
        {
            *in_pure_function = true;
        }
        self
    }

    pub fn user(exc: ExceptionObject, span: Span) -> Self {
        Self::new(EvalErrorKind::User(exc), span)
    }

    /// The name a `catch (Name1, Name2)` clause matches against. User
    /// exceptions use their own name; every internal error kind gets a
    /// canonical name derived from its taxonomy entry (spec.md §7), so a
    /// `catch { ... }`-anything clause or a `catch (TypeError)` clause can
    /// catch a runtime error exactly like a `throw`n one.
    pub fn exception_name(&self) -> String {
        match &self.kind {
            EvalErrorKind::UndefinedVariable { .. } => "UndefinedVariable".to_string(),
            EvalErrorKind::TypeError => "TypeError".to_string(),
            EvalErrorKind::DivisionByZero => "DivisionByZero".to_string(),
            EvalErrorKind::OutOfBounds => "OutOfBounds".to_string(),
            EvalErrorKind::NotAnLValue => "NotAnLValue".to_string(),
            EvalErrorKind::NotCallable => "NotCallable".to_string(),
            EvalErrorKind::AlreadyDefined { .. } => "AlreadyDefined".to_string(),
            EvalErrorKind::CannotRebindConstOrBuiltin { .. } => {
                "CannotRebindConstOrBuiltin".to_string()
            }
            EvalErrorKind::CannotChangeConst => "CannotChangeConst".to_string(),
            EvalErrorKind::InvalidArgument { .. } => "InvalidArgument".to_string(),
            EvalErrorKind::AssertionFailure { .. } => "AssertionFailure".to_string(),
            EvalErrorKind::CannotBindPureFunctionToConst => {
                "CannotBindPureFunctionToConst".to_string()
            }
            EvalErrorKind::User(exc) => exc.name().to_string(),
        }
    }

    /// The value a `catch (... as e)` binds `e` to. A user exception
    /// carries its own payload through unchanged; an internal error is
    /// wrapped in a synthetic exception object so every catchable failure
    /// looks the same from inside a catch body.
    pub fn to_exception_value(&self) -> crate::value::Value {
        match &self.kind {
            EvalErrorKind::User(exc) => crate::value::Value::Exception(exc.clone()),
            _ => crate::value::Value::Exception(ExceptionObject::new(
                self.exception_name(),
                crate::value::Value::Str(crate::value::string::SharedStr::new(self.to_string())),
            )),
        }
    }
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EvalErrorKind::UndefinedVariable {
                name,
                in_pure_function,
            } => {
                if *in_pure_function {
                    write!(f, "undefined variable '{name}' in pure function")
                } else {
                    write!(f, "undefined variable '{name}'")
                }
            }
            EvalErrorKind::TypeError => write!(f, "type error"),
            EvalErrorKind::DivisionByZero => write!(f, "division by zero"),
            EvalErrorKind::OutOfBounds => write!(f, "out of bounds"),
            EvalErrorKind::NotAnLValue => write!(f, "not an l-value"),
            EvalErrorKind::NotCallable => write!(f, "not callable"),
            EvalErrorKind::AlreadyDefined { name } => write!(f, "'{name}' already defined"),
            EvalErrorKind::CannotRebindConstOrBuiltin { name } => {
                write!(f, "cannot rebind const or builtin '{name}'")
            }
            EvalErrorKind::CannotChangeConst => write!(f, "cannot change const"),
            EvalErrorKind::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
            EvalErrorKind::AssertionFailure { message } => match message {
                Some(m) => write!(f, "assertion failure: {m}"),
                None => write!(f, "assertion failure"),
            },
            EvalErrorKind::CannotBindPureFunctionToConst => {
                write!(f, "cannot bind pure function to const")
            }
            EvalErrorKind::User(exc) => write!(f, "uncaught exception '{}'", exc.name()),
        }
    }
}

impl Error for EvalError {}

impl SourceError for EvalError {
    fn span(&self) -> Option<Span> {
        self.span
    }
}

/// Non-local control flow: `break`/`continue`/`return`/`throw` are
/// threaded as an explicit result of statement evaluation rather than as
/// panics or a `Result`-as-exceptions encoding (SPEC_FULL's binding design
/// choice). Ordinary fallible operations still use `Result<_, EvalError>`;
/// a `Signal::Throw` is produced only by `throw`/propagated `EvalError`s
/// that unwind through a `try`.
#[derive(Debug, Clone)]
pub enum Signal {
    Normal,
    Break,
    Continue,
    Return(crate::value::Value),
    Throw(EvalError),
}
