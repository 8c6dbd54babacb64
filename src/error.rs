//! A shared trait implemented by every error type the core produces, so a
//! driver can ask any of them for an optional source location without
//! knowing which phase raised it. Each phase still keeps its own error enum
//! with a hand-written `Display`, the way the lexer/typechecker modules in
//! this codebase have always done it; this trait just gives them a common
//! seam.

use crate::location::Span;

pub trait SourceError: std::error::Error {
    /// The span of source text this error is about, if the layer that
    /// raised it knew one. Enclosing layers may fill this in later; they
    /// must never overwrite a span that's already set (see lexer::LexError,
    /// parser::ParseError, eval::EvalError for the three concrete cases).
    fn span(&self) -> Option<Span>;
}
