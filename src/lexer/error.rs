use std::error::Error;
use std::fmt::{self, Display};

use crate::error::SourceError;
use crate::location::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub text: String,
    pub span: Span,
}

impl LexError {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;

impl Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid token '{}' at {}", self.text, self.span)
    }
}

impl Error for LexError {}

impl SourceError for LexError {
    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}
