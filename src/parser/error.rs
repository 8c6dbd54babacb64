use std::error::Error;
use std::fmt::{self, Display};

use crate::error::SourceError;
use crate::lexer::token::{Op, Token};
use crate::location::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub found: Option<Token>,
    pub expected_op: Option<Op>,
}

pub type ParseResult<T> = Result<T, ParseError>;

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            found: None,
            expected_op: None,
        }
    }

    pub fn expected_token(message: impl Into<String>, span: Span, found: Token) -> Self {
        Self {
            message: message.into(),
            span,
            found: Some(found),
            expected_op: None,
        }
    }

    pub fn expected_op(op: Op, span: Span, found: Token) -> Self {
        Self {
            message: format!("expected '{}'", op.lexeme()),
            span,
            found: Some(found),
            expected_op: Some(op),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}: {}", self.span.start, self.message)?;
        if let Some(found) = &self.found {
            write!(f, " (found {:?})", found.kind)?;
        }
        Ok(())
    }
}

impl Error for ParseError {}

impl SourceError for ParseError {
    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}
