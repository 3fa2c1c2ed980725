//! Parser error types.

use crate::lexer::Span;

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// What the parser expected (if applicable).
    pub expected: Option<String>,
    /// The offending source text.
    pub found: Option<String>,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        let found: String = found.into();
        Self {
            message: format!("unexpected '{found}': expected {expected}"),
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            message: format!("unexpected end of input: expected {expected}"),
            span,
            expected: Some(expected),
            found: None,
        }
    }

    /// Records the offending source text.
    #[must_use]
    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}
