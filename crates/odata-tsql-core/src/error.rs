//! Error types for the compilation pipeline.

use thiserror::Error;

use crate::parser::ParseError;

/// Errors raised while compiling a query or rendering a statement.
///
/// None of these are transient: they describe malformed input or a
/// request the compiler refuses to honour, and are returned to the caller
/// as soon as they are detected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Malformed filter or query-option syntax.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A type the code generator cannot map (enum width, cast target, value type).
    #[error("unsupported type '{type_name}': {reason}")]
    UnsupportedType {
        /// The offending type name.
        type_name: String,
        /// Why the type was rejected.
        reason: String,
    },

    /// A statement shape the compiler refuses to emit.
    #[error("policy violation: {0}")]
    Policy(String),

    /// A construct with no SQL rendering, such as a scalar function with no
    /// built-in mapping and no user-defined fallback.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A hand-built expression tree that breaks a model invariant.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Result sets handed back by the execution boundary do not have the expected shape.
    #[error("invalid result set: {0}")]
    InvalidResult(String),

    /// The optimistic-concurrency check of a generated MERGE failed.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

impl CompileError {
    /// Creates an [`CompileError::UnsupportedType`] error.
    #[must_use]
    pub fn unsupported_type(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for the failure raised by a generated concurrency check.
    #[must_use]
    pub const fn is_concurrency_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    #[test]
    fn test_parse_error_converts() {
        let err: CompileError = ParseError::new("unbalanced parenthesis", Span::new(3, 4)).into();
        assert!(matches!(err, CompileError::Parse(_)));
        assert!(err.to_string().contains("unbalanced parenthesis"));
    }

    #[test]
    fn test_unsupported_type_message_names_type() {
        let err = CompileError::unsupported_type("Edm.Geography", "no SQL mapping");
        assert_eq!(
            err.to_string(),
            "unsupported type 'Edm.Geography': no SQL mapping"
        );
    }

    #[test]
    fn test_concurrency_conflict_is_recognizable() {
        let err = CompileError::ConcurrencyConflict(String::from("row changed"));
        assert!(err.is_concurrency_conflict());
        assert!(!CompileError::Policy(String::from("x")).is_concurrency_conflict());
    }
}
