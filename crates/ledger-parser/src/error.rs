//! Parse error type.

use thiserror::Error;

use crate::span::SourceSpan;

/// A single parse failure, tied to the line it was raised on.
///
/// The parser recovers at the next top-level line after emitting one of
/// these, so a malformed directive doesn't prevent the rest of the file from
/// being parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{span}: {message}")]
pub struct ParseError {
    /// Where the error occurred.
    pub span: SourceSpan,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    /// Construct a parse error.
    #[must_use]
    pub fn new(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}
