//! Error types for template parsing.

use source_map::Span;
use std::fmt;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Malformed template syntax. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// Where in the template the problem was found.
    pub span: Span,
    /// The error code.
    pub code: ErrorCode,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// Create an unexpected token error.
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::new(
            format!("Expected {}, found {}", expected, found),
            span,
            ErrorCode::UnexpectedToken,
        )
    }

    /// Create an unclosed tag error.
    pub fn unclosed_tag(tag: &str, span: Span) -> Self {
        Self::new(
            format!("Unclosed tag: <{}>", tag),
            span,
            ErrorCode::UnclosedTag,
        )
    }

    /// `<open>` closed by `</close>`.
    pub fn mismatched_tag(open: &str, close: &str, span: Span) -> Self {
        Self::new(
            format!("<{}> closed by </{}>", open, close),
            span,
            ErrorCode::MismatchedTag,
        )
    }

    pub fn unterminated_string(span: Span) -> Self {
        Self::new(
            "Unterminated string literal",
            span,
            ErrorCode::UnterminatedString,
        )
    }

    /// An opening `(`, `{` or `[` that never finds its partner.
    pub fn unclosed_delimiter(open: char, span: Span) -> Self {
        Self::new(
            format!("Unclosed '{}'", open),
            span,
            ErrorCode::UnclosedDelimiter,
        )
    }

    pub fn trailing_content(span: Span) -> Self {
        Self::new(
            "Unexpected content after the root element",
            span,
            ErrorCode::TrailingContent,
        )
    }
}

/// Error codes for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unexpected token encountered.
    UnexpectedToken,
    /// Element never closed.
    UnclosedTag,
    /// Closing tag name differs from the opening one.
    MismatchedTag,
    /// Quote without its closing partner.
    UnterminatedString,
    /// Bracket without its closing partner.
    UnclosedDelimiter,
    /// Text after the root element.
    TrailingContent,
}

impl ErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedToken => "unexpected-token",
            ErrorCode::UnclosedTag => "unclosed-tag",
            ErrorCode::MismatchedTag => "mismatched-tag",
            ErrorCode::UnterminatedString => "unterminated-string",
            ErrorCode::UnclosedDelimiter => "unclosed-delimiter",
            ErrorCode::TrailingContent => "trailing-content",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
