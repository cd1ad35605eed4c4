//! Error types for lowering templates.

use host_expr::SyntaxError;
use source_map::Span;
use std::fmt;

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// A template that parsed but cannot be turned into an evaluable expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CompileError {
    /// The error message.
    pub message: String,
    /// The template span the error points at.
    pub span: Span,
    /// The error code.
    pub code: CompileErrorCode,
}

impl CompileError {
    /// Create a new compile error.
    pub fn new(message: impl Into<String>, span: Span, code: CompileErrorCode) -> Self {
        Self {
            message: message.into(),
            span,
            code,
        }
    }

    /// No provider of the tag resolver accepted `tag`.
    pub fn unknown_tag(tag: &str, span: Span) -> Self {
        Self::new(
            format!("no resolver for tag: {}", tag),
            span,
            CompileErrorCode::UnknownTag,
        )
    }

    /// An embedded expression the host parser rejected. `span` is the
    /// template position the host error maps back to.
    pub fn invalid_expression(error: &SyntaxError, span: Span) -> Self {
        Self::new(
            format!("Invalid expression: {}", error.message),
            span,
            CompileErrorCode::InvalidExpression,
        )
    }

    /// Two arguments of one constructor call ended up with the same name.
    pub fn duplicate_argument(tag: &str, name: &str, span: Span) -> Self {
        Self::new(
            format!("<{}> got multiple values for argument '{}'", tag, name),
            span,
            CompileErrorCode::DuplicateArgument,
        )
    }

    pub fn malformed_node(what: &str, span: Span) -> Self {
        Self::new(
            format!("Malformed node: {}", what),
            span,
            CompileErrorCode::MalformedNode,
        )
    }
}

/// Error codes for lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileErrorCode {
    /// Tag resolution failed.
    UnknownTag,
    /// Host expression syntax error.
    InvalidExpression,
    /// Repeated keyword argument.
    DuplicateArgument,
    /// Abstract tree with an impossible shape.
    MalformedNode,
}

impl CompileErrorCode {
    /// Get the error code as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTag => "unknown-tag",
            Self::InvalidExpression => "invalid-expression",
            Self::DuplicateArgument => "duplicate-argument",
            Self::MalformedNode => "malformed-node",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
