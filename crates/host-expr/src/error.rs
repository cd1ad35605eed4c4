//! Errors raised while parsing or evaluating host expressions.

use std::fmt;

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Host source that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("SyntaxError: {message} (at offset {offset})")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the parsed text.
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// A failure while evaluating a parsed expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(
            EvalErrorKind::NameError,
            format!("name '{}' is not defined", name),
        )
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::ValueError, message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::ZeroDivision, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::IndexError, message)
    }

    pub fn key_error(key: impl fmt::Display) -> Self {
        Self::new(EvalErrorKind::KeyError, key.to_string())
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::AttributeError, message)
    }

    pub fn overflow(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::Overflow, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvalErrorKind {
    NameError,
    TypeError,
    ValueError,
    ZeroDivision,
    IndexError,
    KeyError,
    AttributeError,
    Overflow,
}

impl EvalErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalErrorKind::NameError => "NameError",
            EvalErrorKind::TypeError => "TypeError",
            EvalErrorKind::ValueError => "ValueError",
            EvalErrorKind::ZeroDivision => "ZeroDivisionError",
            EvalErrorKind::IndexError => "IndexError",
            EvalErrorKind::KeyError => "KeyError",
            EvalErrorKind::AttributeError => "AttributeError",
            EvalErrorKind::Overflow => "OverflowError",
        }
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
