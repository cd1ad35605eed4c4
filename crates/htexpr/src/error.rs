//! The error type returned by [`compile`](crate::compile).

use htexpr_compiler::CompileError;
use htexpr_parser::ParseError;
use miette::{Diagnostic, LabeledSpan, Report};
use source_map::{LineCol, LineIndex, Span};
use std::fmt;

/// A template that could not be compiled.
///
/// Evaluation errors are not wrapped; they are returned as
/// [`host_expr::EvalError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed template syntax.
    #[error("{error} at line {}, column {}", .location.line + 1, .location.col + 1)]
    Parse { error: ParseError, location: LineCol },
    /// A tag that cannot be resolved, an invalid embedded expression, or a
    /// malformed tree.
    #[error("{error} at line {}, column {}", .location.line + 1, .location.col + 1)]
    Compile {
        error: CompileError,
        location: LineCol,
    },
}

impl Error {
    pub fn parse(error: ParseError, template: &str) -> Self {
        let location = LineIndex::new(template).line_col(error.span.start);
        Error::Parse { error, location }
    }

    pub fn compile(error: CompileError, template: &str) -> Self {
        let location = LineIndex::new(template).line_col(error.span.start);
        Error::Compile { error, location }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Parse { error, .. } => &error.message,
            Error::Compile { error, .. } => &error.message,
        }
    }

    /// The template span the error points at.
    pub fn span(&self) -> Span {
        match self {
            Error::Parse { error, .. } => error.span,
            Error::Compile { error, .. } => error.span,
        }
    }

    pub fn location(&self) -> LineCol {
        match self {
            Error::Parse { location, .. } | Error::Compile { location, .. } => *location,
        }
    }

    /// Kebab-case error code, e.g. `mismatched-tag` or `unknown-tag`.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Parse { error, .. } => error.code.as_str(),
            Error::Compile { error, .. } => error.code.as_str(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }

    /// A renderable report with the offending span of `template` labelled.
    pub fn report(&self, template: &str) -> Report {
        Report::new(self.clone()).with_source_code(template.to_string())
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("htexpr::{}", Error::code(self))))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = match self {
            Error::Parse { .. } => "here",
            Error::Compile { .. } => "in this template fragment",
        };
        Some(Box::new(std::iter::once(LabeledSpan::at(
            self.span().to_range(),
            label,
        ))))
    }
}
