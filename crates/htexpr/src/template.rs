//! Compiled templates.

use host_expr::{evaluate, evaluate_layered, Bindings, EvalResult, Expr, Value};
use std::fmt;

/// A template lowered to one host expression.
///
/// Immutable and `Send + Sync`: it can be evaluated any number of times,
/// from any thread, against different bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    expr: Expr,
}

impl CompiledTemplate {
    pub(crate) fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Build the component tree. Names the template uses must be bound in
    /// `bindings` (or be builtins); a missing one is a `NameError`.
    pub fn evaluate(&self, bindings: &Bindings) -> EvalResult<Value> {
        evaluate(&self.expr, bindings)
    }

    /// Like [`evaluate`](Self::evaluate), looking names up in `explicit`
    /// first and then in `ambient`.
    pub fn evaluate_layered(&self, ambient: &Bindings, explicit: &Bindings) -> EvalResult<Value> {
        evaluate_layered(&self.expr, &[explicit, ambient])
    }

    /// The generated expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The generated expression as host source.
    pub fn source(&self) -> String {
        self.expr.to_string()
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.expr.fmt(f)
    }
}
