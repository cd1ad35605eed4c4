//! Typed IR fragments.

use host_expr::Expr;
use serde::Serialize;
use std::fmt;

/// How many child values a fragment evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// Exactly one value.
    Scalar,
    /// A list of zero or more values.
    List,
}

/// A host expression tagged with the kind of value it produces.
///
/// The kind is fixed by template syntax: `{...}`, literals and elements are
/// scalar, `[...]` is a list.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFragment {
    pub kind: FragmentKind,
    pub node: Expr,
}

impl IrFragment {
    pub fn scalar(node: Expr) -> Self {
        Self {
            kind: FragmentKind::Scalar,
            node,
        }
    }

    pub fn list(node: Expr) -> Self {
        Self {
            kind: FragmentKind::List,
            node,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind == FragmentKind::List
    }

    pub fn into_expr(self) -> Expr {
        self.node
    }
}

impl fmt::Display for IrFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node.fmt(f)
    }
}
