//! Merging an element's children into one list expression.

use crate::ir::{FragmentKind, IrFragment};
use host_expr::{BinOp, Expr};

/// Merge `fragments` into a single list fragment, preserving order.
///
/// Consecutive fragments of the same kind form a run. A run of scalars
/// becomes one list literal; a run of lists is concatenated left to right
/// (a single list is used as is). The runs are then concatenated left to
/// right. No fragments give an empty list literal.
pub fn flatten(fragments: Vec<IrFragment>) -> IrFragment {
    let mut runs = Vec::new();
    let mut fragments = fragments.into_iter().peekable();
    while let Some(first) = fragments.next() {
        let kind = first.kind;
        let mut run = vec![first.node];
        while let Some(next) = fragments.next_if(|f| f.kind == kind) {
            run.push(next.node);
        }
        runs.push(match kind {
            FragmentKind::Scalar => Expr::List(run),
            FragmentKind::List => concat(run),
        });
    }
    if runs.is_empty() {
        return IrFragment::list(Expr::List(Vec::new()));
    }
    IrFragment::list(concat(runs))
}

/// `a + b + c`, grouped to the left. `exprs` is never empty.
fn concat(exprs: Vec<Expr>) -> Expr {
    exprs
        .into_iter()
        .reduce(|left, right| Expr::binary(BinOp::Add, left, right))
        .unwrap_or_else(|| Expr::List(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use host_expr::{evaluate, Bindings, Constant, Value};
    use insta::assert_snapshot;

    fn scalar(name: &str) -> IrFragment {
        IrFragment::scalar(Expr::name(name))
    }

    fn list(name: &str) -> IrFragment {
        IrFragment::list(Expr::name(name))
    }

    fn int(i: i64) -> IrFragment {
        IrFragment::scalar(Expr::Constant(Constant::Int(i)))
    }

    fn render(fragments: Vec<IrFragment>) -> String {
        let flat = flatten(fragments);
        assert!(flat.is_list());
        flat.to_string()
    }

    #[test]
    fn test_flatten_empty() {
        assert_snapshot!(render(vec![]), @"[]");
    }

    #[test]
    fn test_flatten_scalars() {
        assert_snapshot!(render(vec![int(1)]), @"[1]");
        assert_snapshot!(render(vec![int(1), int(2)]), @"[1, 2]");
    }

    #[test]
    fn test_flatten_lists() {
        assert_snapshot!(render(vec![list("expr")]), @"expr");
        assert_snapshot!(render(vec![list("expr1"), list("expr2")]), @"(expr1 + expr2)");
        assert_snapshot!(
            render(vec![list("expr1"), list("expr2"), list("expr3")]),
            @"((expr1 + expr2) + expr3)"
        );
    }

    #[test]
    fn test_flatten_mixed_runs() {
        assert_snapshot!(render(vec![scalar("v"), list("expr")]), @"([v] + expr)");
        assert_snapshot!(render(vec![list("expr"), scalar("v")]), @"(expr + [v])");
        assert_snapshot!(
            render(vec![scalar("v"), list("expr1"), list("expr2")]),
            @"([v] + (expr1 + expr2))"
        );
        assert_snapshot!(
            render(vec![list("expr1"), scalar("v"), list("expr2")]),
            @"((expr1 + [v]) + expr2)"
        );
        assert_snapshot!(
            render(vec![list("expr1"), list("expr2"), scalar("v")]),
            @"((expr1 + expr2) + [v])"
        );
    }

    #[test]
    fn test_flatten_evaluates_in_order() {
        let flat = flatten(vec![scalar("a"), list("b"), list("c"), scalar("d")]);
        assert_snapshot!(flat.to_string(), @"(([a] + (b + c)) + [d])");
        let bindings = Bindings::new()
            .with("a", 1i64)
            .with("b", Value::List(vec![Value::Int(2), Value::Int(3)]))
            .with("c", Value::List(vec![]))
            .with("d", 4i64);
        let value = evaluate(&flat.node, &bindings).unwrap();
        assert_eq!(value.to_string(), "[1, 2, 3, 4]");
    }
}
