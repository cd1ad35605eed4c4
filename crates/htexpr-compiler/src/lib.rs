//! Template compiler for htexpr.
//!
//! Takes the concrete parse tree from `htexpr-parser` through three passes:
//!
//! 1. [`simplify`] builds the [`AbstractElement`] tree, splitting embedded
//!    expressions into segments around nested elements.
//! 2. [`lower`] resolves tags through a [`TagResolver`], renames attributes
//!    through an [`AttributeMapper`] and splices each expression into host
//!    source, producing typed [`IrFragment`]s.
//! 3. [`flatten`] merges an element's children into one list expression.

pub mod ast;
pub mod error;
pub mod flatten;
pub mod ir;
pub mod lower;
pub mod mappings;
pub mod resolve;
pub mod simplify;

pub use ast::{AbstractElement, AttrValue, Attribute, ContentItem, ExprSource, Segment};
pub use error::{CompileError, CompileErrorCode, CompileResult};
pub use flatten::flatten;
pub use ir::{FragmentKind, IrFragment};
pub use lower::{lower, Lowerer};
pub use mappings::DEFAULT_ATTRIBUTES;
pub use resolve::{AttributeMapper, Resolution, TagProvider, TagResolver, TagTable};
pub use simplify::{simplify, InterpositionIndex, Simplifier};

#[cfg(test)]
mod tests {
    use super::*;
    use host_expr::{evaluate, Bindings, Namespace, Value};

    #[test]
    fn test_dash_pipeline() {
        let source = r#"<div class="row"><Graph id="g"/></div>"#;
        let doc = htexpr_parser::parse(source).unwrap();
        let element = simplify(source, &doc).unwrap();
        let ir = lower(
            source,
            &element,
            &TagResolver::dash(),
            &AttributeMapper::dash(),
        )
        .unwrap();
        assert_eq!(
            ir.to_string(),
            "html.Div(children=[dcc.Graph(children=[], id='g')], className='row')"
        );

        let bindings = Bindings::new()
            .with("html", Namespace::with_constructors("html", ["Div"]))
            .with("dcc", Namespace::with_constructors("dcc", ["Graph"]));
        let value = evaluate(&ir.node, &bindings).unwrap();
        assert_eq!(
            value.to_string(),
            "html.Div(children=[dcc.Graph(children=[], id='g')], className='row')"
        );
        assert!(matches!(value, Value::Component(_)));
    }
}
