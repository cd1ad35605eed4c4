//! Template grammar for htexpr.
//!
//! This crate turns template text into a [`ConcreteNode`] tree that records
//! which grammar rule produced every span. Embedded host expressions are not
//! interpreted here; only their extent is found, along with any elements
//! nested inside them.

pub mod cst;
pub mod cursor;
pub mod error;
pub mod parser;

pub use cst::{ConcreteNode, Rule};
pub use error::{ErrorCode, ParseError, ParseResult};
pub use parser::parse_template;

/// Parse a template and return its concrete parse tree.
pub fn parse(source: &str) -> ParseResult<ConcreteNode> {
    parse_template(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_template() {
        let source = "<div id=\"main\">\n  Hello {name}\n</div>";
        let doc = parse(source).unwrap();
        let div = &doc.children[0];
        assert_eq!(div.rule, Rule::Normal);
        assert_eq!(div.find(Rule::TagName).unwrap().text(source), "div");
        assert_eq!(div.find(Rule::QuotedLiteral).unwrap().text(source), "\"main\"");
        assert_eq!(div.find(Rule::Expr).unwrap().text(source), "name");
    }

    #[test]
    fn test_parse_error_has_span() {
        let err = parse("<div>").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnclosedTag);
        assert_eq!(err.span, source_map::Span::new(0, 5));
    }
}
