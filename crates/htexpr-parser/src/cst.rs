//! Concrete parse tree.

use source_map::Span;

/// The grammar rule a [`ConcreteNode`] was produced by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rule {
    /// `ws element ws`; one child, the root element.
    Document,
    /// `<tag attrs/>`; children are `TagName` then `Attribute`s.
    SelfClosing,
    /// `open content close`; children are `OpenTag`, `Content`, `CloseTag`.
    Normal,
    /// `<tag attrs>`; children are `TagName` then `Attribute`s.
    OpenTag,
    /// `</tag>`; one `TagName` child.
    CloseTag,
    TagName,
    /// `name = value`; children are `AttrName` and one value node.
    Attribute,
    AttrName,
    /// `"text"` or `'text'`, span includes the quotes.
    QuotedLiteral,
    /// `{key: value}`; children are the key `Expr` and value `Expr`, span
    /// includes the braces.
    DictShorthand,
    /// `{expr}` in attribute position.
    ExprValue,
    /// `[expr]` in attribute position.
    ExprListValue,
    /// Element body; children are content items.
    Content,
    /// `{expr}` in content position.
    ContentExpr,
    /// `[expr]` in content position.
    ContentExprList,
    /// Literal text between markup and expressions.
    Text,
    /// An embedded host expression; children are its lexical pieces.
    Expr,
    /// A quoted string inside an expression.
    StringLiteral,
    /// `( expr )` inside an expression.
    Parens,
    /// `{ expr }` inside an expression.
    Braces,
    /// `[ expr ]` inside an expression.
    Brackets,
    /// `( element )` inside an expression; one element child.
    NestedElement,
    /// Any other expression text, passed through untouched.
    Opaque,
}

impl Rule {
    /// Whether nodes of this rule are elements.
    pub fn is_element(self) -> bool {
        matches!(self, Rule::SelfClosing | Rule::Normal)
    }

    /// Whether nodes of this rule are bracket groups inside an expression.
    pub fn is_group(self) -> bool {
        matches!(self, Rule::Parens | Rule::Braces | Rule::Brackets)
    }
}

/// A node in the concrete parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcreteNode {
    pub rule: Rule,
    pub span: Span,
    pub children: Vec<ConcreteNode>,
}

impl ConcreteNode {
    pub fn leaf(rule: Rule, span: Span) -> Self {
        Self {
            rule,
            span,
            children: Vec::new(),
        }
    }

    pub fn with_children(rule: Rule, span: Span, children: Vec<ConcreteNode>) -> Self {
        Self {
            rule,
            span,
            children,
        }
    }

    /// The source text this node covers.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source)
    }

    /// First child produced by `rule`.
    pub fn child(&self, rule: Rule) -> Option<&ConcreteNode> {
        self.children.iter().find(|c| c.rule == rule)
    }

    /// Depth-first pre-order search for the first node produced by `rule`,
    /// including `self`.
    pub fn find(&self, rule: Rule) -> Option<&ConcreteNode> {
        if self.rule == rule {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(rule))
    }
}
