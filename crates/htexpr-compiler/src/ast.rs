//! Abstract template tree.
//!
//! The simplifier reduces the concrete parse tree to these types: elements
//! with their attributes and content, literal text, and embedded
//! expressions split into source segments around any nested elements.

use serde::Serialize;
use smol_str::SmolStr;
use source_map::Span;

/// An element of the template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbstractElement {
    /// The tag name as written.
    pub tag: SmolStr,
    /// Attributes in source order.
    pub attrs: Vec<Attribute>,
    /// `None` for a self-closing element, otherwise the (possibly empty)
    /// content between the tags.
    pub content: Option<Vec<ContentItem>>,
    /// Span of the whole element.
    pub span: Span,
}

impl AbstractElement {
    pub fn new(tag: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            content: None,
            span,
        }
    }

    pub fn is_self_closing(&self) -> bool {
        self.content.is_none()
    }

    /// Content items, empty for self-closing elements.
    pub fn children(&self) -> &[ContentItem] {
        self.content.as_deref().unwrap_or(&[])
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }
}

/// `name=value` on an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: AttrValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// A quoted string, without its quotes.
    Literal(String),
    /// `{expr}`, or a `{key: value}` dict shorthand spanning its braces.
    Expr(ExprSource),
    /// `[expr]`, evaluated as a list.
    ExprList(ExprSource),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContentItem {
    Element(AbstractElement),
    Literal(String),
    /// `{expr}`: exactly one child.
    Expr(ExprSource),
    /// `[expr]`: zero or more children.
    ExprList(ExprSource),
}

/// The source of an embedded expression, split around nested elements.
///
/// Concatenating the segment texts gives back the template text under
/// `span`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExprSource {
    pub span: Span,
    pub segments: Vec<Segment>,
}

impl ExprSource {
    /// The raw expression text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Elements nested inside the expression, left to right.
    pub fn nested(&self) -> impl Iterator<Item = &AbstractElement> {
        self.segments.iter().filter_map(|s| s.element.as_deref())
    }
}

/// A run of expression source. When `element` is set the run is a
/// `( element )` occurrence, parentheses included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub text: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<AbstractElement>>,
}

impl Segment {
    pub fn raw(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
            element: None,
        }
    }

    pub fn nested(text: impl Into<String>, span: Span, element: AbstractElement) -> Self {
        Self {
            text: text.into(),
            span,
            element: Some(Box::new(element)),
        }
    }
}
