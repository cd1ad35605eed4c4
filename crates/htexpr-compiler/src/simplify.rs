//! Concrete parse tree to [`AbstractElement`].
//!
//! Elements nested inside embedded expressions are simplified first and
//! recorded in an [`InterpositionIndex`] keyed by their start offset; the
//! enclosing expression then takes them back out as [`Segment`]s. Because
//! inner expressions are finished before outer ones, every entry is taken
//! by the innermost expression that contains it.

use crate::ast::{AbstractElement, AttrValue, Attribute, ContentItem, ExprSource, Segment};
use htexpr_parser::{ConcreteNode, ErrorCode, ParseError, ParseResult, Rule};
use source_map::Span;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Simplify a parse of `source`. `node` may be the [`Rule::Document`] root
/// or an element node.
pub fn simplify(source: &str, node: &ConcreteNode) -> ParseResult<AbstractElement> {
    let mut simplifier = Simplifier::new(source);
    let element = match node.rule {
        Rule::Document => match node.children.first() {
            Some(root) => simplifier.element(root)?,
            None => return Err(malformed("document without an element", node.span)),
        },
        _ => simplifier.element(node)?,
    };
    Ok(element)
}

fn malformed(what: &str, span: Span) -> ParseError {
    ParseError::new(
        format!("Malformed parse tree: {}", what),
        span,
        ErrorCode::UnexpectedToken,
    )
}

/// A nested element and the `( element )` span it occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct Interposed {
    pub span: Span,
    pub element: AbstractElement,
}

/// Nested elements found inside expressions, ordered by start offset.
///
/// At most one entry begins at a given offset; the first one recorded there
/// is kept.
#[derive(Debug, Default)]
pub struct InterpositionIndex {
    entries: BTreeMap<u32, Interposed>,
}

impl InterpositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `element` as occupying `span`. Returns `false` if an entry
    /// already starts at `span.start`.
    pub fn record(&mut self, span: Span, element: AbstractElement) -> bool {
        match self.entries.entry(span.start) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Interposed { span, element });
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interposed> {
        self.entries.values()
    }

    /// Split the text of `span` into segments around the entries inside it,
    /// moving those entries out of the index.
    ///
    /// Raw runs between entries become segments without an element; each
    /// entry becomes a segment carrying its element. An entry starting inside
    /// one already emitted is skipped, as is one reaching past `span`. The
    /// segment texts concatenate to the text of `span`.
    pub fn take_interposed(&mut self, source: &str, span: Span) -> Vec<Segment> {
        let starts: Vec<u32> = self
            .entries
            .range(span.start..span.end)
            .map(|(&start, _)| start)
            .collect();

        let mut segments = Vec::new();
        let mut cursor = span.start;
        for start in starts {
            if start < cursor {
                continue;
            }
            let Some(entry) = self.entries.get(&start) else {
                continue;
            };
            if entry.span.end > span.end {
                continue;
            }
            let Some(entry) = self.entries.remove(&start) else {
                continue;
            };
            if cursor < start {
                let raw = Span::new(cursor, start);
                segments.push(Segment::raw(raw.slice(source), raw));
            }
            segments.push(Segment::nested(
                entry.span.slice(source),
                entry.span,
                entry.element,
            ));
            cursor = entry.span.end;
        }
        if cursor < span.end || segments.is_empty() {
            let raw = Span::new(cursor, span.end);
            segments.push(Segment::raw(raw.slice(source), raw));
        }
        segments
    }
}

/// Walks a concrete tree once, building the abstract tree.
pub struct Simplifier<'s> {
    source: &'s str,
    index: InterpositionIndex,
}

impl<'s> Simplifier<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            index: InterpositionIndex::new(),
        }
    }

    /// Entries not yet claimed by an enclosing expression.
    pub fn index(&self) -> &InterpositionIndex {
        &self.index
    }

    pub fn element(&mut self, node: &ConcreteNode) -> ParseResult<AbstractElement> {
        match node.rule {
            Rule::SelfClosing => {
                let (tag, attrs) = self.head(node)?;
                Ok(AbstractElement {
                    tag: tag.into(),
                    attrs,
                    content: None,
                    span: node.span,
                })
            }
            Rule::Normal => {
                let [open, content, close] = node.children.as_slice() else {
                    return Err(malformed(
                        "element without open tag, content and close tag",
                        node.span,
                    ));
                };
                let (tag, attrs) = self.head(open)?;
                let close_tag = self.tag_name(close)?;
                if tag != close_tag {
                    return Err(ParseError::mismatched_tag(tag, close_tag, close.span));
                }
                let mut items = self.content(content)?;
                strip_trailing_whitespace(&mut items);
                Ok(AbstractElement {
                    tag: tag.into(),
                    attrs,
                    content: Some(items),
                    span: node.span,
                })
            }
            other => Err(malformed(&format!("{:?} is not an element", other), node.span)),
        }
    }

    fn tag_name(&self, node: &ConcreteNode) -> ParseResult<&'s str> {
        node.child(Rule::TagName)
            .map(|name| name.text(self.source))
            .ok_or_else(|| malformed("tag without a name", node.span))
    }

    /// Tag name and attributes of an open tag or self-closing element.
    fn head(&mut self, node: &ConcreteNode) -> ParseResult<(&'s str, Vec<Attribute>)> {
        let tag = self.tag_name(node)?;
        let attrs = node
            .children
            .iter()
            .filter(|child| child.rule == Rule::Attribute)
            .map(|attr| self.attribute(attr))
            .collect::<ParseResult<Vec<_>>>()?;
        Ok((tag, attrs))
    }

    fn attribute(&mut self, node: &ConcreteNode) -> ParseResult<Attribute> {
        let [name, value] = node.children.as_slice() else {
            return Err(malformed("attribute without name and value", node.span));
        };
        let value = match value.rule {
            Rule::QuotedLiteral => {
                let quoted = value.text(self.source);
                let inner = quoted.get(1..quoted.len().saturating_sub(1)).unwrap_or("");
                AttrValue::Literal(inner.to_string())
            }
            Rule::DictShorthand => {
                for part in &value.children {
                    self.collect_nested(part)?;
                }
                AttrValue::Expr(self.expr_source(value.span))
            }
            Rule::ExprValue => AttrValue::Expr(self.inner_expr(value)?),
            Rule::ExprListValue => AttrValue::ExprList(self.inner_expr(value)?),
            other => {
                return Err(malformed(
                    &format!("{:?} is not an attribute value", other),
                    value.span,
                ))
            }
        };
        Ok(Attribute {
            name: name.text(self.source).into(),
            value,
            span: node.span,
        })
    }

    fn content(&mut self, node: &ConcreteNode) -> ParseResult<Vec<ContentItem>> {
        node.children
            .iter()
            .map(|item| -> ParseResult<ContentItem> {
                Ok(match item.rule {
                    Rule::Text => ContentItem::Literal(item.text(self.source).to_string()),
                    Rule::ContentExpr => ContentItem::Expr(self.inner_expr(item)?),
                    Rule::ContentExprList => ContentItem::ExprList(self.inner_expr(item)?),
                    _ => ContentItem::Element(self.element(item)?),
                })
            })
            .collect()
    }

    /// The `Expr` child of a bracketed value, split into segments.
    fn inner_expr(&mut self, node: &ConcreteNode) -> ParseResult<ExprSource> {
        let expr = node
            .child(Rule::Expr)
            .ok_or_else(|| malformed("bracketed value without an expression", node.span))?;
        self.collect_nested(expr)?;
        Ok(self.expr_source(expr.span))
    }

    fn expr_source(&mut self, span: Span) -> ExprSource {
        ExprSource {
            span,
            segments: self.index.take_interposed(self.source, span),
        }
    }

    /// Simplify and record every `( element )` inside an expression piece.
    fn collect_nested(&mut self, node: &ConcreteNode) -> ParseResult<()> {
        match node.rule {
            Rule::NestedElement => {
                let element = node
                    .children
                    .first()
                    .ok_or_else(|| malformed("nested element without an element", node.span))?;
                let element = self.element(element)?;
                self.index.record(node.span, element);
            }
            Rule::StringLiteral | Rule::Opaque => {}
            _ => {
                for child in &node.children {
                    self.collect_nested(child)?;
                }
            }
        }
        Ok(())
    }
}

/// Drop trailing whitespace from a final literal, and the literal itself if
/// nothing is left.
fn strip_trailing_whitespace(items: &mut Vec<ContentItem>) {
    if let Some(ContentItem::Literal(text)) = items.last_mut() {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        if text.is_empty() {
            items.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn simplified(source: &str) -> AbstractElement {
        let doc = htexpr_parser::parse(source).unwrap();
        simplify(source, &doc).unwrap()
    }

    fn literal(text: &str) -> ContentItem {
        ContentItem::Literal(text.to_string())
    }

    /// `(text, nested tag)` for each segment of the first content expression.
    fn segments(code: &str) -> Vec<(String, Option<String>)> {
        let element = simplified(&format!("<div>{{{}}}</div>", code));
        let Some(ContentItem::Expr(expr)) = element.children().first() else {
            panic!("no expression in {code}");
        };
        assert_eq!(expr.text(), code);
        expr.segments
            .iter()
            .map(|s| {
                (
                    s.text.clone(),
                    s.element.as_ref().map(|e| e.tag.to_string()),
                )
            })
            .collect()
    }

    #[test]
    fn test_self_closing_has_no_content() {
        assert_eq!(simplified("<div/>").content, None);
        assert_eq!(simplified("<div></div>").content, Some(vec![]));
    }

    #[test]
    fn test_trailing_whitespace_is_stripped() {
        assert_eq!(simplified("<div>text  \n</div>").content, Some(vec![literal("text")]));
        assert_eq!(simplified("<div>   </div>").content, Some(vec![]));
        assert_eq!(
            simplified("<p>a {b} </p>").children().len(),
            2,
            "a whitespace-only final literal is dropped"
        );
    }

    #[test]
    fn test_whitespace_outside_text_is_irrelevant() {
        let compact = simplified(r#"<div id="x"><br/></div>"#);
        let spaced = simplified("\n  < div  id = \"x\" >\n   <br />\n  </ div >  ");
        let shape = |e: &AbstractElement| {
            (
                e.tag.clone(),
                e.attr("id").cloned(),
                e.children()
                    .iter()
                    .map(|c| matches!(c, ContentItem::Element(_)))
                    .collect::<Vec<_>>(),
            )
        };
        assert_eq!(shape(&compact), shape(&spaced));
    }

    #[test]
    fn test_grammar_example() {
        let source = r#"<h1 id="foo" class={bar}>heading {foo}<div id="1" class="2"/></h1>"#;
        let h1 = simplified(source);
        assert_eq!(h1.tag, "h1");
        assert_eq!(h1.attr("id"), Some(&AttrValue::Literal("foo".into())));
        let Some(AttrValue::Expr(class)) = h1.attr("class") else {
            panic!("class is not an expression");
        };
        assert_eq!(class.text(), "bar");

        let children = h1.children();
        assert_eq!(children[0], literal("heading "));
        let ContentItem::Expr(foo) = &children[1] else {
            panic!("expected expression");
        };
        assert_eq!(foo.segments, vec![Segment::raw("foo", Span::new(34, 37))]);
        let ContentItem::Element(div) = &children[2] else {
            panic!("expected element");
        };
        assert_eq!(div.span.start, 38);
        assert!(div.is_self_closing());
        assert_eq!(div.attr("class"), Some(&AttrValue::Literal("2".into())));
    }

    #[test]
    fn test_interposition() {
        assert_eq!(
            segments("1 if 2 < 3 else 4 > 5"),
            vec![("1 if 2 < 3 else 4 > 5".to_string(), None)]
        );
        assert_eq!(
            segments("(<span />) if 2 < 3 else (<naps />)"),
            vec![
                ("(<span />)".to_string(), Some("span".to_string())),
                (" if 2 < 3 else ".to_string(), None),
                ("(<naps />)".to_string(), Some("naps".to_string())),
            ]
        );
        assert_eq!(
            segments("1 + 2 + (<div />) + (<span />)"),
            vec![
                ("1 + 2 + ".to_string(), None),
                ("(<div />)".to_string(), Some("div".to_string())),
                (" + ".to_string(), None),
                ("(<span />)".to_string(), Some("span".to_string())),
            ]
        );
        assert_eq!(
            segments("(<div>{(<span/>)}</div>)"),
            vec![("(<div>{(<span/>)}</div>)".to_string(), Some("div".to_string()))]
        );
    }

    #[test]
    fn test_nested_elements_inside_groups() {
        let segs = segments("[(<li/>) for _ in range(2)]");
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1], ("(<li/>)".to_string(), Some("li".to_string())));
    }

    #[test]
    fn test_deeply_nested_element_is_claimed_by_inner_expression() {
        let div = simplified("<div>{(<p>{(<b/>)}</p>)}</div>");
        let Some(ContentItem::Expr(outer)) = div.children().first() else {
            panic!("no expression");
        };
        let p = outer.nested().next().unwrap();
        let Some(ContentItem::Expr(inner)) = p.children().first() else {
            panic!("no inner expression");
        };
        assert_eq!(inner.nested().map(|e| e.tag.as_str()).collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn test_dict_shorthand_spans_braces() {
        let source = "<div style={'color': 'red'} />";
        let div = simplified(source);
        let Some(AttrValue::Expr(style)) = div.attr("style") else {
            panic!("style is not an expression");
        };
        assert_eq!(style.text(), "{'color': 'red'}");
    }

    #[test]
    fn test_list_attribute() {
        let div = simplified("<div a=[i for i in x] />");
        let Some(AttrValue::ExprList(a)) = div.attr("a") else {
            panic!("a is not a list expression");
        };
        assert_eq!(a.text(), "i for i in x");
    }

    #[test]
    fn test_index_keeps_first_entry_at_offset() {
        let mut index = InterpositionIndex::new();
        assert!(index.record(Span::new(3, 9), AbstractElement::new("a", Span::new(4, 8))));
        assert!(!index.record(Span::new(3, 12), AbstractElement::new("b", Span::new(4, 11))));
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().unwrap().element.tag, "a");

        let source = "xx (<a/>) yy";
        let segments = index.take_interposed(source, Span::new(0, 12));
        assert_eq!(segments.len(), 3);
        assert!(index.is_empty());
    }

    #[test]
    fn test_serializes_tree() {
        let div = simplified(r#"<div id="x">hi</div>"#);
        let json = serde_json::to_value(&div).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "tag": "div",
                "attrs": [{
                    "name": "id",
                    "value": {"kind": "literal", "value": "x"},
                    "span": {"start": 5, "end": 11}
                }],
                "content": [{"kind": "literal", "value": "hi"}],
                "span": {"start": 0, "end": 20}
            })
        );
    }
}
