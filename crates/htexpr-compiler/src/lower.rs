//! Abstract tree to IR.
//!
//! Embedded expressions are spliced back into host source: raw segments
//! are copied, each nested element is replaced by a placeholder name, and
//! list expressions are wrapped in `[` `]`. The result is dedented and
//! parsed, and every placeholder leaf is then swapped for the compiled
//! nested element. A [`Splicer`] records where each run of the synthesized
//! text came from so host syntax errors point into the template.

use crate::ast::{AbstractElement, AttrValue, ContentItem, ExprSource};
use crate::error::{CompileError, CompileResult};
use crate::flatten::flatten;
use crate::ir::{FragmentKind, IrFragment};
use crate::resolve::{AttributeMapper, TagResolver};
use host_expr::{parse_expression, Argument, Expr};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use source_map::{Span, Splicer};
use std::ops::Range;
use tracing::trace;

const PLACEHOLDER_PREFIX: &str = "__htexpr_";

/// Lower `element`, the simplified root of `template`.
pub fn lower(
    template: &str,
    element: &AbstractElement,
    resolver: &TagResolver,
    mapper: &AttributeMapper,
) -> CompileResult<IrFragment> {
    Lowerer::new(template, resolver, mapper).lower_element(element)
}

pub struct Lowerer<'a> {
    resolver: &'a TagResolver,
    mapper: &'a AttributeMapper,
    /// Prefix of placeholder names, chosen so no name in the template
    /// starts with it.
    prefix: String,
    next_placeholder: usize,
}

impl<'a> Lowerer<'a> {
    pub fn new(template: &str, resolver: &'a TagResolver, mapper: &'a AttributeMapper) -> Self {
        let mut prefix = PLACEHOLDER_PREFIX.to_string();
        while template.contains(prefix.as_str()) {
            prefix.insert(0, '_');
        }
        Self {
            resolver,
            mapper,
            prefix,
            next_placeholder: 0,
        }
    }

    /// A constructor call: `ns.Name(children=[...], attr=value, ...)`.
    pub fn lower_element(&mut self, element: &AbstractElement) -> CompileResult<IrFragment> {
        if element.tag.is_empty() {
            return Err(CompileError::malformed_node(
                "element without a tag name",
                element.span,
            ));
        }
        let resolution = self.resolver.resolve(&element.tag, element.span)?;

        let children = element
            .children()
            .iter()
            .map(|item| self.lower_content(item))
            .collect::<CompileResult<Vec<_>>>()?;
        let mut args = vec![Argument::Keyword("children".into(), flatten(children).node)];

        let mut seen: FxHashSet<SmolStr> = FxHashSet::default();
        seen.insert("children".into());
        for attr in &element.attrs {
            let name = SmolStr::new(self.mapper.get(&attr.name, &attr.name));
            if !seen.insert(name.clone()) {
                return Err(CompileError::duplicate_argument(
                    &element.tag,
                    &name,
                    attr.span,
                ));
            }
            let value = match &attr.value {
                AttrValue::Literal(text) => Expr::str(text.as_str()),
                AttrValue::Expr(source) => self.lower_expr(source, FragmentKind::Scalar)?.node,
                AttrValue::ExprList(source) => self.lower_expr(source, FragmentKind::List)?.node,
            };
            args.push(Argument::Keyword(name, value));
        }

        trace!(tag = %element.tag, resolved = %resolution, "lowered element");
        Ok(IrFragment::scalar(resolution.callee().call(args)))
    }

    fn lower_content(&mut self, item: &ContentItem) -> CompileResult<IrFragment> {
        match item {
            ContentItem::Element(element) => self.lower_element(element),
            ContentItem::Literal(text) => Ok(IrFragment::scalar(Expr::str(text.as_str()))),
            ContentItem::Expr(source) => self.lower_expr(source, FragmentKind::Scalar),
            ContentItem::ExprList(source) => self.lower_expr(source, FragmentKind::List),
        }
    }

    fn placeholder(&mut self) -> SmolStr {
        let name = format!("{}{}", self.prefix, self.next_placeholder);
        self.next_placeholder += 1;
        SmolStr::new(name)
    }

    /// Splice, parse and substitute one embedded expression. A list
    /// expression is wrapped in brackets and parsed as a list display.
    pub fn lower_expr(
        &mut self,
        source: &ExprSource,
        kind: FragmentKind,
    ) -> CompileResult<IrFragment> {
        if source.segments.is_empty() {
            return Err(CompileError::malformed_node(
                "expression without source segments",
                source.span,
            ));
        }

        // Text the host parser sees before dedenting, as (text, origin) runs.
        let mut pieces: Vec<(SmolStr, Piece)> = Vec::with_capacity(source.segments.len());
        let mut nested: FxHashMap<SmolStr, Expr> = FxHashMap::default();
        for segment in &source.segments {
            match &segment.element {
                Some(element) => {
                    let compiled = self.lower_element(element)?;
                    let name = self.placeholder();
                    trace!(placeholder = %name, tag = %element.tag, "spliced nested element");
                    nested.insert(name.clone(), compiled.node);
                    // Keep the parentheses so the placeholder stays a separate
                    // token after names and keywords such as `f(` or `else(`.
                    let text = SmolStr::new(format!("({})", name));
                    pieces.push((text, Piece::Replaced(segment.span)));
                }
                None => pieces.push((
                    segment.text.as_str().into(),
                    Piece::Verbatim(segment.span.start),
                )),
            }
        }

        let flat: String = pieces.iter().map(|(text, _)| text.as_str()).collect();
        let removed = dedent_ranges(&flat);

        let mut splicer = Splicer::new();
        if kind == FragmentKind::List {
            splicer.push_str("[");
        }
        let mut offset = 0;
        for (text, piece) in &pieces {
            let range = offset..offset + text.len();
            offset = range.end;
            match *piece {
                Piece::Replaced(span) => splicer.push_replacement(text, span),
                Piece::Verbatim(source_start) => {
                    for kept in subtract(range.clone(), &removed) {
                        let local = kept.start - range.start..kept.end - range.start;
                        splicer.push_mapped(
                            &text.as_str()[local.clone()],
                            source_start + local.start as u32,
                        );
                    }
                }
            }
        }
        if kind == FragmentKind::List {
            splicer.push_str("]");
        }
        let (code, source_map) = splicer.finish();

        let mut node = parse_expression(&code).map_err(|err| {
            let at = source_map
                .to_source_offset(err.offset as u32)
                .unwrap_or(source.span.start);
            let end = if at < source.span.end { at + 1 } else { at };
            CompileError::invalid_expression(&err, Span::new(at, end))
        })?;
        node.replace_names(&mut |name: &str| nested.remove(name));

        Ok(IrFragment { kind, node })
    }
}

/// Origin of one run of spliced text.
#[derive(Debug, Clone, Copy)]
enum Piece {
    /// Copied from the template, starting at this offset.
    Verbatim(u32),
    /// A placeholder standing in for the nested element at this span.
    Replaced(Span),
}

/// Byte ranges of `text` to drop when dedenting: leading blank lines, and
/// up to the common indentation of the remaining non-blank lines from the
/// start of every line.
fn dedent_ranges(text: &str) -> Vec<Range<usize>> {
    let mut removed = Vec::new();

    let mut body_start = 0;
    while let Some(newline) = text[body_start..].find('\n') {
        let line = &text[body_start..body_start + newline];
        if !line.trim().is_empty() {
            break;
        }
        body_start += newline + 1;
    }
    if body_start > 0 {
        removed.push(0..body_start);
    }

    let body = &text[body_start..];
    let margin = body
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(indentation)
        .min()
        .unwrap_or(0);
    if margin == 0 {
        return removed;
    }

    let mut line_start = body_start;
    for line in body.split('\n') {
        let drop = indentation(line).min(margin);
        if drop > 0 {
            removed.push(line_start..line_start + drop);
        }
        line_start += line.len() + 1;
    }
    removed
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// The parts of `range` not covered by any of the sorted, disjoint
/// `removed` ranges.
fn subtract(range: Range<usize>, removed: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut kept = Vec::new();
    let mut start = range.start;
    for cut in removed {
        if cut.end <= start || cut.start >= range.end {
            continue;
        }
        if cut.start > start {
            kept.push(start..cut.start);
        }
        start = start.max(cut.end);
    }
    if start < range.end {
        kept.push(start..range.end);
    }
    kept
}
