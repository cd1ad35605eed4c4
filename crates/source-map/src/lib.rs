//! Source positions for htexpr templates.
//!
//! Templates are parsed in several stages, and embedded expressions are
//! re-assembled into fresh host-language source before they are parsed
//! again. This crate keeps every stage pointing back at the original
//! template text: [`Span`] for byte ranges, [`LineIndex`] for human
//! line/column positions, and [`Splicer`]/[`SourceMap`] for mapping offsets
//! in synthesized text back to the template.

use std::ops::Range;

/// A half-open byte range `[start, end)` in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at the given offset.
    #[inline]
    pub const fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Create a span from `usize` offsets.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self::new(start as u32, end as u32)
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if `other` lies entirely inside this span.
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[inline]
    pub const fn contains_offset(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span covering both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The text this span covers in `source`.
    ///
    /// Out-of-range or non-boundary spans yield an empty string rather than
    /// panicking.
    pub fn slice(self, source: &str) -> &str {
        source.get(self.to_range()).unwrap_or("")
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::from_offsets(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.to_range()
    }
}

/// Byte offset to line/column conversion for a template.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Line and column (both 0-indexed) of a byte offset. Offsets past the
    /// end clamp to the end of the text.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        LineCol {
            line: line as u32,
            col: offset - self.line_starts[line],
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// A 0-indexed line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// 1-indexed `(line, col)` for display.
    #[inline]
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

/// One run of synthesized text that came from the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mapping {
    /// Offset in the synthesized text.
    pub generated_offset: u32,
    /// Length in the synthesized text.
    pub generated_length: u32,
    /// The template span the run stands for. Its length differs from
    /// `generated_length` when a whole template construct was replaced by a
    /// shorter or longer token.
    pub source: Span,
}

impl Mapping {
    pub fn generated_span(&self) -> Span {
        Span::new(
            self.generated_offset,
            self.generated_offset + self.generated_length,
        )
    }
}

/// Mappings from synthesized text back to the template, sorted by
/// generated offset.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mapping: Mapping) {
        let pos = self
            .mappings
            .partition_point(|m| m.generated_offset < mapping.generated_offset);
        self.mappings.insert(pos, mapping);
    }

    /// The mapping covering a generated offset, if any.
    pub fn find(&self, generated_offset: u32) -> Option<&Mapping> {
        let idx = self
            .mappings
            .partition_point(|m| m.generated_offset <= generated_offset);
        let mapping = self.mappings.get(idx.checked_sub(1)?)?;
        mapping
            .generated_span()
            .contains_offset(generated_offset)
            .then_some(mapping)
    }

    /// Map a generated offset to a template offset.
    ///
    /// Runs copied verbatim map one-to-one; replaced runs map to the start of
    /// the construct they replaced. Offsets between runs (text inserted by
    /// the splicer itself) map to the start of the next run, or to the end of
    /// the last one.
    pub fn to_source_offset(&self, generated_offset: u32) -> Option<u32> {
        if let Some(m) = self.find(generated_offset) {
            let delta = generated_offset - m.generated_offset;
            return Some(if m.generated_length == m.source.len() {
                m.source.start + delta
            } else {
                m.source.start
            });
        }
        self.mappings
            .iter()
            .find(|m| m.generated_offset >= generated_offset)
            .map(|m| m.source.start)
            .or_else(|| self.mappings.last().map(|m| m.source.end))
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }
}

/// Builds synthesized source text while recording where each run came from.
#[derive(Debug, Default)]
pub struct Splicer {
    text: String,
    source_map: SourceMap,
}

impl Splicer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of the synthesized text.
    pub fn offset(&self) -> u32 {
        self.text.len() as u32
    }

    /// Append text that has no counterpart in the template.
    pub fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Append text copied verbatim from the template at `source_offset`.
    pub fn push_mapped(&mut self, text: &str, source_offset: u32) {
        if text.is_empty() {
            return;
        }
        let len = text.len() as u32;
        self.source_map.add(Mapping {
            generated_offset: self.offset(),
            generated_length: len,
            source: Span::new(source_offset, source_offset + len),
        });
        self.text.push_str(text);
    }

    /// Append `text` standing in for the template construct at `source`.
    pub fn push_replacement(&mut self, text: &str, source: Span) {
        self.source_map.add(Mapping {
            generated_offset: self.offset(),
            generated_length: text.len() as u32,
            source,
        });
        self.text.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> (String, SourceMap) {
        (self.text, self.source_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span() {
        let span = Span::new(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(span.contains_offset(15));
        assert!(!span.contains_offset(20));
        assert!(span.contains(Span::new(12, 20)));
        assert!(!span.contains(Span::new(12, 21)));
        assert_eq!(span.merge(Span::new(15, 30)), Span::new(10, 30));
    }

    #[test]
    fn test_span_slice() {
        let source = "<div>{x}</div>";
        assert_eq!(Span::new(6, 7).slice(source), "x");
        assert_eq!(Span::new(6, 70).slice(source), "");
    }

    #[test]
    fn test_line_index() {
        let index = LineIndex::new("<div>\n  {x}\n</div>");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(0), LineCol::new(0, 0));
        assert_eq!(index.line_col(8), LineCol::new(1, 2));
        assert_eq!(index.line_col(12), LineCol::new(2, 0));
        assert_eq!(index.line_col(8).to_display(), (2, 3));
        assert_eq!(index.line_col(999), LineCol::new(2, 6));
    }

    #[test]
    fn test_splicer_verbatim_runs() {
        let mut splicer = Splicer::new();
        splicer.push_str("[");
        splicer.push_mapped("foo + ", 40);
        splicer.push_replacement("__p0", Span::new(46, 60));
        splicer.push_str("]");

        let (text, map) = splicer.finish();
        assert_eq!(text, "[foo + __p0]");
        assert_eq!(map.len(), 2);
        assert_eq!(map.to_source_offset(1), Some(40));
        assert_eq!(map.to_source_offset(4), Some(43));
        assert_eq!(map.to_source_offset(9), Some(46));
        assert_eq!(map.to_source_offset(0), Some(40));
        assert_eq!(map.to_source_offset(11), Some(60));
    }

    #[test]
    fn test_empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.to_source_offset(3), None);
    }
}
