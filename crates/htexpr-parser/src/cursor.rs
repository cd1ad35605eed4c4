//! Character cursor over template source.

use source_map::Span;

/// A position in template source with the small lookahead helpers the
/// grammar needs. Positions are byte offsets and always sit on a char
/// boundary.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewind (or skip) to a position previously returned by [`pos`](Self::pos).
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Consume `s` if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.source[start..self.pos]
    }

    /// Read a tag or attribute name: `[A-Za-z][A-Za-z0-9._-]*`.
    pub fn read_name(&mut self) -> Option<&'a str> {
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return None,
        }
        Some(self.consume_while(|c| {
            c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
        }))
    }

    /// A short description of what is under the cursor, for error messages.
    pub fn describe_next(&self) -> String {
        match self.peek_char() {
            Some(c) => format!("{:?}", c),
            None => "end of input".to_string(),
        }
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span::from_offsets(start, self.pos)
    }

    /// A span covering the next char, or an empty span at end of input.
    pub fn here(&self) -> Span {
        let len = self.peek_char().map_or(0, char::len_utf8);
        Span::from_offsets(self.pos, self.pos + len)
    }
}
