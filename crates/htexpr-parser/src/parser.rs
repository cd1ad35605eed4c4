//! Recursive-descent parser for templates.
//!
//! The grammar is a PEG: alternatives are tried in order and repetition is
//! greedy. Embedded expressions are only tokenized far enough to find where
//! they end (string literals and balanced brackets), with one exception:
//! `( element )` inside an expression is parsed as markup, so elements can be
//! nested anywhere an expression can hold a parenthesized value.

use crate::cst::{ConcreteNode, Rule};
use crate::cursor::Cursor;
use crate::error::{ParseError, ParseResult};
use rustc_hash::FxHashMap;
use source_map::Span;

/// Parse a template into its concrete parse tree.
///
/// The root is a [`Rule::Document`] node with exactly one element child.
pub fn parse_template(source: &str) -> ParseResult<ConcreteNode> {
    TemplateParser::new(source).parse_document()
}

/// Outcome of an `( element )` attempt: the element and the offset just past
/// it, or why the element did not parse.
type NestedAttempt = ParseResult<(ConcreteNode, usize)>;

struct TemplateParser<'a> {
    cursor: Cursor<'a>,
    /// Earlier `( element )` attempts keyed by the offset of their `<`. An
    /// element not followed by `)` falls back to plain parentheses, and the
    /// fallback re-scans the same text, so without this the work doubles per
    /// level of nesting.
    nested: FxHashMap<usize, NestedAttempt>,
}

impl<'a> TemplateParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            nested: FxHashMap::default(),
        }
    }

    /// `document = ws element ws`
    fn parse_document(&mut self) -> ParseResult<ConcreteNode> {
        self.cursor.skip_whitespace();
        if !self.cursor.starts_with("<") {
            return Err(ParseError::unexpected_token(
                "'<'",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        }
        let element = self.parse_element()?;
        self.cursor.skip_whitespace();
        if !self.cursor.is_eof() {
            let rest = Span::from_offsets(self.cursor.pos(), self.cursor.source().len());
            return Err(ParseError::trailing_content(rest));
        }
        let span = Span::from_offsets(0, self.cursor.source().len());
        Ok(ConcreteNode::with_children(
            Rule::Document,
            span,
            vec![element],
        ))
    }

    /// `element = selfClosing | normal`, with the cursor on `<`.
    fn parse_element(&mut self) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        if !self.cursor.consume("<") {
            return Err(ParseError::unexpected_token(
                "'<'",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        }
        self.cursor.skip_whitespace();

        let tag_start = self.cursor.pos();
        let Some(tag) = self.cursor.read_name() else {
            return Err(ParseError::unexpected_token(
                "tag name",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        };
        let mut head = vec![ConcreteNode::leaf(
            Rule::TagName,
            self.cursor.span_from(tag_start),
        )];
        head.extend(self.parse_attributes()?);
        self.cursor.skip_whitespace();

        if self.cursor.consume("/>") {
            return Ok(ConcreteNode::with_children(
                Rule::SelfClosing,
                self.cursor.span_from(start),
                head,
            ));
        }
        if !self.cursor.consume(">") {
            return Err(ParseError::unexpected_token(
                "'>' or '/>'",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        }
        let open = ConcreteNode::with_children(Rule::OpenTag, self.cursor.span_from(start), head);
        self.cursor.skip_whitespace();

        let content = self.parse_content()?;
        let close = self.parse_close_tag(tag, open.span)?;

        Ok(ConcreteNode::with_children(
            Rule::Normal,
            self.cursor.span_from(start),
            vec![open, content, close],
        ))
    }

    /// `close = ws '</' tagName '>'`; the name must equal `open_tag`.
    fn parse_close_tag(&mut self, open_tag: &str, open_span: Span) -> ParseResult<ConcreteNode> {
        self.cursor.skip_whitespace();
        let start = self.cursor.pos();
        if !self.cursor.consume("</") {
            return Err(if self.cursor.is_eof() {
                ParseError::unclosed_tag(open_tag, open_span)
            } else {
                ParseError::unexpected_token(
                    &format!("</{}>", open_tag),
                    &self.cursor.describe_next(),
                    self.cursor.here(),
                )
            });
        }
        self.cursor.skip_whitespace();
        let name_start = self.cursor.pos();
        let Some(name) = self.cursor.read_name() else {
            return Err(ParseError::unexpected_token(
                "tag name",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        };
        let name_node = ConcreteNode::leaf(Rule::TagName, self.cursor.span_from(name_start));
        self.cursor.skip_whitespace();
        if !self.cursor.consume(">") {
            return Err(ParseError::unexpected_token(
                "'>'",
                &self.cursor.describe_next(),
                self.cursor.here(),
            ));
        }
        let span = self.cursor.span_from(start);
        if name != open_tag {
            return Err(ParseError::mismatched_tag(open_tag, name, span));
        }
        Ok(ConcreteNode::with_children(
            Rule::CloseTag,
            span,
            vec![name_node],
        ))
    }

    /// `attrs = attr*`, `attr = ws attrName ws '=' ws attrValue`
    fn parse_attributes(&mut self) -> ParseResult<Vec<ConcreteNode>> {
        let mut attrs = Vec::new();
        loop {
            let before = self.cursor.pos();
            self.cursor.skip_whitespace();
            let start = self.cursor.pos();
            if self.cursor.read_name().is_none() {
                self.cursor.reset(before);
                return Ok(attrs);
            }
            let name = ConcreteNode::leaf(Rule::AttrName, self.cursor.span_from(start));
            self.cursor.skip_whitespace();
            if !self.cursor.consume("=") {
                return Err(ParseError::unexpected_token(
                    "'='",
                    &self.cursor.describe_next(),
                    self.cursor.here(),
                ));
            }
            self.cursor.skip_whitespace();
            let value = self.parse_attr_value()?;
            attrs.push(ConcreteNode::with_children(
                Rule::Attribute,
                self.cursor.span_from(start),
                vec![name, value],
            ));
        }
    }

    /// `attrValue = quotedLiteral | '{' exprNoColon ':' expr '}' | '{' expr '}' | '[' expr ']'`
    fn parse_attr_value(&mut self) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        match self.cursor.peek_char() {
            Some(quote @ ('"' | '\'')) => {
                self.cursor.next_char();
                self.cursor.consume_while(|c| c != quote);
                if !self.cursor.consume(&quote.to_string()) {
                    return Err(ParseError::unterminated_string(self.cursor.span_from(start)));
                }
                Ok(ConcreteNode::leaf(
                    Rule::QuotedLiteral,
                    self.cursor.span_from(start),
                ))
            }
            Some('{') => {
                if let Some(dict) = self.try_dict_shorthand()? {
                    return Ok(dict);
                }
                let expr = self.parse_delimited('{', '}')?;
                Ok(ConcreteNode::with_children(
                    Rule::ExprValue,
                    self.cursor.span_from(start),
                    vec![expr],
                ))
            }
            Some('[') => {
                let expr = self.parse_delimited('[', ']')?;
                Ok(ConcreteNode::with_children(
                    Rule::ExprListValue,
                    self.cursor.span_from(start),
                    vec![expr],
                ))
            }
            _ => Err(ParseError::unexpected_token(
                "attribute value",
                &self.cursor.describe_next(),
                self.cursor.here(),
            )),
        }
    }

    /// `'{' exprNoColon ':' expr '}'`. Returns `None` with the cursor
    /// restored when there is no colon at the top level of the braces.
    fn try_dict_shorthand(&mut self) -> ParseResult<Option<ConcreteNode>> {
        let start = self.cursor.pos();
        self.cursor.next_char();
        let key = self.parse_expr(true)?;
        if !self.cursor.consume(":") {
            self.cursor.reset(start);
            return Ok(None);
        }
        let value = self.parse_expr(false)?;
        if !self.cursor.consume("}") {
            self.cursor.reset(start);
            return Ok(None);
        }
        Ok(Some(ConcreteNode::with_children(
            Rule::DictShorthand,
            self.cursor.span_from(start),
            vec![key, value],
        )))
    }

    /// `open expr close`, returning the inner expression node.
    fn parse_delimited(&mut self, open: char, close: char) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        self.cursor.next_char();
        let expr = self.parse_expr(false)?;
        if !self.cursor.consume(&close.to_string()) {
            return Err(ParseError::unclosed_delimiter(
                open,
                Span::from_offsets(start, start + 1),
            ));
        }
        Ok(expr)
    }

    /// `content = contentItem*`
    fn parse_content(&mut self) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        let mut items = Vec::new();
        while let Some(c) = self.cursor.peek_char() {
            let item_start = self.cursor.pos();
            let item = match c {
                '<' if self.cursor.starts_with("</") => break,
                '<' => self.parse_element()?,
                '{' => {
                    let expr = self.parse_delimited('{', '}')?;
                    ConcreteNode::with_children(
                        Rule::ContentExpr,
                        self.cursor.span_from(item_start),
                        vec![expr],
                    )
                }
                '[' => {
                    let expr = self.parse_delimited('[', ']')?;
                    ConcreteNode::with_children(
                        Rule::ContentExprList,
                        self.cursor.span_from(item_start),
                        vec![expr],
                    )
                }
                _ => {
                    self.cursor
                        .consume_while(|c| !matches!(c, '<' | '{' | '['));
                    ConcreteNode::leaf(Rule::Text, self.cursor.span_from(item_start))
                }
            };
            items.push(item);
        }
        Ok(ConcreteNode::with_children(
            Rule::Content,
            self.cursor.span_from(start),
            items,
        ))
    }

    /// Scan an embedded expression up to (not including) its closing
    /// delimiter. With `stop_at_colon`, a colon outside any bracket also ends
    /// it.
    fn parse_expr(&mut self, stop_at_colon: bool) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        let mut pieces = Vec::new();
        while let Some(c) = self.cursor.peek_char() {
            let piece = match c {
                ')' | '}' | ']' => break,
                ':' if stop_at_colon => break,
                '"' | '\'' => self.parse_string()?,
                '(' => self.parse_parens()?,
                '{' => self.parse_group('{', '}', Rule::Braces)?,
                '[' => self.parse_group('[', ']', Rule::Brackets)?,
                _ => {
                    let opaque_start = self.cursor.pos();
                    self.cursor.consume_while(|c| {
                        !matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | '"' | '\'')
                            && !(stop_at_colon && c == ':')
                    });
                    ConcreteNode::leaf(Rule::Opaque, self.cursor.span_from(opaque_start))
                }
            };
            pieces.push(piece);
        }
        Ok(ConcreteNode::with_children(
            Rule::Expr,
            self.cursor.span_from(start),
            pieces,
        ))
    }

    /// A single-, double- or triple-quoted string with backslash escapes.
    fn parse_string(&mut self) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        let delimiter = if self.cursor.starts_with("\"\"\"") {
            "\"\"\""
        } else if self.cursor.starts_with("'''") {
            "'''"
        } else if self.cursor.starts_with("\"") {
            "\""
        } else {
            "'"
        };
        self.cursor.consume(delimiter);
        loop {
            if self.cursor.consume(delimiter) {
                return Ok(ConcreteNode::leaf(
                    Rule::StringLiteral,
                    self.cursor.span_from(start),
                ));
            }
            match self.cursor.next_char() {
                Some('\\') => {
                    self.cursor.next_char();
                }
                Some(_) => {}
                None => {
                    return Err(ParseError::unterminated_string(self.cursor.span_from(start)));
                }
            }
        }
    }

    /// `'(' ws element ws ')'` as a nested element, else a plain group.
    fn parse_parens(&mut self) -> ParseResult<ConcreteNode> {
        if let Some(nested) = self.try_nested_element()? {
            return Ok(nested);
        }
        self.parse_group('(', ')', Rule::Parens)
    }

    /// No host expression starts with `<`, so once `(` is followed by `<` an
    /// element that fails to parse is the error to report.
    fn try_nested_element(&mut self) -> ParseResult<Option<ConcreteNode>> {
        let start = self.cursor.pos();
        self.cursor.next_char();
        self.cursor.skip_whitespace();
        if !self.cursor.starts_with("<") {
            self.cursor.reset(start);
            return Ok(None);
        }

        let lt = self.cursor.pos();
        let attempt = match self.nested.get(&lt).cloned() {
            Some(memo) => memo,
            None => {
                let attempt = self
                    .parse_element()
                    .map(|element| (element, self.cursor.pos()));
                self.nested.insert(lt, attempt.clone());
                attempt
            }
        };
        let (element, end) = attempt?;

        self.cursor.reset(end);
        self.cursor.skip_whitespace();
        if !self.cursor.consume(")") {
            self.cursor.reset(start);
            return Ok(None);
        }
        Ok(Some(ConcreteNode::with_children(
            Rule::NestedElement,
            self.cursor.span_from(start),
            vec![element],
        )))
    }

    fn parse_group(&mut self, open: char, close: char, rule: Rule) -> ParseResult<ConcreteNode> {
        let start = self.cursor.pos();
        let inner = self.parse_delimited(open, close)?;
        Ok(ConcreteNode::with_children(
            rule,
            self.cursor.span_from(start),
            vec![inner],
        ))
    }
}
