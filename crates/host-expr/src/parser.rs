//! Recursive-descent parser for host expressions.
//!
//! Precedence, lowest first: tuple, conditional, `or`, `and`, `not`,
//! comparison, `+ -`, `* / // %`, unary `+ -`, `**`, then calls,
//! subscripts and attribute access.

use crate::ast::{
    Argument, BinOp, BoolOp, CmpOp, Comprehension, Constant, Expr, Target, UnaryOp,
};
use crate::error::SyntaxError;
use crate::token::{tokenize, Token};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::ops::Range;

type ParseResult<T> = Result<T, SyntaxError>;

/// Parse a complete expression. A top-level comma list becomes a tuple.
pub fn parse_expression(source: &str) -> ParseResult<Expr> {
    let mut parser = Parser {
        tokens: tokenize(source)?,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.expression_list()?;
    match parser.tokens.get(parser.pos) {
        Some((token, span)) => Err(SyntaxError::new(
            format!("unexpected '{}'", token),
            span.start,
        )),
        None => Ok(expr),
    }
}

struct Parser {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end, |(_, span)| span.start)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> ParseResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", token)))
        }
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let found = match self.peek() {
            Some(token) => format!("'{}'", token),
            None => "end of input".to_string(),
        };
        SyntaxError::new(
            format!("expected {}, found {}", expected, found),
            self.offset(),
        )
    }

    /// Whether the next token closes the current construct.
    fn at_closer(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::RParen | Token::RBracket | Token::RBrace)
        )
    }

    fn expression_list(&mut self) -> ParseResult<Expr> {
        let first = self.test()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_closer() {
                break;
            }
            items.push(self.test()?);
        }
        Ok(Expr::Tuple(items))
    }

    /// `or_test ['if' or_test 'else' test]`
    fn test(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::Lambda) {
            return Err(SyntaxError::new(
                "lambda expressions are not supported",
                self.offset(),
            ));
        }
        let body = self.or_test()?;
        if !self.eat(&Token::If) {
            return Ok(body);
        }
        let test = self.or_test()?;
        self.expect(&Token::Else)?;
        let orelse = self.test()?;
        Ok(Expr::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn or_test(&mut self) -> ParseResult<Expr> {
        let mut left = self.and_test()?;
        while self.eat(&Token::Or) {
            let right = self.and_test()?;
            left = Expr::BoolOp {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_test(&mut self) -> ParseResult<Expr> {
        let mut left = self.not_test()?;
        while self.eat(&Token::And) {
            let right = self.not_test()?;
            left = Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn not_test(&mut self) -> ParseResult<Expr> {
        if self.eat(&Token::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek()? {
            Token::EqEq => CmpOp::Eq,
            Token::NotEq => CmpOp::NotEq,
            Token::Lt => CmpOp::Lt,
            Token::LtEq => CmpOp::LtE,
            Token::Gt => CmpOp::Gt,
            Token::GtEq => CmpOp::GtE,
            Token::In => CmpOp::In,
            Token::Not if self.peek_at(1) == Some(&Token::In) => {
                self.pos += 2;
                return Some(CmpOp::NotIn);
            }
            Token::Is if self.peek_at(1) == Some(&Token::Not) => {
                self.pos += 2;
                return Some(CmpOp::IsNot);
            }
            Token::Is => CmpOp::Is,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let left = self.arith()?;
        let mut comparisons = Vec::new();
        while let Some(op) = self.comparison_op() {
            comparisons.push((op, self.arith()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expr::Compare {
            left: Box::new(left),
            comparisons,
        })
    }

    fn arith(&mut self) -> ParseResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.factor()?;
            left = Expr::binary(op, left, right);
        }
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Pos,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    /// `primary ['**' factor]`, so `**` binds right to left.
    fn power(&mut self) -> ParseResult<Expr> {
        let base = self.primary()?;
        if !self.eat(&Token::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.factor()?;
        Ok(Expr::binary(BinOp::Pow, base, exponent))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat(&Token::LParen) {
                let args = self.call_arguments()?;
                expr = expr.call(args);
            } else if self.eat(&Token::LBracket) {
                let index = self.subscript_list()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat(&Token::Dot) {
                let Some(Token::Name(attr)) = self.peek().cloned() else {
                    return Err(self.unexpected("attribute name"));
                };
                self.pos += 1;
                expr = expr.attr(attr);
            } else {
                return Ok(expr);
            }
        }
    }

    fn atom(&mut self) -> ParseResult<Expr> {
        let start = self.offset();
        let Some(token) = self.advance() else {
            return Err(self.unexpected("an expression"));
        };
        match token {
            Token::Name(name) => Ok(Expr::Name(name)),
            Token::Int(value) => Ok(Expr::Constant(Constant::Int(value))),
            Token::Float(value) => Ok(Expr::Constant(Constant::Float(value))),
            Token::None => Ok(Expr::Constant(Constant::None)),
            Token::True => Ok(Expr::Constant(Constant::Bool(true))),
            Token::False => Ok(Expr::Constant(Constant::Bool(false))),
            Token::Str(first) => {
                let mut text = first;
                while let Some(Token::Str(next)) = self.peek() {
                    text.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::str(text))
            }
            Token::LParen => self.paren_atom(),
            Token::LBracket => self.list_atom(),
            Token::LBrace => self.brace_atom(start),
            _ => {
                self.pos -= 1;
                Err(self.unexpected("an expression"))
            }
        }
    }

    fn paren_atom(&mut self) -> ParseResult<Expr> {
        if self.eat(&Token::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.test()?;
        if self.check(&Token::For) {
            let generators = self.comprehension_clauses()?;
            self.expect(&Token::RParen)?;
            return Ok(Expr::GeneratorExp {
                element: Box::new(first),
                generators,
            });
        }
        if self.eat(&Token::RParen) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_closer() {
                break;
            }
            items.push(self.test()?);
        }
        self.expect(&Token::RParen)?;
        Ok(Expr::Tuple(items))
    }

    fn list_atom(&mut self) -> ParseResult<Expr> {
        if self.eat(&Token::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.test()?;
        if self.check(&Token::For) {
            let generators = self.comprehension_clauses()?;
            self.expect(&Token::RBracket)?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                generators,
            });
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_closer() {
                break;
            }
            items.push(self.test()?);
        }
        self.expect(&Token::RBracket)?;
        Ok(Expr::List(items))
    }

    fn brace_atom(&mut self, start: usize) -> ParseResult<Expr> {
        if self.eat(&Token::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }
        let key = self.test()?;
        if !self.eat(&Token::Colon) {
            return Err(SyntaxError::new("set displays are not supported", start));
        }
        let value = self.test()?;
        if self.check(&Token::For) {
            let generators = self.comprehension_clauses()?;
            self.expect(&Token::RBrace)?;
            return Ok(Expr::DictComp {
                key: Box::new(key),
                value: Box::new(value),
                generators,
            });
        }
        let mut entries = vec![(key, value)];
        while self.eat(&Token::Comma) {
            if self.at_closer() {
                break;
            }
            let key = self.test()?;
            self.expect(&Token::Colon)?;
            entries.push((key, self.test()?));
        }
        self.expect(&Token::RBrace)?;
        Ok(Expr::Dict(entries))
    }

    /// One or more `for target in iter (if cond)*` clauses.
    fn comprehension_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.eat(&Token::For) {
            let target = self.target_list()?;
            self.expect(&Token::In)?;
            let iter = self.or_test()?;
            let mut ifs = Vec::new();
            while self.eat(&Token::If) {
                ifs.push(self.or_test()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn target_list(&mut self) -> ParseResult<Target> {
        let first = self.target()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if matches!(self.peek(), Some(Token::In | Token::RParen | Token::RBracket)) {
                break;
            }
            items.push(self.target()?);
        }
        Ok(Target::Tuple(items))
    }

    fn target(&mut self) -> ParseResult<Target> {
        match self.peek() {
            Some(Token::Name(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(Target::Name(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.target_list()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                let inner = self.target_list()?;
                self.expect(&Token::RBracket)?;
                Ok(match inner {
                    Target::Name(name) => Target::Tuple(vec![Target::Name(name)]),
                    tuple => tuple,
                })
            }
            _ => Err(self.unexpected("a loop variable")),
        }
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn call_arguments(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = Vec::new();
        let mut keywords: FxHashSet<SmolStr> = FxHashSet::default();
        loop {
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            if self.eat(&Token::Star) {
                args.push(Argument::Unpack(self.test()?));
            } else if self.eat(&Token::DoubleStar) {
                args.push(Argument::UnpackKeywords(self.test()?));
            } else if let (Some(Token::Name(name)), Some(Token::Assign)) =
                (self.peek(), self.peek_at(1))
            {
                let name = name.clone();
                let offset = self.offset();
                self.pos += 2;
                if !keywords.insert(name.clone()) {
                    return Err(SyntaxError::new(
                        format!("keyword argument repeated: {}", name),
                        offset,
                    ));
                }
                args.push(Argument::Keyword(name, self.test()?));
            } else {
                let value = self.test()?;
                if args.is_empty() && self.check(&Token::For) {
                    let generators = self.comprehension_clauses()?;
                    self.expect(&Token::RParen)?;
                    return Ok(vec![Argument::Positional(Expr::GeneratorExp {
                        element: Box::new(value),
                        generators,
                    })]);
                }
                args.push(Argument::Positional(value));
            }
            if !self.eat(&Token::Comma) {
                self.expect(&Token::RParen)?;
                return Ok(args);
            }
        }
    }

    fn subscript_list(&mut self) -> ParseResult<Expr> {
        let first = self.subscript()?;
        if !self.check(&Token::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&Token::Comma) {
            if self.at_closer() {
                break;
            }
            items.push(self.subscript()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn subscript(&mut self) -> ParseResult<Expr> {
        let lower = if self.check(&Token::Colon) {
            None
        } else {
            let lower = self.test()?;
            if !self.check(&Token::Colon) {
                return Ok(lower);
            }
            Some(Box::new(lower))
        };
        self.expect(&Token::Colon)?;
        let upper = self.optional_slice_part()?;
        let step = if self.eat(&Token::Colon) {
            self.optional_slice_part()?
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn optional_slice_part(&mut self) -> ParseResult<Option<Box<Expr>>> {
        if matches!(
            self.peek(),
            Some(Token::Colon | Token::Comma | Token::RBracket)
        ) {
            return Ok(None);
        }
        Ok(Some(Box::new(self.test()?)))
    }
}
