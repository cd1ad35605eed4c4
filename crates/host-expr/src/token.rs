//! Lexer for host expressions.

use logos::{Lexer, Logos};
use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

use crate::error::SyntaxError;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("in")]
    In,
    #[token("is")]
    Is,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("lambda")]
    Lambda,
    #[token("None")]
    None,
    #[token("True")]
    True,
    #[token("False")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| SmolStr::new(lex.slice()))]
    Name(SmolStr),

    #[regex(r"[0-9][0-9_]*", |lex| parse_int(lex.slice(), 10))]
    #[regex(r"0[xX][0-9a-fA-F_]+", |lex| parse_int(&lex.slice()[2..], 16))]
    Int(i64),

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", parse_float)]
    Float(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#, single_quoted)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, single_quoted)]
    #[token("\"\"\"", |lex| triple_quoted(lex, "\"\"\""))]
    #[token("'''", |lex| triple_quoted(lex, "'''"))]
    Str(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::And => "and",
            Token::Or => "or",
            Token::Not => "not",
            Token::In => "in",
            Token::Is => "is",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::Lambda => "lambda",
            Token::None => "None",
            Token::True => "True",
            Token::False => "False",
            Token::Name(name) => return f.write_str(name),
            Token::Int(value) => return write!(f, "{}", value),
            Token::Float(value) => return write!(f, "{}", value),
            Token::Str(_) => "string literal",
        };
        f.write_str(text)
    }
}

fn parse_int(digits: &str, radix: u32) -> Option<i64> {
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    i64::from_str_radix(&digits, radix).ok()
}

fn parse_float(lex: &mut Lexer<Token>) -> Option<f64> {
    let digits: String = lex.slice().chars().filter(|&c| c != '_').collect();
    digits.parse().ok()
}

fn single_quoted(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

/// Scan to the closing triple quote; the opening one is already consumed.
fn triple_quoted(lex: &mut Lexer<Token>, delimiter: &str) -> Option<String> {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if rest[i..].starts_with(delimiter) {
            let body = unescape(&rest[..i]);
            lex.bump(i + delimiter.len());
            return Some(body);
        }
    }
    None
}

/// Resolve backslash escapes. Unknown escapes keep their backslash.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some(kind @ ('x' | 'u')) => {
                let width = if kind == 'x' { 2 } else { 4 };
                let hex: String = (0..width).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == width => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Tokenize `source`, failing at the first character that starts no token.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, SyntaxError> {
    let mut tokens = Vec::new();
    for (token, span) in Token::lexer(source).spanned() {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let found = &source[span.clone()];
                let message = if found.starts_with(|c: char| c == '"' || c == '\'') {
                    "unterminated string literal".to_string()
                } else {
                    format!("invalid syntax near {:?}", found)
                };
                return Err(SyntaxError::new(message, span.start));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_operators_prefer_longest_match() {
        assert_eq!(
            kinds("a ** b // c <= d"),
            vec![
                Token::Name("a".into()),
                Token::DoubleStar,
                Token::Name("b".into()),
                Token::DoubleSlash,
                Token::Name("c".into()),
                Token::LtEq,
                Token::Name("d".into()),
            ]
        );
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            kinds("not nothing is None"),
            vec![
                Token::Not,
                Token::Name("nothing".into()),
                Token::Is,
                Token::None,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1_000 0x1f 2.5 .5 1e3 3."),
            vec![
                Token::Int(1000),
                Token::Int(31),
                Token::Float(2.5),
                Token::Float(0.5),
                Token::Float(1000.0),
                Token::Float(3.0),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds(r#"'a\'b' "c\n" '''x"y''' """p
q""""#),
            vec![
                Token::Str("a'b".into()),
                Token::Str("c\n".into()),
                Token::Str("x\"y".into()),
                Token::Str("p\nq".into()),
            ]
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"\x41é\q"), "Aé\\q");
    }

    #[test]
    fn test_lex_errors() {
        let err = tokenize("a + 'open").unwrap_err();
        assert_eq!(err.offset, 4);
        assert_eq!(err.message, "unterminated string literal");
        assert!(tokenize("a $ b").is_err());
        assert!(tokenize("'''never closed").is_err());
    }
}
