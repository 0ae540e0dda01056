//! SQL lexer emitting tokens with byte-offset spans

use super::ast::Span;
use crate::error::{Error, Result};
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An identifier.
    Ident(String),
    /// A string literal, without the enclosing quotes.
    String(String),
    /// A numeric literal, with the raw text.
    Number(String),
    /// A `?` parameter placeholder.
    Question,
    /// A keyword.
    Keyword(Keyword),
    Period,
    Comma,
    OpenParen,
    CloseParen,
    Semicolon,
    Asterisk,
    Plus,
    Minus,
    Slash,
    Percent,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(ident) => write!(f, "{ident}"),
            Token::String(s) => write!(f, "'{s}'"),
            Token::Number(n) => write!(f, "{n}"),
            Token::Question => write!(f, "?"),
            Token::Keyword(keyword) => write!(f, "{keyword}"),
            Token::Period => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::Semicolon => write!(f, ";"),
            Token::Asterisk => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Equal => write!(f, "="),
            Token::NotEqual => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::LessOrEqual => write!(f, "<="),
            Token::GreaterThan => write!(f, ">"),
            Token::GreaterOrEqual => write!(f, ">="),
        }
    }
}

/// Reserved SQL keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    As,
    Asc,
    By,
    Delete,
    Desc,
    False,
    From,
    In,
    Insert,
    Into,
    Is,
    Like,
    Limit,
    Not,
    Null,
    Or,
    Order,
    Select,
    Set,
    True,
    Update,
    Values,
    Where,
}

impl Keyword {
    /// Looks up a keyword by its (case-insensitive) text.
    fn from_str(ident: &str) -> Option<Self> {
        Some(match ident.to_ascii_uppercase().as_str() {
            "AND" => Keyword::And,
            "AS" => Keyword::As,
            "ASC" => Keyword::Asc,
            "BY" => Keyword::By,
            "DELETE" => Keyword::Delete,
            "DESC" => Keyword::Desc,
            "FALSE" => Keyword::False,
            "FROM" => Keyword::From,
            "IN" => Keyword::In,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "IS" => Keyword::Is,
            "LIKE" => Keyword::Like,
            "LIMIT" => Keyword::Limit,
            "NOT" => Keyword::Not,
            "NULL" => Keyword::Null,
            "OR" => Keyword::Or,
            "ORDER" => Keyword::Order,
            "SELECT" => Keyword::Select,
            "SET" => Keyword::Set,
            "TRUE" => Keyword::True,
            "UPDATE" => Keyword::Update,
            "VALUES" => Keyword::Values,
            "WHERE" => Keyword::Where,
            _ => return None,
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_uppercase())
    }
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::Keyword(keyword)
    }
}

/// The SQL lexer. Iterates over `(token, span)` pairs, where the span is
/// the byte range of the token in the input (string literal spans include
/// the quotes).
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Iterator for Lexer<'_> {
    type Item = Result<(Token, Span)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();
            let &(start, c) = self.chars.peek()?;
            // Line comments start with --; a lone - is the minus token.
            if c == '-' {
                self.chars.next();
                if self.chars.peek().is_some_and(|&(_, c)| c == '-') {
                    self.skip_line_comment();
                    continue;
                }
                return Some(Ok((Token::Minus, self.span_from(start))));
            }
            let token = match c {
                '\'' => self.scan_string(),
                c if c.is_ascii_digit() => Ok(self.scan_number()),
                c if c.is_alphabetic() || c == '_' => Ok(self.scan_ident_or_keyword()),
                _ => self.scan_symbol(),
            };
            return Some(token.map(|token| (token, self.span_from(start))));
        }
    }
}

impl<'a> Lexer<'a> {
    /// Creates a lexer for the given input string.
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// The current byte offset into the input.
    fn pos(&mut self) -> usize {
        self.chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn span_from(&mut self, start: usize) -> Span {
        Span {
            start,
            end: self.pos(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn skip_line_comment(&mut self) {
        for (_, c) in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Scans a single-quoted string literal, with '' as the quote escape.
    fn scan_string(&mut self) -> Result<Token> {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => {
                    // '' is an escaped quote, anything else ends the string
                    if self.chars.next_if(|&(_, c)| c == '\'').is_some() {
                        value.push('\'');
                    } else {
                        return Ok(Token::String(value));
                    }
                }
                Some((_, c)) => value.push(c),
                None => return Err(Error::ParseError("unterminated string literal".into())),
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let mut raw = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
            raw.push(c);
        }
        if let Some((_, c)) = self.chars.next_if(|&(_, c)| c == '.') {
            raw.push(c);
            while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit()) {
                raw.push(c);
            }
        }
        Token::Number(raw)
    }

    fn scan_ident_or_keyword(&mut self) -> Token {
        let mut ident = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| c.is_alphanumeric() || *c == '_')
        {
            ident.push(c);
        }
        match Keyword::from_str(&ident) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(ident),
        }
    }

    fn scan_symbol(&mut self) -> Result<Token> {
        let (_, c) = self.chars.next().expect("peeked");
        Ok(match c {
            '.' => Token::Period,
            ',' => Token::Comma,
            '(' => Token::OpenParen,
            ')' => Token::CloseParen,
            ';' => Token::Semicolon,
            '*' => Token::Asterisk,
            '+' => Token::Plus,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '?' => Token::Question,
            '=' => Token::Equal,
            '!' => {
                if self.chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::NotEqual
                } else {
                    return Err(Error::ParseError("unexpected character !".into()));
                }
            }
            '<' => {
                if self.chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::LessOrEqual
                } else if self.chars.next_if(|&(_, c)| c == '>').is_some() {
                    Token::NotEqual
                } else {
                    Token::LessThan
                }
            }
            '>' => {
                if self.chars.next_if(|&(_, c)| c == '=').is_some() {
                    Token::GreaterOrEqual
                } else {
                    Token::GreaterThan
                }
            }
            c => return Err(Error::ParseError(format!("unexpected character {c}"))),
        })
    }
}
