//! SQL lexing and parsing
//!
//! The parser produces an AST in which every identifier, literal, and
//! placeholder carries its byte-offset span into the original text. Spans
//! are what the rewrite engine substitutes on, so they are first-class
//! here rather than an afterthought.
//!
//! Only the DML surface the rewriter must see structurally is parsed
//! (SELECT, INSERT ... VALUES, UPDATE, DELETE). Any other statement is
//! lexed for placeholder positions and passed through untouched.

pub mod ast;
mod lexer;
mod parser;

use crate::error::Result;

pub use ast::{Span, Statement};
pub use lexer::{Keyword, Lexer, Token};
pub use parser::Parser;

/// Parse a SQL statement string into an AST.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    Parser::parse(sql)
}
