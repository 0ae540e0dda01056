//! Recursive-descent SQL parser
//!
//! Parses the DML surface the rewriter needs to see structurally and
//! numbers `?` placeholders in lexical order as it goes. Statements with
//! any other leading token are drained through the lexer, counting
//! placeholders, and represented as passthrough.

use std::iter::Peekable;

use super::ast::{
    Assignment, BinaryOp, ColumnList, DeleteStatement, Direction, Expression, ExpressionKind,
    Ident, InsertStatement, Literal, OtherStatement, SelectItem, SelectStatement, Span, Statement,
    TableRef, UpdateStatement, ValuesRow,
};
use super::{Keyword, Lexer, Token};
use crate::error::{Error, Result};

/// The SQL parser. Takes spanned tokens from the lexer and builds the
/// span-carrying AST. It only ensures the syntax is well-formed; whether
/// tables or columns exist is the job of the statement context.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    /// Counter for parameter placeholders (?).
    param_count: usize,
}

impl Parser<'_> {
    /// Parses the input string into a single SQL statement AST, ending
    /// with an optional semicolon.
    pub fn parse(statement: &str) -> Result<Statement> {
        let mut parser = Self::new(statement);
        let statement = parser.parse_statement()?;
        if matches!(statement, Statement::Other(_)) {
            // Passthrough statements drain the lexer entirely.
            return Ok(statement);
        }
        parser.skip(Token::Semicolon);
        if let Some((token, _)) = parser.lexer.next().transpose()? {
            return Err(Error::ParseError(format!("unexpected token {token}")));
        }
        Ok(statement)
    }

    /// Parses the input string into a single SQL expression AST. Only used
    /// in tests.
    #[cfg(test)]
    pub fn parse_expr(expr: &str) -> Result<Expression> {
        let mut parser = Self::new(expr);
        let expression = parser.parse_expression()?;
        if let Some((token, _)) = parser.lexer.next().transpose()? {
            return Err(Error::ParseError(format!("unexpected token {token}")));
        }
        Ok(expression)
    }

    fn new(input: &str) -> Parser<'_> {
        Parser {
            lexer: Lexer::new(input).peekable(),
            param_count: 0,
        }
    }

    /// Fetches the next token, or errors if none is found.
    fn next(&mut self) -> Result<(Token, Span)> {
        self.lexer
            .next()
            .transpose()?
            .ok_or_else(|| Error::ParseError("unexpected end of input".into()))
    }

    /// Peeks the next token if any.
    fn peek(&mut self) -> Result<Option<&Token>> {
        match self.lexer.peek() {
            Some(Ok((token, _))) => Ok(Some(token)),
            Some(Err(err)) => Err(err.clone()),
            None => Ok(None),
        }
    }

    /// Returns the next identifier, or errors if not found.
    fn next_ident(&mut self) -> Result<Ident> {
        match self.next()? {
            (Token::Ident(name), span) => Ok(Ident { name, span }),
            (token, _) => Err(Error::ParseError(format!(
                "expected identifier, got {token}"
            ))),
        }
    }

    /// Consumes the next token if it is an identifier.
    fn next_if_ident(&mut self) -> Option<Ident> {
        if !matches!(self.peek(), Ok(Some(Token::Ident(_)))) {
            return None;
        }
        match self.next() {
            Ok((Token::Ident(name), span)) => Some(Ident { name, span }),
            _ => None,
        }
    }

    /// Consumes the next token if it equals the given one, returning its span.
    fn next_if_token(&mut self, token: Token) -> Option<Span> {
        match self.peek() {
            Ok(Some(t)) if *t == token => {}
            _ => return None,
        }
        self.next().ok().map(|(_, span)| span)
    }

    /// Consumes the next token if it equals the given one, returning true.
    fn next_is(&mut self, token: Token) -> bool {
        self.next_if_token(token).is_some()
    }

    /// Consumes the next token if it's the expected one, or errors.
    fn expect(&mut self, expect: Token) -> Result<Span> {
        let (token, span) = self.next()?;
        if token != expect {
            return Err(Error::ParseError(format!(
                "expected token {expect}, found {token}"
            )));
        }
        Ok(span)
    }

    /// Consumes the next token if it is the given token.
    fn skip(&mut self, token: Token) {
        self.next_is(token);
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let Some(token) = self.peek()? else {
            return Err(Error::ParseError("unexpected end of input".into()));
        };
        match token {
            Token::Keyword(Keyword::Select) => self.parse_select().map(Statement::Select),
            Token::Keyword(Keyword::Insert) => self.parse_insert().map(Statement::Insert),
            Token::Keyword(Keyword::Update) => self.parse_update().map(Statement::Update),
            Token::Keyword(Keyword::Delete) => self.parse_delete().map(Statement::Delete),
            _ => self.parse_other().map(Statement::Other),
        }
    }

    /// Drains an unstructured statement, keeping only its placeholder count.
    fn parse_other(&mut self) -> Result<OtherStatement> {
        let mut parameter_count = 0;
        while let Some((token, _)) = self.lexer.next().transpose()? {
            if token == Token::Question {
                parameter_count += 1;
            }
        }
        Ok(OtherStatement { parameter_count })
    }

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(Keyword::Select.into())?;
        let mut items = Vec::new();
        loop {
            if let Some(span) = self.next_if_token(Token::Asterisk) {
                items.push(SelectItem::Wildcard(span));
            } else {
                let expr = self.parse_expression()?;
                let alias = if self.next_is(Keyword::As.into()) {
                    Some(self.next_ident()?)
                } else {
                    self.next_if_ident()
                };
                items.push(SelectItem::Expression { expr, alias });
            }
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        let from = if self.next_is(Keyword::From.into()) {
            Some(self.parse_table_ref()?)
        } else {
            None
        };
        let r#where = if self.next_is(Keyword::Where.into()) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let mut order_by = Vec::new();
        if self.next_is(Keyword::Order.into()) {
            self.expect(Keyword::By.into())?;
            loop {
                let expr = self.parse_expression()?;
                let direction = if self.next_is(Keyword::Desc.into()) {
                    Direction::Descending
                } else {
                    self.skip(Keyword::Asc.into());
                    Direction::Ascending
                };
                order_by.push((expr, direction));
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
        }
        let limit = if self.next_is(Keyword::Limit.into()) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(SelectStatement {
            items,
            from,
            r#where,
            order_by,
            limit,
        })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let name = self.next_ident()?;
        let alias = if self.next_is(Keyword::As.into()) {
            Some(self.next_ident()?)
        } else {
            self.next_if_ident()
        };
        Ok(TableRef { name, alias })
    }

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(Keyword::Insert.into())?;
        self.expect(Keyword::Into.into())?;
        let table = TableRef {
            name: self.next_ident()?,
            alias: None,
        };
        let columns = if self.next_if_token(Token::OpenParen).is_some() {
            let mut columns = Vec::new();
            loop {
                columns.push(self.next_ident()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            let close = self.expect(Token::CloseParen)?.start;
            Some(ColumnList { columns, close })
        } else {
            None
        };
        self.expect(Keyword::Values.into())?;
        let mut rows = Vec::new();
        loop {
            self.expect(Token::OpenParen)?;
            let mut values = Vec::new();
            loop {
                values.push(self.parse_expression()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            let close = self.expect(Token::CloseParen)?.start;
            rows.push(ValuesRow { values, close });
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(InsertStatement {
            table,
            columns,
            rows,
        })
    }

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(Keyword::Update.into())?;
        let table = TableRef {
            name: self.next_ident()?,
            alias: None,
        };
        self.expect(Keyword::Set.into())?;
        let mut assignments = Vec::new();
        loop {
            let column = self.next_ident()?;
            self.expect(Token::Equal)?;
            let value = self.parse_expression()?;
            let span = column.span.union(value.span);
            assignments.push(Assignment {
                column,
                value,
                span,
            });
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        let r#where = if self.next_is(Keyword::Where.into()) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(UpdateStatement {
            table,
            assignments,
            r#where,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(Keyword::Delete.into())?;
        self.expect(Keyword::From.into())?;
        let table = TableRef {
            name: self.next_ident()?,
            alias: None,
        };
        let r#where = if self.next_is(Keyword::Where.into()) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(DeleteStatement { table, r#where })
    }

    fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_and()?;
        while self.next_is(Keyword::Or.into()) {
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_not()?;
        while self.next_is(Keyword::And.into()) {
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expression> {
        if let Some(not_span) = self.next_if_token(Keyword::Not.into()) {
            let expr = self.parse_not()?;
            let span = not_span.union(expr.span);
            return Ok(Expression {
                kind: ExpressionKind::Not(Box::new(expr)),
                span,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let lhs = self.parse_additive()?;

        if self.next_is(Keyword::Is.into()) {
            let negated = self.next_is(Keyword::Not.into());
            let null_span = self.expect(Keyword::Null.into())?;
            let span = lhs.span.union(null_span);
            return Ok(Expression {
                kind: ExpressionKind::IsNull {
                    expr: Box::new(lhs),
                    negated,
                },
                span,
            });
        }

        // a [NOT] IN (...) and a [NOT] LIKE b
        let negated = self.next_is(Keyword::Not.into());
        if self.next_is(Keyword::In.into()) {
            self.expect(Token::OpenParen)?;
            let mut list = Vec::new();
            loop {
                list.push(self.parse_expression()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            let close = self.expect(Token::CloseParen)?;
            let span = lhs.span.union(close);
            return Ok(Expression {
                kind: ExpressionKind::InList {
                    expr: Box::new(lhs),
                    list,
                    negated,
                },
                span,
            });
        }
        if self.next_is(Keyword::Like.into()) {
            let rhs = self.parse_additive()?;
            let like = binary(BinaryOp::Like, lhs, rhs);
            if negated {
                let span = like.span;
                return Ok(Expression {
                    kind: ExpressionKind::Not(Box::new(like)),
                    span,
                });
            }
            return Ok(like);
        }
        if negated {
            return Err(Error::ParseError("expected IN or LIKE after NOT".into()));
        }

        let op = match self.peek()? {
            Some(Token::Equal) => Some(BinaryOp::Equal),
            Some(Token::NotEqual) => Some(BinaryOp::NotEqual),
            Some(Token::LessThan) => Some(BinaryOp::LessThan),
            Some(Token::LessOrEqual) => Some(BinaryOp::LessOrEqual),
            Some(Token::GreaterThan) => Some(BinaryOp::GreaterThan),
            Some(Token::GreaterOrEqual) => Some(BinaryOp::GreaterOrEqual),
            _ => None,
        };
        if let Some(op) = op {
            self.next()?;
            let rhs = self.parse_additive()?;
            return Ok(binary(op, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek()? {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.next()?;
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek()? {
                Some(Token::Asterisk) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                Some(Token::Percent) => BinaryOp::Remainder,
                _ => break,
            };
            self.next()?;
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        if let Some(minus_span) = self.next_if_token(Token::Minus) {
            let expr = self.parse_unary()?;
            let span = minus_span.union(expr.span);
            return Ok(Expression {
                kind: ExpressionKind::Negate(Box::new(expr)),
                span,
            });
        }
        if self.next_is(Token::Plus) {
            return self.parse_unary();
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expression> {
        let (token, span) = self.next()?;
        let kind = match token {
            Token::Number(raw) if raw.contains('.') => {
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| Error::ParseError(format!("invalid number {raw}")))?;
                ExpressionKind::Literal(Literal::Float(value))
            }
            Token::Number(raw) => {
                let value = raw
                    .parse::<i64>()
                    .map_err(|_| Error::ParseError(format!("invalid number {raw}")))?;
                ExpressionKind::Literal(Literal::Integer(value))
            }
            Token::String(s) => ExpressionKind::Literal(Literal::String(s)),
            Token::Question => {
                let index = self.param_count;
                self.param_count += 1;
                ExpressionKind::Parameter(index)
            }
            Token::Keyword(Keyword::Null) => ExpressionKind::Literal(Literal::Null),
            Token::Keyword(Keyword::True) => ExpressionKind::Literal(Literal::Boolean(true)),
            Token::Keyword(Keyword::False) => ExpressionKind::Literal(Literal::Boolean(false)),
            Token::OpenParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::CloseParen)?;
                return Ok(expr);
            }
            Token::Ident(name) => {
                let ident = Ident { name, span };
                if self.next_if_token(Token::Period).is_some() {
                    let column = self.next_ident()?;
                    let span = ident.span.union(column.span);
                    return Ok(Expression {
                        kind: ExpressionKind::Column {
                            table: Some(ident),
                            name: column,
                        },
                        span,
                    });
                }
                if self.next_if_token(Token::OpenParen).is_some() {
                    let mut args = Vec::new();
                    if self.peek()? != Some(&Token::CloseParen) {
                        loop {
                            if let Some(star) = self.next_if_token(Token::Asterisk) {
                                args.push(Expression {
                                    kind: ExpressionKind::Wildcard,
                                    span: star,
                                });
                            } else {
                                args.push(self.parse_expression()?);
                            }
                            if !self.next_is(Token::Comma) {
                                break;
                            }
                        }
                    }
                    let close = self.expect(Token::CloseParen)?;
                    let span = ident.span.union(close);
                    return Ok(Expression {
                        kind: ExpressionKind::Function { name: ident, args },
                        span,
                    });
                }
                let span = ident.span;
                return Ok(Expression {
                    kind: ExpressionKind::Column {
                        table: None,
                        name: ident,
                    },
                    span,
                });
            }
            token => return Err(Error::ParseError(format!("unexpected token {token}"))),
        };
        Ok(Expression { kind, span })
    }
}

fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
    let span = lhs.span.union(rhs.span);
    Expression {
        kind: ExpressionKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_with_spans() {
        let sql = "INSERT INTO users (id, ssn) VALUES (?, ?)";
        let Statement::Insert(insert) = Parser::parse(sql).unwrap() else {
            panic!("expected insert");
        };
        assert_eq!(insert.table.name.name, "users");
        let columns = insert.columns.unwrap();
        assert_eq!(columns.columns[1].name, "ssn");
        assert_eq!(columns.columns[1].span, Span { start: 23, end: 26 });
        assert_eq!(columns.close, 26);
        assert_eq!(insert.rows.len(), 1);
        assert_eq!(insert.rows[0].close, 40);
        assert_eq!(
            insert.rows[0].values[1].kind,
            ExpressionKind::Parameter(1)
        );
    }

    #[test]
    fn parses_multi_row_insert() {
        let sql = "INSERT INTO t VALUES (1, 'a'), (2, 'b')";
        let Statement::Insert(insert) = Parser::parse(sql).unwrap() else {
            panic!("expected insert");
        };
        assert!(insert.columns.is_none());
        assert_eq!(insert.rows.len(), 2);
        assert_eq!(
            insert.rows[1].values[1].kind,
            ExpressionKind::Literal(Literal::String("b".into()))
        );
    }

    #[test]
    fn numbers_placeholders_in_lexical_order() {
        let sql = "UPDATE t SET a = ?, b = ? WHERE c = ?";
        let statement = Parser::parse(sql).unwrap();
        assert_eq!(statement.parameter_count(), 3);
        let Statement::Update(update) = statement else {
            panic!("expected update");
        };
        assert_eq!(
            update.assignments[1].value.kind,
            ExpressionKind::Parameter(1)
        );
    }

    #[test]
    fn parses_predicates() {
        let expr = Parser::parse_expr("a = 1 AND b IN (2, 3) OR NOT c LIKE 'x%'").unwrap();
        let ExpressionKind::Binary { op: BinaryOp::Or, .. } = expr.kind else {
            panic!("expected OR at the root, got {:?}", expr.kind);
        };
    }

    #[test]
    fn is_null_and_qualified_columns() {
        let expr = Parser::parse_expr("u.ssn IS NOT NULL").unwrap();
        let ExpressionKind::IsNull { expr: inner, negated: true } = expr.kind else {
            panic!("expected IS NOT NULL");
        };
        let ExpressionKind::Column { table: Some(table), name } = inner.kind else {
            panic!("expected qualified column");
        };
        assert_eq!(table.name, "u");
        assert_eq!(name.name, "ssn");
    }

    #[test]
    fn other_statements_pass_through_with_param_count() {
        let statement = Parser::parse("CREATE TABLE t (id INTEGER)").unwrap();
        assert!(matches!(statement, Statement::Other(_)));
        let statement = Parser::parse("CALL do_thing(?, ?)").unwrap();
        assert_eq!(statement.parameter_count(), 2);
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(Parser::parse("SELECT a FROM t extra garbage here").is_err());
        assert!(Parser::parse("SELECT a FROM t;").is_ok());
    }
}
