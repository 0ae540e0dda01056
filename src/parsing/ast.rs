//! SQL Abstract Syntax Tree with source spans
//!
//! Unlike an executing engine's AST, this one exists to drive text
//! rewriting: every node that a decorator might substitute records the
//! byte range it came from, and INSERT column/value lists record the
//! offset of their closing parenthesis so derived columns can be
//! appended in place.

use crate::types::Value;

/// A byte range `[start, end)` into the original SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// The smallest span covering both spans.
    pub fn union(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A parsed SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    /// A statement outside the rewritten DML surface (DDL and friends).
    /// Lexed only for its placeholder count and forwarded untouched.
    Other(OtherStatement),
}

/// SELECT statement structure.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Expressions to select, or the wildcard.
    pub items: Vec<SelectItem>,
    /// FROM: the table to select from, if any.
    pub from: Option<TableRef>,
    /// WHERE: optional condition to filter rows.
    pub r#where: Option<Expression>,
    /// ORDER BY: expressions to sort by, with direction.
    pub order_by: Vec<(Expression, Direction)>,
    /// LIMIT: maximum number of rows to return.
    pub limit: Option<Expression>,
}

/// A single item in a SELECT projection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// All columns, i.e. `*`.
    Wildcard(Span),
    /// An expression with an optional alias.
    Expression {
        expr: Expression,
        alias: Option<Ident>,
    },
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A table reference with an optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: Ident,
    pub alias: Option<Ident>,
}

/// An explicit INSERT column list, e.g. `(id, ssn)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnList {
    pub columns: Vec<Ident>,
    /// Byte offset of the closing parenthesis: the insertion point for
    /// derived column names.
    pub close: usize,
}

/// One parenthesized VALUES row.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesRow {
    pub values: Vec<Expression>,
    /// Byte offset of the closing parenthesis: the insertion point for
    /// derived values.
    pub close: usize,
}

/// INSERT INTO ... VALUES statement structure.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: TableRef,
    /// Columns to insert into. None means all columns in table order.
    pub columns: Option<ColumnList>,
    pub rows: Vec<ValuesRow>,
}

/// One `column = value` assignment in an UPDATE SET clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Ident,
    pub value: Expression,
    /// Span from the column name through the end of the value expression;
    /// its end is the insertion point for derived assignments.
    pub span: Span,
}

/// UPDATE statement structure.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    pub r#where: Option<Expression>,
}

/// DELETE statement structure.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: TableRef,
    pub r#where: Option<Expression>,
}

/// A passthrough statement, lexed but not structured.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherStatement {
    pub parameter_count: usize,
}

/// A SQL expression with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// A literal value.
    Literal(Literal),
    /// A `?` parameter placeholder with its 0-indexed position.
    Parameter(usize),
    /// A column reference, optionally qualified with a table name.
    Column {
        table: Option<Ident>,
        name: Ident,
    },
    /// A function call, e.g. `count(*)`.
    Function {
        name: Ident,
        args: Vec<Expression>,
    },
    /// `*` as a function argument.
    Wildcard,
    /// A binary operator.
    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Not(Box<Expression>),
    Negate(Box<Expression>),
    /// `expr [NOT] IN (a, b, c)`.
    InList {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },
    /// `expr IS [NOT] NULL`.
    IsNull {
        expr: Box<Expression>,
        negated: bool,
    },
}

/// Expression literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Like,
}

impl Literal {
    /// Converts the literal into a bind value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Integer(i) => Value::I64(*i),
            Literal::Float(f) => Value::F64(*f),
            Literal::String(s) => Value::Str(s.clone()),
        }
    }
}

impl Expression {
    /// Visits this expression and all nested expressions, depth-first.
    pub fn walk(&self, visit: &mut impl FnMut(&Expression)) {
        visit(self);
        match &self.kind {
            ExpressionKind::Literal(_)
            | ExpressionKind::Parameter(_)
            | ExpressionKind::Column { .. }
            | ExpressionKind::Wildcard => {}
            ExpressionKind::Function { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            ExpressionKind::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            ExpressionKind::Not(expr) | ExpressionKind::Negate(expr) => expr.walk(visit),
            ExpressionKind::InList { expr, list, .. } => {
                expr.walk(visit);
                for item in list {
                    item.walk(visit);
                }
            }
            ExpressionKind::IsNull { expr, .. } => expr.walk(visit),
        }
    }
}

impl Statement {
    /// Visits every expression in the statement.
    pub fn walk_expressions(&self, visit: &mut impl FnMut(&Expression)) {
        match self {
            Statement::Select(select) => {
                for item in &select.items {
                    if let SelectItem::Expression { expr, .. } = item {
                        expr.walk(visit);
                    }
                }
                if let Some(clause) = &select.r#where {
                    clause.walk(visit);
                }
                for (expr, _) in &select.order_by {
                    expr.walk(visit);
                }
                if let Some(limit) = &select.limit {
                    limit.walk(visit);
                }
            }
            Statement::Insert(insert) => {
                for row in &insert.rows {
                    for value in &row.values {
                        value.walk(visit);
                    }
                }
            }
            Statement::Update(update) => {
                for assignment in &update.assignments {
                    assignment.value.walk(visit);
                }
                if let Some(clause) = &update.r#where {
                    clause.walk(visit);
                }
            }
            Statement::Delete(delete) => {
                if let Some(clause) = &delete.r#where {
                    clause.walk(visit);
                }
            }
            Statement::Other(_) => {}
        }
    }

    /// The number of `?` placeholders in the statement.
    pub fn parameter_count(&self) -> usize {
        if let Statement::Other(other) = self {
            return other.parameter_count;
        }
        let mut count = 0;
        self.walk_expressions(&mut |expr| {
            if matches!(expr.kind, ExpressionKind::Parameter(_)) {
                count += 1;
            }
        });
        count
    }

    /// The main table the statement targets, if it is structured DML.
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            Statement::Select(select) => select.from.as_ref(),
            Statement::Insert(insert) => Some(&insert.table),
            Statement::Update(update) => Some(&update.table),
            Statement::Delete(delete) => Some(&delete.table),
            Statement::Other(_) => None,
        }
    }
}
