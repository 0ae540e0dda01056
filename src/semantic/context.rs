//! Statement context derivation
//!
//! The statement context is a pure function of the parsed AST, the raw
//! SQL, the bound parameters, and the table metadata lookup. It captures
//! what decorators need to decide which tokens to emit: the statement
//! kind, the tables and columns it touches, and the placeholder count.
//! The AST itself is shared via Arc rather than copied.

use crate::parsing::ast::{ExpressionKind, Statement};
use crate::types::Catalog;
use std::collections::HashSet;
use std::sync::Arc;

/// Statement kind for quick identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Other,
}

/// Semantic facts derived from one parsed statement.
#[derive(Debug, Clone)]
pub struct StatementContext {
    /// Shared, immutable reference to the parsed AST.
    pub ast: Arc<Statement>,

    /// Table metadata lookup for positional column resolution.
    pub catalog: Arc<Catalog>,

    /// Statement kind.
    pub kind: StatementKind,

    /// The main table the statement targets, if any.
    pub table: Option<String>,

    /// All column names referenced, lowercased.
    pub referenced_columns: HashSet<String>,

    /// Number of `?` placeholders in the statement.
    pub parameter_count: usize,
}

impl StatementContext {
    /// Derives the context for a parsed statement. Pure: no side effects,
    /// and the same inputs always produce the same context.
    pub fn new(ast: Arc<Statement>, catalog: Arc<Catalog>) -> Self {
        let kind = match ast.as_ref() {
            Statement::Select(_) => StatementKind::Select,
            Statement::Insert(_) => StatementKind::Insert,
            Statement::Update(_) => StatementKind::Update,
            Statement::Delete(_) => StatementKind::Delete,
            Statement::Other(_) => StatementKind::Other,
        };
        let table = ast.table().map(|t| t.name.name.clone());
        let parameter_count = ast.parameter_count();
        let referenced_columns = collect_columns(&ast);
        Self {
            ast,
            catalog,
            kind,
            table,
            referenced_columns,
            parameter_count,
        }
    }

    /// Whether the statement references the named column, case-insensitive.
    pub fn references_column(&self, name: &str) -> bool {
        self.referenced_columns.contains(&name.to_ascii_lowercase())
    }
}

fn collect_columns(statement: &Statement) -> HashSet<String> {
    let mut columns = HashSet::new();
    statement.walk_expressions(&mut |expr| {
        if let ExpressionKind::Column { name, .. } = &expr.kind {
            columns.insert(name.name.to_ascii_lowercase());
        }
    });
    match statement {
        Statement::Insert(insert) => {
            if let Some(list) = &insert.columns {
                for column in &list.columns {
                    columns.insert(column.name.to_ascii_lowercase());
                }
            }
        }
        Statement::Update(update) => {
            for assignment in &update.assignments {
                columns.insert(assignment.column.name.to_ascii_lowercase());
            }
        }
        // Select items and predicates are covered by the expression walk.
        _ => {}
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_sql;

    fn context(sql: &str) -> StatementContext {
        let ast = Arc::new(parse_sql(sql).unwrap());
        StatementContext::new(ast, Arc::new(Catalog::new()))
    }

    #[test]
    fn derives_kind_table_and_columns() {
        let ctx = context("SELECT ssn FROM users WHERE id = ? AND Name = 'x'");
        assert_eq!(ctx.kind, StatementKind::Select);
        assert_eq!(ctx.table.as_deref(), Some("users"));
        assert_eq!(ctx.parameter_count, 1);
        assert!(ctx.references_column("ssn"));
        assert!(ctx.references_column("NAME"));
        assert!(!ctx.references_column("missing"));
    }

    #[test]
    fn insert_column_list_counts_as_references() {
        let ctx = context("INSERT INTO users (id, ssn) VALUES (?, ?)");
        assert_eq!(ctx.kind, StatementKind::Insert);
        assert!(ctx.references_column("ssn"));
        assert_eq!(ctx.parameter_count, 2);
    }

    #[test]
    fn other_statement_has_no_table() {
        let ctx = context("DROP TABLE users");
        assert_eq!(ctx.kind, StatementKind::Other);
        assert!(ctx.table.is_none());
    }
}
