//! Encrypt rewrite decorator
//!
//! Walks a statement context and contributes tokens and parameter
//! substitutions for every reference to an encrypted column:
//!
//! - INSERT/UPDATE value positions are encrypted in place (parameter
//!   substitution for bound slots, literal replacement otherwise), and
//!   configured assisted/plain columns are appended as derived
//!   column-list and value entries. Derived values are spliced as SQL
//!   literals, never as new placeholders, so the placeholder count of a
//!   rewrite pass never changes.
//! - Predicate and select positions are renamed to the cipher column
//!   when `query_with_cipher_column` is on, otherwise to the plain or
//!   assisted column where configured; compared values are transformed
//!   to match the targeted column. With neither configured the
//!   reference is left untouched, which degrades to fetching cipher
//!   data the caller must not use directly.
//!
//! A statement referencing no encrypted column contributes nothing.

use super::algorithm::{AlgorithmRegistry, EncryptAlgorithm};
use super::rule::{ColumnRule, EncryptRule, TableRule};
use crate::error::{Error, Result};
use crate::parsing::ast::{
    BinaryOp, Expression, ExpressionKind, Ident, InsertStatement, SelectItem, SelectStatement,
    Statement, UpdateStatement,
};
use crate::rewrite::{RewriteContext, RewriteDecorator, SqlToken};
use crate::semantic::StatementContext;
use crate::types::Value;
use std::sync::Arc;

/// How a compared value must be transformed to match the column the
/// predicate was rewritten to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueTransform {
    /// Encrypt: the predicate targets the cipher column.
    Encrypt,
    /// Digest: the predicate targets the assisted-query column.
    Assist,
    /// Leave untouched: the predicate targets a plaintext column.
    Keep,
}

/// The encryption rewrite decorator.
pub struct EncryptDecorator {
    rule: Arc<EncryptRule>,
    algorithms: Arc<AlgorithmRegistry>,
    query_with_cipher_column: bool,
}

impl EncryptDecorator {
    pub fn new(
        rule: Arc<EncryptRule>,
        algorithms: Arc<AlgorithmRegistry>,
        query_with_cipher_column: bool,
    ) -> Self {
        EncryptDecorator {
            rule,
            algorithms,
            query_with_cipher_column,
        }
    }

    fn decorate_insert(
        &self,
        statement: &StatementContext,
        insert: &InsertStatement,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        // Resolve the written column order, falling back to catalog order
        // when the statement names no columns.
        let column_names: Vec<String> = match &insert.columns {
            Some(list) => list.columns.iter().map(|c| c.name.clone()).collect(),
            None => {
                let table_name = &insert.table.name.name;
                let table = statement
                    .catalog
                    .table(table_name)
                    .ok_or_else(|| Error::TableNotFound(table_name.clone()))?;
                table.column_names().map(str::to_string).collect()
            }
        };

        for (index, column_name) in column_names.iter().enumerate() {
            let Some(column_rule) = rule.column(column_name) else {
                continue;
            };
            let algorithm = self.algorithms.get(&column_rule.algorithm)?;

            let derives = column_rule.assisted_query_column.is_some()
                || column_rule.plain_column.is_some();
            if derives && insert.columns.is_none() {
                return Err(Error::ConfigError(format!(
                    "column {column_name} has derived columns configured; \
                     INSERT must name its columns explicitly"
                )));
            }

            if let Some(list) = &insert.columns {
                let ident = &list.columns[index];
                if !ident.name.eq_ignore_ascii_case(&column_rule.cipher_column) {
                    ctx.add_token(SqlToken::replacing(
                        ident.span,
                        column_rule.cipher_column.clone(),
                    ))?;
                }
                if let Some(assisted) = &column_rule.assisted_query_column {
                    ctx.add_token(SqlToken::inserting(list.close, format!(", {assisted}")))?;
                }
                if let Some(plain) = &column_rule.plain_column {
                    ctx.add_token(SqlToken::inserting(list.close, format!(", {plain}")))?;
                }
            }

            for row in &insert.rows {
                let value_expr = row.values.get(index).ok_or_else(|| {
                    Error::InvalidValue(format!(
                        "INSERT row has {} values but column {column_name} is at position {}",
                        row.values.len(),
                        index + 1
                    ))
                })?;
                let plaintext = self.plaintext_of(value_expr, ctx, column_name)?;
                self.substitute_value(value_expr, &plaintext, &*algorithm, ctx, column_name)?;

                // Derived value entries mirror the derived column entries,
                // in the same registration order.
                if column_rule.assisted_query_column.is_some() {
                    let assisted_value = algorithm.assisted_query_value(&plaintext)?;
                    ctx.add_token(SqlToken::inserting(
                        row.close,
                        format!(", {}", assisted_value.to_sql_literal()?),
                    ))?;
                }
                if column_rule.plain_column.is_some() {
                    ctx.add_token(SqlToken::inserting(
                        row.close,
                        format!(", {}", plaintext.to_sql_literal()?),
                    ))?;
                }
            }
        }
        Ok(())
    }

    fn decorate_update(
        &self,
        update: &UpdateStatement,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        for assignment in &update.assignments {
            let column_name = &assignment.column.name;
            let Some(column_rule) = rule.column(column_name) else {
                continue;
            };
            let algorithm = self.algorithms.get(&column_rule.algorithm)?;

            if !column_name.eq_ignore_ascii_case(&column_rule.cipher_column) {
                ctx.add_token(SqlToken::replacing(
                    assignment.column.span,
                    column_rule.cipher_column.clone(),
                ))?;
            }

            let plaintext = self.plaintext_of(&assignment.value, ctx, column_name)?;
            self.substitute_value(&assignment.value, &plaintext, &*algorithm, ctx, column_name)?;

            if let Some(assisted) = &column_rule.assisted_query_column {
                let assisted_value = algorithm.assisted_query_value(&plaintext)?;
                ctx.add_token(SqlToken::inserting(
                    assignment.span.end,
                    format!(", {assisted} = {}", assisted_value.to_sql_literal()?),
                ))?;
            }
            if let Some(plain) = &column_rule.plain_column {
                ctx.add_token(SqlToken::inserting(
                    assignment.span.end,
                    format!(", {plain} = {}", plaintext.to_sql_literal()?),
                ))?;
            }
        }
        self.decorate_where(update.r#where.as_ref(), rule, ctx)
    }

    fn decorate_select(
        &self,
        select: &SelectStatement,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        for item in &select.items {
            if let SelectItem::Expression { expr, .. } = item {
                self.rename_columns(expr, rule, ctx)?;
            }
        }
        self.decorate_where(select.r#where.as_ref(), rule, ctx)?;
        for (expr, _) in &select.order_by {
            self.rename_columns(expr, rule, ctx)?;
        }
        Ok(())
    }

    fn decorate_where(
        &self,
        clause: Option<&Expression>,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        match clause {
            Some(expr) => self.decorate_predicate(expr, rule, ctx),
            None => Ok(()),
        }
    }

    /// Walks a predicate tree. Comparisons of an encrypted column against
    /// a bound parameter or literal get both the column rename and the
    /// value transform; everything else gets name-only renames.
    fn decorate_predicate(
        &self,
        expr: &Expression,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        match &expr.kind {
            ExpressionKind::Binary {
                op: BinaryOp::And | BinaryOp::Or,
                lhs,
                rhs,
            } => {
                self.decorate_predicate(lhs, rule, ctx)?;
                self.decorate_predicate(rhs, rule, ctx)
            }
            ExpressionKind::Not(inner) => self.decorate_predicate(inner, rule, ctx),
            ExpressionKind::Binary {
                op:
                    BinaryOp::Equal
                    | BinaryOp::NotEqual
                    | BinaryOp::LessThan
                    | BinaryOp::LessOrEqual
                    | BinaryOp::GreaterThan
                    | BinaryOp::GreaterOrEqual
                    | BinaryOp::Like,
                lhs,
                rhs,
            } => match (&lhs.kind, &rhs.kind) {
                (ExpressionKind::Column { name, .. }, _) if is_value(rhs) => {
                    self.decorate_comparison(name, rhs, rule, ctx)
                }
                (_, ExpressionKind::Column { name, .. }) if is_value(lhs) => {
                    self.decorate_comparison(name, lhs, rule, ctx)
                }
                _ => {
                    self.rename_columns(lhs, rule, ctx)?;
                    self.rename_columns(rhs, rule, ctx)
                }
            },
            ExpressionKind::InList { expr: inner, list, .. } => {
                if let ExpressionKind::Column { name, .. } = &inner.kind {
                    for item in list {
                        if !is_value(item) {
                            self.rename_columns(item, rule, ctx)?;
                        }
                    }
                    for item in list.iter().filter(|item| is_value(item)) {
                        self.decorate_comparison_value(name, item, rule, ctx)?;
                    }
                    self.rename_column(name, rule, ctx)
                } else {
                    self.rename_columns(inner, rule, ctx)?;
                    for item in list {
                        self.rename_columns(item, rule, ctx)?;
                    }
                    Ok(())
                }
            }
            ExpressionKind::IsNull { expr: inner, .. } => self.rename_columns(inner, rule, ctx),
            _ => self.rename_columns(expr, rule, ctx),
        }
    }

    /// One `column <op> value` comparison: rename plus value transform.
    fn decorate_comparison(
        &self,
        column: &Ident,
        value: &Expression,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        self.decorate_comparison_value(column, value, rule, ctx)?;
        self.rename_column(column, rule, ctx)
    }

    /// Transforms one compared value without renaming the column (IN
    /// lists rename once but transform every element).
    fn decorate_comparison_value(
        &self,
        column: &Ident,
        value: &Expression,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        let Some(column_rule) = rule.column(&column.name) else {
            return Ok(());
        };
        let algorithm = self.algorithms.get(&column_rule.algorithm)?;
        let transform = self.value_transform(column_rule);
        if transform == ValueTransform::Keep {
            return Ok(());
        }
        let plaintext = self.plaintext_of(value, ctx, &column.name)?;
        let transformed = match transform {
            ValueTransform::Encrypt => algorithm.encrypt(&plaintext)?,
            ValueTransform::Assist => algorithm.assisted_query_value(&plaintext)?,
            ValueTransform::Keep => unreachable!("handled above"),
        };
        match &value.kind {
            ExpressionKind::Parameter(slot) => ctx.add_parameter_substitution(*slot, transformed),
            ExpressionKind::Literal(_) => ctx.add_token(SqlToken::replacing(
                value.span,
                transformed.to_sql_literal()?,
            )),
            _ => Err(Error::ValueNotEncryptable(format!(
                "encrypted column {} compared to an expression, not a value",
                column.name
            ))),
        }
    }

    /// Renames every encrypted column referenced anywhere in the
    /// expression, without touching values.
    fn rename_columns(
        &self,
        expr: &Expression,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        let mut idents = Vec::new();
        expr.walk(&mut |e| {
            if let ExpressionKind::Column { name, .. } = &e.kind {
                idents.push(name.clone());
            }
        });
        for ident in &idents {
            self.rename_column(ident, rule, ctx)?;
        }
        Ok(())
    }

    fn rename_column(
        &self,
        ident: &Ident,
        rule: &TableRule,
        ctx: &mut RewriteContext<'_>,
    ) -> Result<()> {
        let Some(column_rule) = rule.column(&ident.name) else {
            return Ok(());
        };
        // Resolve the algorithm even for a name-only rewrite, so missing
        // configuration surfaces before the backend sees the statement.
        self.algorithms.get(&column_rule.algorithm)?;
        let target = self.query_target(column_rule, &ident.name);
        if !ident.name.eq_ignore_ascii_case(target) {
            ctx.add_token(SqlToken::replacing(ident.span, target.to_string()))?;
        }
        Ok(())
    }

    /// The physical column a read position targets under the current mode.
    fn query_target<'r>(&self, rule: &'r ColumnRule, logical: &'r str) -> &'r str {
        if self.query_with_cipher_column {
            &rule.cipher_column
        } else if let Some(plain) = &rule.plain_column {
            plain
        } else if let Some(assisted) = &rule.assisted_query_column {
            assisted
        } else {
            logical
        }
    }

    fn value_transform(&self, rule: &ColumnRule) -> ValueTransform {
        if self.query_with_cipher_column {
            ValueTransform::Encrypt
        } else if rule.plain_column.is_some() {
            ValueTransform::Keep
        } else if rule.assisted_query_column.is_some() {
            ValueTransform::Assist
        } else {
            ValueTransform::Keep
        }
    }

    /// The plaintext behind a value expression: the bound parameter for a
    /// placeholder, the literal value otherwise.
    fn plaintext_of(
        &self,
        value: &Expression,
        ctx: &RewriteContext<'_>,
        column_name: &str,
    ) -> Result<Value> {
        match &value.kind {
            ExpressionKind::Parameter(slot) => {
                ctx.parameters().get(*slot).cloned().ok_or_else(|| {
                    Error::Internal(format!(
                        "placeholder {slot} for column {column_name} has no bound parameter"
                    ))
                })
            }
            ExpressionKind::Literal(literal) => Ok(literal.to_value()),
            _ => Err(Error::ValueNotEncryptable(format!(
                "column {column_name} is bound to an expression, not a value"
            ))),
        }
    }

    /// Encrypts a value position in place: parameter slots are
    /// substituted, literals replaced in the text.
    fn substitute_value(
        &self,
        value: &Expression,
        plaintext: &Value,
        algorithm: &dyn EncryptAlgorithm,
        ctx: &mut RewriteContext<'_>,
        column_name: &str,
    ) -> Result<()> {
        match &value.kind {
            ExpressionKind::Parameter(slot) => {
                ctx.add_parameter_substitution(*slot, algorithm.encrypt(plaintext)?)
            }
            ExpressionKind::Literal(_) => ctx.add_token(SqlToken::replacing(
                value.span,
                algorithm.encrypt(plaintext)?.to_sql_literal()?,
            )),
            _ => Err(Error::ValueNotEncryptable(format!(
                "column {column_name} is bound to an expression, not a value"
            ))),
        }
    }
}

fn is_value(expr: &Expression) -> bool {
    matches!(
        expr.kind,
        ExpressionKind::Parameter(_) | ExpressionKind::Literal(_)
    )
}

impl RewriteDecorator for EncryptDecorator {
    fn decorate(
        &self,
        statement: &StatementContext,
        context: &mut RewriteContext<'_>,
    ) -> Result<()> {
        let Some(table_name) = statement.table.as_deref() else {
            return Ok(());
        };
        let Some(table_rule) = self.rule.table(table_name) else {
            return Ok(());
        };
        if table_rule.is_empty() {
            return Ok(());
        }
        match statement.ast.as_ref() {
            Statement::Insert(insert) => self.decorate_insert(statement, insert, table_rule, context),
            Statement::Update(update) => self.decorate_update(update, table_rule, context),
            Statement::Select(select) => self.decorate_select(select, table_rule, context),
            Statement::Delete(delete) => {
                self.decorate_where(delete.r#where.as_ref(), table_rule, context)
            }
            Statement::Other(_) => Ok(()),
        }
    }
}
