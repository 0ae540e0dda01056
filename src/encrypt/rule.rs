//! Column-level encryption rule metadata
//!
//! A rule maps a logical column to the physical columns that store it:
//! the cipher column always, plus an optional assisted-query column
//! (a deterministic searchable digest) and an optional plain column.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Encryption configuration for one logical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    /// The physical column storing the encrypted form.
    pub cipher_column: String,
    /// Optional column storing a deterministic, searchable digest used to
    /// support equality predicates without exposing plaintext.
    pub assisted_query_column: Option<String>,
    /// Optional column keeping the plaintext alongside the cipher form,
    /// typically during migration.
    pub plain_column: Option<String>,
    /// Name of the registered algorithm to encrypt with.
    pub algorithm: String,
}

impl ColumnRule {
    pub fn new(cipher_column: impl Into<String>, algorithm: impl Into<String>) -> Self {
        ColumnRule {
            cipher_column: cipher_column.into(),
            assisted_query_column: None,
            plain_column: None,
            algorithm: algorithm.into(),
        }
    }

    pub fn with_assisted_query_column(mut self, column: impl Into<String>) -> Self {
        self.assisted_query_column = Some(column.into());
        self
    }

    pub fn with_plain_column(mut self, column: impl Into<String>) -> Self {
        self.plain_column = Some(column.into());
        self
    }
}

/// Encryption rules for one table, keyed by lowercased logical column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRule {
    columns: HashMap<String, ColumnRule>,
}

impl TableRule {
    /// The rule for a logical column, case-insensitive.
    pub fn column(&self, name: &str) -> Option<&ColumnRule> {
        self.columns.get(&name.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encryption rules across tables, keyed case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncryptRule {
    tables: HashMap<String, TableRule>,
}

impl EncryptRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a rule for `table.logical_column`.
    pub fn add_column(&mut self, table: &str, logical_column: &str, rule: ColumnRule) {
        self.tables
            .entry(table.to_ascii_lowercase())
            .or_default()
            .columns
            .insert(logical_column.to_ascii_lowercase(), rule);
    }

    /// The rules for a table, if any column in it is encrypted.
    pub fn table(&self, name: &str) -> Option<&TableRule> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// The rule for a single column reference.
    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnRule> {
        self.table(table).and_then(|t| t.column(column))
    }
}
