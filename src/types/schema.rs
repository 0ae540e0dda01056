//! Table metadata as loaded from the backend catalog
//!
//! The middleware only needs column names and order: enough for the
//! encrypt decorator to resolve positional INSERT columns. Constraint
//! enforcement stays with the backend.

use crate::error::{Error, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A table schema as seen by the rewriter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The table name. Can't be empty.
    pub name: String,
    /// The table's columns, in definition order.
    pub columns: Vec<Column>,
}

/// A column in a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidValue("table name cannot be empty".into()));
        }
        Ok(Table { name, columns })
    }

    /// Index of the named column, case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Column names in definition order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Column {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Table metadata lookup, keyed case-insensitively by table name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    tables: HashMap<String, Table>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.to_ascii_lowercase(), table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_is_case_insensitive() {
        let table = Table::new(
            "Users",
            vec![
                Column::new("id", DataType::Integer, false),
                Column::new("ssn", DataType::Text, true),
            ],
        )
        .unwrap();
        assert_eq!(table.column_index("SSN"), Some(1));

        let mut catalog = Catalog::new();
        catalog.add_table(table);
        assert!(catalog.table("USERS").is_some());
        assert!(catalog.table("orders").is_none());
    }

    #[test]
    fn empty_table_name_is_rejected() {
        assert!(Table::new("", Vec::new()).is_err());
    }
}
