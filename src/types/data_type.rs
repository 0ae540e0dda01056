//! SQL data types as seen by the middleware catalog

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data types for catalog columns. The middleware never evaluates SQL
/// expressions, so this is the storage-facing surface only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Decimal,
    Text,
    Date,
    Time,
    Timestamp,
    Uuid,
    Bytea,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Decimal => "DECIMAL",
            DataType::Text => "TEXT",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Uuid => "UUID",
            DataType::Bytea => "BYTEA",
        };
        write!(f, "{name}")
    }
}
