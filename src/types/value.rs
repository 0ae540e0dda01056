//! SQL bind values
//!
//! Values flow through the engine opaquely: the rewriter replaces them but
//! never evaluates them. The variants cover what a relational backend binds
//! through a prepared-statement interface.

use crate::error::{Error, Result};
use crate::types::DataType;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of values returned by the backend.
pub type Row = Vec<Value>;

/// A SQL bind or result value.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Decimal(Decimal),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
    Bytea(Vec<u8>),
}

impl Value {
    /// The data type of this value, None for NULL.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(DataType::Boolean),
            Value::I64(_) => Some(DataType::Integer),
            Value::F64(_) => Some(DataType::Float),
            Value::Decimal(_) => Some(DataType::Decimal),
            Value::Str(_) => Some(DataType::Text),
            Value::Date(_) => Some(DataType::Date),
            Value::Time(_) => Some(DataType::Time),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Uuid(_) => Some(DataType::Uuid),
            Value::Bytea(_) => Some(DataType::Bytea),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders this value as a SQL literal, suitable for splicing into
    /// rewritten SQL text. Strings are quoted with `''` escaping, byte
    /// arrays use the `X'..'` hex literal form.
    pub fn to_sql_literal(&self) -> Result<String> {
        match self {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Value::I64(i) => Ok(i.to_string()),
            Value::F64(f) => {
                if f.is_finite() {
                    Ok(f.to_string())
                } else {
                    Err(Error::InvalidValue(format!(
                        "non-finite float {f} has no SQL literal form"
                    )))
                }
            }
            Value::Decimal(d) => Ok(d.to_string()),
            Value::Str(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
            Value::Date(d) => Ok(format!("DATE '{d}'")),
            Value::Time(t) => Ok(format!("TIME '{t}'")),
            Value::Timestamp(ts) => Ok(format!("TIMESTAMP '{ts}'")),
            Value::Uuid(u) => Ok(format!("'{u}'")),
            Value::Bytea(bytes) => Ok(format!("X'{}'", hex_encode(bytes))),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::I64(i) => write!(f, "I64({i})"),
            Value::F64(v) => write!(f, "F64({v})"),
            Value::Decimal(d) => write!(f, "Decimal({d})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Date(d) => write!(f, "Date({d})"),
            Value::Time(t) => write!(f, "Time({t})"),
            Value::Timestamp(ts) => write!(f, "Timestamp({ts})"),
            Value::Uuid(u) => write!(f, "Uuid({u})"),
            Value::Bytea(b) => write!(f, "Bytea({})", hex_encode(b)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Null => write!(f, "NULL"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytea(bytes)
    }
}
