//! Session-level configuration properties
//!
//! Two options are recognized: `QUERY_WITH_CIPHER_COLUMN` selects whether
//! read queries target the cipher column directly or an assisted/plain
//! column, and `SQL_SHOW` gates the rewritten-SQL trace.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Property key controlling predicate/select column-name substitution.
pub const QUERY_WITH_CIPHER_COLUMN: &str = "QUERY_WITH_CIPHER_COLUMN";

/// Property key controlling rewritten-SQL trace emission.
pub const SQL_SHOW: &str = "SQL_SHOW";

/// Configuration consumed by the execution session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProps {
    /// Whether read queries target the cipher column directly. When false,
    /// encrypted column references degrade to the plain or assisted-query
    /// column where configured.
    pub query_with_cipher_column: bool,

    /// Whether to emit the rewritten SQL through the diagnostics sink.
    pub sql_show: bool,
}

impl Default for SessionProps {
    fn default() -> Self {
        Self {
            query_with_cipher_column: true,
            sql_show: false,
        }
    }
}

impl SessionProps {
    /// Builds properties from a string map, e.g. loaded from middleware
    /// configuration. Unrecognized keys are rejected rather than ignored.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let mut props = Self::default();
        for (key, value) in properties {
            match key.as_str() {
                QUERY_WITH_CIPHER_COLUMN => {
                    props.query_with_cipher_column = parse_bool(key, value)?
                }
                SQL_SHOW => props.sql_show = parse_bool(key, value)?,
                unknown => {
                    return Err(Error::ConfigError(format!(
                        "unrecognized property: {unknown}"
                    )));
                }
            }
        }
        Ok(props)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::ConfigError(format!(
            "property {key} expects true or false, got {other}"
        ))),
    }
}
