//! Prepared-statement creation options
//!
//! A caller may request a statement through several overlapping option
//! shapes. They resolve in a fixed priority order, independent of the
//! order they were set in:
//!
//! 1. result set type + concurrency + holdability
//! 2. result set type + concurrency
//! 3. auto-generated keys
//! 4. generated-key column indexes
//! 5. generated-key column names
//! 6. plain defaults

/// Result set scrollability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetType {
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// Result set concurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetConcurrency {
    ReadOnly,
    Updatable,
}

/// Result set holdability across commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSetHoldability {
    HoldCursorsOverCommit,
    CloseCursorsAtCommit,
}

/// Whether the backend should return auto-generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeys {
    Return,
    NoReturn,
}

/// The options a prepared statement was requested with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOptions {
    pub result_set_type: Option<ResultSetType>,
    pub result_set_concurrency: Option<ResultSetConcurrency>,
    pub result_set_holdability: Option<ResultSetHoldability>,
    pub auto_generated_keys: Option<GeneratedKeys>,
    pub generated_key_indexes: Option<Vec<usize>>,
    pub generated_key_names: Option<Vec<String>>,
}

/// The single shape a backend actually prepares with, after priority
/// resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareMode {
    ResultSetFull {
        r#type: ResultSetType,
        concurrency: ResultSetConcurrency,
        holdability: ResultSetHoldability,
    },
    ResultSet {
        r#type: ResultSetType,
        concurrency: ResultSetConcurrency,
    },
    GeneratedKeys(GeneratedKeys),
    KeyIndexes(Vec<usize>),
    KeyNames(Vec<String>),
    Default,
}

impl StatementOptions {
    /// Collapses the requested options into the one mode the backend
    /// prepares with.
    pub fn resolve(&self) -> PrepareMode {
        if let (Some(t), Some(c), Some(h)) = (
            self.result_set_type,
            self.result_set_concurrency,
            self.result_set_holdability,
        ) {
            return PrepareMode::ResultSetFull {
                r#type: t,
                concurrency: c,
                holdability: h,
            };
        }
        if let (Some(t), Some(c)) = (self.result_set_type, self.result_set_concurrency) {
            return PrepareMode::ResultSet {
                r#type: t,
                concurrency: c,
            };
        }
        if let Some(keys) = self.auto_generated_keys {
            return PrepareMode::GeneratedKeys(keys);
        }
        if let Some(indexes) = &self.generated_key_indexes {
            return PrepareMode::KeyIndexes(indexes.clone());
        }
        if let Some(names) = &self.generated_key_names {
            return PrepareMode::KeyNames(names.clone());
        }
        PrepareMode::Default
    }
}
