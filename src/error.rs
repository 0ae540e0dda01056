//! Error types for the rewrite and execution engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Input errors
    #[error("SQL string is null or empty")]
    EmptySql,

    #[error("SQL parse error: {0}")]
    ParseError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // Metadata errors
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    // Rewrite-consistency errors. These indicate a defect in a decorator or
    // the merge engine and must never be patched over at runtime.
    #[error("SQL tokens overlap: [{0}, {1}) and [{2}, {3})")]
    TokenOverlap(usize, usize, usize, usize),

    #[error("Rewritten SQL has {placeholders} placeholders but {parameters} parameters")]
    PlaceholderMismatch {
        placeholders: usize,
        parameters: usize,
    },

    // Batch errors
    #[error("Batch entries rewrote to different SQL shapes: first was {first:?}, entry {index} was {found:?}")]
    BatchHeterogeneity {
        first: String,
        found: String,
        index: usize,
    },

    // Encryption errors
    #[error("Encrypt algorithm not registered: {0}")]
    AlgorithmNotFound(String),

    #[error("Value cannot be encrypted: {0}")]
    ValueNotEncryptable(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encrypt configuration error: {0}")]
    ConfigError(String),

    // Backend errors are passed through unchanged. This engine does not
    // interpret or retry them.
    #[error("Backend error: {0}")]
    Backend(String),

    // System errors
    #[error("Internal error: {0}")]
    Internal(String),
}
