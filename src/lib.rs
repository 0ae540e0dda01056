//! Encryption-aware SQL rewrite and parameter-replay engine.
//!
//! The engine sits between an application and a SQL backend and makes
//! column-level encryption transparent: applications write SQL against
//! logical column names with plaintext parameters, and every execution
//! runs a rewrite pass that substitutes physical cipher columns,
//! encrypts value positions, and appends derived assisted-query and
//! plain columns where configured. The rewritten statement is then
//! prepared and replayed at a pluggable backend.
//!
//! The pipeline for one execution:
//!
//! 1. [`parsing`] lexes and parses the logical SQL into a span-carrying
//!    AST.
//! 2. [`semantic`] derives a statement context (kind, target table,
//!    referenced columns, placeholder count).
//! 3. [`encrypt`] decorates a [`rewrite::RewriteContext`] with text
//!    tokens and parameter substitutions.
//! 4. [`rewrite`] merges tokens and substitutions into a final
//!    [`rewrite::SqlUnit`].
//! 5. [`execute`] prepares the unit's SQL at the backend and binds its
//!    parameters.
//!
//! A rewrite pass never changes the number of `?` placeholders: derived
//! values are spliced into the SQL text as literals. The merge step
//! revalidates this before anything reaches a backend.

pub mod config;
pub mod encrypt;
pub mod error;
pub mod execute;
pub mod parsing;
pub mod rewrite;
pub mod semantic;
pub mod types;

pub use config::SessionProps;
pub use encrypt::{AesGcmAlgorithm, AlgorithmRegistry, ColumnRule, EncryptAlgorithm, EncryptRule};
pub use error::{Error, Result};
pub use execute::{
    Backend, EncryptRuntime, EncryptSession, ExecuteOutcome, QueryResult, StatementHandle,
    StatementOptions,
};
pub use rewrite::SqlUnit;
pub use types::{Catalog, Column, DataType, Row, Table, Value};
