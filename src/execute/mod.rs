//! Statement execution against a pluggable backend
//!
//! This layer turns rewrite passes into backend calls: sessions own a
//! logical SQL string, replay parameter sets through it, and drive the
//! prepared statements the backend hands back.

mod backend;
mod options;
mod runtime;
mod session;

pub use backend::{Backend, ExecuteOutcome, QueryResult, StatementHandle};
pub use options::{
    GeneratedKeys, PrepareMode, ResultSetConcurrency, ResultSetHoldability, ResultSetType,
    StatementOptions,
};
pub use runtime::EncryptRuntime;
pub use session::EncryptSession;
