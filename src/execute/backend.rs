//! Backend abstraction
//!
//! The engine rewrites SQL and replays parameters; it never talks a wire
//! protocol itself. A `Backend` prepares statements from final SQL text,
//! and the resulting `StatementHandle` receives the rewritten parameter
//! values slot by slot. Backend failures surface as `Error::Backend`
//! without interpretation.

use super::options::StatementOptions;
use crate::error::Result;
use crate::types::{Row, Value};

/// A result set returned from a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// What a generic execute produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome {
    /// The statement produced a result set.
    ResultSet(QueryResult),
    /// The statement produced an update count.
    UpdateCount(u64),
}

/// A prepared statement held open at the backend.
pub trait StatementHandle {
    /// Binds a value to a 0-indexed parameter slot.
    fn bind(&mut self, slot: usize, value: &Value) -> Result<()>;

    fn execute_query(&mut self) -> Result<QueryResult>;

    fn execute_update(&mut self) -> Result<u64>;

    fn execute(&mut self) -> Result<ExecuteOutcome>;

    /// Queues the currently bound parameters as one batch entry.
    fn add_batch(&mut self) -> Result<()>;

    /// Executes all queued batch entries, returning per-entry update
    /// counts in queue order.
    fn execute_batch(&mut self) -> Result<Vec<u64>>;

    fn clear_batch(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// A source of prepared statements.
pub trait Backend {
    type Handle: StatementHandle;

    /// Prepares a statement from final, already rewritten SQL.
    fn prepare(&mut self, sql: &str, options: &StatementOptions) -> Result<Self::Handle>;
}
