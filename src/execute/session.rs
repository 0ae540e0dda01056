//! Encrypted prepared-statement session
//!
//! One session owns one logical SQL string and replays executions of it
//! against a backend. Every execution runs a fresh rewrite pass: parse,
//! derive the statement context, run the decorator chain, merge tokens
//! and substitutions into a final SQL unit, then prepare and bind at the
//! backend. Logical parameters are cleared after every execution attempt,
//! success or failure, so a failed run never leaks values into the next.

use super::backend::{Backend, ExecuteOutcome, QueryResult, StatementHandle};
use super::options::StatementOptions;
use super::runtime::EncryptRuntime;
use crate::error::{Error, Result};
use crate::parsing::parse_sql;
use crate::rewrite::{RewriteContext, RewriteDecorator, SqlUnit};
use crate::semantic::StatementContext;
use crate::types::Value;
use std::sync::Arc;

pub struct EncryptSession<B: Backend> {
    backend: B,
    runtime: Arc<EncryptRuntime>,
    decorators: Vec<Box<dyn RewriteDecorator>>,
    sql: String,
    options: StatementOptions,
    parameters: Vec<Value>,
    handle: Option<B::Handle>,
    batch: Vec<SqlUnit>,
}

impl<B: Backend> EncryptSession<B> {
    pub fn new(backend: B, runtime: Arc<EncryptRuntime>, sql: &str) -> Result<Self> {
        Self::with_options(backend, runtime, sql, StatementOptions::default())
    }

    pub fn with_options(
        backend: B,
        runtime: Arc<EncryptRuntime>,
        sql: &str,
        options: StatementOptions,
    ) -> Result<Self> {
        if sql.trim().is_empty() {
            return Err(Error::EmptySql);
        }
        let decorators = runtime.decorators();
        Ok(EncryptSession {
            backend,
            runtime,
            decorators,
            sql: sql.to_string(),
            options,
            parameters: Vec::new(),
            handle: None,
            batch: Vec::new(),
        })
    }

    /// The logical SQL this session was created with.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binds a logical value to a 0-indexed parameter slot, growing the
    /// parameter list with nulls if the slot is past the end.
    pub fn set_parameter(&mut self, slot: usize, value: Value) {
        if slot >= self.parameters.len() {
            self.parameters.resize(slot + 1, Value::Null);
        }
        self.parameters[slot] = value;
    }

    /// Clears all bound logical parameters.
    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn execute_query(&mut self) -> Result<QueryResult> {
        let result = self.execute_query_inner();
        self.clear_parameters();
        result
    }

    pub fn execute_update(&mut self) -> Result<u64> {
        let result = self.execute_update_inner();
        self.clear_parameters();
        result
    }

    pub fn execute(&mut self) -> Result<ExecuteOutcome> {
        let result = self.execute_inner();
        self.clear_parameters();
        result
    }

    /// Runs the rewrite pass for the current parameters and queues the
    /// resulting SQL unit for `execute_batch`.
    pub fn add_batch(&mut self) -> Result<()> {
        let result = self.rewrite_pass();
        self.clear_parameters();
        self.batch.push(result?);
        Ok(())
    }

    /// Executes all queued batch entries through one prepared statement.
    ///
    /// Every entry must have rewritten to the same SQL text; a mismatch
    /// fails before anything reaches the backend. The queue is consumed
    /// whether execution succeeds or fails.
    pub fn execute_batch(&mut self) -> Result<Vec<u64>> {
        let result = self.execute_batch_inner();
        self.clear_parameters();
        result
    }

    /// Discards all queued batch entries along with any bound parameters.
    pub fn clear_batch(&mut self) -> Result<()> {
        self.batch.clear();
        self.clear_parameters();
        if let Some(handle) = &mut self.handle {
            handle.clear_batch()?;
        }
        Ok(())
    }

    /// Closes the backend statement, if one is open.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut handle) = self.handle.take() {
            handle.close()?;
        }
        Ok(())
    }

    fn execute_query_inner(&mut self) -> Result<QueryResult> {
        let unit = self.rewrite_pass()?;
        let handle = self.prepare_and_bind(&unit)?;
        handle.execute_query()
    }

    fn execute_update_inner(&mut self) -> Result<u64> {
        let unit = self.rewrite_pass()?;
        let handle = self.prepare_and_bind(&unit)?;
        handle.execute_update()
    }

    fn execute_inner(&mut self) -> Result<ExecuteOutcome> {
        let unit = self.rewrite_pass()?;
        let handle = self.prepare_and_bind(&unit)?;
        handle.execute()
    }

    fn execute_batch_inner(&mut self) -> Result<Vec<u64>> {
        let batch = std::mem::take(&mut self.batch);
        let Some(first) = batch.first() else {
            return Ok(Vec::new());
        };
        for (index, unit) in batch.iter().enumerate().skip(1) {
            if unit.sql != first.sql {
                return Err(Error::BatchHeterogeneity {
                    first: first.sql.clone(),
                    found: unit.sql.clone(),
                    index,
                });
            }
        }
        let handle = self.replace_handle(&first.sql)?;
        for unit in &batch {
            for (slot, value) in unit.parameters.iter().enumerate() {
                handle.bind(slot, value)?;
            }
            handle.add_batch()?;
        }
        handle.execute_batch()
    }

    /// One full rewrite pass over the logical SQL and parameters.
    fn rewrite_pass(&mut self) -> Result<SqlUnit> {
        let ast = Arc::new(parse_sql(&self.sql)?);
        let statement = StatementContext::new(ast, Arc::clone(&self.runtime.catalog));
        if self.parameters.len() != statement.parameter_count {
            return Err(Error::PlaceholderMismatch {
                placeholders: statement.parameter_count,
                parameters: self.parameters.len(),
            });
        }
        let mut context = RewriteContext::new(&self.sql, &self.parameters);
        for decorator in &self.decorators {
            decorator.decorate(&statement, &mut context)?;
        }
        let unit = context.finalize()?;
        if self.runtime.props.sql_show {
            tracing::info!(
                target: "sqlveil::sql",
                logic = %self.sql,
                actual = %unit.sql,
                "rewritten sql"
            );
        }
        Ok(unit)
    }

    fn prepare_and_bind(&mut self, unit: &SqlUnit) -> Result<&mut B::Handle> {
        let sql = unit.sql.clone();
        let handle = self.replace_handle(&sql)?;
        for (slot, value) in unit.parameters.iter().enumerate() {
            handle.bind(slot, value)?;
        }
        Ok(handle)
    }

    /// Prepares a fresh backend statement, closing the previous one.
    /// A close failure on the old handle is logged and ignored; the old
    /// statement is unusable either way.
    fn replace_handle(&mut self, sql: &str) -> Result<&mut B::Handle> {
        if let Some(mut old) = self.handle.take() {
            if let Err(error) = old.close() {
                tracing::warn!(%error, "failed to close previous backend statement");
            }
        }
        let handle = self.backend.prepare(sql, &self.options)?;
        Ok(self.handle.insert(handle))
    }
}
