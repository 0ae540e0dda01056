//! Shared test fixtures: an in-memory recording backend plus catalog,
//! rule, and runtime constructors used across the integration tests.

#![allow(dead_code)]

use sqlveil::encrypt::{AesGcmAlgorithm, AlgorithmRegistry, EncryptRule};
use sqlveil::execute::{
    Backend, EncryptRuntime, ExecuteOutcome, QueryResult, StatementHandle, StatementOptions,
};
use sqlveil::types::{Catalog, Column, DataType, Table, Value};
use sqlveil::{Error, Result, SessionProps};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Everything the backend was asked to do, in order.
#[derive(Debug, Default)]
pub struct BackendLog {
    /// SQL text of every prepared statement.
    pub prepared: Vec<String>,
    /// One entry per execute call: the SQL and the bind sets it ran with.
    pub executions: Vec<Execution>,
}

#[derive(Debug)]
pub struct Execution {
    pub sql: String,
    pub kind: ExecutionKind,
    pub bind_sets: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Query,
    Update,
    Generic,
    Batch,
}

/// A backend that records every call and returns scripted results.
pub struct MockBackend {
    log: Rc<RefCell<BackendLog>>,
    fail_execute: bool,
    query_result: QueryResult,
    update_count: u64,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            log: Rc::new(RefCell::new(BackendLog::default())),
            fail_execute: false,
            query_result: QueryResult::default(),
            update_count: 1,
        }
    }

    /// A backend whose execute calls all fail. Prepare and bind still
    /// succeed and are still recorded.
    pub fn failing_execute() -> Self {
        MockBackend {
            fail_execute: true,
            ..Self::new()
        }
    }

    pub fn with_query_result(mut self, result: QueryResult) -> Self {
        self.query_result = result;
        self
    }

    pub fn log(&self) -> Rc<RefCell<BackendLog>> {
        Rc::clone(&self.log)
    }
}

impl Backend for MockBackend {
    type Handle = MockHandle;

    fn prepare(&mut self, sql: &str, _options: &StatementOptions) -> Result<Self::Handle> {
        self.log.borrow_mut().prepared.push(sql.to_string());
        Ok(MockHandle {
            sql: sql.to_string(),
            log: Rc::clone(&self.log),
            binds: Vec::new(),
            batch: Vec::new(),
            fail_execute: self.fail_execute,
            query_result: self.query_result.clone(),
            update_count: self.update_count,
        })
    }
}

pub struct MockHandle {
    sql: String,
    log: Rc<RefCell<BackendLog>>,
    binds: Vec<Value>,
    batch: Vec<Vec<Value>>,
    fail_execute: bool,
    query_result: QueryResult,
    update_count: u64,
}

impl MockHandle {
    fn record(&mut self, kind: ExecutionKind, bind_sets: Vec<Vec<Value>>) {
        self.log.borrow_mut().executions.push(Execution {
            sql: self.sql.clone(),
            kind,
            bind_sets,
        });
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_execute {
            Err(Error::Backend("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

impl StatementHandle for MockHandle {
    fn bind(&mut self, slot: usize, value: &Value) -> Result<()> {
        if slot >= self.binds.len() {
            self.binds.resize(slot + 1, Value::Null);
        }
        self.binds[slot] = value.clone();
        Ok(())
    }

    fn execute_query(&mut self) -> Result<QueryResult> {
        self.check_failure()?;
        let binds = std::mem::take(&mut self.binds);
        self.record(ExecutionKind::Query, vec![binds]);
        Ok(self.query_result.clone())
    }

    fn execute_update(&mut self) -> Result<u64> {
        self.check_failure()?;
        let binds = std::mem::take(&mut self.binds);
        self.record(ExecutionKind::Update, vec![binds]);
        Ok(self.update_count)
    }

    fn execute(&mut self) -> Result<ExecuteOutcome> {
        self.check_failure()?;
        let binds = std::mem::take(&mut self.binds);
        self.record(ExecutionKind::Generic, vec![binds]);
        Ok(ExecuteOutcome::UpdateCount(self.update_count))
    }

    fn add_batch(&mut self) -> Result<()> {
        self.batch.push(std::mem::take(&mut self.binds));
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<u64>> {
        self.check_failure()?;
        let entries = std::mem::take(&mut self.batch);
        let counts = vec![self.update_count; entries.len()];
        self.record(ExecutionKind::Batch, entries);
        Ok(counts)
    }

    fn clear_batch(&mut self) -> Result<()> {
        self.batch.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A catalog with the `users` table most tests run against.
pub fn users_catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    catalog.add_table(
        Table::new(
            "users",
            vec![
                Column::new("id", DataType::Integer, false),
                Column::new("ssn", DataType::Text, true),
                Column::new("name", DataType::Text, true),
            ],
        )
        .unwrap(),
    );
    Arc::new(catalog)
}

/// A registry with a deterministic AES-GCM algorithm registered as "aes".
pub fn registry() -> Arc<AlgorithmRegistry> {
    let registry = AlgorithmRegistry::new();
    registry.register(Arc::new(AesGcmAlgorithm::new("aes", b"integration test secret")));
    Arc::new(registry)
}

pub fn runtime(rule: EncryptRule, props: SessionProps) -> Arc<EncryptRuntime> {
    Arc::new(EncryptRuntime::new(
        users_catalog(),
        Arc::new(rule),
        registry(),
        props,
    ))
}
