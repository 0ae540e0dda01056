//! Batch replay: one prepared statement, per-entry rewrites, and the
//! homogeneity check that guards the single-prepare model.

mod common;

use common::{runtime, ExecutionKind, MockBackend};
use sqlveil::encrypt::{AesGcmAlgorithm, ColumnRule, EncryptAlgorithm, EncryptRule};
use sqlveil::{EncryptSession, Error, SessionProps, Value};

fn algorithm() -> AesGcmAlgorithm {
    AesGcmAlgorithm::new("aes", b"integration test secret")
}

fn ssn_rule(column: ColumnRule) -> EncryptRule {
    let mut rule = EncryptRule::new();
    rule.add_column("users", "ssn", column);
    rule
}

#[test]
fn batch_prepares_once_and_replays_every_entry() {
    let backend = MockBackend::new();
    let log = backend.log();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    let ssns = ["111-11-1111", "222-22-2222", "333-33-3333"];
    for (id, ssn) in ssns.iter().enumerate() {
        session.set_parameter(0, Value::I64(id as i64));
        session.set_parameter(1, Value::from(*ssn));
        session.add_batch().unwrap();
    }
    let counts = session.execute_batch().unwrap();
    assert_eq!(counts, vec![1, 1, 1]);

    let log = log.borrow();
    assert_eq!(
        log.prepared,
        vec!["INSERT INTO users (id, ssn_cipher) VALUES (?, ?)".to_string()]
    );
    let execution = &log.executions[0];
    assert_eq!(execution.kind, ExecutionKind::Batch);
    assert_eq!(execution.bind_sets.len(), 3);
    for (index, (bind_set, ssn)) in execution.bind_sets.iter().zip(&ssns).enumerate() {
        assert_eq!(bind_set[0], Value::I64(index as i64));
        assert_eq!(bind_set[1], algorithm().encrypt(&Value::from(*ssn)).unwrap());
    }
}

#[test]
fn batch_on_unencrypted_columns_replays_parameters_verbatim() {
    let backend = MockBackend::new();
    let log = backend.log();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes")),
        SessionProps::default(),
    );

    let sql = "INSERT INTO users (id, name) VALUES (?, ?)";
    let mut session = EncryptSession::new(backend, runtime, sql).unwrap();
    for (id, name) in ["a", "b", "c"].iter().enumerate() {
        session.set_parameter(0, Value::I64(id as i64 + 1));
        session.set_parameter(1, Value::from(*name));
        session.add_batch().unwrap();
    }
    assert_eq!(session.execute_batch().unwrap(), vec![1, 1, 1]);

    let log = log.borrow();
    assert_eq!(log.prepared, vec![sql.to_string()]);
    let execution = &log.executions[0];
    assert_eq!(execution.kind, ExecutionKind::Batch);
    assert_eq!(
        execution.bind_sets,
        vec![
            vec![Value::I64(1), Value::from("a")],
            vec![Value::I64(2), Value::from("b")],
            vec![Value::I64(3), Value::from("c")],
        ]
    );
}

#[test]
fn heterogeneous_batch_fails_before_reaching_the_backend() {
    let backend = MockBackend::new();
    let log = backend.log();
    // Assisted digests are spliced as literals, so each entry rewrites
    // to different SQL text and the batch cannot share one statement.
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes").with_assisted_query_column("ssn_assist")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    for (id, ssn) in ["111-11-1111", "222-22-2222"].iter().enumerate() {
        session.set_parameter(0, Value::I64(id as i64));
        session.set_parameter(1, Value::from(*ssn));
        session.add_batch().unwrap();
    }
    let err = session.execute_batch().unwrap_err();
    assert!(matches!(err, Error::BatchHeterogeneity { index: 1, .. }));

    let log = log.borrow();
    assert!(log.prepared.is_empty());
    assert!(log.executions.is_empty());
}

#[test]
fn failed_batch_clears_the_queue() {
    let backend = MockBackend::new();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes").with_assisted_query_column("ssn_assist")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    for (id, ssn) in ["111-11-1111", "222-22-2222"].iter().enumerate() {
        session.set_parameter(0, Value::I64(id as i64));
        session.set_parameter(1, Value::from(*ssn));
        session.add_batch().unwrap();
    }
    session.execute_batch().unwrap_err();

    // The queue was discarded with the failure.
    assert_eq!(session.execute_batch().unwrap(), Vec::<u64>::new());
}

#[test]
fn empty_batch_executes_nothing() {
    let backend = MockBackend::new();
    let log = backend.log();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    assert_eq!(session.execute_batch().unwrap(), Vec::<u64>::new());
    assert!(log.borrow().prepared.is_empty());
}

#[test]
fn clear_batch_discards_queued_entries() {
    let backend = MockBackend::new();
    let log = backend.log();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    session.set_parameter(0, Value::I64(1));
    session.set_parameter(1, Value::from("111-11-1111"));
    session.add_batch().unwrap();
    session.clear_batch().unwrap();

    assert_eq!(session.execute_batch().unwrap(), Vec::<u64>::new());
    assert!(log.borrow().prepared.is_empty());
}

#[test]
fn clear_batch_also_clears_bound_parameters() {
    let backend = MockBackend::new();
    let log = backend.log();
    let runtime = runtime(
        ssn_rule(ColumnRule::new("ssn_cipher", "aes")),
        SessionProps::default(),
    );

    let mut session =
        EncryptSession::new(backend, runtime, "INSERT INTO users (id, ssn) VALUES (?, ?)")
            .unwrap();
    session.set_parameter(0, Value::I64(1));
    session.set_parameter(1, Value::from("111-11-1111"));
    session.clear_batch().unwrap();

    // An execution without rebinding must not see the stale values.
    let err = session.execute_update().unwrap_err();
    assert_eq!(
        err,
        Error::PlaceholderMismatch {
            placeholders: 2,
            parameters: 0,
        }
    );
    assert!(log.borrow().prepared.is_empty());
}
