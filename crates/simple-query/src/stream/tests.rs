use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::testing::{MockConnection, UserSummary, user_rows};
use crate::{ExecConfig, Record, Source};

fn users(dialect: Dialect) -> Arc<Source> {
    Source::new("users")
        .unwrap()
        .with_dialect(dialect)
        .scope("active", |q, _| q.where_eq("active", true))
        .into_shared()
}

fn postgres_rows(n: i64) -> MockConnection {
    MockConnection::new(Dialect::Postgres).with_rows(&["id", "name"], user_rows(n))
}

// ==================== Cursor streaming ====================

#[tokio::test]
async fn test_cursor_statement_sequence() {
    let conn = postgres_rows(5);
    let mut q = users(Dialect::Postgres).query();
    let cursor = format!("simple_query_cursor_{}", q.id());

    let mut seen = Vec::new();
    let delivered = q
        .stream_each_batched(&conn, 2, |record: Record| {
            seen.push(record.get_as::<i64>("id")?);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(delivered, 5);
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    let fetch = format!("FETCH 2 FROM {cursor}");
    assert_eq!(
        conn.statements(),
        vec![
            "BEGIN".to_string(),
            format!("DECLARE {cursor} NO SCROLL CURSOR FOR SELECT * FROM users"),
            fetch.clone(),
            fetch.clone(),
            fetch.clone(),
            fetch,
            format!("CLOSE {cursor}"),
            "COMMIT".to_string(),
        ]
    );
    assert!(conn.abandoned().is_empty());
}

#[tokio::test]
async fn test_cursor_streams_compiled_query() {
    let conn = postgres_rows(1);
    let mut q = users(Dialect::Postgres)
        .query()
        .scope("active")
        .unwrap()
        .order("id", "asc")
        .unwrap();
    q.stream_each(&conn, |_| Ok(())).await.unwrap();
    assert!(conn.statements()[1].ends_with(
        "NO SCROLL CURSOR FOR SELECT * FROM users WHERE users.active = TRUE ORDER BY users.id ASC"
    ));
}

#[tokio::test]
async fn test_empty_result_still_commits() {
    let conn = postgres_rows(0);
    let mut q = users(Dialect::Postgres).query();
    let delivered = q.stream_each(&conn, |_| Ok(())).await.unwrap();
    assert_eq!(delivered, 0);
    let statements = conn.statements();
    assert_eq!(statements.len(), 5);
    assert_eq!(statements.last().map(String::as_str), Some("COMMIT"));
}

#[tokio::test]
async fn test_callback_error_rolls_back() {
    let conn = postgres_rows(5);
    let mut q = users(Dialect::Postgres).query();

    let mut calls = 0;
    let err = q
        .stream_each_batched(&conn, 2, |_| {
            calls += 1;
            if calls == 3 {
                return Err(QueryError::callback("stop at three"));
            }
            Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Callback error: stop at three");
    assert_eq!(calls, 3);
    let statements = conn.statements();
    assert_eq!(statements.last().map(String::as_str), Some("ROLLBACK"));
    assert!(!statements.iter().any(|s| s == "COMMIT"));
    assert!(!statements.iter().any(|s| s.starts_with("CLOSE")));
    assert!(conn.abandoned().is_empty());
}

#[tokio::test]
async fn test_cancelled_stream_reports_open_transaction() {
    let conn = postgres_rows(5).hanging_on("FETCH");
    let mut q = users(Dialect::Postgres).query();
    let cursor = format!("simple_query_cursor_{}", q.id());

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        q.stream_each(&conn, |_| Ok(())),
    )
    .await;

    assert!(outcome.is_err(), "stream should still be waiting on FETCH");
    assert_eq!(conn.abandoned(), vec![cursor.clone()]);
    assert_eq!(
        conn.statements(),
        vec![
            "BEGIN".to_string(),
            format!("DECLARE {cursor} NO SCROLL CURSOR FOR SELECT * FROM users"),
            format!("FETCH 1000 FROM {cursor}"),
        ]
    );
}

#[tokio::test]
async fn test_fetch_error_rolls_back() {
    let conn = postgres_rows(5).failing_on("FETCH");
    let mut q = users(Dialect::Postgres).query();
    let err = q.stream_each(&conn, |_| Ok(())).await.unwrap_err();
    assert!(err.is_database());
    assert!(err.to_string().contains("mock failure: FETCH"));
    assert_eq!(
        conn.statements().last().map(String::as_str),
        Some("ROLLBACK")
    );
}

#[tokio::test]
async fn test_commit_error_rolls_back() {
    let conn = postgres_rows(1).failing_on("COMMIT");
    let mut q = users(Dialect::Postgres).query();
    let err = q.stream_each(&conn, |_| Ok(())).await.unwrap_err();
    assert_eq!(err.to_string(), "Statement error: mock failure: COMMIT");
    assert_eq!(
        conn.statements().last().map(String::as_str),
        Some("ROLLBACK")
    );
}

#[tokio::test]
async fn test_failed_rollback_keeps_original_error() {
    let conn = postgres_rows(3).failing_rollback();
    let mut q = users(Dialect::Postgres).query();
    let err = q
        .stream_each(&conn, |_| Err(QueryError::callback("first row rejected")))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Callback error: first row rejected");
    assert_eq!(
        conn.statements().last().map(String::as_str),
        Some("ROLLBACK")
    );
}

#[tokio::test]
async fn test_begin_failure_skips_rollback() {
    let conn = postgres_rows(3).failing_on("BEGIN");
    let mut q = users(Dialect::Postgres).query();
    let err = q.stream_each(&conn, |_| Ok(())).await.unwrap_err();
    assert!(err.is_database());
    assert_eq!(conn.statements(), vec!["BEGIN".to_string()]);
}

#[tokio::test]
async fn test_cursor_prefix_and_batch_size_from_config() {
    let conn = postgres_rows(3);
    let mut q = users(Dialect::Postgres)
        .query()
        .with_config(ExecConfig::new().cursor_prefix("export").batch_size(10));
    let delivered = q.stream_each(&conn, |_| Ok(())).await.unwrap();
    assert_eq!(delivered, 3);

    let cursor = format!("export_{}", q.id());
    let statements = conn.statements();
    assert_eq!(
        statements[1],
        format!("DECLARE {cursor} NO SCROLL CURSOR FOR SELECT * FROM users")
    );
    assert_eq!(statements[2], format!("FETCH 10 FROM {cursor}"));
}

#[test]
fn test_concurrent_builders_use_distinct_cursors() {
    let source = users(Dialect::Postgres);
    let a = source.query();
    let b = source.query();
    assert_ne!(
        format!("{}_{}", a.config().cursor_prefix, a.id()),
        format!("{}_{}", b.config().cursor_prefix, b.id())
    );
}

#[tokio::test]
async fn test_stream_into_read_model_reuses_shape() {
    let conn = postgres_rows(4);
    let mut q = users(Dialect::Postgres).query().map_to::<UserSummary>();
    let mut names = Vec::new();
    q.stream_each_batched(&conn, 3, |user| {
        names.push(user.full_name.unwrap_or_default());
        Ok(())
    })
    .await
    .unwrap();
    assert_eq!(names, vec!["user1", "user2", "user3", "user4"]);
    assert!(q.shape.is_some());
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let conn = postgres_rows(3);
    let mut q = users(Dialect::Postgres).query();
    let err = q
        .stream_each_batched(&conn, 0, |_| Ok(()))
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_invalid_cursor_prefix_is_rejected() {
    let conn = postgres_rows(3);
    let mut q = users(Dialect::Postgres)
        .query()
        .with_config(ExecConfig::new().cursor_prefix("c; DROP TABLE users"));
    let err = q.stream_each(&conn, |_| Ok(())).await.unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(conn.statements().is_empty());
}

#[tokio::test]
async fn test_stream_on_other_dialect_connection_is_rejected() {
    let conn = MockConnection::new(Dialect::MySql).with_rows(&["id", "name"], user_rows(3));
    let mut q = users(Dialect::Postgres).query();
    let err = q.stream_each(&conn, |_| Ok(())).await.unwrap_err();
    assert!(err.is_dialect_mismatch());
    assert!(conn.statements().is_empty());
}

// ==================== Native streaming ====================

#[tokio::test]
async fn test_mysql_native_streaming() {
    let conn = MockConnection::new(Dialect::MySql).with_rows(&["id", "name"], user_rows(3));
    let mut q = users(Dialect::MySql).query();
    let mut ids = Vec::new();
    let delivered = q
        .stream_each(&conn, |record| {
            ids.push(record.get_as::<i64>("id")?);
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(delivered, 3);
    assert_eq!(ids, vec![1, 2, 3]);
    // No transaction or cursor statements.
    assert_eq!(conn.statements(), vec!["SELECT * FROM users".to_string()]);
}

#[tokio::test]
async fn test_mysql_callback_error_stops_stream() {
    let conn = MockConnection::new(Dialect::MySql).with_rows(&["id", "name"], user_rows(3));
    let mut q = users(Dialect::MySql).query();
    let mut calls = 0;
    let err = q
        .stream_each(&conn, |_| {
            calls += 1;
            Err(QueryError::callback("halt"))
        })
        .await
        .unwrap_err();
    assert_eq!(calls, 1);
    assert_eq!(err.to_string(), "Callback error: halt");
}

// ==================== Unsupported ====================

#[tokio::test]
async fn test_sqlite_streaming_is_unsupported() {
    let conn = MockConnection::new(Dialect::Sqlite).with_rows(&["id", "name"], user_rows(3));
    let mut q = users(Dialect::Sqlite).query();
    let mut calls = 0;
    let err = q
        .stream_each(&conn, |_| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(err.is_unsupported_streaming());
    assert_eq!(err.to_string(), "Streaming is not supported for sqlite");
    assert_eq!(calls, 0);
    assert!(conn.statements().is_empty());
}

#[test]
fn test_strategy_for_dialect() {
    assert_eq!(
        StreamStrategy::for_dialect(&Dialect::Postgres).unwrap(),
        StreamStrategy::Cursor
    );
    assert_eq!(
        StreamStrategy::for_dialect(&Dialect::MySql).unwrap(),
        StreamStrategy::Native
    );
    assert!(StreamStrategy::for_dialect(&Dialect::Other("oracle".into())).is_err());
}

#[test]
fn test_state_transitions() {
    use StreamState::*;
    let happy = [
        Idle,
        TransactionOpen,
        CursorDeclared,
        Fetching,
        Delivering,
        Fetching,
        CursorClosed,
        Committed,
    ];
    for pair in happy.windows(2) {
        assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
    }
    for state in [TransactionOpen, CursorDeclared, Fetching, Delivering, CursorClosed] {
        assert!(state.can_transition(Aborted));
    }
    assert!(!Idle.can_transition(Aborted));
    assert!(!Committed.can_transition(Fetching));
    assert!(!Aborted.can_transition(TransactionOpen));
    assert!(!Fetching.can_transition(Committed));
}
