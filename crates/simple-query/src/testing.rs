//! In-memory connection used by unit tests.

use std::sync::{Arc, Mutex};

use crate::client::Connection;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::row::{RowSet, RowStream};
use crate::value::Value;

/// Records every statement it receives and serves a fixed row set.
///
/// `FETCH n FROM ..` statements page through the rows the way a cursor would.
pub(crate) struct MockConnection {
    dialect: Dialect,
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
    position: Mutex<usize>,
    statements: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
    fail_rollback: bool,
    hang_on: Option<&'static str>,
    abandoned: Mutex<Vec<String>>,
    affected: u64,
}

impl MockConnection {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
            position: Mutex::new(0),
            statements: Mutex::new(Vec::new()),
            fail_on: None,
            fail_rollback: false,
            hang_on: None,
            abandoned: Mutex::new(Vec::new()),
            affected: 0,
        }
    }

    pub fn with_rows(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.rows = rows;
        self
    }

    /// Fail every statement starting with `prefix`.
    pub fn failing_on(mut self, prefix: &'static str) -> Self {
        self.fail_on = Some(prefix);
        self
    }

    /// Never complete statements starting with `prefix`.
    pub fn hanging_on(mut self, prefix: &'static str) -> Self {
        self.hang_on = Some(prefix);
        self
    }

    /// Cursors whose stream was dropped with the transaction open.
    pub fn abandoned(&self) -> Vec<String> {
        self.abandoned.lock().unwrap().clone()
    }

    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> QueryResult<()> {
        self.statements.lock().unwrap().push(sql.to_string());
        if self.fail_on.is_some_and(|prefix| sql.starts_with(prefix)) {
            return Err(QueryError::statement(format!("mock failure: {sql}")));
        }
        if self.fail_rollback && sql == "ROLLBACK" {
            return Err(QueryError::statement("mock rollback failure"));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        self.dialect.clone()
    }

    async fn select_all(&self, sql: &str) -> QueryResult<RowSet> {
        self.record(sql)?;
        if self.hang_on.is_some_and(|prefix| sql.starts_with(prefix)) {
            std::future::pending::<()>().await;
        }
        if let Some(rest) = sql.strip_prefix("FETCH ") {
            let batch: usize = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
            let mut position = self.position.lock().unwrap();
            let end = (*position + batch).min(self.rows.len());
            let rows = self.rows[*position..end].to_vec();
            *position = end;
            return Ok(RowSet::new(Arc::clone(&self.columns), rows));
        }
        Ok(RowSet::new(Arc::clone(&self.columns), self.rows.clone()))
    }

    async fn execute(&self, sql: &str) -> QueryResult<u64> {
        self.record(sql)?;
        Ok(self.affected)
    }

    async fn batch_execute(&self, sql: &str) -> QueryResult<()> {
        self.record(sql)
    }

    fn stream_abandoned(&self, cursor: &str) {
        self.abandoned.lock().unwrap().push(cursor.to_string());
    }

    async fn stream_rows(&self, sql: &str) -> QueryResult<RowStream> {
        self.record(sql)?;
        if self.dialect != Dialect::MySql {
            return Err(QueryError::UnsupportedStreaming(self.dialect.name().to_string()));
        }
        let columns = Arc::clone(&self.columns);
        let batches = self
            .rows
            .clone()
            .into_iter()
            .map(move |row| Ok(RowSet::new(Arc::clone(&columns), vec![row])));
        Ok(RowStream::new(futures_util::stream::iter(batches)))
    }
}

/// Read model mapping `identifier` to `id` and `full_name` to `name`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UserSummary {
    pub identifier: i64,
    pub full_name: Option<String>,
}

impl crate::ReadModel for UserSummary {
    fn attributes() -> &'static [crate::Attribute] {
        &[
            crate::Attribute {
                name: "identifier",
                column: "id",
            },
            crate::Attribute {
                name: "full_name",
                column: "name",
            },
        ]
    }

    fn from_row(row: &crate::RowView<'_>) -> QueryResult<Self> {
        Ok(Self {
            identifier: row.attribute("id")?,
            full_name: row.attribute("name")?,
        })
    }
}

/// `users` rows `(id, name)` for ids `1..=n`.
pub(crate) fn user_rows(n: i64) -> Vec<Vec<Value>> {
    (1..=n)
        .map(|id| vec![Value::Int(id), Value::Text(format!("user{id}"))])
        .collect()
}
