//! Connection trait consumed by builders.

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::row::{RowSet, RowStream, decode_pg_row, pg_columns};

/// The narrow connection interface the builder executes against.
///
/// SQL reaching a connection is fully rendered; no bind parameters are passed.
pub trait Connection: Send + Sync {
    /// The dialect used to pick a streaming strategy.
    fn dialect(&self) -> Dialect;

    /// Run a query and return all rows, with column names even when there are no rows.
    fn select_all(&self, sql: &str) -> impl std::future::Future<Output = QueryResult<RowSet>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str) -> impl std::future::Future<Output = QueryResult<u64>> + Send;

    /// Run one or more statements without results (transaction and cursor control).
    fn batch_execute(&self, sql: &str) -> impl std::future::Future<Output = QueryResult<()>> + Send;

    /// Run a query in the driver's unbuffered streaming mode.
    ///
    /// The default implementation reports that the connection cannot stream.
    fn stream_rows(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = QueryResult<RowStream>> + Send {
        let _ = sql;
        let dialect = self.dialect();
        async move { Err(QueryError::UnsupportedStreaming(dialect.name().to_string())) }
    }

    /// Called synchronously when a stream is dropped between `BEGIN` and `COMMIT`/`ROLLBACK`,
    /// e.g. because its future was cancelled by a timeout.
    ///
    /// The session still holds the open transaction and cursor. Connections that can discard
    /// or flag the session without awaiting should do so here; the default does nothing.
    /// Pools created by `create_pool` roll back on recycle.
    fn stream_abandoned(&self, cursor: &str) {
        let _ = cursor;
    }
}

impl Connection for tokio_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn select_all(&self, sql: &str) -> QueryResult<RowSet> {
        let stmt = tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(QueryError::from_db_error)?;
        let rows = tokio_postgres::Client::query(self, &stmt, &[])
            .await
            .map_err(QueryError::from_db_error)?;
        let values = rows
            .iter()
            .map(decode_pg_row)
            .collect::<QueryResult<Vec<_>>>()?;
        Ok(RowSet::new(pg_columns(stmt.columns()), values))
    }

    async fn execute(&self, sql: &str) -> QueryResult<u64> {
        tokio_postgres::Client::execute(self, sql, &[])
            .await
            .map_err(QueryError::from_db_error)
    }

    async fn batch_execute(&self, sql: &str) -> QueryResult<()> {
        tokio_postgres::Client::batch_execute(self, sql)
            .await
            .map_err(QueryError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl Connection for deadpool_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn select_all(&self, sql: &str) -> QueryResult<RowSet> {
        // Delegate to the deref target (tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Connection::select_all(client, sql).await
    }

    async fn execute(&self, sql: &str) -> QueryResult<u64> {
        let client: &tokio_postgres::Client = self;
        Connection::execute(client, sql).await
    }

    async fn batch_execute(&self, sql: &str) -> QueryResult<()> {
        let client: &tokio_postgres::Client = self;
        Connection::batch_execute(client, sql).await
    }
}
