//! Execution and result mapping.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use crate::builder::QueryBuilder;
use crate::client::Connection;
use crate::error::{QueryError, QueryResult};
use crate::logging::StatementKind;
use crate::read_model::RowMapper;
use crate::record::{RecordShape, reuse_shape};
use crate::row::RowSet;
use crate::value::Value;

impl<M: RowMapper> QueryBuilder<M> {
    /// Run the query and map every row.
    pub async fn execute<C: Connection>(&mut self, conn: &C) -> QueryResult<Vec<M::Output>> {
        let rows = self.fetch_all(conn).await?;
        let shape = reuse_shape(&mut self.shape, rows.columns());
        rows.into_rows()
            .into_iter()
            .map(|values| M::map_row(&shape, values))
            .collect()
    }

    /// Run the query once and convert rows only as they are consumed.
    ///
    /// All rows are fetched up front; use [`QueryBuilder::stream_each`] to bound memory.
    pub async fn lazy_execute<C: Connection>(&mut self, conn: &C) -> QueryResult<LazyRows<M>> {
        let rows = self.fetch_all(conn).await?;
        let shape = reuse_shape(&mut self.shape, rows.columns());
        Ok(LazyRows::new(shape, rows.into_rows()))
    }
}

impl<M> QueryBuilder<M> {
    /// Update every row matching the current filters. Returns the affected row count.
    pub async fn bulk_update<C, K, V>(
        &mut self,
        conn: &C,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> QueryResult<u64>
    where
        C: Connection,
        K: Into<String>,
        V: Into<Value>,
    {
        self.check_dialect(conn)?;
        let sql = self.bulk_update_sql(pairs)?;
        self.config.logger.emit(StatementKind::Update, &sql);
        let started = Instant::now();
        let affected = conn.execute(&sql).await?;
        tracing::debug!(
            target: "simple_query",
            builder = self.id,
            affected,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk update executed"
        );
        Ok(affected)
    }

    /// SQL is rendered for the source's dialect; refuse to run it anywhere else.
    pub(crate) fn check_dialect<C: Connection>(&self, conn: &C) -> QueryResult<()> {
        let actual = conn.dialect();
        let expected = self.source.dialect();
        if actual != *expected {
            return Err(QueryError::DialectMismatch {
                expected: expected.name().to_string(),
                actual: actual.name().to_string(),
            });
        }
        Ok(())
    }

    async fn fetch_all<C: Connection>(&mut self, conn: &C) -> QueryResult<RowSet> {
        self.check_dialect(conn)?;
        let sql = self.build_query();
        self.config.logger.emit(StatementKind::Select, &sql);
        let started = Instant::now();
        let rows = conn.select_all(&sql).await?;
        tracing::debug!(
            target: "simple_query",
            builder = self.id,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "query executed"
        );
        Ok(rows)
    }
}

/// Forward-only, single-pass rows from [`QueryBuilder::lazy_execute`].
///
/// Each call to `next` converts one row.
pub struct LazyRows<M> {
    shape: Arc<RecordShape>,
    rows: std::vec::IntoIter<Vec<Value>>,
    mapper: PhantomData<fn() -> M>,
}

impl<M> LazyRows<M> {
    fn new(shape: Arc<RecordShape>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            shape,
            rows: rows.into_iter(),
            mapper: PhantomData,
        }
    }

    pub fn columns(&self) -> &[String] {
        self.shape.columns()
    }
}

impl<M: RowMapper> Iterator for LazyRows<M> {
    type Item = QueryResult<M::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows
            .next()
            .map(|values| M::map_row(&self.shape, values))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<M: RowMapper> ExactSizeIterator for LazyRows<M> {}
