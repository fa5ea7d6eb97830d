//! Streaming execution.
//!
//! Large result sets are delivered row by row to a callback without materializing them.
//! The strategy is chosen once per call from the connection's dialect:
//!
//! - Postgres: a server-side cursor inside a transaction
//!   (`BEGIN`, `DECLARE .. NO SCROLL CURSOR`, repeated `FETCH n`, `CLOSE`, `COMMIT`).
//!   Any failure after `BEGIN` rolls back and returns the original error.
//! - MySQL: the driver's unbuffered streaming mode.
//! - Anything else: [`QueryError::UnsupportedStreaming`].

mod cursor;
mod native;

use std::fmt;

use crate::builder::QueryBuilder;
use crate::client::Connection;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::ident::Ident;
use crate::logging::{SqlLogger, StatementKind};
use crate::read_model::RowMapper;
use crate::record::reuse_shape;
use crate::row::RowSet;

use cursor::CursorStreaming;
use native::NativeStreaming;

/// Where a stream is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    TransactionOpen,
    CursorDeclared,
    Fetching,
    Delivering,
    CursorClosed,
    Committed,
    Aborted,
}

impl StreamState {
    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition(self, next: StreamState) -> bool {
        use StreamState::*;
        match (self, next) {
            (Idle, TransactionOpen) => true,
            (TransactionOpen, CursorDeclared) => true,
            (CursorDeclared, Fetching) => true,
            (Fetching, Delivering) => true,
            (Delivering, Fetching) => true,
            (Fetching, CursorClosed) => true,
            (CursorClosed, Committed) => true,
            (Idle, _) | (Committed, _) | (Aborted, _) => false,
            (_, Aborted) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks and logs state transitions of one stream.
#[derive(Debug)]
pub(crate) struct StateTracker<'a> {
    name: &'a str,
    state: StreamState,
}

impl<'a> StateTracker<'a> {
    pub(crate) fn new(name: &'a str) -> Self {
        Self {
            name,
            state: StreamState::Idle,
        }
    }

    /// Move to `Aborted` unless already there.
    pub(crate) fn abort(&mut self) {
        if self.state != StreamState::Aborted {
            self.advance(StreamState::Aborted);
        }
    }

    pub(crate) fn advance(&mut self, next: StreamState) {
        debug_assert!(
            self.state.can_transition(next),
            "illegal stream transition {} -> {next}",
            self.state
        );
        tracing::trace!(
            target: "simple_query",
            stream = self.name,
            from = %self.state,
            to = %next,
            "stream state"
        );
        self.state = next;
    }
}

/// Everything a strategy needs to run one stream.
pub(crate) struct StreamPlan<'a> {
    pub sql: &'a str,
    pub cursor: &'a str,
    pub batch_size: usize,
    pub logger: &'a SqlLogger,
}

pub(crate) trait StreamingStrategy {
    /// Run the stream, handing every batch to `deliver` in order.
    async fn stream<C, F>(&self, conn: &C, plan: &StreamPlan<'_>, deliver: F) -> QueryResult<()>
    where
        C: Connection,
        F: FnMut(RowSet) -> QueryResult<()>;
}

/// The streaming strategy for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStrategy {
    Cursor,
    Native,
}

impl StreamStrategy {
    /// Pick the strategy for `dialect`, or fail if it has none.
    pub fn for_dialect(dialect: &Dialect) -> QueryResult<Self> {
        if dialect.supports_cursors() {
            Ok(StreamStrategy::Cursor)
        } else if dialect.supports_native_streaming() {
            Ok(StreamStrategy::Native)
        } else {
            Err(QueryError::UnsupportedStreaming(dialect.name().to_string()))
        }
    }

    async fn run<C, F>(&self, conn: &C, plan: &StreamPlan<'_>, deliver: F) -> QueryResult<()>
    where
        C: Connection,
        F: FnMut(RowSet) -> QueryResult<()>,
    {
        match self {
            StreamStrategy::Cursor => CursorStreaming.stream(conn, plan, deliver).await,
            StreamStrategy::Native => NativeStreaming.stream(conn, plan, deliver).await,
        }
    }
}

impl<M: RowMapper> QueryBuilder<M> {
    /// Stream every row to `callback`, fetching the configured batch size at a time.
    ///
    /// Returns the number of rows delivered. An error returned by the callback stops the
    /// stream, rolls back, and is returned as is.
    pub async fn stream_each<C, F>(&mut self, conn: &C, callback: F) -> QueryResult<u64>
    where
        C: Connection,
        F: FnMut(M::Output) -> QueryResult<()>,
    {
        let batch_size = self.config.batch_size;
        self.stream_each_batched(conn, batch_size, callback).await
    }

    /// [`QueryBuilder::stream_each`] with an explicit batch size.
    pub async fn stream_each_batched<C, F>(
        &mut self,
        conn: &C,
        batch_size: usize,
        mut callback: F,
    ) -> QueryResult<u64>
    where
        C: Connection,
        F: FnMut(M::Output) -> QueryResult<()>,
    {
        if batch_size == 0 {
            return Err(QueryError::invalid_argument(
                "batch size must be a positive integer",
            ));
        }
        self.check_dialect(conn)?;
        let strategy = StreamStrategy::for_dialect(&conn.dialect())?;
        let prefix = &self.config.cursor_prefix;
        if strategy == StreamStrategy::Cursor && !Ident::parse(prefix).is_ok_and(|i| i.is_plain()) {
            return Err(QueryError::invalid_argument(format!(
                "Cursor prefix must be a plain identifier, got {prefix:?}"
            )));
        }
        let cursor = format!("{prefix}_{}", self.id);
        let sql = self.build_query();
        self.config.logger.emit(StatementKind::Stream, &sql);

        let mut shape = self.shape.take();
        let mut delivered = 0u64;
        let deliver = |batch: RowSet| -> QueryResult<()> {
            let batch_shape = reuse_shape(&mut shape, batch.columns());
            for values in batch.into_rows() {
                callback(M::map_row(&batch_shape, values)?)?;
                delivered += 1;
            }
            Ok(())
        };

        let plan = StreamPlan {
            sql: &sql,
            cursor: &cursor,
            batch_size,
            logger: &self.config.logger,
        };
        let result = strategy.run(conn, &plan, deliver).await;
        self.shape = shape;
        tracing::debug!(
            target: "simple_query",
            builder = self.id,
            strategy = ?strategy,
            delivered,
            ok = result.is_ok(),
            "stream finished"
        );
        result.map(|()| delivered)
    }
}

#[cfg(test)]
mod tests;
