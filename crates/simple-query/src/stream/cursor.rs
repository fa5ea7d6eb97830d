use crate::client::Connection;
use crate::error::QueryResult;
use crate::logging::StatementKind;
use crate::row::RowSet;

use super::{StateTracker, StreamPlan, StreamState, StreamingStrategy};

/// Server-side cursor inside an explicit transaction.
pub(crate) struct CursorStreaming;

impl StreamingStrategy for CursorStreaming {
    async fn stream<C, F>(&self, conn: &C, plan: &StreamPlan<'_>, mut deliver: F) -> QueryResult<()>
    where
        C: Connection,
        F: FnMut(RowSet) -> QueryResult<()>,
    {
        let mut tracker = StateTracker::new(plan.cursor);
        control(conn, plan, "BEGIN").await?;
        tracker.advance(StreamState::TransactionOpen);
        let mut open = OpenTransaction::new(conn, plan.cursor, tracker);

        match run_cursor(conn, plan, &mut deliver, &mut open.tracker).await {
            Ok(()) => {
                open.release();
                Ok(())
            }
            Err(err) => {
                open.tracker.abort();
                // Best effort: the original error is what the caller needs to see.
                let rollback = control(conn, plan, "ROLLBACK").await;
                open.release();
                if let Err(rollback_err) = rollback {
                    tracing::warn!(
                        target: "simple_query",
                        cursor = plan.cursor,
                        error = %rollback_err,
                        "rollback after failed stream also failed"
                    );
                }
                Err(err)
            }
        }
    }
}

/// The transaction opened by `BEGIN`, until COMMIT or ROLLBACK has run.
///
/// Dropping it unreleased means the stream future was cancelled mid-protocol.
struct OpenTransaction<'a, C: Connection> {
    conn: &'a C,
    cursor: &'a str,
    tracker: StateTracker<'a>,
    armed: bool,
}

impl<'a, C: Connection> OpenTransaction<'a, C> {
    fn new(conn: &'a C, cursor: &'a str, tracker: StateTracker<'a>) -> Self {
        Self {
            conn,
            cursor,
            tracker,
            armed: true,
        }
    }

    fn release(&mut self) {
        self.armed = false;
    }
}

impl<C: Connection> Drop for OpenTransaction<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.tracker.abort();
        tracing::warn!(
            target: "simple_query",
            cursor = self.cursor,
            "stream dropped with its transaction still open"
        );
        self.conn.stream_abandoned(self.cursor);
    }
}

async fn run_cursor<C, F>(
    conn: &C,
    plan: &StreamPlan<'_>,
    deliver: &mut F,
    tracker: &mut StateTracker<'_>,
) -> QueryResult<()>
where
    C: Connection,
    F: FnMut(RowSet) -> QueryResult<()>,
{
    let declare = format!("DECLARE {} NO SCROLL CURSOR FOR {}", plan.cursor, plan.sql);
    control(conn, plan, &declare).await?;
    tracker.advance(StreamState::CursorDeclared);

    let fetch = format!("FETCH {} FROM {}", plan.batch_size, plan.cursor);
    loop {
        tracker.advance(StreamState::Fetching);
        plan.logger.emit(StatementKind::Stream, &fetch);
        let batch = conn.select_all(&fetch).await?;
        if batch.is_empty() {
            break;
        }
        tracker.advance(StreamState::Delivering);
        deliver(batch)?;
    }

    control(conn, plan, &format!("CLOSE {}", plan.cursor)).await?;
    tracker.advance(StreamState::CursorClosed);
    control(conn, plan, "COMMIT").await?;
    tracker.advance(StreamState::Committed);
    Ok(())
}

async fn control<C: Connection>(conn: &C, plan: &StreamPlan<'_>, sql: &str) -> QueryResult<()> {
    plan.logger.emit(StatementKind::Control, sql);
    conn.batch_execute(sql).await
}
