use futures_util::StreamExt;

use crate::client::Connection;
use crate::error::QueryResult;
use crate::row::RowSet;

use super::{StreamPlan, StreamingStrategy};

/// The driver's own unbuffered streaming mode. No transaction is opened.
pub(crate) struct NativeStreaming;

impl StreamingStrategy for NativeStreaming {
    async fn stream<C, F>(&self, conn: &C, plan: &StreamPlan<'_>, mut deliver: F) -> QueryResult<()>
    where
        C: Connection,
        F: FnMut(RowSet) -> QueryResult<()>,
    {
        let mut rows = conn.stream_rows(plan.sql).await?;
        while let Some(batch) = rows.next().await {
            deliver(batch?)?;
        }
        Ok(())
    }
}
