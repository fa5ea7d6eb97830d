use crate::error::{QueryError, QueryResult};

use super::Clause;

/// Pagination bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LimitOffsetClause {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl LimitOffsetClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row limit. Must be positive.
    pub fn with_limit(&mut self, limit: i64) -> QueryResult<()> {
        if limit <= 0 {
            return Err(QueryError::invalid_argument(format!(
                "LIMIT must be a positive integer, got {limit}"
            )));
        }
        self.limit = Some(limit);
        Ok(())
    }

    /// Set the row offset. Must not be negative.
    pub fn with_offset(&mut self, offset: i64) -> QueryResult<()> {
        if offset < 0 {
            return Err(QueryError::invalid_argument(format!(
                "OFFSET must be a non-negative integer, got {offset}"
            )));
        }
        self.offset = Some(offset);
        Ok(())
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }
}

impl Clause for LimitOffsetClause {
    fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    fn write_sql(&self, out: &mut String) {
        if let Some(limit) = self.limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }
    }
}
