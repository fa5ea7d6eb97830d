//! Clause objects.
//!
//! Each clause owns one slice of query state, validates caller input when it is added and
//! renders its SQL fragment. Rendered fragments carry a leading space so the assembler can
//! append them in a fixed order.

mod aggregation;
mod distinct;
mod group_having;
mod join;
mod limit_offset;
mod order;
mod set;
mod template;
mod where_clause;

pub use aggregation::{Aggregation, AggregationClause};
pub use distinct::DistinctClause;
pub use group_having::GroupHavingClause;
pub use join::{Join, JoinClause, JoinKind};
pub use limit_offset::LimitOffsetClause;
pub use order::{Direction, IntoDirection, OrderClause};
pub use set::SetClause;
pub use where_clause::{Condition, WhereClause};

/// A renderable slice of a SELECT statement.
pub trait Clause {
    /// Whether the clause contributes nothing to the statement.
    fn is_empty(&self) -> bool;

    /// Append this clause's SQL (with a leading space) to `out`.
    fn write_sql(&self, out: &mut String);
}
