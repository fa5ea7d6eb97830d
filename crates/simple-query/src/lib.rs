//! # simple-query
//!
//! A fluent, composable SQL query builder with typed result mapping and batched streaming.
//!
//! A [`Source`] names a table, its [`Dialect`] and its named scopes. A [`QueryBuilder`]
//! accumulates clauses through chained calls, compiles them into one SQL statement (cached
//! per builder until the next change) and executes it on any [`Connection`].
//!
//! ## Quick start
//!
//! ```ignore
//! use simple_query::{ReadModel, Source};
//!
//! #[derive(Debug, ReadModel)]
//! struct UserSummary {
//!     #[read_model(column = "id")]
//!     identifier: i64,
//!     #[read_model(column = "name")]
//!     full_name: Option<String>,
//! }
//!
//! let users = Source::new("users")?
//!     .scope("active", |q, _| q.where_eq("active", true))
//!     .into_shared();
//!
//! let mut query = users
//!     .query()
//!     .scope("active")?
//!     .where_sql("created_at > ?", ["2024-01-01"])?
//!     .order("name", "asc")?
//!     .limit(50)?
//!     .map_to::<UserSummary>();
//!
//! let summaries: Vec<UserSummary> = query.execute(&client).await?;
//!
//! // Large result sets: Postgres cursor / MySQL native streaming, 1000 rows per batch.
//! let delivered = query
//!     .stream_each(&client, |user| {
//!         println!("{user:?}");
//!         Ok(())
//!     })
//!     .await?;
//!
//! // Bulk update of every row matching the filters.
//! users.query().where_eq("status", 0)?.bulk_update(&client, [("status", 9)]).await?;
//! ```
//!
//! Values are rendered into the SQL as escaped literals for the source's dialect; builders
//! never send bind parameters.

pub mod builder;
mod cache;
pub mod clause;
pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
mod exec;
pub mod ident;
pub mod logging;
#[cfg(feature = "pool")]
pub mod pool;
pub mod read_model;
pub mod record;
pub mod row;
pub mod scope;
pub mod source;
pub mod stream;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::QueryBuilder;
pub use clause::{
    Aggregation, AggregationClause, Clause, Condition, Direction, DistinctClause,
    GroupHavingClause, IntoDirection, Join, JoinClause, JoinKind, LimitOffsetClause,
    OrderClause, SetClause, WhereClause,
};
pub use client::Connection;
pub use config::{DEFAULT_BATCH_SIZE, DEFAULT_CURSOR_PREFIX, ExecConfig};
pub use dialect::Dialect;
pub use error::{QueryError, QueryResult};
pub use exec::LazyRows;
pub use ident::Ident;
pub use logging::{SqlLogger, StatementKind};
#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_builder, create_pool_with_config};
pub use read_model::{Attribute, MapTo, ReadModel, Records, RowMapper, RowView};
pub use record::{Record, RecordShape};
pub use row::{RowSet, RowStream};
pub use scope::{ScopeArgs, ScopeFn, ScopeRegistry};
pub use source::Source;
pub use stream::{StreamState, StreamStrategy};
pub use value::{FromValue, Value};

// Re-export the derive macro. Traits and derive macros live in different namespaces,
// so `ReadModel` names both.
#[cfg(feature = "derive")]
pub use simple_query_derive::ReadModel;

// Re-export tokio_postgres for convenience
pub use tokio_postgres;
