//! Schema sources.

use std::sync::Arc;

use crate::builder::QueryBuilder;
use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::ident::{Ident, qualified_column};
use crate::scope::{ScopeArgs, ScopeRegistry};

/// The table a builder queries, its dialect and its named scopes.
///
/// # Example
/// ```ignore
/// use simple_query::{Dialect, Source};
///
/// let users = Source::new("users")?
///     .with_dialect(Dialect::Sqlite)
///     .scope("active", |q, _| q.where_eq("active", true))
///     .scope("by_name", |q, args| q.where_eq("name", args.value(0)?.clone()))
///     .into_shared();
///
/// let mut query = users.query().scope("active")?.limit(10)?;
/// # Ok::<(), simple_query::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Source {
    table: Ident,
    dialect: Dialect,
    scopes: ScopeRegistry,
}

impl Source {
    pub fn new(table: &str) -> QueryResult<Self> {
        Ok(Self {
            table: Ident::parse(table)?,
            dialect: Dialect::default(),
            scopes: ScopeRegistry::new(),
        })
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Register a named scope.
    pub fn scope<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(QueryBuilder, &ScopeArgs) -> QueryResult<QueryBuilder> + Send + Sync + 'static,
    {
        self.scopes.register(name, body);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// A column reference qualified with this table (`users.name`).
    pub fn column(&self, name: &str) -> QueryResult<String> {
        qualified_column(&self.table, name)
    }

    /// A new builder over this source.
    pub fn query(self: &Arc<Self>) -> QueryBuilder {
        QueryBuilder::new(self)
    }
}
