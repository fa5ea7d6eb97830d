//! Named scopes.
//!
//! A scope is a reusable, parameterizable query fragment registered on a [`Source`] and
//! applied by name with [`QueryBuilder::scope`] or [`QueryBuilder::scope_with`].
//!
//! [`Source`]: crate::Source
//! [`QueryBuilder::scope`]: crate::QueryBuilder::scope
//! [`QueryBuilder::scope_with`]: crate::QueryBuilder::scope_with

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::builder::QueryBuilder;
use crate::error::{QueryError, QueryResult};
use crate::value::{FromValue, Value};

/// A registered scope body.
pub type ScopeFn =
    Arc<dyn Fn(QueryBuilder, &ScopeArgs) -> QueryResult<QueryBuilder> + Send + Sync + 'static>;

/// Arguments passed to a scope at the call site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeArgs {
    values: Vec<Value>,
}

impl ScopeArgs {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// The argument at `index`, or an error naming the missing position.
    pub fn value(&self, index: usize) -> QueryResult<&Value> {
        self.values.get(index).ok_or_else(|| {
            QueryError::invalid_argument(format!(
                "missing scope argument {index} (got {})",
                self.values.len()
            ))
        })
    }

    /// The argument at `index` converted to `T`.
    pub fn arg<T: FromValue>(&self, index: usize) -> QueryResult<T> {
        let value = self.value(index)?;
        T::from_value(value).ok_or_else(|| {
            QueryError::invalid_argument(format!(
                "scope argument {index} is {}, expected {}",
                value.kind(),
                std::any::type_name::<T>()
            ))
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

/// Scope name to body.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, ScopeFn>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `body` under `name`, replacing any previous scope of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn(QueryBuilder, &ScopeArgs) -> QueryResult<QueryBuilder> + Send + Sync + 'static,
    {
        self.scopes.insert(name.into(), Arc::new(body));
    }

    pub fn get(&self, name: &str) -> Option<ScopeFn> {
        self.scopes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.names())
            .finish()
    }
}
