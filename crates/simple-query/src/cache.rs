//! Per-builder SQL cache.

use std::collections::HashMap;

use crate::clause::{Aggregation, Direction, Join};

/// Snapshot of every piece of clause state that influences the compiled SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct QueryKey {
    pub selects: Vec<String>,
    pub wheres: Vec<String>,
    pub joins: Vec<Join>,
    pub groups: Vec<String>,
    pub havings: Vec<String>,
    pub orders: Vec<(String, Direction)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub distinct: bool,
    pub aggregations: Vec<Aggregation>,
}

/// Compiled SQL by clause state. Cleared whenever the builder is mutated.
#[derive(Debug, Default, Clone)]
pub(crate) struct SqlCache {
    entries: HashMap<QueryKey, String>,
    compiles: u64,
}

impl SqlCache {
    pub fn get(&self, key: &QueryKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: QueryKey, sql: String) {
        self.compiles += 1;
        self.entries.insert(key, sql);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// How many times the assembler ran for this builder.
    pub fn compiles(&self) -> u64 {
        self.compiles
    }
}
