//! Query builder.
//!
//! [`QueryBuilder`] accumulates clause state through chained calls and compiles it into one
//! SELECT statement with a fixed clause order:
//!
//! ```text
//! SELECT [DISTINCT] <projection> FROM <table> [joins] [WHERE ..] [GROUP BY ..] [HAVING ..]
//!     [ORDER BY ..] [LIMIT n] [OFFSET m]
//! ```
//!
//! Compiled SQL is cached per builder and keyed by the full clause state; every mutating
//! call clears the cache.
//!
//! # Example
//! ```ignore
//! use simple_query::{Dialect, Source};
//!
//! let users = Source::new("users")?.with_dialect(Dialect::Postgres).into_shared();
//! let mut query = users
//!     .query()
//!     .select(["id", "name"])?
//!     .where_eq("active", true)?
//!     .order("name", "asc")?
//!     .limit(10)?;
//!
//! assert_eq!(
//!     query.build_query(),
//!     "SELECT users.id, users.name FROM users WHERE users.active = TRUE \
//!      ORDER BY users.name ASC LIMIT 10"
//! );
//! # Ok::<(), simple_query::QueryError>(())
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::{QueryKey, SqlCache};
use crate::clause::{
    AggregationClause, Clause, Condition, DistinctClause, GroupHavingClause, IntoDirection,
    JoinClause, JoinKind, LimitOffsetClause, OrderClause, SetClause, WhereClause,
};
use crate::config::ExecConfig;
use crate::error::{QueryError, QueryResult};
use crate::ident::qualified_column;
use crate::read_model::{MapTo, ReadModel, Records};
use crate::record::RecordShape;
use crate::scope::ScopeArgs;
use crate::source::Source;
use crate::value::Value;

static NEXT_BUILDER_ID: AtomicU64 = AtomicU64::new(1);

/// Fluent SELECT builder bound to a [`Source`].
///
/// `M` selects how rows are returned: [`Records`] (the default) or [`MapTo<R>`] for a
/// read model `R`, chosen with [`QueryBuilder::map_to`].
pub struct QueryBuilder<M = Records> {
    pub(crate) source: Arc<Source>,
    pub(crate) id: u64,
    pub(crate) config: ExecConfig,
    selects: Vec<String>,
    wheres: WhereClause,
    joins: JoinClause,
    group_having: GroupHavingClause,
    orders: OrderClause,
    limits: LimitOffsetClause,
    distinct: DistinctClause,
    aggregations: AggregationClause,
    pub(crate) cache: SqlCache,
    pub(crate) shape: Option<Arc<RecordShape>>,
    mapper: PhantomData<fn() -> M>,
}

impl QueryBuilder<Records> {
    pub fn new(source: &Arc<Source>) -> Self {
        let table = source.table().clone();
        let dialect = source.dialect().clone();
        Self {
            source: Arc::clone(source),
            id: NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed),
            config: ExecConfig::default(),
            selects: Vec::new(),
            wheres: WhereClause::new(table.clone(), dialect.clone()),
            joins: JoinClause::new(),
            group_having: GroupHavingClause::new(table.clone(), dialect.clone()),
            orders: OrderClause::new(table.clone()),
            limits: LimitOffsetClause::new(),
            distinct: DistinctClause::new(),
            aggregations: AggregationClause::new(table, dialect),
            cache: SqlCache::default(),
            shape: None,
            mapper: PhantomData,
        }
    }
}

impl<M> QueryBuilder<M> {
    /// Process-unique id of this builder; also names its streaming cursor.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Replace the execution settings. Does not affect the compiled SQL.
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    fn changed(mut self) -> Self {
        self.cache.clear();
        self
    }

    // ==================== Projection ====================

    /// Project columns, qualified with the source table unless already dotted.
    pub fn select<I, S>(mut self, columns: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = self.source.table();
        let columns = columns
            .into_iter()
            .map(|c| qualified_column(table, c.as_ref()))
            .collect::<QueryResult<Vec<_>>>()?;
        self.selects.extend(columns);
        Ok(self.changed())
    }

    /// Project raw SQL expressions as given.
    pub fn select_raw<I, S>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selects.extend(expressions.into_iter().map(Into::into));
        self.changed()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct.enable();
        self.changed()
    }

    // ==================== Filtering ====================

    /// Add any [`Condition`]. Successive filters are ANDed in call order.
    pub fn filter(mut self, condition: Condition) -> QueryResult<Self> {
        self.wheres.add(condition)?;
        Ok(self.changed())
    }

    /// `table.column = value` (`IS NULL` for null, `IN (...)` for lists).
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> QueryResult<Self> {
        self.filter(Condition::eq(column, value))
    }

    /// One equality predicate per pair.
    pub fn where_all<K, V>(self, pairs: impl IntoIterator<Item = (K, V)>) -> QueryResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter(Condition::columns(pairs))
    }

    /// A raw boolean expression.
    pub fn where_raw(self, sql: impl Into<String>) -> QueryResult<Self> {
        self.filter(Condition::raw(sql))
    }

    /// A template with `?` placeholders.
    pub fn where_sql<V: Into<Value>>(
        self,
        template: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> QueryResult<Self> {
        self.filter(Condition::positional(template, values))
    }

    /// A template with `:name` placeholders.
    pub fn where_named<K, V>(
        self,
        template: impl Into<String>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> QueryResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter(Condition::named(template, values))
    }

    // ==================== Joins ====================

    /// `INNER JOIN right ON right.foreign_key = left.primary_key`
    pub fn join(
        self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> QueryResult<Self> {
        self.join_with(left, right, foreign_key, primary_key, JoinKind::Inner)
    }

    pub fn left_join(
        self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> QueryResult<Self> {
        self.join_with(left, right, foreign_key, primary_key, JoinKind::Left)
    }

    pub fn right_join(
        self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> QueryResult<Self> {
        self.join_with(left, right, foreign_key, primary_key, JoinKind::Right)
    }

    pub fn full_join(
        self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> QueryResult<Self> {
        self.join_with(left, right, foreign_key, primary_key, JoinKind::Full)
    }

    pub fn join_with(
        mut self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
        kind: JoinKind,
    ) -> QueryResult<Self> {
        self.joins.add(left, right, foreign_key, primary_key, kind)?;
        Ok(self.changed())
    }

    // ==================== Ordering & pagination ====================

    /// Sort by `column`; `direction` is a [`Direction`](crate::Direction) or `"asc"`/`"desc"`.
    pub fn order(mut self, column: &str, direction: impl IntoDirection) -> QueryResult<Self> {
        self.orders.add(column, direction)?;
        Ok(self.changed())
    }

    /// Several sort keys at once, in order.
    pub fn order_by<I, S, D>(mut self, keys: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (S, D)>,
        S: AsRef<str>,
        D: IntoDirection,
    {
        let mut orders = self.orders.clone();
        for (column, direction) in keys {
            orders.add(column.as_ref(), direction)?;
        }
        self.orders = orders;
        Ok(self.changed())
    }

    pub fn limit(mut self, limit: i64) -> QueryResult<Self> {
        self.limits.with_limit(limit)?;
        Ok(self.changed())
    }

    pub fn offset(mut self, offset: i64) -> QueryResult<Self> {
        self.limits.with_offset(offset)?;
        Ok(self.changed())
    }

    // ==================== Grouping ====================

    pub fn group<I, S>(mut self, columns: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_having.add_group(columns)?;
        Ok(self.changed())
    }

    /// A raw HAVING predicate.
    pub fn having(mut self, sql: impl Into<String>) -> QueryResult<Self> {
        self.group_having.add_having(Condition::raw(sql))?;
        Ok(self.changed())
    }

    /// A HAVING template with `?` placeholders.
    pub fn having_sql<V: Into<Value>>(
        mut self,
        template: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> QueryResult<Self> {
        self.group_having
            .add_having(Condition::positional(template, values))?;
        Ok(self.changed())
    }

    // ==================== Aggregations ====================

    /// `COUNT(*) AS count`, or `COUNT(table.col) AS count_col`.
    pub fn count<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.count(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn sum<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.sum(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn avg<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.avg(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn min<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.min(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn max<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.max(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn variance<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.variance(column.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn stddev<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.stddev(column.into(), alias.into())?;
        Ok(self.changed())
    }

    /// String aggregation; the separator defaults to `,`.
    pub fn group_concat<'a>(
        mut self,
        column: impl Into<Option<&'a str>>,
        separator: impl Into<Option<&'a str>>,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations
            .group_concat(column.into(), separator.into(), alias.into())?;
        Ok(self.changed())
    }

    pub fn custom(mut self, expression: &str, alias: &str) -> QueryResult<Self> {
        self.aggregations.custom(expression, alias)?;
        Ok(self.changed())
    }

    pub fn stats(mut self, column: &str) -> QueryResult<Self> {
        self.aggregations.stats(column)?;
        Ok(self.changed())
    }

    pub fn total_count(mut self) -> Self {
        self.aggregations.total_count();
        self.changed()
    }

    pub fn first_by(mut self, column: &str, order_column: &str) -> QueryResult<Self> {
        self.aggregations.first_by(column, order_column)?;
        Ok(self.changed())
    }

    pub fn last_by(mut self, column: &str, order_column: &str) -> QueryResult<Self> {
        self.aggregations.last_by(column, order_column)?;
        Ok(self.changed())
    }

    pub fn percentage_of_total<'a>(
        mut self,
        column: &str,
        alias: impl Into<Option<&'a str>>,
    ) -> QueryResult<Self> {
        self.aggregations.percentage_of_total(column, alias.into())?;
        Ok(self.changed())
    }

    // ==================== Mapping ====================

    /// Return rows as the read model `R` instead of generic records.
    pub fn map_to<R: ReadModel>(self) -> QueryBuilder<MapTo<R>> {
        self.with_mapper()
    }

    /// Return rows as generic records.
    pub fn records(self) -> QueryBuilder<Records> {
        self.with_mapper()
    }

    fn with_mapper<N>(self) -> QueryBuilder<N> {
        QueryBuilder {
            source: self.source,
            id: self.id,
            config: self.config,
            selects: self.selects,
            wheres: self.wheres,
            joins: self.joins,
            group_having: self.group_having,
            orders: self.orders,
            limits: self.limits,
            distinct: self.distinct,
            aggregations: self.aggregations,
            cache: SqlCache::default(),
            shape: self.shape,
            mapper: PhantomData,
        }
    }

    // ==================== Scopes ====================

    /// Apply the named scope registered on the source.
    pub fn scope(self, name: &str) -> QueryResult<Self> {
        self.scope_with(name, std::iter::empty::<Value>())
    }

    /// Apply the named scope with arguments.
    pub fn scope_with<V: Into<Value>>(
        self,
        name: &str,
        args: impl IntoIterator<Item = V>,
    ) -> QueryResult<Self> {
        let body = self
            .source
            .scopes()
            .get(name)
            .ok_or_else(|| QueryError::UnknownScope(name.to_string()))?;
        let args = ScopeArgs::new(args.into_iter().map(Into::into).collect());
        tracing::trace!(target: "simple_query", builder = self.id, scope = name, "applying scope");
        let scoped = body(self.with_mapper::<Records>(), &args)?;
        Ok(scoped.with_mapper())
    }

    pub fn has_scope(&self, name: &str) -> bool {
        self.source.scopes().contains(name)
    }

    // ==================== Compilation ====================

    /// Compile the current clause state, reusing the cached SQL when unchanged.
    pub fn build_query(&mut self) -> String {
        let key = self.cache_key();
        if let Some(sql) = self.cache.get(&key) {
            tracing::trace!(target: "simple_query", builder = self.id, "query cache hit");
            return sql.to_string();
        }
        let sql = self.assemble();
        self.cache.insert(key, sql.clone());
        tracing::trace!(
            target: "simple_query",
            builder = self.id,
            compiles = self.cache.compiles(),
            "query cache miss"
        );
        sql
    }

    /// The bulk UPDATE statement for `pairs`, restricted by the current filters.
    ///
    /// Joins, ordering and pagination do not apply to bulk updates.
    pub fn bulk_update_sql<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>) -> QueryResult<String>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let set = SetClause::new(self.source.dialect().clone(), pairs)?;
        let mut sql = format!("UPDATE {} SET {}", self.source.table(), set.to_sql()?);
        self.wheres.write_sql(&mut sql);
        Ok(sql)
    }

    fn assemble(&self) -> String {
        let mut sql = String::from("SELECT");
        self.distinct.write_sql(&mut sql);
        sql.push(' ');

        if self.selects.is_empty() && self.aggregations.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.selects.join(", "));
            if !self.aggregations.is_empty() {
                if !self.selects.is_empty() {
                    sql.push_str(", ");
                }
                sql.push_str(&self.aggregations.to_sql());
            }
        }

        sql.push_str(" FROM ");
        self.source.table().write_sql(&mut sql);
        self.joins.write_sql(&mut sql);
        self.wheres.write_sql(&mut sql);
        self.group_having.write_sql(&mut sql);
        self.orders.write_sql(&mut sql);
        self.limits.write_sql(&mut sql);
        sql
    }

    fn cache_key(&self) -> QueryKey {
        QueryKey {
            selects: self.selects.clone(),
            wheres: self.wheres.predicates().to_vec(),
            joins: self.joins.joins().to_vec(),
            groups: self.group_having.groups().to_vec(),
            havings: self.group_having.havings().to_vec(),
            orders: self.orders.orders().to_vec(),
            limit: self.limits.limit(),
            offset: self.limits.offset(),
            distinct: self.distinct.is_enabled(),
            aggregations: self.aggregations.items().to_vec(),
        }
    }
}

impl<M> fmt::Debug for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("id", &self.id)
            .field("table", &self.source.table().to_sql())
            .field("selects", &self.selects)
            .field("wheres", &self.wheres.predicates())
            .field("joins", &self.joins.joins())
            .field("orders", &self.orders.orders())
            .field("limit", &self.limits.limit())
            .field("offset", &self.limits.offset())
            .field("distinct", &self.distinct.is_enabled())
            .field("aggregations", &self.aggregations.items())
            .finish()
    }
}
