use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::ident::{Ident, IdentPart};

/// One `expression AS alias` projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregation {
    pub expression: String,
    pub alias: String,
}

impl Aggregation {
    pub fn to_sql(&self) -> String {
        format!("{} AS {}", self.expression, self.alias)
    }
}

/// Aggregate projections.
///
/// Columns are qualified with the source table unless they already carry a dot, and
/// aliases default to `<function>_<column>` (dots become underscores, quoted when the
/// result is not a plain identifier).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationClause {
    table: Ident,
    dialect: Dialect,
    items: Vec<Aggregation>,
}

impl AggregationClause {
    pub fn new(table: Ident, dialect: Dialect) -> Self {
        Self {
            table,
            dialect,
            items: Vec::new(),
        }
    }

    /// `COUNT(*) AS count`, or `COUNT(col) AS count_<col>`.
    pub fn count(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        match column {
            None => {
                let alias = self.alias_or(alias, "count")?;
                self.push("COUNT(*)".to_string(), alias);
            }
            Some(column) => {
                let resolved = self.resolve_column(column)?;
                let alias = self.alias_or(alias, &default_alias("count", column)?)?;
                self.push(format!("COUNT({resolved})"), alias);
            }
        }
        Ok(())
    }

    pub fn sum(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("SUM", "sum", column, alias)
    }

    pub fn avg(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("AVG", "avg", column, alias)
    }

    pub fn min(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("MIN", "min", column, alias)
    }

    pub fn max(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("MAX", "max", column, alias)
    }

    pub fn variance(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("VARIANCE", "variance", column, alias)
    }

    pub fn stddev(&mut self, column: Option<&str>, alias: Option<&str>) -> QueryResult<()> {
        self.function("STDDEV", "stddev", column, alias)
    }

    /// String aggregation, rendered per dialect.
    pub fn group_concat(
        &mut self,
        column: Option<&str>,
        separator: Option<&str>,
        alias: Option<&str>,
    ) -> QueryResult<()> {
        let column = require_column(column, "group_concat")?;
        let resolved = self.resolve_column(column)?;
        let expression = self
            .dialect
            .group_concat(&resolved, separator.unwrap_or(","))?;
        let alias = self.alias_or(alias, &default_alias("group_concat", column)?)?;
        self.push(expression, alias);
        Ok(())
    }

    /// A caller-written expression. Both parts are required.
    pub fn custom(&mut self, expression: &str, alias: &str) -> QueryResult<()> {
        if expression.trim().is_empty() || alias.trim().is_empty() {
            return Err(QueryError::invalid_argument(
                "Custom aggregation requires both an expression and an alias",
            ));
        }
        let alias = parse_alias(alias)?;
        self.push(expression.trim().to_string(), alias);
        Ok(())
    }

    /// COUNT, SUM, AVG, MIN and MAX of one column, aliased `<column>_<fn>`.
    pub fn stats(&mut self, column: &str) -> QueryResult<()> {
        let stem = alias_stem(column)?;
        let resolved = self.resolve_column(column)?;
        let mut staged = Vec::with_capacity(5);
        for (function, suffix) in [
            ("COUNT", "count"),
            ("SUM", "sum"),
            ("AVG", "avg"),
            ("MIN", "min"),
            ("MAX", "max"),
        ] {
            staged.push(Aggregation {
                expression: format!("{function}({resolved})"),
                alias: parse_alias(&plain_or_quoted(format!("{stem}_{suffix}")))?,
            });
        }
        self.items.extend(staged);
        Ok(())
    }

    /// `COUNT(*) AS total_count`
    pub fn total_count(&mut self) {
        self.push("COUNT(*)".to_string(), "total_count".to_string());
    }

    /// Value of `column` on the row that sorts first by `order_column`.
    pub fn first_by(&mut self, column: &str, order_column: &str) -> QueryResult<()> {
        self.window_first(column, order_column, "ASC", "first")
    }

    /// Value of `column` on the row that sorts last by `order_column`.
    pub fn last_by(&mut self, column: &str, order_column: &str) -> QueryResult<()> {
        self.window_first(column, order_column, "DESC", "last")
    }

    /// Share of the grand total contributed by each group, as a percentage.
    pub fn percentage_of_total(&mut self, column: &str, alias: Option<&str>) -> QueryResult<()> {
        let resolved = self.resolve_column(column)?;
        let default = plain_or_quoted(format!("{}_percentage", alias_stem(column)?));
        let alias = self.alias_or(alias, &default)?;
        self.push(
            format!("ROUND(SUM({resolved}) * 100.0 / SUM(SUM({resolved})) OVER (), 2)"),
            alias,
        );
        Ok(())
    }

    pub fn items(&self) -> &[Aggregation] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `expr AS alias, ...`
    pub fn to_sql(&self) -> String {
        self.items
            .iter()
            .map(Aggregation::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn function(
        &mut self,
        function: &str,
        name: &str,
        column: Option<&str>,
        alias: Option<&str>,
    ) -> QueryResult<()> {
        let column = require_column(column, name)?;
        let resolved = self.resolve_column(column)?;
        let alias = self.alias_or(alias, &default_alias(name, column)?)?;
        self.push(format!("{function}({resolved})"), alias);
        Ok(())
    }

    fn window_first(
        &mut self,
        column: &str,
        order_column: &str,
        direction: &str,
        prefix: &str,
    ) -> QueryResult<()> {
        let resolved = self.resolve_column(column)?;
        let order = self.resolve_column(order_column)?;
        let alias = parse_alias(&default_alias(prefix, column)?)?;
        self.push(
            format!("FIRST_VALUE({resolved}) OVER (ORDER BY {order} {direction})"),
            alias,
        );
        Ok(())
    }

    fn resolve_column(&self, column: &str) -> QueryResult<String> {
        Ok(Ident::parse(column)?.qualify(&self.table).to_sql())
    }

    fn alias_or(&self, alias: Option<&str>, default: &str) -> QueryResult<String> {
        parse_alias(alias.unwrap_or(default))
    }

    fn push(&mut self, expression: String, alias: String) {
        self.items.push(Aggregation { expression, alias });
    }
}

fn require_column<'a>(column: Option<&'a str>, name: &str) -> QueryResult<&'a str> {
    match column {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(QueryError::invalid_argument(format!(
            "Column is required for {name} aggregation"
        ))),
    }
}

fn default_alias(name: &str, column: &str) -> QueryResult<String> {
    Ok(plain_or_quoted(format!("{name}_{}", alias_stem(column)?)))
}

/// Part names of `column` without quotes, joined with `_`.
fn alias_stem(column: &str) -> QueryResult<String> {
    let ident = Ident::parse(column)?;
    let names: Vec<&str> = ident
        .parts
        .iter()
        .map(|part| match part {
            IdentPart::Unquoted(name) | IdentPart::Quoted(name) => name.as_str(),
        })
        .collect();
    Ok(names.join("_"))
}

fn plain_or_quoted(alias: String) -> String {
    match Ident::parse(&alias) {
        Ok(ident) if ident.is_plain() => alias,
        _ => format!("\"{}\"", alias.replace('"', "\"\"")),
    }
}

fn parse_alias(alias: &str) -> QueryResult<String> {
    let ident = Ident::parse(alias)?;
    if ident.is_qualified() {
        return Err(QueryError::invalid_argument(format!(
            "Alias must be a single identifier: {alias}"
        )));
    }
    Ok(ident.to_sql())
}
