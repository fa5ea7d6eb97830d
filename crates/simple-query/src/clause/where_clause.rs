use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::ident::{Ident, qualified_column};
use crate::value::Value;

use super::Clause;
use super::template::{render_named, render_positional};

/// One filter as the caller describes it.
///
/// # Example
/// ```ignore
/// use simple_query::Condition;
///
/// Condition::eq("active", true);
/// Condition::columns([("admin", false.into()), ("status", 1.into())]);
/// Condition::positional("founded_year > ?", [2000]);
/// Condition::named("industry = :industry", [("industry", "Tech")]);
/// Condition::raw("name LIKE 'A%'");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Column/value pairs, one equality predicate per pair.
    Columns(Vec<(String, Value)>),
    /// A boolean SQL expression used as given.
    Raw(String),
    /// A template with `?` placeholders.
    Positional { template: String, values: Vec<Value> },
    /// A template with `:name` placeholders.
    Named {
        template: String,
        values: Vec<(String, Value)>,
    },
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Columns(vec![(column.into(), value.into())])
    }

    pub fn columns<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Columns(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw(sql.into())
    }

    pub fn positional<V: Into<Value>>(
        template: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Condition::Positional {
            template: template.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn named<K, V>(template: impl Into<String>, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Condition::Named {
            template: template.into(),
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Render into one or more predicates, qualifying bare columns with `table`.
    pub(crate) fn render(self, table: &Ident, dialect: &Dialect) -> QueryResult<Vec<String>> {
        match self {
            Condition::Columns(pairs) => {
                if pairs.is_empty() {
                    return Err(QueryError::invalid_argument("Condition has no columns"));
                }
                pairs
                    .into_iter()
                    .map(|(column, value)| equality(table, dialect, &column, &value))
                    .collect()
            }
            Condition::Raw(sql) => Ok(vec![parenthesize(&sql)?]),
            Condition::Positional { template, values } => {
                let sql = render_positional(dialect, &template, &values)?;
                Ok(vec![parenthesize(&sql)?])
            }
            Condition::Named { template, values } => {
                let sql = render_named(dialect, &template, &values)?;
                Ok(vec![parenthesize(&sql)?])
            }
        }
    }
}

fn equality(table: &Ident, dialect: &Dialect, column: &str, value: &Value) -> QueryResult<String> {
    let column = qualified_column(table, column)?;
    Ok(match value {
        Value::Null => format!("{column} IS NULL"),
        Value::List(items) if items.is_empty() => "1=0".to_string(),
        Value::List(_) => format!("{column} IN ({})", dialect.literal(value)?),
        _ => format!("{column} = {}", dialect.literal(value)?),
    })
}

fn parenthesize(sql: &str) -> QueryResult<String> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(QueryError::invalid_argument("Condition cannot be empty"));
    }
    Ok(format!("({sql})"))
}

/// Ordered filter predicates, ANDed in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhereClause {
    table: Ident,
    dialect: Dialect,
    predicates: Vec<String>,
}

impl WhereClause {
    pub fn new(table: Ident, dialect: Dialect) -> Self {
        Self {
            table,
            dialect,
            predicates: Vec::new(),
        }
    }

    /// Append a condition. Invalid input leaves the clause unchanged.
    pub fn add(&mut self, condition: Condition) -> QueryResult<()> {
        let rendered = condition.render(&self.table, &self.dialect)?;
        self.predicates.extend(rendered);
        Ok(())
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    /// The combined predicate (`a AND b`), if any.
    pub fn to_sql(&self) -> Option<String> {
        (!self.predicates.is_empty()).then(|| self.predicates.join(" AND "))
    }
}

impl Clause for WhereClause {
    fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn write_sql(&self, out: &mut String) {
        if let Some(sql) = self.to_sql() {
            out.push_str(" WHERE ");
            out.push_str(&sql);
        }
    }
}
