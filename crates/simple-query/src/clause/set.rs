use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::ident::Ident;
use crate::value::Value;

/// Column assignments for a bulk `UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    dialect: Dialect,
    assignments: Vec<(String, Value)>,
}

impl SetClause {
    /// Build from column/value pairs. Fails when there is nothing to assign.
    pub fn new<K, V>(dialect: Dialect, pairs: impl IntoIterator<Item = (K, V)>) -> QueryResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let assignments: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if assignments.is_empty() {
            return Err(QueryError::invalid_argument("No columns to update"));
        }
        for (column, _) in &assignments {
            let ident = Ident::parse(column)?;
            if ident.is_qualified() {
                return Err(QueryError::invalid_argument(format!(
                    "Update column must not be qualified: {column}"
                )));
            }
        }
        Ok(Self {
            dialect,
            assignments,
        })
    }

    pub fn assignments(&self) -> &[(String, Value)] {
        &self.assignments
    }

    /// `"col" = value, ...`
    pub fn to_sql(&self) -> QueryResult<String> {
        let mut out = String::new();
        for (i, (column, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let name = Ident::parse(column)?;
            out.push_str(&self.dialect.quote_column(name.name()));
            out.push_str(" = ");
            self.dialect.write_literal(value, &mut out)?;
        }
        Ok(out)
    }
}
