use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::ident::{Ident, qualified_column};

use super::{Clause, Condition};

/// GROUP BY columns and HAVING predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupHavingClause {
    table: Ident,
    dialect: Dialect,
    groups: Vec<String>,
    havings: Vec<String>,
}

impl GroupHavingClause {
    pub fn new(table: Ident, dialect: Dialect) -> Self {
        Self {
            table,
            dialect,
            groups: Vec::new(),
            havings: Vec::new(),
        }
    }

    pub fn add_group<I, S>(&mut self, columns: I) -> QueryResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = columns
            .into_iter()
            .map(|c| qualified_column(&self.table, c.as_ref()))
            .collect::<QueryResult<Vec<_>>>()?;
        self.groups.extend(columns);
        Ok(())
    }

    pub fn add_having(&mut self, condition: Condition) -> QueryResult<()> {
        let rendered = condition.render(&self.table, &self.dialect)?;
        self.havings.extend(rendered);
        Ok(())
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn havings(&self) -> &[String] {
        &self.havings
    }
}

impl Clause for GroupHavingClause {
    fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.havings.is_empty()
    }

    fn write_sql(&self, out: &mut String) {
        if !self.groups.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&self.groups.join(", "));
        }
        if !self.havings.is_empty() {
            out.push_str(" HAVING ");
            out.push_str(&self.havings.join(" AND "));
        }
    }
}
