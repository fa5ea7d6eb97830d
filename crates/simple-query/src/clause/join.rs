use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::ident::{Ident, qualified_column};

use super::Clause;

/// Join kind. Joins are inner unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT OUTER JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" | "left_outer" => Ok(JoinKind::Left),
            "right" | "right_outer" => Ok(JoinKind::Right),
            "full" | "full_outer" => Ok(JoinKind::Full),
            _ => Err(QueryError::invalid_argument(format!(
                "Invalid join type: {s}. Use inner, left, right or full."
            ))),
        }
    }
}

/// `<KIND> JOIN right ON right.foreign_key = left.primary_key`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub table: String,
    pub foreign_key: String,
    pub primary_key: String,
    pub kind: JoinKind,
}

impl Join {
    pub fn new(
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
        kind: JoinKind,
    ) -> QueryResult<Self> {
        let left = Ident::parse(left)?;
        let right = Ident::parse(right)?;
        Ok(Self {
            foreign_key: qualified_column(&right, foreign_key)?,
            primary_key: qualified_column(&left, primary_key)?,
            table: right.to_sql(),
            kind,
        })
    }

    fn write_sql(&self, out: &mut String) {
        out.push(' ');
        out.push_str(self.kind.keyword());
        out.push(' ');
        out.push_str(&self.table);
        out.push_str(" ON ");
        out.push_str(&self.foreign_key);
        out.push_str(" = ");
        out.push_str(&self.primary_key);
    }
}

/// Ordered join specifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JoinClause {
    joins: Vec<Join>,
}

impl JoinClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        left: &str,
        right: &str,
        foreign_key: &str,
        primary_key: &str,
        kind: JoinKind,
    ) -> QueryResult<()> {
        self.joins
            .push(Join::new(left, right, foreign_key, primary_key, kind)?);
        Ok(())
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }
}

impl Clause for JoinClause {
    fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    fn write_sql(&self, out: &mut String) {
        for join in &self.joins {
            join.write_sql(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(clause: &JoinClause) -> String {
        let mut sql = String::new();
        clause.write_sql(&mut sql);
        sql
    }

    #[test]
    fn default_kind_is_inner() {
        let mut joins = JoinClause::new();
        joins
            .add("users", "companies", "user_id", "id", JoinKind::default())
            .unwrap();
        assert_eq!(
            render(&joins),
            " INNER JOIN companies ON companies.user_id = users.id"
        );
    }

    #[test]
    fn outer_kinds() {
        let mut joins = JoinClause::new();
        joins.add("users", "companies", "user_id", "id", JoinKind::Left).unwrap();
        joins.add("companies", "projects", "company_id", "id", JoinKind::Right).unwrap();
        joins.add("users", "teams_users", "user_id", "id", JoinKind::Full).unwrap();
        assert_eq!(
            render(&joins),
            " LEFT OUTER JOIN companies ON companies.user_id = users.id \
             RIGHT OUTER JOIN projects ON projects.company_id = companies.id \
             FULL OUTER JOIN teams_users ON teams_users.user_id = users.id"
        );
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("LEFT".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("full_outer".parse::<JoinKind>().unwrap(), JoinKind::Full);
        assert!("cross".parse::<JoinKind>().is_err());
    }

    #[test]
    fn rejects_bad_identifiers() {
        let mut joins = JoinClause::new();
        assert!(joins.add("users", "companies; --", "user_id", "id", JoinKind::Inner).is_err());
        assert!(joins.is_empty());
    }
}
