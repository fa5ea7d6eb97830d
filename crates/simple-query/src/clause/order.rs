use std::fmt;
use std::str::FromStr;

use crate::error::{QueryError, QueryResult};
use crate::ident::{Ident, qualified_column};

use super::Clause;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(QueryError::invalid_argument(format!(
                "Invalid order direction: {s}. Use asc or desc."
            ))),
        }
    }
}

/// Convert an input into a [`Direction`].
pub trait IntoDirection {
    fn into_direction(self) -> QueryResult<Direction>;
}

impl IntoDirection for Direction {
    fn into_direction(self) -> QueryResult<Direction> {
        Ok(self)
    }
}

impl IntoDirection for &str {
    fn into_direction(self) -> QueryResult<Direction> {
        self.parse()
    }
}

impl IntoDirection for String {
    fn into_direction(self) -> QueryResult<Direction> {
        self.parse()
    }
}

/// Ordered sort keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderClause {
    table: Ident,
    orders: Vec<(String, Direction)>,
}

impl OrderClause {
    pub fn new(table: Ident) -> Self {
        Self {
            table,
            orders: Vec::new(),
        }
    }

    pub fn add(&mut self, column: &str, direction: impl IntoDirection) -> QueryResult<()> {
        let direction = direction.into_direction()?;
        let column = qualified_column(&self.table, column)?;
        self.orders.push((column, direction));
        Ok(())
    }

    pub fn orders(&self) -> &[(String, Direction)] {
        &self.orders
    }
}

impl Clause for OrderClause {
    fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn write_sql(&self, out: &mut String) {
        for (i, (column, direction)) in self.orders.iter().enumerate() {
            out.push_str(if i == 0 { " ORDER BY " } else { ", " });
            out.push_str(column);
            out.push(' ');
            out.push_str(direction.as_sql());
        }
    }
}
