//! SQL dialects.
//!
//! A [`Dialect`] decides how literals, identifiers and a few dialect-specific functions are
//! rendered, and which streaming strategy a connection supports.

use std::fmt::Write as _;

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// SQL-generation variant of a database family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    /// Any other adapter, identified by name.
    Other(String),
}

impl Dialect {
    /// Map a driver/adapter name (`postgresql`, `mysql2`, `sqlite3`, ...) to its family.
    pub fn from_adapter_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("postgres") || lower.contains("postgis") {
            Dialect::Postgres
        } else if lower.contains("mysql") || lower.contains("mariadb") || lower.contains("trilogy")
        {
            Dialect::MySql
        } else if lower.contains("sqlite") {
            Dialect::Sqlite
        } else {
            Dialect::Other(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Other(name) => name,
        }
    }

    /// Server-side cursors inside an explicit transaction.
    pub fn supports_cursors(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Unbuffered row streaming in the driver.
    pub fn supports_native_streaming(&self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Quote a bare column name (`"status"`, or `` `status` `` for MySQL).
    pub fn quote_column(&self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Render a string as a quoted SQL literal.
    pub fn quote_str(&self, s: &str) -> QueryResult<String> {
        let mut out = String::with_capacity(s.len() + 2);
        self.write_str_literal(s, &mut out)?;
        Ok(out)
    }

    /// Render a value as an inline SQL literal.
    pub fn literal(&self, value: &Value) -> QueryResult<String> {
        let mut out = String::new();
        self.write_literal(value, &mut out)?;
        Ok(out)
    }

    pub(crate) fn write_literal(&self, value: &Value, out: &mut String) -> QueryResult<()> {
        match value {
            Value::Null => out.push_str("NULL"),
            Value::Bool(b) => out.push_str(self.bool_literal(*b)),
            Value::Int(v) => {
                let _ = write!(out, "{v}");
            }
            Value::Float(v) => {
                if !v.is_finite() {
                    return Err(QueryError::invalid_argument(format!(
                        "Cannot render non-finite float {v} as a literal"
                    )));
                }
                let _ = write!(out, "{v}");
            }
            Value::Decimal(d) => {
                let _ = write!(out, "{d}");
            }
            Value::Text(s) => self.write_str_literal(s, out)?,
            Value::Json(v) => {
                self.write_str_literal(&v.to_string(), out)?;
                if *self == Dialect::Postgres {
                    out.push_str("::jsonb");
                }
            }
            Value::Date(d) => {
                let _ = write!(out, "'{}'", d.format("%Y-%m-%d"));
            }
            Value::Timestamp(t) => {
                let _ = write!(out, "'{}'", t.format("%Y-%m-%d %H:%M:%S%.f"));
            }
            Value::TimestampTz(t) => match self {
                Dialect::Postgres => {
                    let _ = write!(out, "'{}'", t.format("%Y-%m-%d %H:%M:%S%.f+00:00"));
                }
                _ => {
                    let _ = write!(out, "'{}'", t.naive_utc().format("%Y-%m-%d %H:%M:%S%.f"));
                }
            },
            Value::Uuid(u) => {
                let _ = write!(out, "'{}'", u.hyphenated());
            }
            Value::Bytes(bytes) => match self {
                Dialect::Postgres => {
                    out.push_str("'\\x");
                    for b in bytes {
                        let _ = write!(out, "{b:02x}");
                    }
                    out.push_str("'::bytea");
                }
                _ => {
                    out.push_str("X'");
                    for b in bytes {
                        let _ = write!(out, "{b:02X}");
                    }
                    out.push('\'');
                }
            },
            Value::List(items) => {
                if items.is_empty() {
                    out.push_str("NULL");
                }
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_literal(item, out)?;
                }
            }
        }
        Ok(())
    }

    fn write_str_literal(&self, s: &str, out: &mut String) -> QueryResult<()> {
        if s.contains('\0') {
            return Err(QueryError::invalid_argument(
                "String literal cannot contain NUL character",
            ));
        }
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\'' => out.push_str("''"),
                // MySQL treats backslash as an escape character by default.
                '\\' if *self == Dialect::MySql => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('\'');
        Ok(())
    }

    fn bool_literal(&self, b: bool) -> &'static str {
        match (self, b) {
            (Dialect::Sqlite, true) => "1",
            (Dialect::Sqlite, false) => "0",
            (_, true) => "TRUE",
            (_, false) => "FALSE",
        }
    }

    /// String aggregation over an already-qualified column.
    pub(crate) fn group_concat(&self, column: &str, separator: &str) -> QueryResult<String> {
        Ok(match self {
            Dialect::MySql => format!("GROUP_CONCAT({column} SEPARATOR {})", self.quote_str(separator)?),
            Dialect::Postgres => format!("STRING_AGG({column}::text, {})", self.quote_str(separator)?),
            Dialect::Sqlite => format!("GROUP_CONCAT({column}, {})", self.quote_str(separator)?),
            Dialect::Other(_) => format!("GROUP_CONCAT({column})"),
        })
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn adapter_names() {
        assert_eq!(Dialect::from_adapter_name("PostgreSQL"), Dialect::Postgres);
        assert_eq!(Dialect::from_adapter_name("postgis"), Dialect::Postgres);
        assert_eq!(Dialect::from_adapter_name("mysql2"), Dialect::MySql);
        assert_eq!(Dialect::from_adapter_name("Trilogy"), Dialect::MySql);
        assert_eq!(Dialect::from_adapter_name("sqlite3"), Dialect::Sqlite);
        assert_eq!(
            Dialect::from_adapter_name("oracle"),
            Dialect::Other("oracle".into())
        );
    }

    #[test]
    fn string_literals_escape_quotes() {
        let pg = Dialect::Postgres;
        assert_eq!(pg.literal(&"O'Brien".into()).unwrap(), "'O''Brien'");
        assert_eq!(pg.literal(&r"a\b".into()).unwrap(), r"'a\b'");
        assert_eq!(
            Dialect::MySql.literal(&r"a\'b".into()).unwrap(),
            r"'a\\''b'"
        );
    }

    #[test]
    fn string_literal_rejects_nul() {
        let err = Dialect::Postgres.literal(&"a\0b".into()).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn bool_literals() {
        assert_eq!(Dialect::Postgres.literal(&true.into()).unwrap(), "TRUE");
        assert_eq!(Dialect::MySql.literal(&false.into()).unwrap(), "FALSE");
        assert_eq!(Dialect::Sqlite.literal(&true.into()).unwrap(), "1");
    }

    #[test]
    fn scalar_literals() {
        let pg = Dialect::Postgres;
        assert_eq!(pg.literal(&Value::Null).unwrap(), "NULL");
        assert_eq!(pg.literal(&42.into()).unwrap(), "42");
        assert_eq!(pg.literal(&1.5.into()).unwrap(), "1.5");
        assert!(pg.literal(&f64::NAN.into()).is_err());
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(pg.literal(&date.into()).unwrap(), "'2024-01-02'");
        let ts = date.and_hms_opt(3, 4, 5).unwrap();
        assert_eq!(pg.literal(&ts.into()).unwrap(), "'2024-01-02 03:04:05'");
        assert_eq!(
            pg.literal(&ts.and_utc().into()).unwrap(),
            "'2024-01-02 03:04:05+00:00'"
        );
    }

    #[test]
    fn byte_literals() {
        let bytes = Value::Bytes(vec![0x0a, 0xff]);
        assert_eq!(Dialect::Postgres.literal(&bytes).unwrap(), r"'\x0aff'::bytea");
        assert_eq!(Dialect::Sqlite.literal(&bytes).unwrap(), "X'0AFF'");
    }

    #[test]
    fn list_literals() {
        let list: Value = ["a", "b"].into_iter().collect();
        assert_eq!(Dialect::Postgres.literal(&list).unwrap(), "'a', 'b'");
        assert_eq!(
            Dialect::Postgres.literal(&Value::List(vec![])).unwrap(),
            "NULL"
        );
    }

    #[test]
    fn quote_column() {
        assert_eq!(Dialect::Postgres.quote_column("status"), "\"status\"");
        assert_eq!(Dialect::MySql.quote_column("status"), "`status`");
    }

    #[test]
    fn group_concat_per_dialect() {
        assert_eq!(
            Dialect::MySql.group_concat("users.name", ",").unwrap(),
            "GROUP_CONCAT(users.name SEPARATOR ',')"
        );
        assert_eq!(
            Dialect::Postgres.group_concat("users.name", ",").unwrap(),
            "STRING_AGG(users.name::text, ',')"
        );
        assert_eq!(
            Dialect::Sqlite.group_concat("users.name", "; ").unwrap(),
            "GROUP_CONCAT(users.name, '; ')"
        );
        assert_eq!(
            Dialect::Other("oracle".into())
                .group_concat("users.name", ",")
                .unwrap(),
            "GROUP_CONCAT(users.name)"
        );
    }
}
