//! SQLite-backed connection for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use simple_query::{Connection, Dialect, QueryError, QueryResult, RowSet, Source, Value};

pub struct SqliteConnection {
    inner: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn open() -> Self {
        let conn = rusqlite::Connection::open_in_memory().expect("open in-memory sqlite");
        conn.execute_batch(SCHEMA).expect("create schema");
        Self {
            inner: Mutex::new(conn),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>) -> QueryResult<T> {
        let conn = self
            .inner
            .lock()
            .map_err(|_| QueryError::Other("sqlite connection poisoned".into()))?;
        f(&conn).map_err(|e| QueryError::statement(e.to_string()))
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn select_all(&self, sql: &str) -> QueryResult<RowSet> {
        self.with(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
            let width = columns.len();
            let mut rows = stmt.query([])?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(decode(row.get_ref(i)?));
                }
                out.push(values);
            }
            Ok(RowSet::new(columns, out))
        })
    }

    async fn execute(&self, sql: &str) -> QueryResult<u64> {
        self.with(|conn| conn.execute(sql, []).map(|n| n as u64))
    }

    async fn batch_execute(&self, sql: &str) -> QueryResult<()> {
        self.with(|conn| conn.execute_batch(sql))
    }
}

fn decode(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

const SCHEMA: &str = "
CREATE TABLE companies (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    industry TEXT NOT NULL,
    founded_year INTEGER NOT NULL
);
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT,
    email TEXT NOT NULL,
    active INTEGER NOT NULL,
    status INTEGER NOT NULL DEFAULT 0,
    score REAL NOT NULL DEFAULT 0,
    company_id INTEGER REFERENCES companies(id)
);
INSERT INTO companies (id, name, industry, founded_year) VALUES
    (1, 'Acme', 'Manufacturing', 1990),
    (2, 'Globex', 'Energy', 2005),
    (3, 'Initech', 'Software', 2010);
INSERT INTO users (id, name, email, active, score, company_id) VALUES
    (1, 'Ann', 'ann@example.com', 1, 10.0, 1),
    (2, 'Bob', 'bob@example.com', 0, 20.0, 1),
    (3, 'Cid', 'cid@example.com', 1, 30.0, 2),
    (4, NULL, 'ghost@example.com', 1, 40.0, 3);
";

pub fn users() -> Arc<Source> {
    Source::new("users")
        .expect("valid table")
        .with_dialect(Dialect::Sqlite)
        .scope("active", |q, _| q.where_eq("active", true))
        .scope("in_company", |q, args| {
            q.where_eq("company_id", args.value(0)?.clone())
        })
        .into_shared()
}

pub fn companies() -> Arc<Source> {
    Source::new("companies")
        .expect("valid table")
        .with_dialect(Dialect::Sqlite)
        .scope("founded_after", |q, args| {
            q.where_sql("founded_year > ?", [args.value(0)?.clone()])
        })
        .into_shared()
}
