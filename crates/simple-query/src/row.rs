//! Result containers returned by connections.

use std::error::Error;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, NaiveTime, Utc};
use futures_core::Stream;
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, Kind, Type};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// Column names plus decoded rows, positional.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: impl Into<Arc<[String]>>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into(),
            rows,
        }
    }

    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A stream of row batches from a driver's streaming mode.
///
/// Type-erased so different connections can return a uniform streaming type.
#[must_use]
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = QueryResult<RowSet>> + Send>>,
}

impl RowStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = QueryResult<RowSet>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for RowStream {
    type Item = QueryResult<RowSet>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

pub(crate) fn pg_columns(columns: &[tokio_postgres::Column]) -> Arc<[String]> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// Decode every column of a tokio-postgres row into [`Value`]s.
pub(crate) fn decode_pg_row(row: &tokio_postgres::Row) -> QueryResult<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let raw = row
                .try_get::<_, Option<RawValue<'_>>>(idx)
                .map_err(|e| QueryError::decode(column.name(), e.to_string()))?;
            match raw {
                Some(RawValue(bytes)) => decode_pg_value(column.name(), column.type_(), bytes),
                None => Ok(Value::Null),
            }
        })
        .collect()
}

/// The undecoded wire bytes of a non-null value of any type.
struct RawValue<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawValue<'a> {
    fn from_sql(_: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawValue(raw))
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

/// Decode one binary-format value of type `ty`.
///
/// Scalars map to their [`Value`] variant, one-dimensional arrays to [`Value::List`], enums
/// and other text-encoded types to [`Value::Text`]. Domains decode as their base type.
fn decode_pg_value(column: &str, ty: &Type, raw: &[u8]) -> QueryResult<Value> {
    fn parse<'a, T: FromSql<'a>>(column: &str, ty: &Type, raw: &'a [u8]) -> QueryResult<T> {
        T::from_sql(ty, raw).map_err(|e| QueryError::decode(column, e.to_string()))
    }

    let value = match *ty {
        Type::BOOL => Value::Bool(parse(column, ty, raw)?),
        Type::CHAR => Value::from(parse::<i8>(column, ty, raw)?),
        Type::INT2 => Value::from(parse::<i16>(column, ty, raw)?),
        Type::INT4 => Value::from(parse::<i32>(column, ty, raw)?),
        Type::INT8 => Value::Int(parse(column, ty, raw)?),
        Type::OID => Value::from(parse::<u32>(column, ty, raw)?),
        Type::FLOAT4 => Value::from(parse::<f32>(column, ty, raw)?),
        Type::FLOAT8 => Value::Float(parse(column, ty, raw)?),
        Type::NUMERIC => Value::Decimal(parse::<Decimal>(column, ty, raw)?),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::XML => {
            Value::Text(text(column, raw)?)
        }
        Type::JSON | Type::JSONB => Value::Json(parse(column, ty, raw)?),
        Type::DATE => Value::Date(parse(column, ty, raw)?),
        Type::TIME => Value::Text(parse::<NaiveTime>(column, ty, raw)?.to_string()),
        Type::TIMESTAMP => Value::Timestamp(parse(column, ty, raw)?),
        Type::TIMESTAMPTZ => Value::TimestampTz(parse::<DateTime<Utc>>(column, ty, raw)?),
        Type::INTERVAL => Value::Text(interval_text(column, raw)?),
        Type::INET => Value::Text(parse::<IpAddr>(column, ty, raw)?.to_string()),
        Type::UUID => Value::Uuid(parse::<Uuid>(column, ty, raw)?),
        Type::BYTEA => Value::Bytes(parse(column, ty, raw)?),
        _ => match ty.kind() {
            Kind::Array(member) => {
                let items = parse::<Vec<Option<RawValue<'_>>>>(column, ty, raw)?;
                let values = items
                    .into_iter()
                    .map(|item| match item {
                        Some(RawValue(bytes)) => decode_pg_value(column, member, bytes),
                        None => Ok(Value::Null),
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                Value::List(values)
            }
            Kind::Enum(_) => Value::Text(text(column, raw)?),
            Kind::Domain(base) => return decode_pg_value(column, base, raw),
            // Extension types whose binary form is their text form.
            _ if matches!(ty.name(), "citext" | "ltree" | "lquery") => {
                Value::Text(text(column, raw)?)
            }
            _ => {
                return Err(QueryError::decode(
                    column,
                    format!("unsupported column type {ty}"),
                ));
            }
        },
    };
    Ok(value)
}

fn text(column: &str, raw: &[u8]) -> QueryResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| QueryError::decode(column, e.to_string()))
}

/// Render a binary interval (microseconds, days, months) as `M mons D days HH:MM:SS[.ffffff]`.
fn interval_text(column: &str, raw: &[u8]) -> QueryResult<String> {
    if raw.len() != 16 {
        return Err(QueryError::decode(
            column,
            format!("invalid interval length {}", raw.len()),
        ));
    }
    let mut micros = [0u8; 8];
    micros.copy_from_slice(&raw[..8]);
    let mut days = [0u8; 4];
    days.copy_from_slice(&raw[8..12]);
    let mut months = [0u8; 4];
    months.copy_from_slice(&raw[12..]);
    let micros = i64::from_be_bytes(micros);
    let days = i32::from_be_bytes(days);
    let months = i32::from_be_bytes(months);

    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    let hours = abs / 3_600_000_000;
    let minutes = abs / 60_000_000 % 60;
    let seconds = abs / 1_000_000 % 60;
    let fraction = abs % 1_000_000;

    let mut out = format!("{months} mons {days} days {sign}{hours:02}:{minutes:02}:{seconds:02}");
    if fraction != 0 {
        out.push_str(&format!(".{fraction:06}"));
    }
    Ok(out)
}
