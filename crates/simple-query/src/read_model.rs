//! Read models and row mapping.
//!
//! A read model is a plain struct with an explicit attribute to column mapping. It is
//! usually derived:
//!
//! ```ignore
//! use simple_query::ReadModel;
//!
//! #[derive(ReadModel)]
//! struct UserSummary {
//!     #[read_model(column = "id")]
//!     identifier: i64,
//!     #[read_model(column = "name")]
//!     full_name: Option<String>,
//! }
//! ```
//!
//! Columns without an attribute are ignored. `Option` attributes whose column is missing
//! or NULL are left `None`.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::QueryResult;
use crate::record::{Record, RecordShape};
use crate::value::{FromValue, Value};

/// One attribute of a read model and the column it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: &'static str,
    pub column: &'static str,
}

/// A typed record built from a row through a factory.
pub trait ReadModel: Sized {
    /// Attribute to column mapping, in declaration order.
    fn attributes() -> &'static [Attribute];

    /// Build an instance from a row.
    fn from_row(row: &RowView<'_>) -> QueryResult<Self>;

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// The mapped column names.
    fn columns() -> Vec<&'static str> {
        Self::attributes().iter().map(|a| a.column).collect()
    }
}

/// Borrowed view of one result row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    shape: &'a RecordShape,
    values: &'a [Value],
}

impl<'a> RowView<'a> {
    pub fn new(shape: &'a RecordShape, values: &'a [Value]) -> Self {
        Self { shape, values }
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.shape.index_of(column).and_then(|i| self.values.get(i))
    }

    /// Read `column` as `T`.
    pub fn attribute<T: FromValue>(&self, column: &str) -> QueryResult<T> {
        T::from_column(column, self.get(column))
    }

    pub fn columns(&self) -> &'a [String] {
        self.shape.columns()
    }
}

/// How a builder turns rows into output items.
pub trait RowMapper {
    type Output;

    fn map_row(shape: &Arc<RecordShape>, values: Vec<Value>) -> QueryResult<Self::Output>;
}

/// Default mapping: generic [`Record`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Records;

impl RowMapper for Records {
    type Output = Record;

    fn map_row(shape: &Arc<RecordShape>, values: Vec<Value>) -> QueryResult<Record> {
        Ok(Record::new(Arc::clone(shape), values))
    }
}

/// Mapping into the read model `M`.
pub struct MapTo<M>(PhantomData<fn() -> M>);

impl<M: ReadModel> RowMapper for MapTo<M> {
    type Output = M;

    fn map_row(shape: &Arc<RecordShape>, values: Vec<Value>) -> QueryResult<M> {
        M::from_row(&RowView::new(shape, &values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct UserSummary {
        identifier: i64,
        full_name: Option<String>,
    }

    impl ReadModel for UserSummary {
        fn attributes() -> &'static [Attribute] {
            &[
                Attribute {
                    name: "identifier",
                    column: "id",
                },
                Attribute {
                    name: "full_name",
                    column: "name",
                },
            ]
        }

        fn from_row(row: &RowView<'_>) -> QueryResult<Self> {
            Ok(Self {
                identifier: row.attribute("id")?,
                full_name: row.attribute("name")?,
            })
        }
    }

    fn shape(columns: &[&str]) -> Arc<RecordShape> {
        Arc::new(RecordShape::new(
            columns.iter().map(|c| c.to_string()).collect(),
        ))
    }

    #[test]
    fn maps_attributes_from_columns() {
        let model =
            MapTo::<UserSummary>::map_row(&shape(&["id", "name", "email"]), vec![
                7.into(),
                "Ann".into(),
                "ann@example.com".into(),
            ])
            .unwrap();
        assert_eq!(
            model,
            UserSummary {
                identifier: 7,
                full_name: Some("Ann".into())
            }
        );
    }

    #[test]
    fn missing_optional_column_is_none() {
        let model = MapTo::<UserSummary>::map_row(&shape(&["id"]), vec![7.into()]).unwrap();
        assert_eq!(model.full_name, None);
    }

    #[test]
    fn missing_required_column_is_decode_error() {
        let err = MapTo::<UserSummary>::map_row(&shape(&["name"]), vec!["Ann".into()])
            .unwrap_err();
        assert!(matches!(err, crate::QueryError::Decode { ref column, .. } if column == "id"));
    }

    #[test]
    fn records_share_shape() {
        let s = shape(&["id"]);
        let a = Records::map_row(&s, vec![1.into()]).unwrap();
        let b = Records::map_row(&s, vec![2.into()]).unwrap();
        assert!(Arc::ptr_eq(a.shape(), b.shape()));
    }

    #[test]
    fn columns_follow_attributes() {
        assert_eq!(UserSummary::columns(), vec!["id", "name"]);
    }
}
