//! Generic result records.
//!
//! Rows that are not mapped to a read model become [`Record`]s. All records produced from
//! the same column set share one [`RecordShape`], so column lookup tables are built once per
//! shape rather than once per row.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::QueryResult;
use crate::read_model::RowView;
use crate::value::{FromValue, Value};

/// Ordered column names of a result set plus a name index.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordShape {
    columns: Arc<[String]>,
    index: HashMap<String, usize>,
}

impl RecordShape {
    pub fn new(columns: Arc<[String]>) -> Self {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            // Duplicate names (e.g. `id` from both sides of a join): first one wins.
            index.entry(name.clone()).or_insert(i);
        }
        Self { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Whether this shape describes exactly `columns`, in order.
    pub fn matches(&self, columns: &[String]) -> bool {
        *self.columns == *columns
    }
}

/// Reuse the shape in `slot` when it describes `columns`, otherwise build and store a new one.
pub(crate) fn reuse_shape(
    slot: &mut Option<Arc<RecordShape>>,
    columns: &Arc<[String]>,
) -> Arc<RecordShape> {
    if let Some(shape) = slot.as_ref().filter(|s| s.matches(columns)) {
        return Arc::clone(shape);
    }
    let shape = Arc::new(RecordShape::new(Arc::clone(columns)));
    *slot = Some(Arc::clone(&shape));
    shape
}

/// A generic row: values addressed by column name or position.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: Arc<RecordShape>,
    values: Vec<Value>,
}

impl Record {
    pub(crate) fn new(shape: Arc<RecordShape>, values: Vec<Value>) -> Self {
        Self { shape, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.shape.index_of(column).and_then(|i| self.values.get(i))
    }

    /// Get a column converted to `T`.
    pub fn get_as<T: FromValue>(&self, column: &str) -> QueryResult<T> {
        T::from_column(column, self.get(column))
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        self.shape.columns()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn shape(&self) -> &Arc<RecordShape> {
        &self.shape
    }

    /// Borrow this record as a row view, e.g. to build a read model from it.
    pub fn view(&self) -> RowView<'_> {
        RowView::new(&self.shape, &self.values)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.shape.columns().iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
