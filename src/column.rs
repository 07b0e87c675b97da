use allocative::Allocative;

use crate::data::ColumnData;
use crate::data_type::DataType;
use crate::value::Value;

/// Represents a column within a store.
/// It pairs metadata (name, type) with the data container holding every row's value.
#[derive(Debug, Clone, Allocative)]
pub struct Column {
    /// The name of the column, unique within a store.
    pub name: String,
    /// The declared data type of the column. Never changes after creation.
    pub data_type: DataType,
    /// The actual values stored in the column.
    pub data: ColumnData,
}

impl Column {
    /// Creates a new, empty column with the specified name and data type.
    /// The underlying container is initialized according to the data type.
    pub fn new(name: String, data_type: DataType) -> Self {
        Self {
            name,
            data_type,
            data: ColumnData::new(data_type),
        }
    }

    /// Appends a new value to the end of the column, calling `record` with the
    /// integer projection of every scalar it contributes.
    ///
    /// # Errors
    /// Returns the offending value's type if it does not match the column's data
    /// type. Nothing is appended in that case.
    ///
    /// # Example
    /// ```
    /// # use colscan::{Column, DataType, Value};
    /// let mut col = Column::new("tags".into(), DataType::MultiInt8);
    /// col.push(&Value::MultiInt8(vec![1, 2]), |_| {}).unwrap();
    ///
    /// assert_eq!(col.len(), 1);
    /// assert!(col.push(&Value::Int8(1), |_| {}).is_err());
    /// ```
    pub fn push(&mut self, value: &Value, record: impl FnMut(i64)) -> Result<(), Option<DataType>> {
        if self.data.push(value, record) {
            Ok(())
        } else {
            Err(value.data_type())
        }
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieves the value at the specified row position.
    ///
    /// Returns `None` if the position is out of bounds. A null string comes back
    /// as `Some(Value::Null)`.
    pub fn get(&self, position: usize) -> Option<Value> {
        self.data.get(position)
    }

    /// Reads a scalar integer value widened to `i64`, for generic range checks.
    ///
    /// Returns `None` for multi-valued and string columns.
    pub fn value_as_int(&self, position: usize) -> Option<i64> {
        self.data.value_as_int(position)
    }
}
