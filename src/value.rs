use std::sync::Arc;

use crate::data_type::DataType;

/// Represents a single row value flowing in or out of the store.
///
/// This enum wraps every supported column type into a single type that can be
/// passed around the engine. `Null` is only storable in string columns, where it
/// is kept distinct from the empty string.
///
/// The derived ordering compares the variant first, so `Null` sorts before any
/// other value, then the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// represents a missing string.
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    MultiInt8(Vec<i8>),
    MultiInt16(Vec<i16>),
    MultiInt64(Vec<i64>),
    /// A UTF-8 string value, wrapped in an [Arc] so values read back from the
    /// dictionary are shared instead of copied.
    Text(Arc<str>),
}

impl Value {
    /// Returns `true` if the value is [Value::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Widens a scalar integer value to `i64`.
    /// Returns `None` for null, arrays and strings.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int8(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the inner string slice if this is a [Value::Text].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the [DataType] of the column able to hold this value.
    ///
    /// Returns `None` for [Value::Null], which is untyped until it is placed in a
    /// string column.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int8(_) => Some(DataType::Int8),
            Self::Int16(_) => Some(DataType::Int16),
            Self::Int32(_) => Some(DataType::Int32),
            Self::Int64(_) => Some(DataType::Int64),
            Self::MultiInt8(_) => Some(DataType::MultiInt8),
            Self::MultiInt16(_) => Some(DataType::MultiInt16),
            Self::MultiInt64(_) => Some(DataType::MultiInt64),
            Self::Text(_) => Some(DataType::CompressedString),
        }
    }

    /// Returns `true` if a column of type `data_type` can store this value.
    pub fn fits(&self, data_type: DataType) -> bool {
        match self.data_type() {
            None => data_type == DataType::CompressedString,
            Some(t) => t == data_type,
        }
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<Vec<i8>> for Value {
    fn from(v: Vec<i8>) -> Self {
        Self::MultiInt8(v)
    }
}

impl From<Vec<i16>> for Value {
    fn from(v: Vec<i16>) -> Self {
        Self::MultiInt16(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Self::MultiInt64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(Arc::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
