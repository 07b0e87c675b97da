use std::fmt;

use allocative::Allocative;

use crate::data_type::DataType;
use crate::string_data::StringData;
use crate::value::Value;

/// A fixed-width signed integer that can be stored in a data container.
pub trait Scalar: Copy + Default + Ord + fmt::Debug + Allocative + Send + Sync + 'static {
    /// Widens the value to the common integer representation used by requests
    /// and by the block index.
    fn widen(self) -> i64;
}

impl Scalar for i8 {
    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl Scalar for i16 {
    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl Scalar for i32 {
    #[inline]
    fn widen(self) -> i64 {
        i64::from(self)
    }
}

impl Scalar for i64 {
    #[inline]
    fn widen(self) -> i64 {
        self
    }
}

/// Densely packed single-valued integer column data, indexed by absolute row position.
#[derive(Debug, Clone, Default, Allocative)]
pub struct IntData<T: Scalar> {
    data: Vec<T>,
}

impl<T: Scalar> IntData<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// # Panics
    /// Panics if `position` is out of bounds.
    #[inline]
    pub fn get(&self, position: usize) -> T {
        self.data[position]
    }

    /// Backing array, cached by requests for the duration of a scan.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns `true` if the value at `position` is one of `candidates`.
    /// `candidates` must be sorted ascending.
    #[inline]
    pub fn check(&self, position: usize, candidates: &[i64]) -> bool {
        candidates.binary_search(&self.data[position].widen()).is_ok()
    }
}

/// Multi-valued integer column data.
///
/// Every row owns a variable-length group of values. Groups are flattened into
/// `payload`; row `i` spans `payload[offsets[i]..offsets[i + 1]]`.
#[derive(Debug, Clone, Allocative)]
pub struct MultiData<T: Scalar> {
    offsets: Vec<usize>,
    payload: Vec<T>,
}

impl<T: Scalar> Default for MultiData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> MultiData<T> {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            payload: Vec::new(),
        }
    }

    /// Appends one row holding `values`, preserving their order.
    pub fn push(&mut self, values: &[T]) {
        self.payload.extend_from_slice(values);
        self.offsets.push(self.payload.len());
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values of the row at `position`, in insertion order.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds.
    #[inline]
    pub fn get(&self, position: usize) -> &[T] {
        &self.payload[self.offsets[position]..self.offsets[position + 1]]
    }

    /// Returns `true` if any value of the row at `position` is one of `candidates`.
    /// `candidates` must be sorted ascending.
    #[inline]
    pub fn check(&self, position: usize, candidates: &[i64]) -> bool {
        self.get(position)
            .iter()
            .any(|v| candidates.binary_search(&v.widen()).is_ok())
    }
}

/// Physical storage for column data.
/// Each variant wraps the container matching one [DataType], so the supported
/// type list is checked exhaustively wherever column data is matched.
#[derive(Debug, Clone, Allocative)]
pub enum ColumnData {
    Int8(IntData<i8>),
    Int16(IntData<i16>),
    Int32(IntData<i32>),
    Int64(IntData<i64>),
    MultiInt8(MultiData<i8>),
    MultiInt16(MultiData<i16>),
    MultiInt64(MultiData<i64>),
    CompressedString(StringData),
}

impl ColumnData {
    /// Creates the empty container matching `data_type`.
    pub fn new(data_type: DataType) -> Self {
        match data_type {
            DataType::Int8 => Self::Int8(IntData::new()),
            DataType::Int16 => Self::Int16(IntData::new()),
            DataType::Int32 => Self::Int32(IntData::new()),
            DataType::Int64 => Self::Int64(IntData::new()),
            DataType::MultiInt8 => Self::MultiInt8(MultiData::new()),
            DataType::MultiInt16 => Self::MultiInt16(MultiData::new()),
            DataType::MultiInt64 => Self::MultiInt64(MultiData::new()),
            DataType::CompressedString => Self::CompressedString(StringData::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int8(_) => DataType::Int8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::MultiInt8(_) => DataType::MultiInt8,
            Self::MultiInt16(_) => DataType::MultiInt16,
            Self::MultiInt64(_) => DataType::MultiInt64,
            Self::CompressedString(_) => DataType::CompressedString,
        }
    }

    /// Returns the number of rows currently stored.
    pub fn len(&self) -> usize {
        match self {
            Self::Int8(d) => d.len(),
            Self::Int16(d) => d.len(),
            Self::Int32(d) => d.len(),
            Self::Int64(d) => d.len(),
            Self::MultiInt8(d) => d.len(),
            Self::MultiInt16(d) => d.len(),
            Self::MultiInt64(d) => d.len(),
            Self::CompressedString(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `value` and calls `record` once with the integer projection of
    /// every scalar the value contributes: the value itself, each array
    /// element, or the dictionary code of a string.
    ///
    /// Returns `false`, leaving the container untouched, if the value does not
    /// fit this container.
    pub fn push(&mut self, value: &Value, mut record: impl FnMut(i64)) -> bool {
        match (self, value) {
            (Self::Int8(d), Value::Int8(v)) => {
                d.push(*v);
                record(v.widen());
            }
            (Self::Int16(d), Value::Int16(v)) => {
                d.push(*v);
                record(v.widen());
            }
            (Self::Int32(d), Value::Int32(v)) => {
                d.push(*v);
                record(v.widen());
            }
            (Self::Int64(d), Value::Int64(v)) => {
                d.push(*v);
                record(*v);
            }
            (Self::MultiInt8(d), Value::MultiInt8(v)) => {
                d.push(v);
                v.iter().for_each(|x| record(x.widen()));
            }
            (Self::MultiInt16(d), Value::MultiInt16(v)) => {
                d.push(v);
                v.iter().for_each(|x| record(x.widen()));
            }
            (Self::MultiInt64(d), Value::MultiInt64(v)) => {
                d.push(v);
                v.iter().for_each(|x| record(*x));
            }
            (Self::CompressedString(d), Value::Text(s)) => record(i64::from(d.push(Some(&**s)))),
            (Self::CompressedString(d), Value::Null) => record(i64::from(d.push(None))),
            _ => return false,
        }
        true
    }

    /// Retrieves the value at the specified row position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: usize) -> Option<Value> {
        if position >= self.len() {
            return None;
        }
        let value = match self {
            Self::Int8(d) => Value::Int8(d.get(position)),
            Self::Int16(d) => Value::Int16(d.get(position)),
            Self::Int32(d) => Value::Int32(d.get(position)),
            Self::Int64(d) => Value::Int64(d.get(position)),
            Self::MultiInt8(d) => Value::MultiInt8(d.get(position).to_vec()),
            Self::MultiInt16(d) => Value::MultiInt16(d.get(position).to_vec()),
            Self::MultiInt64(d) => Value::MultiInt64(d.get(position).to_vec()),
            Self::CompressedString(d) => d.get(position).map_or(Value::Null, Value::Text),
        };
        Some(value)
    }

    /// Widens the scalar value at `position` to `i64`.
    ///
    /// Returns `None` for array and string containers, or if out of bounds.
    pub fn value_as_int(&self, position: usize) -> Option<i64> {
        if position >= self.len() {
            return None;
        }
        match self {
            Self::Int8(d) => Some(d.get(position).widen()),
            Self::Int16(d) => Some(d.get(position).widen()),
            Self::Int32(d) => Some(d.get(position).widen()),
            Self::Int64(d) => Some(d.get(position)),
            _ => None,
        }
    }

    /// Returns `true` if the value(s) stored at `position` intersect `candidates`.
    ///
    /// `candidates` must be sorted ascending. For string containers candidates
    /// are dictionary codes.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds.
    pub fn check(&self, position: usize, candidates: &[i64]) -> bool {
        match self {
            Self::Int8(d) => d.check(position, candidates),
            Self::Int16(d) => d.check(position, candidates),
            Self::Int32(d) => d.check(position, candidates),
            Self::Int64(d) => d.check(position, candidates),
            Self::MultiInt8(d) => d.check(position, candidates),
            Self::MultiInt16(d) => d.check(position, candidates),
            Self::MultiInt64(d) => d.check(position, candidates),
            Self::CompressedString(d) => candidates
                .binary_search(&i64::from(d.code(position)))
                .is_ok(),
        }
    }
}
