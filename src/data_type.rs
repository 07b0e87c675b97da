use std::fmt;
use std::str::FromStr;

use allocative::Allocative;

use crate::error::StoreError;

/// Represents the supported column types of a store schema.
/// Every variant has exactly one matching data container, see [crate::data::ColumnData].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Allocative)]
pub enum DataType {
    /// An 8-bit signed integer.
    Int8,
    /// A 16-bit signed integer.
    Int16,
    /// A 32-bit signed integer.
    Int32,
    /// A 64-bit signed integer.
    Int64,
    /// A variable-length array of 8-bit signed integers.
    MultiInt8,
    /// A variable-length array of 16-bit signed integers.
    MultiInt16,
    /// A variable-length array of 64-bit signed integers.
    MultiInt64,
    /// A nullable UTF-8 string stored through a per-column dictionary.
    CompressedString,
}

impl DataType {
    /// All supported types, in declaration order.
    pub const ALL: [DataType; 8] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::MultiInt8,
        DataType::MultiInt16,
        DataType::MultiInt64,
        DataType::CompressedString,
    ];

    /// Canonical name, as accepted by [DataType::from_str].
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::MultiInt8 => "int8[]",
            Self::MultiInt16 => "int16[]",
            Self::MultiInt64 => "int64[]",
            Self::CompressedString => "string",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = StoreError;

    /// Parses a type name, case-insensitively.
    ///
    /// # Errors
    /// Returns [StoreError::UnsupportedColumnType] when the name maps to no container.
    ///
    /// # Example
    /// ```
    /// # use colscan::DataType;
    /// assert_eq!("INT".parse::<DataType>().unwrap(), DataType::Int32);
    /// assert_eq!("short[]".parse::<DataType>().unwrap(), DataType::MultiInt16);
    /// assert!("float".parse::<DataType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(data_type) = Self::ALL.into_iter().find(|t| t.name() == name) {
            return Ok(data_type);
        }
        let data_type = match name.as_str() {
            "byte" => Self::Int8,
            "short" => Self::Int16,
            "int" => Self::Int32,
            "long" => Self::Int64,
            "byte[]" => Self::MultiInt8,
            "short[]" => Self::MultiInt16,
            "long[]" => Self::MultiInt64,
            "text" => Self::CompressedString,
            _ => return Err(StoreError::UnsupportedColumnType(s.trim().to_string())),
        };
        Ok(data_type)
    }
}
