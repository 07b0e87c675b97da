use thiserror::Error;

use crate::data_type::DataType;

/// Errors raised by the store.
///
/// Scanning itself never fails once the requests are bound: every variant is
/// raised either while building the store, while appending, at request bind
/// time, or while rebuilding row objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("unsupported column type {0:?}, supported: int8, int16, int32, int64, int8[], int16[], int64[], string")]
    UnsupportedColumnType(String),

    #[error("column {0:?} is declared more than once")]
    DuplicateColumn(String),

    #[error("schema has no columns")]
    EmptySchema,

    #[error("block capacity must be greater than zero")]
    InvalidBlockCapacity,

    #[error("row accessor cannot bind column {column:?}: {reason}")]
    UnboundColumn { column: String, reason: String },

    #[error("failed to extract column {column:?} from row {row}: {reason}")]
    ValueExtraction {
        column: String,
        row: usize,
        reason: String,
    },

    #[error("column {column:?} expects {expected:?}, got {found:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: Option<DataType>,
    },

    #[error("row has {found} values while the schema has {expected} columns")]
    RowArity { expected: usize, found: usize },

    #[error("request {request} cannot run against column {column:?} of type {data_type:?}")]
    IncompatibleRequest {
        request: String,
        column: String,
        data_type: DataType,
    },

    #[error("failed to rebuild row at position {position}: {reason}")]
    RowBuild { position: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
