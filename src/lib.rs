pub mod accessor;
pub mod block;
pub mod callback;
pub mod column;
pub mod data;
pub mod data_type;
pub mod error;
pub mod request;
pub mod schema;
pub mod store;
pub mod string_data;
pub mod value;

pub use accessor::{FieldAccessor, RowAccessor, ValuesAccessor};
pub use block::{Block, ColumnIndex};
pub use callback::{
    GroupCountCallback, MultiGroupCountCallback, ObjectCallback, PositionCallback, ScanCallback,
};
pub use column::Column;
pub use data_type::DataType;
pub use error::{Result, StoreError};
pub use request::{
    IntBetweenRequest, IntRequest, PreparedRequest, Request, StringLikeRequest, StringRequest,
};
pub use schema::{ColumnDef, Schema, StoreBuilder, StoreConfig};
pub use store::{ScanStats, Store};
pub use value::Value;
