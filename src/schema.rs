use std::collections::HashSet;

use crate::accessor::RowAccessor;
use crate::data_type::DataType;
use crate::error::{Result, StoreError};
use crate::store::Store;

/// Column definition in the schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered list of column definitions. Fixed once a store is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub columns: Vec<ColumnDef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// Parses a comma-separated list of `name type` pairs.
    ///
    /// # Errors
    /// Returns [StoreError::UnsupportedColumnType] for an unknown or missing type name.
    ///
    /// # Example
    /// ```
    /// # use colscan::{DataType, Schema};
    /// let schema = Schema::parse("id int32, tags short[], name string").unwrap();
    /// assert_eq!(schema.columns[1].data_type, DataType::MultiInt16);
    /// ```
    pub fn parse(definition: &str) -> Result<Self> {
        let columns = definition
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut words = part.split_whitespace();
                let name = words.next().unwrap_or_default();
                let type_name = words.collect::<Vec<_>>().join(" ");
                Ok(ColumnDef::new(name, type_name.parse()?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Checks the schema is non-empty and that column names are unique.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(StoreError::EmptySchema);
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(StoreError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

/// Rows per block when none is configured.
pub const DEFAULT_BLOCK_CAPACITY: usize = 1000;

/// Tunables of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of consecutive rows grouped under one pruning index.
    pub block_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            block_capacity: DEFAULT_BLOCK_CAPACITY,
        }
    }
}

/// Fluent construction of a [Store].
///
/// # Example
/// ```
/// # use colscan::{DataType, StoreBuilder, Value, ValuesAccessor};
/// let mut store = StoreBuilder::new()
///     .column("id", DataType::Int32)
///     .block_capacity(2)
///     .build(ValuesAccessor)
///     .unwrap();
///
/// store.append(&[vec![Value::Int32(1)], vec![Value::Int32(2)], vec![Value::Int32(3)]]).unwrap();
/// assert_eq!(store.size(), 3);
/// assert_eq!(store.blocks().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StoreBuilder {
    schema: Schema,
    config: StoreConfig,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.schema.columns.push(ColumnDef::new(name, data_type));
        self
    }

    /// Appends every column of `schema` after the ones already declared.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema.columns.extend(schema.columns);
        self
    }

    pub fn block_capacity(mut self, block_capacity: usize) -> Self {
        self.config.block_capacity = block_capacity;
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the schema and config, binds `accessor` to the schema and
    /// creates an empty store.
    ///
    /// # Errors
    /// - [StoreError::EmptySchema] or [StoreError::DuplicateColumn] for a bad schema.
    /// - [StoreError::InvalidBlockCapacity] if the capacity is zero.
    /// - [StoreError::UnboundColumn] if the accessor cannot serve a column.
    pub fn build<A: RowAccessor>(self, accessor: A) -> Result<Store<A>> {
        Store::new(self.schema, self.config, accessor)
    }
}
