use std::fmt;

use crate::schema::Schema;
use crate::value::Value;

/// Bridge between external row objects and store columns.
///
/// The store only relies on this narrow contract: pull one value per column
/// out of a row while appending, and build a row back from one value per
/// column while materializing. Columns are addressed by their position in the
/// schema, which is fixed once [RowAccessor::bind] succeeded.
pub trait RowAccessor {
    type Row;

    /// Resolves the accessor against the store schema, once, at store
    /// construction.
    ///
    /// # Errors
    /// Returns `(column name, reason)` for the first column it cannot serve.
    fn bind(&mut self, schema: &Schema) -> Result<(), (String, String)> {
        let _ = schema;
        Ok(())
    }

    /// Extracts the value of the column at `column` from `row`.
    fn extract(&self, row: &Self::Row, column: usize) -> Result<Value, String>;

    /// Builds a row object from `values`, given in schema order.
    fn build(&self, values: Vec<Value>) -> Result<Self::Row, String>;
}

/// Accessor for positional rows: a row is a `Vec<Value>` in schema order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuesAccessor;

impl RowAccessor for ValuesAccessor {
    type Row = Vec<Value>;

    fn extract(&self, row: &Vec<Value>, column: usize) -> Result<Value, String> {
        row.get(column)
            .cloned()
            .ok_or_else(|| format!("row has {} values, no value at index {column}", row.len()))
    }

    fn build(&self, values: Vec<Value>) -> Result<Vec<Value>, String> {
        Ok(values)
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Result<Value, String> + Send + Sync>;
type Builder<T> = Box<dyn Fn(Vec<Value>) -> Result<T, String> + Send + Sync>;

/// Explicit mapping table from column names to field getters of `T`.
///
/// Fields may be registered in any order; [RowAccessor::bind] lines them up
/// with the schema.
///
/// # Example
/// ```
/// # use colscan::{DataType, FieldAccessor, StoreBuilder, Value};
/// #[derive(Debug, PartialEq)]
/// struct User {
///     id: i32,
///     name: Option<String>,
/// }
///
/// let accessor = FieldAccessor::new(|values: Vec<Value>| {
///     let mut values = values.into_iter();
///     let id = match values.next() {
///         Some(Value::Int32(id)) => id,
///         other => return Err(format!("bad id {other:?}")),
///     };
///     let name = values.next().and_then(|v| v.as_str().map(str::to_string));
///     Ok(User { id, name })
/// })
/// .field("name", |u: &User| Ok(u.name.as_deref().into()))
/// .field("id", |u: &User| Ok(u.id.into()));
///
/// let mut store = StoreBuilder::new()
///     .column("id", DataType::Int32)
///     .column("name", DataType::CompressedString)
///     .build(accessor)
///     .unwrap();
///
/// let users = vec![User { id: 1, name: None }, User { id: 2, name: Some("Bob".into()) }];
/// store.append(&users).unwrap();
/// assert_eq!(store.select(&[]).unwrap(), users);
/// ```
pub struct FieldAccessor<T> {
    fields: Vec<(String, Getter<T>)>,
    /// Schema position -> index into `fields`.
    order: Vec<usize>,
    builder: Builder<T>,
}

impl<T> FieldAccessor<T> {
    pub fn new(builder: impl Fn(Vec<Value>) -> Result<T, String> + Send + Sync + 'static) -> Self {
        Self {
            fields: Vec::new(),
            order: Vec::new(),
            builder: Box::new(builder),
        }
    }

    /// Registers the getter used for column `name`.
    pub fn field(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&T) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.fields.push((name.into(), Box::new(getter)));
        self
    }
}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("fields", &self.fields.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("order", &self.order)
            .finish()
    }
}

impl<T> RowAccessor for FieldAccessor<T> {
    type Row = T;

    fn bind(&mut self, schema: &Schema) -> Result<(), (String, String)> {
        self.order = schema
            .columns
            .iter()
            .map(|column| {
                self.fields
                    .iter()
                    .position(|(name, _)| *name == column.name)
                    .ok_or_else(|| (column.name.clone(), "no field registered".to_string()))
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn extract(&self, row: &T, column: usize) -> Result<Value, String> {
        let field = self
            .order
            .get(column)
            .ok_or_else(|| format!("column {column} is not bound"))?;
        (self.fields[*field].1)(row)
    }

    fn build(&self, values: Vec<Value>) -> Result<T, String> {
        (self.builder)(values)
    }
}
