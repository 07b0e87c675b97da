use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use log::{debug, info, trace};

use crate::accessor::RowAccessor;
use crate::block::Block;
use crate::callback::{
    GroupCountCallback, MultiGroupCountCallback, ObjectCallback, PositionCallback, ScanCallback,
};
use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{Result, StoreError};
use crate::request::{PreparedRequest, Request};
use crate::schema::{Schema, StoreConfig};
use crate::value::Value;

/// Counters reported by a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Blocks considered.
    pub blocks: usize,
    /// Blocks skipped by their pruning index, without any row-level check.
    pub pruned: usize,
    /// Rows delivered to the callback.
    pub matched: usize,
}

/// Compact in-memory columnar store with block-pruned scans.
///
/// Rows are pulled apart into one densely packed container per column on
/// append, and grouped into fixed-capacity blocks. Every block keeps a small
/// index per column so a scan can skip a whole block before checking its rows.
///
/// Appends need `&mut self` and scans `&self`, so the borrow checker keeps
/// writers and readers apart. For parallel scans, split the block range with
/// [Store::scan_blocks]: each call binds its own requests.
///
/// # Example
/// ```
/// use colscan::{DataType, IntBetweenRequest, StoreBuilder, Value, ValuesAccessor};
///
/// let mut store = StoreBuilder::new()
///     .column("id", DataType::Int32)
///     .block_capacity(1)
///     .build(ValuesAccessor)
///     .unwrap();
/// store.insert(vec![Value::Int32(5)]).unwrap();
///
/// let hit = store.select(&[&IntBetweenRequest::new("id", 3, 10)]).unwrap();
/// assert_eq!(hit, vec![vec![Value::Int32(5)]]);
///
/// let mut positions = vec![];
/// let stats = store
///     .scan(&[&IntBetweenRequest::new("id", 6, 10)], &mut |p: usize| positions.push(p))
///     .unwrap();
/// assert!(positions.is_empty());
/// assert_eq!(stats.pruned, 1);
/// ```
pub struct Store<A: RowAccessor> {
    config: StoreConfig,
    schema: Schema,
    columns: Vec<Column>,
    blocks: Vec<Block>,
    accessor: A,
}

type Bound<'a> = Vec<(usize, Box<dyn PreparedRequest + 'a>)>;

impl<A: RowAccessor> Store<A> {
    /// Creates an empty store. See [crate::StoreBuilder] for the fluent form.
    ///
    /// # Errors
    /// Fails on an invalid schema, a zero block capacity, or an accessor that
    /// cannot bind every column.
    pub fn new(schema: Schema, config: StoreConfig, mut accessor: A) -> Result<Self> {
        schema.validate()?;
        if config.block_capacity == 0 {
            return Err(StoreError::InvalidBlockCapacity);
        }
        accessor
            .bind(&schema)
            .map_err(|(column, reason)| StoreError::UnboundColumn { column, reason })?;

        let columns = schema
            .columns
            .iter()
            .map(|def| Column::new(def.name.clone(), def.data_type))
            .collect();
        info!(
            "created store with {} columns, block capacity {}",
            schema.columns.len(),
            config.block_capacity
        );
        Ok(Self {
            config,
            schema,
            columns,
            blocks: Vec::new(),
            accessor,
        })
    }

    /// Appends `rows`, in order, extracting every column through the accessor.
    ///
    /// Each row is committed atomically: all its values are extracted and
    /// type-checked before any column is touched. The batch is not: when row
    /// `i` fails, rows `0..i` stay committed and the error names `i`.
    ///
    /// # Errors
    /// - [StoreError::ValueExtraction] if the accessor fails on a column.
    /// - [StoreError::TypeMismatch] if an extracted value does not fit its column.
    pub fn append(&mut self, rows: &[A::Row]) -> Result<usize> {
        for (i, row) in rows.iter().enumerate() {
            let values = (0..self.columns.len())
                .map(|c| {
                    self.accessor
                        .extract(row, c)
                        .map_err(|reason| StoreError::ValueExtraction {
                            column: self.columns[c].name.clone(),
                            row: i,
                            reason,
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            self.insert(values)?;
        }
        Ok(rows.len())
    }

    /// Appends one positional row, `values` in schema order, bypassing the accessor.
    ///
    /// # Errors
    /// - [StoreError::RowArity] if the number of values differs from the number of columns.
    /// - [StoreError::TypeMismatch] if a value does not fit its column.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(StoreError::RowArity {
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        if let Some((column, value)) = self
            .columns
            .iter()
            .zip(&values)
            .find(|(column, value)| !value.fits(column.data_type))
        {
            return Err(mismatch(column, value.data_type()));
        }

        let b = self.open_block();
        let block = &mut self.blocks[b];
        for (i, (column, value)) in self.columns.iter_mut().zip(&values).enumerate() {
            column
                .push(value, |v| block.record_value(i, v))
                .map_err(|found| mismatch(column, found))?;
        }
        block.grow();
        Ok(())
    }

    /// Index of the block accepting the next row, allocating one when the
    /// last is full.
    fn open_block(&mut self) -> usize {
        let capacity = self.config.block_capacity;
        if self.blocks.last().is_none_or(|b| b.size() >= capacity) {
            let start = self.blocks.last().map_or(0, Block::end);
            self.blocks.push(Block::new(start, self.columns.len()));
            debug!("allocated block {} at row {}", self.blocks.len() - 1, start);
        }
        self.blocks.len() - 1
    }

    /// Resolves every request against this store's columns.
    fn bind<'a>(&'a self, requests: &[&'a dyn Request]) -> Result<Bound<'a>> {
        requests
            .iter()
            .map(|request| {
                let request: &'a dyn Request = *request;
                let c = self
                    .column_index(request.column())
                    .ok_or_else(|| StoreError::UnknownColumn(request.column().to_string()))?;
                Ok((c, request.prepare(&self.columns[c])?))
            })
            .collect()
    }

    /// Main search method. Calls `callback` with the position of every row
    /// accepted by all of `requests`, in ascending order.
    ///
    /// Requests are combined with AND. A block is skipped outright as soon as
    /// one request rejects its index; otherwise each of its rows is checked
    /// against the requests in the given order, stopping at the first miss.
    /// An empty request list accepts every row.
    ///
    /// # Errors
    /// Fails before scanning anything if a request names an unknown column or
    /// cannot run against its column's type.
    pub fn scan<C: ScanCallback + ?Sized>(
        &self,
        requests: &[&dyn Request],
        callback: &mut C,
    ) -> Result<ScanStats> {
        self.scan_blocks(requests, 0..self.blocks.len(), callback)
    }

    /// Same as [Store::scan], restricted to the blocks at indexes `blocks`.
    /// The range is clamped to the existing blocks.
    ///
    /// Disjoint ranges can be scanned from different threads; callers needing
    /// a global order must sort what the workers collected.
    pub fn scan_blocks<C: ScanCallback + ?Sized>(
        &self,
        requests: &[&dyn Request],
        blocks: Range<usize>,
        callback: &mut C,
    ) -> Result<ScanStats> {
        let bound = self.bind(requests)?;
        let end = blocks.end.min(self.blocks.len());
        let start = blocks.start.min(end);

        let mut stats = ScanStats::default();
        for block in &self.blocks[start..end] {
            stats.blocks += 1;
            if !bound.iter().all(|(c, p)| p.in_block(block.index(*c))) {
                stats.pruned += 1;
                continue;
            }

            'rows: for position in block.start()..block.end() {
                for (_, prepared) in &bound {
                    if !prepared.check_value(position) {
                        continue 'rows;
                    }
                }
                callback.data(position);
                stats.matched += 1;
            }
        }
        trace!(
            "scanned blocks {start}..{end}: {} pruned, {} rows matched",
            stats.pruned, stats.matched
        );
        Ok(stats)
    }

    /// Returns the positions of the accepted rows, ascending.
    pub fn select_positions(&self, requests: &[&dyn Request]) -> Result<Vec<usize>> {
        let mut callback = PositionCallback::new();
        self.scan(requests, &mut callback)?;
        Ok(callback.into_positions())
    }

    /// Rebuilds the accepted rows through the accessor, in append order.
    pub fn select(&self, requests: &[&dyn Request]) -> Result<Vec<A::Row>> {
        let mut rows = Vec::new();
        self.select_with(requests, |row| rows.push(row))?;
        Ok(rows)
    }

    /// Rebuilds the accepted rows one at a time, in append order, passing
    /// each to `sink` as soon as it is built.
    ///
    /// # Errors
    /// Besides binding errors, returns [StoreError::RowBuild] once the scan
    /// is over if the accessor rejected a row. Rows built before the failure
    /// have already been delivered.
    pub fn select_with(&self, requests: &[&dyn Request], sink: impl FnMut(A::Row)) -> Result<ScanStats> {
        let mut callback = ObjectCallback::new(self, sink);
        let stats = self.scan(requests, &mut callback)?;
        callback.finish()?;
        Ok(stats)
    }

    /// Rebuilds the accepted rows sorted by the values of `columns`, compared
    /// in order. Rows with equal keys keep their append order; null strings
    /// sort first.
    ///
    /// # Errors
    /// Returns [StoreError::UnknownColumn] if a sort column does not exist.
    pub fn select_and_sort(&self, requests: &[&dyn Request], columns: &[&str]) -> Result<Vec<A::Row>> {
        let sort_columns = self.resolve(columns)?;
        let mut keyed: Vec<(Vec<Value>, usize)> = self
            .select_positions(requests)?
            .into_iter()
            .map(|p| {
                let key = sort_columns
                    .iter()
                    .map(|c| c.get(p).unwrap_or(Value::Null))
                    .collect();
                (key, p)
            })
            .collect();
        keyed.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });
        keyed.into_iter().map(|(_, p)| self.build_row(p)).collect()
    }

    /// Counts the accepted rows per value of `column`.
    pub fn group_count(&self, requests: &[&dyn Request], column: &str) -> Result<BTreeMap<Value, usize>> {
        let column = self
            .column(column)
            .ok_or_else(|| StoreError::UnknownColumn(column.to_string()))?;
        let mut callback = GroupCountCallback::new(column);
        self.scan(requests, &mut callback)?;
        Ok(callback.into_counts())
    }

    /// Counts the accepted rows per combination of values of `columns`.
    pub fn multi_group_count(
        &self,
        requests: &[&dyn Request],
        columns: &[&str],
    ) -> Result<BTreeMap<Vec<Value>, usize>> {
        let mut callback = MultiGroupCountCallback::new(self.resolve(columns)?);
        self.scan(requests, &mut callback)?;
        Ok(callback.into_counts())
    }

    /// Creates a new store with the same schema and config holding only the
    /// accepted rows, in scan order.
    pub fn copy(&self, requests: &[&dyn Request]) -> Result<Self>
    where
        A: Clone,
    {
        let mut copy = Self::new(self.schema.clone(), self.config, self.accessor.clone())?;
        for position in self.select_positions(requests)? {
            if let Some(values) = self.row_values(position) {
                copy.insert(values)?;
            }
        }
        Ok(copy)
    }

    /// Reads every column's value at `position`, in schema order.
    pub fn row_values(&self, position: usize) -> Option<Vec<Value>> {
        if position >= self.size() {
            return None;
        }
        self.columns.iter().map(|c| c.get(position)).collect()
    }

    /// Rebuilds the row object at `position` through the accessor.
    ///
    /// # Errors
    /// Returns [StoreError::RowBuild] if the position is out of bounds or the
    /// accessor rejects the values.
    pub fn build_row(&self, position: usize) -> Result<A::Row> {
        let values = self.row_values(position).ok_or_else(|| StoreError::RowBuild {
            position,
            reason: format!("position out of bounds, store has {} rows", self.size()),
        })?;
        self.accessor
            .build(values)
            .map_err(|reason| StoreError::RowBuild { position, reason })
    }

    fn resolve(&self, names: &[&str]) -> Result<Vec<&Column>> {
        names
            .iter()
            .map(|name| {
                self.column(name)
                    .ok_or_else(|| StoreError::UnknownColumn(name.to_string()))
            })
            .collect()
    }

    /// Drops every row, keeping schema and config.
    pub fn clear(&mut self) {
        for column in &mut self.columns {
            *column = Column::new(column.name.clone(), column.data_type);
        }
        self.blocks.clear();
        debug!("store cleared");
    }

    /// Number of rows stored.
    pub fn size(&self) -> usize {
        self.blocks.last().map_or(0, Block::end)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Heap bytes held by column data and block indexes.
    pub fn memory_usage(&self) -> usize {
        allocative::size_of_unique_allocated_data(&self.columns)
            + self.blocks.capacity() * std::mem::size_of::<Block>()
            + self.blocks.iter().map(Block::allocated_bytes).sum::<usize>()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.position(name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> StoreConfig {
        self.config
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }
}

impl<A: RowAccessor> fmt::Debug for Store<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("block_capacity", &self.config.block_capacity)
            .field("size", &self.size())
            .field("blocks", &self.blocks.len())
            .field("columns", &self.schema.columns)
            .finish()
    }
}

fn mismatch(column: &Column, found: Option<DataType>) -> StoreError {
    StoreError::TypeMismatch {
        column: column.name.clone(),
        expected: column.data_type,
        found,
    }
}
