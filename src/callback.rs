use std::collections::BTreeMap;

use crate::accessor::RowAccessor;
use crate::column::Column;
use crate::error::{Result, StoreError};
use crate::store::Store;
use crate::value::Value;

/// Receives the position of every row accepted by a scan.
///
/// Single-threaded scans deliver positions in strictly ascending order.
/// Any `FnMut(usize)` closure is a callback.
pub trait ScanCallback {
    fn data(&mut self, position: usize);
}

impl<F: FnMut(usize)> ScanCallback for F {
    #[inline]
    fn data(&mut self, position: usize) {
        self(position)
    }
}

/// Collects accepted positions in delivery order.
#[derive(Debug, Clone, Default)]
pub struct PositionCallback {
    positions: Vec<usize>,
}

impl PositionCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    pub fn into_positions(self) -> Vec<usize> {
        self.positions
    }
}

impl ScanCallback for PositionCallback {
    fn data(&mut self, position: usize) {
        self.positions.push(position);
    }
}

/// Rebuilds one row object per accepted position through the store's
/// [RowAccessor] and hands it to `sink` right away, so a select never has to
/// buffer its result.
///
/// Row building stops at the first accessor failure, which
/// [ObjectCallback::finish] then reports.
pub struct ObjectCallback<'s, A: RowAccessor, S: FnMut(A::Row)> {
    store: &'s Store<A>,
    sink: S,
    error: Option<StoreError>,
}

impl<'s, A: RowAccessor, S: FnMut(A::Row)> ObjectCallback<'s, A, S> {
    pub fn new(store: &'s Store<A>, sink: S) -> Self {
        Self {
            store,
            sink,
            error: None,
        }
    }

    /// # Errors
    /// Returns [StoreError::RowBuild] if the accessor failed on any row.
    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<A: RowAccessor, S: FnMut(A::Row)> ScanCallback for ObjectCallback<'_, A, S> {
    fn data(&mut self, position: usize) {
        if self.error.is_some() {
            return;
        }
        match self.store.build_row(position) {
            Ok(row) => (self.sink)(row),
            Err(error) => self.error = Some(error),
        }
    }
}

/// Counts accepted rows per value of one column, without materializing rows.
#[derive(Debug)]
pub struct GroupCountCallback<'s> {
    column: &'s Column,
    counts: BTreeMap<Value, usize>,
}

impl<'s> GroupCountCallback<'s> {
    pub fn new(column: &'s Column) -> Self {
        Self {
            column,
            counts: BTreeMap::new(),
        }
    }

    pub fn counts(&self) -> &BTreeMap<Value, usize> {
        &self.counts
    }

    pub fn into_counts(self) -> BTreeMap<Value, usize> {
        self.counts
    }
}

impl ScanCallback for GroupCountCallback<'_> {
    fn data(&mut self, position: usize) {
        if let Some(value) = self.column.get(position) {
            *self.counts.entry(value).or_default() += 1;
        }
    }
}

/// Counts accepted rows per combination of values of several columns.
#[derive(Debug)]
pub struct MultiGroupCountCallback<'s> {
    columns: Vec<&'s Column>,
    counts: BTreeMap<Vec<Value>, usize>,
}

impl<'s> MultiGroupCountCallback<'s> {
    pub fn new(columns: Vec<&'s Column>) -> Self {
        Self {
            columns,
            counts: BTreeMap::new(),
        }
    }

    pub fn counts(&self) -> &BTreeMap<Vec<Value>, usize> {
        &self.counts
    }

    pub fn into_counts(self) -> BTreeMap<Vec<Value>, usize> {
        self.counts
    }
}

impl ScanCallback for MultiGroupCountCallback<'_> {
    fn data(&mut self, position: usize) {
        let key: Option<Vec<Value>> = self.columns.iter().map(|c| c.get(position)).collect();
        if let Some(key) = key {
            *self.counts.entry(key).or_default() += 1;
        }
    }
}
