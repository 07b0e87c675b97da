use bitvec::prelude::*;

/// Values in `[0, BITMAP_DOMAIN)` are tracked exactly by the block bitmaps.
/// Anything outside only flips [ColumnIndex::overflow].
pub const BITMAP_DOMAIN: i64 = 1 << 15;

/// Per-block, per-column pruning index.
///
/// Over-approximates the set of values present in one column within one
/// block: every value seen is either set in `bits` or covered by `overflow`,
/// and always lies within `[min, max]`.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    bits: BitVec,
    overflow: bool,
    min: i64,
    max: i64,
}

impl Default for ColumnIndex {
    fn default() -> Self {
        Self {
            bits: BitVec::new(),
            overflow: false,
            min: i64::MAX,
            max: i64::MIN,
        }
    }
}

impl ColumnIndex {
    /// Records that `value` appears in the block.
    pub fn record(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        match in_domain(value) {
            Some(bit) => {
                if self.bits.len() <= bit {
                    self.bits.resize(bit + 1, false);
                }
                self.bits.set(bit, true);
            }
            None => self.overflow = true,
        }
    }

    /// Returns `false` only if `value` is certainly absent from the block.
    #[inline]
    pub fn may_contain(&self, value: i64) -> bool {
        if value < self.min || value > self.max {
            return false;
        }
        match in_domain(value) {
            Some(bit) => self.bits.get(bit).is_some_and(|b| *b),
            None => self.overflow,
        }
    }

    /// Returns `false` only if none of `values` can be in the block.
    pub fn may_contain_any(&self, values: &[i64]) -> bool {
        values.iter().any(|v| self.may_contain(*v))
    }

    /// Returns `false` only if no value of the block can fall in `[min, max]`.
    /// An inverted range never overlaps.
    #[inline]
    pub fn may_overlap(&self, min: i64, max: i64) -> bool {
        self.range()
            .is_some_and(|(lo, hi)| min <= max && hi >= min && lo <= max)
    }

    /// Values tracked exactly by the bitmap, ascending.
    pub fn ones(&self) -> impl Iterator<Item = i64> + '_ {
        self.bits.iter_ones().map(|bit| bit as i64)
    }

    /// `true` if some value outside the bitmap domain was recorded.
    pub fn overflow(&self) -> bool {
        self.overflow
    }

    /// Observed `(min, max)`, `None` until a value has been recorded.
    pub fn range(&self) -> Option<(i64, i64)> {
        (self.min <= self.max).then_some((self.min, self.max))
    }

    /// Heap bytes held by the bitmap.
    pub fn allocated_bytes(&self) -> usize {
        std::mem::size_of_val(self.bits.as_raw_slice())
    }
}

#[inline]
fn in_domain(value: i64) -> Option<usize> {
    (0..BITMAP_DOMAIN).contains(&value).then_some(value as usize)
}

/// A run of consecutive row positions `[start, start + size)` with one
/// [ColumnIndex] per store column, in schema order.
///
/// Only the last block of a store is open for appends; once full it is never
/// touched again.
#[derive(Debug, Clone)]
pub struct Block {
    start: usize,
    size: usize,
    indexes: Vec<ColumnIndex>,
}

impl Block {
    pub fn new(start: usize, columns: usize) -> Self {
        Self {
            start,
            size: 0,
            indexes: vec![ColumnIndex::default(); columns],
        }
    }

    /// Absolute position of the first row.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Rows currently in the block.
    pub fn size(&self) -> usize {
        self.size
    }

    /// One past the absolute position of the last row.
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Pruning index of the column at `column` (schema order).
    ///
    /// # Panics
    /// Panics if `column` is out of bounds.
    pub fn index(&self, column: usize) -> &ColumnIndex {
        &self.indexes[column]
    }

    pub fn record_value(&mut self, column: usize, value: i64) {
        self.indexes[column].record(value);
    }

    /// Accounts for one more committed row.
    pub(crate) fn grow(&mut self) {
        self.size += 1;
    }

    pub fn allocated_bytes(&self) -> usize {
        self.indexes.capacity() * std::mem::size_of::<ColumnIndex>()
            + self
                .indexes
                .iter()
                .map(ColumnIndex::allocated_bytes)
                .sum::<usize>()
    }
}
