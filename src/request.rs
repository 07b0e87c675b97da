use std::fmt;

use bitvec::prelude::*;

use crate::block::{BITMAP_DOMAIN, ColumnIndex};
use crate::column::Column;
use crate::data::{ColumnData, IntData, MultiData, Scalar};
use crate::error::{Result, StoreError};
use crate::string_data::{NULL_CODE, fold};

/// A filter condition over one named column.
///
/// Requests are plain descriptions; [Request::prepare] binds one to a column
/// of a concrete store and returns the evaluator used for the scan. A request
/// can be prepared any number of times, against any store.
pub trait Request: fmt::Debug + fmt::Display + Send + Sync {
    /// Name of the column the request applies to.
    fn column(&self) -> &str;

    /// Binds the request to `column`, caching whatever it needs from the
    /// column's backing data for the duration of one scan.
    ///
    /// # Errors
    /// Returns [StoreError::IncompatibleRequest] if the request cannot run
    /// against the column's type.
    fn prepare<'a>(&'a self, column: &'a Column) -> Result<Box<dyn PreparedRequest + 'a>>;
}

/// A request bound to a column, ready to evaluate blocks and rows.
pub trait PreparedRequest {
    /// Returns `false` only if no row of the block can satisfy the request.
    fn in_block(&self, index: &ColumnIndex) -> bool;

    /// Returns `true` if the row at absolute `position` satisfies the request.
    fn check_value(&self, position: usize) -> bool;
}

fn incompatible(request: &dyn Request, column: &Column) -> StoreError {
    StoreError::IncompatibleRequest {
        request: request.to_string(),
        column: column.name.clone(),
        data_type: column.data_type,
    }
}

// ─────────────────────────────────────────────────────────────
// Integer membership
// ─────────────────────────────────────────────────────────────

/// Matches rows whose value is one of `values`.
///
/// On multi-valued columns a row matches if any of its elements is one of
/// `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntRequest {
    name: String,
    values: Vec<i64>,
}

impl IntRequest {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        let mut values: Vec<i64> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self {
            name: name.into(),
            values,
        }
    }

    /// Candidate values, sorted and deduplicated.
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}

impl fmt::Display for IntRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{name: {}, values: {:?}}}", self.name, self.values)
    }
}

struct ScalarIn<'a, T: Scalar> {
    data: &'a IntData<T>,
    values: &'a [i64],
}

impl<T: Scalar> PreparedRequest for ScalarIn<'_, T> {
    fn in_block(&self, index: &ColumnIndex) -> bool {
        index.may_contain_any(self.values)
    }

    #[inline]
    fn check_value(&self, position: usize) -> bool {
        self.data.check(position, self.values)
    }
}

struct MultiIn<'a, T: Scalar> {
    data: &'a MultiData<T>,
    values: &'a [i64],
}

impl<T: Scalar> PreparedRequest for MultiIn<'_, T> {
    fn in_block(&self, index: &ColumnIndex) -> bool {
        index.may_contain_any(self.values)
    }

    #[inline]
    fn check_value(&self, position: usize) -> bool {
        self.data.check(position, self.values)
    }
}

impl Request for IntRequest {
    fn column(&self) -> &str {
        &self.name
    }

    fn prepare<'a>(&'a self, column: &'a Column) -> Result<Box<dyn PreparedRequest + 'a>> {
        let values = self.values.as_slice();
        let prepared: Box<dyn PreparedRequest + 'a> = match &column.data {
            ColumnData::Int8(data) => Box::new(ScalarIn { data, values }),
            ColumnData::Int16(data) => Box::new(ScalarIn { data, values }),
            ColumnData::Int32(data) => Box::new(ScalarIn { data, values }),
            ColumnData::Int64(data) => Box::new(ScalarIn { data, values }),
            ColumnData::MultiInt8(data) => Box::new(MultiIn { data, values }),
            ColumnData::MultiInt16(data) => Box::new(MultiIn { data, values }),
            ColumnData::MultiInt64(data) => Box::new(MultiIn { data, values }),
            ColumnData::CompressedString(_) => return Err(incompatible(self, column)),
        };
        Ok(prepared)
    }
}

// ─────────────────────────────────────────────────────────────
// Integer range
// ─────────────────────────────────────────────────────────────

/// Matches rows whose value lies in `[min, max]`, both ends included.
/// `min > max` is accepted and matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntBetweenRequest {
    name: String,
    min: i64,
    max: i64,
}

impl IntBetweenRequest {
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }
}

impl fmt::Display for IntBetweenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{name: {}, min: {}, max: {}}}", self.name, self.min, self.max)
    }
}

struct Between<'a, T: Scalar> {
    data: &'a [T],
    min: i64,
    max: i64,
}

impl<T: Scalar> PreparedRequest for Between<'_, T> {
    fn in_block(&self, index: &ColumnIndex) -> bool {
        index.may_overlap(self.min, self.max)
    }

    #[inline]
    fn check_value(&self, position: usize) -> bool {
        let value = self.data[position].widen();
        value >= self.min && value <= self.max
    }
}

impl Request for IntBetweenRequest {
    fn column(&self) -> &str {
        &self.name
    }

    fn prepare<'a>(&'a self, column: &'a Column) -> Result<Box<dyn PreparedRequest + 'a>> {
        let (min, max) = (self.min, self.max);
        let prepared: Box<dyn PreparedRequest + 'a> = match &column.data {
            ColumnData::Int8(data) => Box::new(Between { data: data.as_slice(), min, max }),
            ColumnData::Int16(data) => Box::new(Between { data: data.as_slice(), min, max }),
            ColumnData::Int32(data) => Box::new(Between { data: data.as_slice(), min, max }),
            ColumnData::Int64(data) => Box::new(Between { data: data.as_slice(), min, max }),
            _ => return Err(incompatible(self, column)),
        };
        Ok(prepared)
    }
}

// ─────────────────────────────────────────────────────────────
// Exact string equality
// ─────────────────────────────────────────────────────────────

/// Matches rows whose string equals one of `values`, case-sensitively.
/// Null rows never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringRequest {
    name: String,
    values: Vec<String>,
}

impl StringRequest {
    pub fn new<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for StringRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{name: {}, values: {:?}}}", self.name, self.values)
    }
}

struct CodeIn<'a> {
    codes: &'a [u32],
    /// Matching dictionary codes, sorted.
    matched: Vec<i64>,
}

impl PreparedRequest for CodeIn<'_> {
    fn in_block(&self, index: &ColumnIndex) -> bool {
        index.may_contain_any(&self.matched)
    }

    #[inline]
    fn check_value(&self, position: usize) -> bool {
        self.matched
            .binary_search(&i64::from(self.codes[position]))
            .is_ok()
    }
}

impl Request for StringRequest {
    fn column(&self) -> &str {
        &self.name
    }

    fn prepare<'a>(&'a self, column: &'a Column) -> Result<Box<dyn PreparedRequest + 'a>> {
        let ColumnData::CompressedString(data) = &column.data else {
            return Err(incompatible(self, column));
        };
        let mut matched: Vec<i64> = self
            .values
            .iter()
            .filter_map(|v| data.dictionary().code_of(v))
            .map(i64::from)
            .collect();
        matched.sort_unstable();
        matched.dedup();
        Ok(Box::new(CodeIn {
            codes: data.codes(),
            matched,
        }))
    }
}

// ─────────────────────────────────────────────────────────────
// Case-insensitive substring
// ─────────────────────────────────────────────────────────────

/// Matches rows whose string contains any of `needles`, ignoring case.
///
/// An empty needle matches every row, null rows included. A request without
/// needles matches nothing.
///
/// The dictionary is searched once at prepare time; the scan itself only
/// tests codes against the resulting set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLikeRequest {
    name: String,
    needles: Vec<String>,
}

impl StringLikeRequest {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, needles: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            needles: needles.into_iter().map(|n| fold(n.as_ref())).collect(),
        }
    }

    fn matches(&self, folded: &str) -> bool {
        self.needles.iter().any(|n| folded.contains(n.as_str()))
    }
}

impl fmt::Display for StringLikeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{name: {}, like: {:?}}}", self.name, self.needles)
    }
}

/// Above this many candidate codes, walking the block bitmap is cheaper than
/// probing it once per code.
const PROBE_LIMIT: usize = (BITMAP_DOMAIN / 64) as usize;

struct CodeMatch<'a> {
    codes: &'a [u32],
    /// Bit `c` set iff code `c` matches.
    matched: BitVec,
    /// Matching codes, ascending.
    matched_codes: Vec<i64>,
    /// Some matching code lies outside the block bitmap domain.
    beyond_domain: bool,
}

impl PreparedRequest for CodeMatch<'_> {
    fn in_block(&self, index: &ColumnIndex) -> bool {
        let Some((lo, hi)) = index.range() else {
            return false;
        };
        let from = self.matched_codes.partition_point(|c| *c < lo);
        let to = self.matched_codes.partition_point(|c| *c <= hi);
        let candidates = &self.matched_codes[from..to];
        if candidates.len() <= PROBE_LIMIT {
            return index.may_contain_any(candidates);
        }
        (index.overflow() && self.beyond_domain)
            || index
                .ones()
                .any(|code| self.matched.get(code as usize).is_some_and(|b| *b))
    }

    #[inline]
    fn check_value(&self, position: usize) -> bool {
        self.matched[self.codes[position] as usize]
    }
}

impl Request for StringLikeRequest {
    fn column(&self) -> &str {
        &self.name
    }

    fn prepare<'a>(&'a self, column: &'a Column) -> Result<Box<dyn PreparedRequest + 'a>> {
        let ColumnData::CompressedString(data) = &column.data else {
            return Err(incompatible(self, column));
        };
        let dictionary = data.dictionary();
        let mut matched = bitvec![0; dictionary.len() + 1];
        matched.set(NULL_CODE as usize, self.needles.iter().any(String::is_empty));
        for (code, folded) in dictionary.folded() {
            if self.matches(folded) {
                matched.set(code as usize, true);
            }
        }
        let matched_codes: Vec<i64> = matched.iter_ones().map(|code| code as i64).collect();
        let beyond_domain = matched_codes.last().is_some_and(|code| *code >= BITMAP_DOMAIN);
        Ok(Box::new(CodeMatch {
            codes: data.codes(),
            matched,
            matched_codes,
            beyond_domain,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::data_type::DataType;
    use crate::value::Value;

    fn column_with(data_type: DataType, values: &[Value]) -> (Column, Block) {
        let mut column = Column::new("c".into(), data_type);
        let mut block = Block::new(0, 1);
        for value in values {
            column.push(value, |v| block.record_value(0, v)).unwrap();
            block.grow();
        }
        (column, block)
    }

    fn matching(request: &dyn Request, column: &Column) -> Vec<usize> {
        let prepared = request.prepare(column).unwrap();
        (0..column.len()).filter(|p| prepared.check_value(*p)).collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : IntRequest on scalar and multi columns
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_int_request_scalar() {
        let (column, block) = column_with(
            DataType::Int16,
            &[Value::Int16(7), Value::Int16(-2), Value::Int16(7)],
        );
        let request = IntRequest::new("c", [7, 100, 7]);

        assert_eq!(request.values(), &[7, 100]);
        assert_eq!(matching(&request, &column), vec![0, 2]);
        assert!(request.prepare(&column).unwrap().in_block(block.index(0)));

        let missing = IntRequest::new("c", [8]);
        assert!(!missing.prepare(&column).unwrap().in_block(block.index(0)));
        assert!(matching(&missing, &column).is_empty());
    }

    #[test]
    fn test_int_request_multi_contains_any() {
        let (column, block) = column_with(
            DataType::MultiInt64,
            &[
                Value::MultiInt64(vec![1, 2]),
                Value::MultiInt64(vec![]),
                Value::MultiInt64(vec![-9, 40_000]),
            ],
        );

        assert_eq!(matching(&IntRequest::new("c", [2, 3]), &column), vec![0]);
        assert_eq!(matching(&IntRequest::new("c", [40_000]), &column), vec![2]);
        let wide = IntRequest::new("c", [40_000]);
        let prepared = wide.prepare(&column).unwrap();
        assert!(prepared.in_block(block.index(0)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : IntBetweenRequest
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_between_agrees_with_block() {
        let (column, block) = column_with(DataType::Int32, &[Value::Int32(5)]);

        let hit = IntBetweenRequest::new("c", 3, 10);
        let miss = IntBetweenRequest::new("c", 6, 10);

        assert_eq!(matching(&hit, &column), vec![0]);
        assert!(hit.prepare(&column).unwrap().in_block(block.index(0)));
        assert!(matching(&miss, &column).is_empty());
        assert!(!miss.prepare(&column).unwrap().in_block(block.index(0)));
    }

    #[test]
    fn test_between_inverted_matches_nothing() {
        let (column, block) = column_with(DataType::Int8, &[Value::Int8(5)]);
        let request = IntBetweenRequest::new("c", 10, 3);

        assert!(matching(&request, &column).is_empty());
        assert!(!request.prepare(&column).unwrap().in_block(block.index(0)));
    }

    #[test]
    fn test_between_rejects_multi_and_strings() {
        let (multi, _) = column_with(DataType::MultiInt8, &[]);
        let (text, _) = column_with(DataType::CompressedString, &[]);
        let request = IntBetweenRequest::new("c", 0, 1);

        assert!(matches!(
            request.prepare(&multi),
            Err(StoreError::IncompatibleRequest { data_type: DataType::MultiInt8, .. })
        ));
        assert!(request.prepare(&text).is_err());
        assert!(IntRequest::new("c", [1]).prepare(&text).is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : StringRequest
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_string_request_exact() {
        let (column, block) = column_with(
            DataType::CompressedString,
            &[Value::from("aRa"), Value::Null, Value::from("ara")],
        );

        assert_eq!(matching(&StringRequest::new("c", ["aRa"]), &column), vec![0]);
        assert_eq!(
            matching(&StringRequest::new("c", ["ara", "aRa"]), &column),
            vec![0, 2]
        );

        let unknown = StringRequest::new("c", ["zzz"]);
        assert!(matching(&unknown, &column).is_empty());
        assert!(!unknown.prepare(&column).unwrap().in_block(block.index(0)));
        assert!(StringRequest::new("c", ["x"]).prepare(&Column::new("i".into(), DataType::Int8)).is_err());
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : StringLikeRequest
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_like_ignores_case() {
        let (column, _) = column_with(
            DataType::CompressedString,
            &[Value::from("A"), Value::from("aRa"), Value::from("ArM")],
        );

        assert_eq!(matching(&StringLikeRequest::new("c", ["ar"]), &column), vec![1, 2]);
        assert_eq!(matching(&StringLikeRequest::new("c", ["ArM"]), &column), vec![2]);
        assert!(matching(&StringLikeRequest::new("c", ["RaR"]), &column).is_empty());
    }

    #[test]
    fn test_like_null_semantics() {
        let (column, block) = column_with(
            DataType::CompressedString,
            &[Value::Null, Value::from(""), Value::from("A")],
        );

        assert_eq!(matching(&StringLikeRequest::new("c", [""]), &column), vec![0, 1, 2]);
        assert_eq!(matching(&StringLikeRequest::new("c", ["a"]), &column), vec![2]);
        assert!(matching(&StringLikeRequest::new("c", Vec::<String>::new()), &column).is_empty());
        assert!(
            StringLikeRequest::new("c", [""])
                .prepare(&column)
                .unwrap()
                .in_block(block.index(0))
        );
    }

    #[test]
    fn test_like_needles_are_or() {
        let (column, _) = column_with(
            DataType::CompressedString,
            &[Value::from("Zorro"), Value::from("Dora"), Value::from("Ara")],
        );

        assert_eq!(
            matching(&StringLikeRequest::new("c", ["oR", "rr"]), &column),
            vec![0, 1]
        );
    }

    #[test]
    fn test_like_prunes_blocks_without_matching_codes() {
        let mut column = Column::new("c".into(), DataType::CompressedString);
        let mut blocks = vec![Block::new(0, 1), Block::new(1, 1)];
        for (i, s) in ["alpha", "beta"].into_iter().enumerate() {
            column
                .push(&Value::from(s), |v| blocks[i].record_value(0, v))
                .unwrap();
            blocks[i].grow();
        }

        let request = StringLikeRequest::new("c", ["ET"]);
        let prepared = request.prepare(&column).unwrap();
        assert!(!prepared.in_block(blocks[0].index(0)));
        assert!(prepared.in_block(blocks[1].index(0)));
    }

    #[test]
    fn test_like_matches_final_sigma_inside_longer_value() {
        let (column, block) = column_with(
            DataType::CompressedString,
            &[Value::from("ΑΣΑ"), Value::from("ασ")],
        );
        let request = StringLikeRequest::new("c", ["ΑΣ"]);

        assert_eq!(matching(&request, &column), vec![0, 1]);
        assert!(request.prepare(&column).unwrap().in_block(block.index(0)));
    }

    #[test]
    fn test_like_pruning_with_many_matching_codes() {
        let mut column = Column::new("c".into(), DataType::CompressedString);
        let mut blocks = vec![Block::new(0, 1), Block::new(1200, 1)];
        let rows = (0..1200)
            .map(|i| (0, if i % 2 == 0 { format!("a{i}") } else { format!("b{i}") }))
            .chain([(1, "b1".to_string()), (1, "b1199".to_string())]);
        for (b, value) in rows {
            let block = &mut blocks[b];
            column
                .push(&Value::from(value), |v| block.record_value(0, v))
                .unwrap();
            block.grow();
        }

        // 600 candidate codes inside both blocks' ranges: walks the bitmaps
        let wide = StringLikeRequest::new("c", ["A"]);
        let prepared = wide.prepare(&column).unwrap();
        assert!(prepared.in_block(blocks[0].index(0)));
        assert!(!prepared.in_block(blocks[1].index(0)));

        // a handful of candidates: probes them one by one
        let narrow = StringLikeRequest::new("c", ["a42"]);
        let prepared = narrow.prepare(&column).unwrap();
        assert!(prepared.in_block(blocks[0].index(0)));
        assert!(!prepared.in_block(blocks[1].index(0)));
        assert_eq!(matching(&narrow, &column), vec![42, 420, 422, 424, 426, 428]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            IntBetweenRequest::new("id", 1, 2).to_string(),
            "{name: id, min: 1, max: 2}"
        );
        assert_eq!(IntRequest::new("id", [2, 1]).column(), "id");
    }
}
