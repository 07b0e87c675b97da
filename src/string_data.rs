use std::collections::HashMap;
use std::sync::Arc;

use allocative::Allocative;

/// Code stored for a null string. Dictionary codes start at 1.
pub const NULL_CODE: u32 = 0;

/// Per-column symbol table mapping every distinct string to a compact code.
///
/// Keeps the exact value for materialization next to its case-folded form, so
/// case-insensitive matching never has to fold row data during a scan.
#[derive(Debug, Clone, Default, Allocative)]
pub struct Dictionary {
    /// Exact values, `values[code - 1]`.
    values: Vec<Arc<str>>,
    /// Lowercase values, `folded[code - 1]`.
    folded: Vec<Box<str>>,
    #[allocative(skip)]
    codes: HashMap<Arc<str>, u32>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the code of `value`, assigning the next free one on first sight.
    pub fn intern(&mut self, value: &str) -> u32 {
        if let Some(code) = self.codes.get(value) {
            return *code;
        }
        let shared: Arc<str> = Arc::from(value);
        self.values.push(Arc::clone(&shared));
        self.folded.push(fold(value).into_boxed_str());
        let code = self.values.len() as u32;
        self.codes.insert(shared, code);
        code
    }

    /// Code of an already interned value.
    pub fn code_of(&self, value: &str) -> Option<u32> {
        self.codes.get(value).copied()
    }

    /// Exact value for `code`, `None` for [NULL_CODE] or an unknown code.
    pub fn value(&self, code: u32) -> Option<&Arc<str>> {
        let index = usize::try_from(code).ok()?.checked_sub(1)?;
        self.values.get(index)
    }

    /// Iterates `(code, folded value)` for every interned string.
    pub fn folded(&self) -> impl Iterator<Item = (u32, &str)> {
        self.folded
            .iter()
            .enumerate()
            .map(|(i, s)| (i as u32 + 1, s.as_ref()))
    }

    /// Number of distinct non-null strings.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Case folding used on both stored values and search needles.
///
/// Folds one character at a time, so a character folds the same way wherever
/// it sits in the string. `str::to_lowercase` turns a word-final `Σ` into `ς`.
pub fn fold(value: &str) -> String {
    value.chars().flat_map(char::to_lowercase).collect()
}

/// Dictionary-compressed nullable string column data.
///
/// Each row position holds one code; equal strings share one dictionary entry,
/// and null is its own code distinct from the empty string.
#[derive(Debug, Clone, Default, Allocative)]
pub struct StringData {
    codes: Vec<u32>,
    dictionary: Dictionary,
}

impl StringData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a string (or null) and returns the code stored for it.
    pub fn push(&mut self, value: Option<&str>) -> u32 {
        let code = match value {
            Some(s) => self.dictionary.intern(s),
            None => NULL_CODE,
        };
        self.codes.push(code);
        code
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// # Panics
    /// Panics if `position` is out of bounds.
    #[inline]
    pub fn code(&self, position: usize) -> u32 {
        self.codes[position]
    }

    /// Backing code array, cached by requests for the duration of a scan.
    #[inline]
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Exact string at `position`, `None` for null.
    ///
    /// # Panics
    /// Panics if `position` is out of bounds.
    pub fn get(&self, position: usize) -> Option<Arc<str>> {
        self.dictionary.value(self.codes[position]).cloned()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }
}
