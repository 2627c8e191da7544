//! Group the rows of a table by the normalized name they carry.
use crate::{normalize_name, Table};
use std::collections::BTreeMap;

/// The normalized names found in one column of a table, each with the rows it was derived from.
///
/// Rows whose name normalizes to the empty key are not part of the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    rows_by_key: BTreeMap<String, Vec<usize>>,
}

impl KeySet {
    /// Build the set from the column `field` of `table`, which may be a name or an index.
    ///
    /// A table without such a column yields an empty set.
    pub fn from_column(table: &Table, field: &str) -> Self {
        match table.column(field) {
            Some(index) => Self::from_cells(table.cells(index)),
            None => KeySet::default(),
        }
    }

    /// Build the set from raw names, with row indices assigned in iteration order.
    pub fn from_cells<'a>(names: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut rows_by_key = BTreeMap::<String, Vec<usize>>::new();
        for (row, name) in names.into_iter().enumerate() {
            let key = normalize_name(name);
            if key.is_empty() {
                continue;
            }
            rows_by_key.entry(key).or_default().push(row);
        }
        KeySet { rows_by_key }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows_by_key.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.rows_by_key.is_empty()
    }

    /// The amount of distinct keys.
    pub fn len(&self) -> usize {
        self.rows_by_key.len()
    }

    /// All distinct keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows_by_key.keys().map(String::as_str)
    }

    /// How many rows normalized to `key`.
    pub fn count(&self, key: &str) -> usize {
        self.rows_by_key.get(key).map_or(0, Vec::len)
    }

    /// The indices of the rows that normalized to `key`, in table order.
    pub fn rows(&self, key: &str) -> &[usize] {
        self.rows_by_key.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Add all keys of `other` to this set. Row indices of `other` are kept as they are.
    pub fn extend(&mut self, other: KeySet) {
        for (key, rows) in other.rows_by_key {
            self.rows_by_key.entry(key).or_default().extend(rows);
        }
    }
}
