//! Find people who appear in two sources, or more than once in the same source.
use crate::{KeySet, Table};
use std::collections::BTreeSet;

/// Return the normalized names present both in column `field_a` of `a` and in column `field_b` of `b`.
///
/// The result doesn't depend on the order of the two sources.
pub fn across(a: &Table, field_a: &str, b: &Table, field_b: &str) -> BTreeSet<String> {
    let a = KeySet::from_column(a, field_a);
    let b = KeySet::from_column(b, field_b);
    a.keys()
        .filter(|key| b.contains(key))
        .map(ToOwned::to_owned)
        .collect()
}

/// Return the normalized names that occur in at least two rows of column `field` of `table`.
///
/// Different spellings collapsing into the same key count as the same name.
pub fn within(table: &Table, field: &str) -> BTreeSet<String> {
    let keys = KeySet::from_column(table, field);
    keys.keys()
        .filter(|key| keys.count(key) > 1)
        .map(ToOwned::to_owned)
        .collect()
}
