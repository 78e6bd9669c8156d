//! Diff computation between installed and desired store paths

use crate::types::Delta;
use std::collections::HashSet;
use std::hash::Hash;

/// Compute what to add and what to remove to turn `got` into `want`
///
/// - `add`: members of `want` not in `got`
/// - `remove`: members of `got` not in `want`
///
/// Duplicates in either input collapse to their first occurrence, and
/// the relative input order is kept so step numbering is stable.
pub fn diff<T: Eq + Hash + Clone>(got: &[T], want: &[T]) -> Delta<T> {
    let got_set: HashSet<&T> = got.iter().collect();
    let want_set: HashSet<&T> = want.iter().collect();

    Delta {
        add: missing_from(want, &got_set),
        remove: missing_from(got, &want_set),
    }
}

/// Items absent from `other`, deduplicated, in order
fn missing_from<T: Eq + Hash + Clone>(items: &[T], other: &HashSet<&T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| !other.contains(*item) && seen.insert(*item))
        .cloned()
        .collect()
}
