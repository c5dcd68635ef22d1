//! Grouped counting
//!
//! Every report in the catalogue is a configuration of the primitives here:
//!
//! - [`count_by`] - one key per record
//! - [`count_fan_out`] - each distinct value of a multi-valued field counts once
//! - [`cross_tabulate`] / [`cross_tabulate_fan_out`] - two keys per record
//!
//! All of them feed the same `Tally`, which counts keys in first-seen order.
//! Rankings are a stable sort on that order, so equal counts keep the order in
//! which their keys were first met.
//!
//! A missing key is never dropped: it is counted under [`Bucket::Unknown`].

use ahash::AHashMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use smallvec::SmallVec;
use std::hash::Hash;

/// A grouping key, or the reserved bucket for records without one
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Bucket<K> {
    Known(K),
    Unknown,
}

impl<K> Bucket<K> {
    #[inline]
    pub fn known(&self) -> Option<&K> {
        match self {
            Bucket::Known(k) => Some(k),
            Bucket::Unknown => None,
        }
    }

    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Bucket::Unknown)
    }
}

impl<K> From<Option<K>> for Bucket<K> {
    fn from(value: Option<K>) -> Self {
        match value {
            Some(k) => Bucket::Known(k),
            None => Bucket::Unknown,
        }
    }
}

impl<K: std::fmt::Display> std::fmt::Display for Bucket<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bucket::Known(k) => write!(f, "{}", k),
            Bucket::Unknown => f.write_str("unknown"),
        }
    }
}

/// Insertion-ordered counter shared by every counting operation.
#[derive(Debug)]
pub(crate) struct Tally<K> {
    slots: AHashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub(crate) fn new() -> Self {
        Self {
            slots: AHashMap::new(),
            entries: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn bump(&mut self, key: K) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.slots.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Entries in the order their keys were first bumped
    pub(crate) fn into_first_seen(self) -> Vec<(K, usize)> {
        self.entries
    }

    /// Entries by count descending, first-seen order among ties
    pub(crate) fn into_ranked(self) -> Vec<(K, usize)> {
        rank(self.entries)
    }
}

#[inline]
fn rank<K>(mut entries: Vec<(K, usize)>) -> Vec<(K, usize)> {
    // sort_by is stable: ties keep first-seen order
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// Ranked key -> count mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counts<K> {
    entries: Vec<(Bucket<K>, usize)>,
}

impl<K> Counts<K> {
    pub(crate) fn from_ranked(entries: Vec<(Bucket<K>, usize)>) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bucket<K>, usize)> {
        self.entries.iter().map(|(k, c)| (k, *c))
    }

    /// Known keys only, in rank order
    pub fn known(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries.iter().filter_map(|(k, c)| k.known().map(|k| (k, *c)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Bucket<K>> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Sum over all buckets, including unknown
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// The `n` highest ranked entries
    pub fn top(&self, n: usize) -> &[(Bucket<K>, usize)] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn unknown(&self) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k.is_unknown())
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn into_vec(self) -> Vec<(Bucket<K>, usize)> {
        self.entries
    }
}

impl<K: PartialEq> Counts<K> {
    /// Count for `key`, 0 when it was never observed
    pub fn get(&self, key: &K) -> usize {
        self.entries
            .iter()
            .find(|(k, _)| k.known() == Some(key))
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

impl<K: Clone> Counts<K> {
    /// A copy holding only the `n` highest ranked entries
    pub fn head(&self, n: usize) -> Self {
        Self::from_ranked(self.top(n).to_vec())
    }
}

impl<K: Ord + Clone> Counts<K> {
    /// Entries by key ascending with the unknown bucket last (timelines)
    pub fn sorted_by_key(&self) -> Vec<(Bucket<K>, usize)> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<K> Default for Counts<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

#[derive(Serialize)]
struct CountEntry<'a, K> {
    key: &'a Bucket<K>,
    count: usize,
}

impl<K: Serialize> Serialize for Counts<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            seq.serialize_element(&CountEntry { key, count: *count })?;
        }
        seq.end()
    }
}

type Keys<K> = SmallVec<[Bucket<K>; 4]>;

#[inline]
fn single_key<K>(value: Option<K>) -> Keys<K> {
    let mut keys = Keys::new();
    keys.push(Bucket::from(value));
    keys
}

/// Distinct values in first-seen order; no values means the unknown bucket
fn fan_out_keys<K: PartialEq + Clone>(values: &[K]) -> Keys<K> {
    let mut keys = Keys::new();
    for value in values {
        let bucket = Bucket::Known(value.clone());
        if !keys.contains(&bucket) {
            keys.push(bucket);
        }
    }
    if keys.is_empty() {
        keys.push(Bucket::Unknown);
    }
    keys
}

fn count_keys<T, K, F>(items: &[T], keys: F) -> Counts<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> Keys<K>,
{
    let mut tally = Tally::new();
    for item in items {
        for key in keys(item) {
            tally.bump(key);
        }
    }
    Counts::from_ranked(tally.into_ranked())
}

/// Count records by a single key. Totals always equal `items.len()`.
pub fn count_by<T, K, F>(items: &[T], key: F) -> Counts<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> Option<K>,
{
    count_keys(items, |item| single_key(key(item)))
}

/// Count each distinct value of a multi-valued field once per record.
///
/// A record without any value counts once under the unknown bucket.
pub fn count_fan_out<T, K, F>(items: &[T], values: F) -> Counts<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> &[K],
{
    count_keys(items, |item| fan_out_keys(values(item)))
}

/// Two-key counts as a dense table.
///
/// Rows and columns are the distinct keys observed, in first-seen order. Cells
/// for combinations that never occurred hold 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTab<A, B> {
    rows: Vec<Bucket<A>>,
    columns: Vec<Bucket<B>>,
    cells: Vec<Vec<usize>>,
}

impl<A: Eq + Hash + Clone, B: Eq + Hash + Clone> CrossTab<A, B> {
    fn from_cells(cells: Vec<((Bucket<A>, Bucket<B>), usize)>) -> Self {
        let mut row_slots: AHashMap<Bucket<A>, usize> = AHashMap::new();
        let mut col_slots: AHashMap<Bucket<B>, usize> = AHashMap::new();
        let mut rows = Vec::new();
        let mut columns = Vec::new();

        for ((row, col), _) in &cells {
            if !row_slots.contains_key(row) {
                row_slots.insert(row.clone(), rows.len());
                rows.push(row.clone());
            }
            if !col_slots.contains_key(col) {
                col_slots.insert(col.clone(), columns.len());
                columns.push(col.clone());
            }
        }

        let mut matrix = vec![vec![0; columns.len()]; rows.len()];
        for ((row, col), count) in &cells {
            matrix[row_slots[row]][col_slots[col]] = *count;
        }

        Self {
            rows,
            columns,
            cells: matrix,
        }
    }

    fn row_slot(&self, row: &Bucket<A>) -> Option<usize> {
        self.rows.iter().position(|r| r == row)
    }

    fn col_slot(&self, col: &Bucket<B>) -> Option<usize> {
        self.columns.iter().position(|c| c == col)
    }

    /// Count for one cell, 0 for unobserved keys
    pub fn cell(&self, row: &Bucket<A>, col: &Bucket<B>) -> usize {
        match (self.row_slot(row), self.col_slot(col)) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0,
        }
    }

    pub fn get(&self, row: &A, col: &B) -> usize {
        self.cell(&Bucket::Known(row.clone()), &Bucket::Known(col.clone()))
    }

    /// One row as a ranked mapping over every observed column
    pub fn row(&self, row: &Bucket<A>) -> Option<Counts<B>> {
        let slot = self.row_slot(row)?;
        let entries = self
            .columns
            .iter()
            .cloned()
            .zip(self.cells[slot].iter().copied())
            .collect();
        Some(Counts::from_ranked(rank(entries)))
    }

    /// Sum of each row. With a single-valued column key this is the
    /// single-key count of the row key.
    pub fn row_totals(&self) -> Counts<A> {
        let entries = self
            .rows
            .iter()
            .cloned()
            .zip(self.cells.iter().map(|r| r.iter().sum::<usize>()))
            .collect();
        Counts::from_ranked(rank(entries))
    }

    pub fn column_totals(&self) -> Counts<B> {
        let entries = self
            .columns
            .iter()
            .enumerate()
            .map(|(c, col)| (col.clone(), self.cells.iter().map(|r| r[c]).sum::<usize>()))
            .collect();
        Counts::from_ranked(rank(entries))
    }

    /// Keep only the `n` rows with the largest totals, in rank order
    pub fn top_rows(&self, n: usize) -> Self {
        let keep: Vec<usize> = self
            .row_totals()
            .top(n)
            .iter()
            .filter_map(|(key, _)| self.row_slot(key))
            .collect();
        Self {
            rows: keep.iter().map(|&r| self.rows[r].clone()).collect(),
            columns: self.columns.clone(),
            cells: keep.iter().map(|&r| self.cells[r].clone()).collect(),
        }
    }
}

impl<A: Ord + Clone, B: Ord + Clone> CrossTab<A, B> {
    /// Rows and columns ordered by key, unknown last
    pub fn sorted_by_key(&self) -> Self {
        let mut row_order: Vec<usize> = (0..self.rows.len()).collect();
        row_order.sort_by(|&a, &b| self.rows[a].cmp(&self.rows[b]));
        let mut col_order: Vec<usize> = (0..self.columns.len()).collect();
        col_order.sort_by(|&a, &b| self.columns[a].cmp(&self.columns[b]));

        Self {
            rows: row_order.iter().map(|&r| self.rows[r].clone()).collect(),
            columns: col_order.iter().map(|&c| self.columns[c].clone()).collect(),
            cells: row_order
                .iter()
                .map(|&r| col_order.iter().map(|&c| self.cells[r][c]).collect())
                .collect(),
        }
    }
}

impl<A: Clone, B: Ord + Clone> CrossTab<A, B> {
    /// Columns ordered by key, unknown last; rows keep their order
    pub fn sorted_columns(&self) -> Self {
        let mut col_order: Vec<usize> = (0..self.columns.len()).collect();
        col_order.sort_by(|&a, &b| self.columns[a].cmp(&self.columns[b]));

        Self {
            rows: self.rows.clone(),
            columns: col_order.iter().map(|&c| self.columns[c].clone()).collect(),
            cells: self
                .cells
                .iter()
                .map(|row| col_order.iter().map(|&c| row[c]).collect())
                .collect(),
        }
    }
}

impl<A, B> CrossTab<A, B> {
    pub fn rows(&self) -> &[Bucket<A>] {
        &self.rows
    }

    pub fn columns(&self) -> &[Bucket<B>] {
        &self.columns
    }

    /// Dense cells, `cells()[row][column]`
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn tabulate<T, A, B, R, C>(items: &[T], rows: R, cols: C) -> CrossTab<A, B>
where
    A: Eq + Hash + Clone,
    B: Eq + Hash + Clone,
    R: Fn(&T) -> Keys<A>,
    C: Fn(&T) -> Keys<B>,
{
    let mut tally = Tally::new();
    for item in items {
        let col_keys = cols(item);
        for row in rows(item) {
            for col in &col_keys {
                tally.bump((row.clone(), col.clone()));
            }
        }
    }
    CrossTab::from_cells(tally.into_first_seen())
}

/// Count records by a pair of single-valued keys.
pub fn cross_tabulate<T, A, B, FA, FB>(items: &[T], row_key: FA, col_key: FB) -> CrossTab<A, B>
where
    A: Eq + Hash + Clone,
    B: Eq + Hash + Clone,
    FA: Fn(&T) -> Option<A>,
    FB: Fn(&T) -> Option<B>,
{
    tabulate(items, |t| single_key(row_key(t)), |t| single_key(col_key(t)))
}

/// Like [`cross_tabulate`], but the row key is a multi-valued field that fans
/// out: a record with two directors lands in both directors' rows.
pub fn cross_tabulate_fan_out<T, A, B, FA, FB>(
    items: &[T],
    row_values: FA,
    col_key: FB,
) -> CrossTab<A, B>
where
    A: Eq + Hash + Clone,
    B: Eq + Hash + Clone,
    FA: Fn(&T) -> &[A],
    FB: Fn(&T) -> Option<B>,
{
    tabulate(items, |t| fan_out_keys(row_values(t)), |t| single_key(col_key(t)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_count_by_ranks_with_first_seen_ties() {
        let items = vec!["b", "a", "c", "a", "b", "d"];
        let counts = count_by(&items, |s| Some(s.to_string()));
        let order: Vec<String> = counts.known().map(|(k, _)| k.clone()).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
        assert_eq!(counts.get(&"a".to_string()), 2);
        assert_eq!(counts.get(&"z".to_string()), 0);
    }

    #[test]
    fn test_count_by_keeps_unknown_bucket() {
        let items = vec![Some(1), None, Some(1), None, None];
        let counts = count_by(&items, |v| *v);
        assert_eq!(counts.unknown(), 3);
        assert_eq!(counts.total(), 5);
        assert!(counts.iter().next().unwrap().0.is_unknown());
    }

    #[test]
    fn test_fan_out_counts_each_value_once() {
        let items = vec![vec!["A", "B"], vec!["A", "A"], vec![]];
        let counts = count_fan_out(&items, |v| v.as_slice());
        assert_eq!(counts.get(&"A"), 2);
        assert_eq!(counts.get(&"B"), 1);
        assert_eq!(counts.unknown(), 1);
    }

    #[test]
    fn test_sorted_by_key_puts_unknown_last() {
        let items = vec![Some(2020), None, Some(2018), Some(2020)];
        let counts = count_by(&items, |v| *v);
        let sorted = counts.sorted_by_key();
        assert_eq!(
            sorted,
            vec![
                (Bucket::Known(2018), 1),
                (Bucket::Known(2020), 2),
                (Bucket::Unknown, 1)
            ]
        );
    }

    #[test]
    fn test_cross_tab_fills_zeroes() {
        let items = vec![("x", 1), ("x", 2), ("y", 1)];
        let tab = cross_tabulate(&items, |t| Some(t.0), |t| Some(t.1));
        assert_eq!(tab.rows().len(), 2);
        assert_eq!(tab.columns().len(), 2);
        assert_eq!(tab.get(&"y", &2), 0);
        assert_eq!(tab.get(&"x", &1), 1);
        let y = tab.row(&Bucket::Known("y")).unwrap();
        assert_eq!(y.len(), 2);
        assert_eq!(y.total(), 1);
    }

    #[test]
    fn test_cross_tab_top_rows() {
        let items = vec![("a", 1), ("b", 1), ("b", 2), ("c", 1), ("b", 1), ("c", 2)];
        let tab = cross_tabulate(&items, |t| Some(t.0), |t| Some(t.1));
        let top = tab.top_rows(2);
        assert_eq!(top.rows(), &[Bucket::Known("b"), Bucket::Known("c")]);
        assert_eq!(top.cells()[0], vec![2, 1]);
    }

    #[test]
    fn test_cross_tab_fan_out_rows() {
        let items = vec![(vec!["d1", "d2"], "Movie"), (vec!["d1"], "TV Show")];
        let tab = cross_tabulate_fan_out(&items, |t| t.0.as_slice(), |t| Some(t.1));
        assert_eq!(tab.get(&"d1", &"Movie"), 1);
        assert_eq!(tab.get(&"d1", &"TV Show"), 1);
        assert_eq!(tab.get(&"d2", &"Movie"), 1);
        assert_eq!(tab.get(&"d2", &"TV Show"), 0);
    }

    #[test]
    fn test_counts_serialize_as_entries() {
        let items = vec![Some("PG"), None];
        let counts = count_by(&items, |v| *v);
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"key": "PG", "count": 1}, {"key": null, "count": 1}])
        );
    }

    proptest! {
        #[test]
        fn prop_count_by_total_is_len(items in prop::collection::vec(prop::option::of(0u8..6), 0..64)) {
            let counts = count_by(&items, |v| *v);
            prop_assert_eq!(counts.total(), items.len());
        }

        #[test]
        fn prop_count_by_is_ranked(items in prop::collection::vec(0u8..6, 0..64)) {
            let counts = count_by(&items, |v| Some(*v));
            let values: Vec<usize> = counts.iter().map(|(_, c)| c).collect();
            prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
        }

        #[test]
        fn prop_row_totals_match_count_by(
            items in prop::collection::vec((prop::option::of(0u8..5), prop::option::of(0u8..4)), 0..64)
        ) {
            let tab = cross_tabulate(&items, |t| t.0, |t| t.1);
            let single = count_by(&items, |t| t.0);
            prop_assert_eq!(tab.row_totals(), single);
        }

        #[test]
        fn prop_fan_out_never_double_counts(
            items in prop::collection::vec(prop::collection::vec(0u8..4, 0..6), 0..32)
        ) {
            let counts = count_fan_out(&items, |v| v.as_slice());
            for (key, count) in counts.known() {
                let expected = items.iter().filter(|v| v.contains(key)).count();
                prop_assert_eq!(count, expected);
            }
        }
    }
}
