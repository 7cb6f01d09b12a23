#![forbid(unsafe_code)]

//! Row-identity resolution against the current data snapshot.
//!
//! Commands never remember where a row was. At replay time they build a
//! fresh [`RowIndex`] from whatever array the host hands them and look rows
//! up by [`RowId`]. The index is rebuilt on every call; caching it would be
//! wrong because the host may have sorted, filtered, or deleted rows since
//! the last replay.
//!
//! # Splice order
//!
//! Removal collects the indices of every target row, sorts them descending,
//! and removes from the end first so earlier removals never shift the
//! positions of later ones.

use ahash::{AHashMap, AHashSet};
use gridline_core::RowId;

/// Host-provided identity function.
pub type RowIdFn<'a, R> = &'a dyn Fn(&R) -> RowId;

/// `RowId -> index` map over one data snapshot.
///
/// If the snapshot contains duplicate ids, the last occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    positions: AHashMap<RowId, usize>,
}

impl RowIndex {
    /// Build the index for `data`.
    #[must_use]
    pub fn build<R>(data: &[R], row_id: RowIdFn<'_, R>) -> Self {
        let mut positions = AHashMap::with_capacity(data.len());
        for (idx, row) in data.iter().enumerate() {
            positions.insert(row_id(row), idx);
        }
        Self { positions }
    }

    /// Current position of `id`, if present.
    #[must_use]
    pub fn get(&self, id: &RowId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Whether `id` is present in the snapshot.
    #[must_use]
    pub fn contains(&self, id: &RowId) -> bool {
        self.positions.contains_key(id)
    }

    /// Number of distinct ids indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the snapshot was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions of `ids`, sorted descending and deduplicated.
    ///
    /// Ids that are not in the snapshot are skipped.
    #[must_use]
    pub fn indices_descending<'a>(&self, ids: impl IntoIterator<Item = &'a RowId>) -> Vec<usize> {
        let mut indices: Vec<usize> = ids.into_iter().filter_map(|id| self.get(id)).collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        indices
    }
}

/// Copy of `data` without the rows whose ids are listed in `ids`.
#[must_use]
pub fn remove_rows<R: Clone>(data: &[R], ids: &[RowId], row_id: RowIdFn<'_, R>) -> Vec<R> {
    let index = RowIndex::build(data, row_id);
    let mut next = data.to_vec();
    for idx in index.indices_descending(ids) {
        next.remove(idx);
    }
    next
}

/// Copy of `data` with `rows` appended at the end.
///
/// Rows whose id is already present in `data` are not appended again, so
/// replaying twice never duplicates a row.
#[must_use]
pub fn append_rows<R: Clone>(data: &[R], rows: &[R], row_id: RowIdFn<'_, R>) -> Vec<R> {
    let index = RowIndex::build(data, row_id);
    let mut seen = AHashSet::with_capacity(rows.len());
    let mut next = Vec::with_capacity(data.len() + rows.len());
    next.extend_from_slice(data);
    for row in rows {
        let id = row_id(row);
        if index.contains(&id) || !seen.insert(id) {
            continue;
        }
        next.push(row.clone());
    }
    next
}
