#![forbid(unsafe_code)]

//! The host grid as seen by the history engine.
//!
//! The engine reads the host's current rows, asks it for row identities,
//! and hands it replacement arrays. It never mutates host rows in place.

use gridline_core::{GridRow, RowId};

/// Data access the history engine needs from the grid that owns the rows.
pub trait GridHost {
    /// Row type stored by the grid.
    type Row: GridRow;

    /// Current snapshot, read at the moment of each undo/redo.
    fn data(&self) -> &[Self::Row];

    /// Replace the grid's rows. This is the engine's only mutation channel.
    fn replace_data(&mut self, next: Vec<Self::Row>);

    /// Stable identity of `row`. Must be pure for the lifetime of the row.
    fn row_id(&self, row: &Self::Row) -> RowId;
}

/// In-memory host: a `Vec` of rows and an identity function.
///
/// Useful for headless hosts and tests. `revision` counts replacements.
pub struct MemoryGrid<R, F> {
    rows: Vec<R>,
    id_of: F,
    revision: u64,
}

impl<R: GridRow, F: Fn(&R) -> RowId> MemoryGrid<R, F> {
    /// Wrap `rows` with the identity function `id_of`.
    #[must_use]
    pub fn new(rows: Vec<R>, id_of: F) -> Self {
        Self {
            rows,
            id_of,
            revision: 0,
        }
    }

    /// Mutable access for host-side edits; the caller reports them with the
    /// controller's `track_*` methods.
    pub fn rows_mut(&mut self) -> &mut Vec<R> {
        &mut self.rows
    }

    /// Consume the grid, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<R> {
        self.rows
    }

    /// Number of `replace_data` calls so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ids of the current rows, in order.
    #[must_use]
    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows.iter().map(&self.id_of).collect()
    }
}

impl<R: GridRow, F: Fn(&R) -> RowId> GridHost for MemoryGrid<R, F> {
    type Row = R;

    fn data(&self) -> &[R] {
        &self.rows
    }

    fn replace_data(&mut self, next: Vec<R>) {
        self.rows = next;
        self.revision += 1;
    }

    fn row_id(&self, row: &R) -> RowId {
        (self.id_of)(row)
    }
}

impl<R: std::fmt::Debug, F> std::fmt::Debug for MemoryGrid<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGrid")
            .field("rows", &self.rows)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}
