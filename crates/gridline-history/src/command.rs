#![forbid(unsafe_code)]

//! Reversible grid commands.
//!
//! A [`Command`] is the record of one user operation that can be stepped
//! back and forward. There are three variants:
//!
//! - [`Command::CellsUpdate`]: a batch of cell edits, each carrying the value
//!   before the batch and the value after it.
//! - [`Command::RowsAdd`]: rows the user inserted.
//! - [`Command::RowsDelete`]: rows the user removed.
//!
//! # Invariants
//!
//! - `undo` and `redo` are pure: they read the snapshot they are given and
//!   return a new array. The input slice is never mutated.
//! - Rows are located by [`RowId`] through a fresh
//!   [`RowIndex`](crate::resolver::RowIndex) on every call. No index position
//!   is captured at record time.
//! - A row that no longer exists is skipped, not reported.
//! - Re-inserted rows (`RowsAdd::redo`, `RowsDelete::undo`) go to the end of
//!   the array. Original positions are not recoverable once rows have been
//!   sorted or filtered.

use std::fmt;

use gridline_core::{CellValue, ColumnId, GridRow, RowId};
use web_time::Instant;

use crate::resolver::{RowIdFn, RowIndex, append_rows, remove_rows};

/// One cell edit: which cell, what it held, what it holds now.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    /// Row holding the cell.
    pub row_id: RowId,
    /// Column of the cell.
    pub column_id: ColumnId,
    /// Value before the edit.
    pub previous: CellValue,
    /// Value after the edit.
    pub next: CellValue,
}

impl CellEdit {
    /// Create a cell edit.
    #[must_use]
    pub fn new(
        row_id: impl Into<RowId>,
        column_id: impl Into<ColumnId>,
        previous: impl Into<CellValue>,
        next: impl Into<CellValue>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            column_id: column_id.into(),
            previous: previous.into(),
            next: next.into(),
        }
    }

    /// Whether the edit leaves the value unchanged.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.previous == self.next
    }
}

/// What a command touched, for notices and UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Cell values.
    Cells,
    /// Whole rows.
    Rows,
}

impl CommandKind {
    /// Unit noun, pluralized for `count`.
    #[must_use]
    pub const fn noun(self, count: usize) -> &'static str {
        match (self, count == 1) {
            (Self::Cells, true) => "cell",
            (Self::Cells, false) => "cells",
            (Self::Rows, true) => "row",
            (Self::Rows, false) => "rows",
        }
    }
}

/// Rows captured by an add or delete, together with their ids.
#[derive(Debug, Clone)]
pub struct RowsChange<R> {
    rows: Vec<R>,
    row_ids: Vec<RowId>,
    timestamp: Instant,
}

impl<R> RowsChange<R> {
    /// The captured rows, in the order they were tracked.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Ids of the captured rows.
    #[must_use]
    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }
}

/// Cell edits captured when an edit batch was flushed.
#[derive(Debug, Clone)]
pub struct CellsUpdate {
    changes: Vec<CellEdit>,
    timestamp: Instant,
}

impl CellsUpdate {
    /// The edits, in first-touched order.
    #[must_use]
    pub fn changes(&self) -> &[CellEdit] {
        &self.changes
    }
}

/// A reversible grid operation.
#[derive(Debug, Clone)]
pub enum Command<R> {
    /// A batch of cell edits.
    CellsUpdate(CellsUpdate),
    /// Rows inserted by the user.
    RowsAdd(RowsChange<R>),
    /// Rows removed by the user.
    RowsDelete(RowsChange<R>),
}

impl<R: GridRow> Command<R> {
    /// Record a batch of cell edits.
    #[must_use]
    pub fn cells_update(changes: Vec<CellEdit>, timestamp: Instant) -> Self {
        Self::CellsUpdate(CellsUpdate { changes, timestamp })
    }

    /// Record rows that were added.
    #[must_use]
    pub fn rows_add(rows: Vec<R>, row_id: RowIdFn<'_, R>, timestamp: Instant) -> Self {
        Self::RowsAdd(capture_rows(rows, row_id, timestamp))
    }

    /// Record rows that were deleted.
    #[must_use]
    pub fn rows_delete(rows: Vec<R>, row_id: RowIdFn<'_, R>, timestamp: Instant) -> Self {
        Self::RowsDelete(capture_rows(rows, row_id, timestamp))
    }

    /// Revert this command against the current `data`.
    #[must_use]
    pub fn undo(&self, data: &[R], row_id: RowIdFn<'_, R>) -> Vec<R> {
        match self {
            Self::CellsUpdate(update) => {
                apply_cells(data, update.changes.iter().rev(), row_id, |c| &c.previous)
            }
            Self::RowsAdd(change) => remove_rows(data, &change.row_ids, row_id),
            Self::RowsDelete(change) => append_rows(data, &change.rows, row_id),
        }
    }

    /// Re-apply this command against the current `data`.
    #[must_use]
    pub fn redo(&self, data: &[R], row_id: RowIdFn<'_, R>) -> Vec<R> {
        match self {
            Self::CellsUpdate(update) => {
                apply_cells(data, update.changes.iter(), row_id, |c| &c.next)
            }
            Self::RowsAdd(change) => append_rows(data, &change.rows, row_id),
            Self::RowsDelete(change) => remove_rows(data, &change.row_ids, row_id),
        }
    }
}

impl<R> Command<R> {
    /// Whether this command touched cells or rows.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::CellsUpdate(_) => CommandKind::Cells,
            Self::RowsAdd(_) | Self::RowsDelete(_) => CommandKind::Rows,
        }
    }

    /// Number of cells or rows affected.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::CellsUpdate(update) => update.changes.len(),
            Self::RowsAdd(change) | Self::RowsDelete(change) => change.rows.len(),
        }
    }

    /// When the command was recorded.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        match self {
            Self::CellsUpdate(update) => update.timestamp,
            Self::RowsAdd(change) | Self::RowsDelete(change) => change.timestamp,
        }
    }

    /// Human-readable description, e.g. "Edit 3 cells" or "Delete 1 row".
    #[must_use]
    pub fn description(&self) -> String {
        let verb = match self {
            Self::CellsUpdate(_) => "Edit",
            Self::RowsAdd(_) => "Add",
            Self::RowsDelete(_) => "Delete",
        };
        let count = self.count();
        format!("{verb} {count} {}", self.kind().noun(count))
    }

    /// Short static name for logs.
    #[must_use]
    pub const fn debug_name(&self) -> &'static str {
        match self {
            Self::CellsUpdate(_) => "cells_update",
            Self::RowsAdd(_) => "rows_add",
            Self::RowsDelete(_) => "rows_delete",
        }
    }
}

impl<R> fmt::Display for Command<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

fn capture_rows<R>(rows: Vec<R>, row_id: RowIdFn<'_, R>, timestamp: Instant) -> RowsChange<R> {
    let row_ids = rows.iter().map(row_id).collect();
    RowsChange {
        rows,
        row_ids,
        timestamp,
    }
}

fn apply_cells<'c, R: GridRow>(
    data: &[R],
    changes: impl Iterator<Item = &'c CellEdit>,
    row_id: RowIdFn<'_, R>,
    pick: impl Fn(&CellEdit) -> &CellValue,
) -> Vec<R> {
    let index = RowIndex::build(data, row_id);
    let mut next = data.to_vec();
    for change in changes {
        if let Some(idx) = index.get(&change.row_id) {
            next[idx].set_cell(&change.column_id, pick(change).clone());
        }
    }
    next
}
