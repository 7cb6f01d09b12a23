#![forbid(unsafe_code)]

//! Row access.
//!
//! [`GridRow`] is the narrow interface the history engine uses to read and
//! write individual cells of a host row. Rows are cloned into commands at
//! record time, so implementations must be `Clone`.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ids::{ColumnId, RowId};
use crate::value::CellValue;

/// Cell-level access to a host row.
pub trait GridRow: Clone {
    /// Current value of `column`, or [`CellValue::Null`] when unset.
    fn cell(&self, column: &ColumnId) -> CellValue;

    /// Overwrite `column` with `value`.
    fn set_cell(&mut self, column: &ColumnId, value: CellValue);
}

/// A ready-made row: an id plus an ordered map of column values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Stable identity.
    pub id: RowId,
    /// Column values. Absent columns read as `Null`.
    pub cells: BTreeMap<ColumnId, CellValue>,
}

impl Record {
    /// Create an empty record with the given id.
    #[must_use]
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Builder: set a column value.
    #[must_use]
    pub fn with(mut self, column: impl Into<ColumnId>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    /// The record's id.
    #[must_use]
    pub fn id(&self) -> &RowId {
        &self.id
    }
}

impl GridRow for Record {
    fn cell(&self, column: &ColumnId) -> CellValue {
        self.cells.get(column).cloned().unwrap_or_default()
    }

    /// Setting [`CellValue::Null`] removes the column.
    fn set_cell(&mut self, column: &ColumnId, value: CellValue) {
        if value.is_null() {
            self.cells.remove(column);
        } else {
            self.cells.insert(column.clone(), value);
        }
    }
}
