#![forbid(unsafe_code)]

//! User-visible confirmation after an undo or redo.

use std::fmt;

use gridline_core::HistoryAction;

use crate::command::CommandKind;

/// Confirmation of a completed undo/redo, e.g. "Undo: 2 rows".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoNotice {
    /// Which direction was applied.
    pub action: HistoryAction,
    /// Whether cells or rows were affected.
    pub kind: CommandKind,
    /// How many cells or rows were affected.
    pub count: usize,
}

impl fmt::Display for UndoNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}",
            self.action.label(),
            self.count,
            self.kind.noun(self.count)
        )
    }
}

/// Receiver of notices, typically a toast queue.
pub trait NoticeSink {
    /// Show `notice` to the user.
    fn notify(&mut self, notice: &UndoNotice);
}

impl<F: FnMut(&UndoNotice)> NoticeSink for F {
    fn notify(&mut self, notice: &UndoNotice) {
        self(notice);
    }
}
