#![forbid(unsafe_code)]

//! Debounced coalescing of cell edits.
//!
//! Fast data entry produces one host update per keystroke. Recording each of
//! them as its own undo step would make undo useless, so [`EditBatcher`]
//! collects edits into a pending map and commits them as a single
//! [`Command::CellsUpdate`] once input goes quiet for the debounce window,
//! or earlier when a boundary event forces a flush.
//!
//! # Merge rule
//!
//! Pending edits are keyed by `(row_id, column_id)`:
//! - `previous` is fixed the first time a key is seen in the current window;
//! - `next` is overwritten by every later edit to the same key.
//!
//! Three edits `v0 -> v1 -> v2 -> v3` to one cell therefore commit as one
//! change `v0 -> v3`.
//!
//! # State Machine
//!
//! ```text
//!               track()                         track()
//!  ┌────────┐ ─────────▶ ┌──────────────────┐ ◀─────────┐ (re-arm)
//!  │  Idle  │            │ Pending(deadline)│ ──────────┘
//!  └────────┘ ◀───────── └──────────────────┘
//!       ▲      flush() / check_timeout(now >= deadline) -> push command
//!       └──────────────── dispose() -> discard
//! ```
//!
//! # Timing
//!
//! The batcher owns no thread or timer. The debounce deadline is an explicit
//! [`DebounceTimer`] handle; the host drives it by calling
//! [`EditBatcher::check_timeout`] from its event loop, and may read
//! [`EditBatcher::timer`] to schedule the wake-up.

use std::rc::Rc;

use ahash::AHashMap;
use gridline_core::{ColumnId, GridRow, RowId};
use tracing::{debug, trace};
use web_time::{Duration, Instant};

use crate::command::{CellEdit, Command};
use crate::store::HistoryStore;

/// Default quiet period before a batch commits.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// An armed debounce deadline.
///
/// Every re-arm produces a new `token`; a handle taken before a re-arm no
/// longer matches [`EditBatcher::timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimer {
    /// Unique id of this arming.
    pub token: u64,
    /// When the batch commits if no further edit arrives.
    pub deadline: Instant,
}

impl DebounceTimer {
    /// Whether the deadline has been reached at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Coalesces cell edits into single undo steps.
#[derive(Debug)]
pub struct EditBatcher<R> {
    store: HistoryStore<R>,
    debounce: Duration,
    /// Pending edits in first-touched order.
    pending: Vec<CellEdit>,
    /// `(row, column) -> position in pending`.
    positions: AHashMap<(RowId, ColumnId), usize>,
    timer: Option<DebounceTimer>,
    next_token: u64,
}

impl<R: GridRow> EditBatcher<R> {
    /// Create a batcher committing into `store`.
    #[must_use]
    pub fn new(store: HistoryStore<R>, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            pending: Vec::new(),
            positions: AHashMap::new(),
            timer: None,
            next_token: 0,
        }
    }

    /// Merge `edits` into the pending batch and (re)arm the debounce timer.
    ///
    /// An empty `edits` leaves the batcher untouched.
    pub fn track_cells_update(&mut self, edits: impl IntoIterator<Item = CellEdit>, now: Instant) {
        let before = self.pending.len();
        let mut seen = 0usize;
        for edit in edits {
            seen += 1;
            self.merge(edit);
        }
        if seen == 0 {
            return;
        }
        trace!(
            edits = seen,
            new_keys = self.pending.len() - before,
            pending = self.pending.len(),
            "batch track"
        );
        self.store.set_pending_changes(true);
        self.arm(now);
    }

    /// Commit the batch if the debounce deadline has passed.
    pub fn check_timeout(&mut self, now: Instant) -> Option<Rc<Command<R>>> {
        let timer = self.timer?;
        if !timer.is_due(now) {
            return None;
        }
        trace!(token = timer.token, "batch debounce fired");
        self.flush(now)
    }

    /// Commit the batch immediately.
    ///
    /// Cancels the timer. Returns the pushed command, or `None` when nothing
    /// was pending.
    pub fn flush(&mut self, now: Instant) -> Option<Rc<Command<R>>> {
        self.cancel_timer();
        if self.pending.is_empty() {
            return None;
        }
        self.positions.clear();
        let changes = std::mem::take(&mut self.pending);
        debug!(cells = changes.len(), "batch flush");
        let command = Rc::new(Command::cells_update(changes, now));
        self.store.push(Rc::clone(&command));
        Some(command)
    }
}

impl<R> EditBatcher<R> {
    /// Cancel the timer and discard pending edits without committing them.
    ///
    /// Returns how many pending cells were dropped.
    pub fn dispose(&mut self) -> usize {
        self.cancel_timer();
        let dropped = self.pending.len();
        self.pending.clear();
        self.positions.clear();
        if dropped > 0 {
            debug!(cells = dropped, "batch discarded on dispose");
        }
        self.store.set_pending_changes(false);
        dropped
    }

    /// Cancel the armed timer, if any, returning its handle.
    ///
    /// Pending edits are kept; they commit on the next flush.
    pub fn cancel_timer(&mut self) -> Option<DebounceTimer> {
        let cancelled = self.timer.take();
        if let Some(timer) = cancelled {
            trace!(token = timer.token, "batch timer cancelled");
        }
        cancelled
    }

    /// The armed debounce timer.
    #[must_use]
    pub fn timer(&self) -> Option<DebounceTimer> {
        self.timer
    }

    /// Whether any edit is waiting to be committed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of distinct cells waiting to be committed.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending edits in first-touched order.
    #[must_use]
    pub fn pending(&self) -> &[CellEdit] {
        &self.pending
    }

    /// Debounce window.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn merge(&mut self, edit: CellEdit) {
        let key = (edit.row_id.clone(), edit.column_id.clone());
        if let Some(&pos) = self.positions.get(&key) {
            // First previous wins, latest next wins.
            self.pending[pos].next = edit.next;
        } else {
            self.positions.insert(key, self.pending.len());
            self.pending.push(edit);
        }
    }

    fn arm(&mut self, now: Instant) {
        self.cancel_timer();
        self.next_token = self.next_token.wrapping_add(1);
        let timer = DebounceTimer {
            token: self.next_token,
            deadline: now + self.debounce,
        };
        trace!(
            token = timer.token,
            debounce_ms = self.debounce.as_millis() as u64,
            "batch timer armed"
        );
        self.timer = Some(timer);
    }
}
