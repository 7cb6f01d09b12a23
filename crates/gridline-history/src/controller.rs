#![forbid(unsafe_code)]

//! The host-facing undo/redo surface.
//!
//! [`UndoRedo`] wires one [`HistoryStore`] to one [`EditBatcher`] and exposes
//! the operations a grid needs:
//!
//! - recording: [`track_cells_update`](UndoRedo::track_cells_update),
//!   [`track_rows_add`](UndoRedo::track_rows_add),
//!   [`track_rows_delete`](UndoRedo::track_rows_delete);
//! - stepping: [`on_undo`](UndoRedo::on_undo), [`on_redo`](UndoRedo::on_redo),
//!   [`on_clear`](UndoRedo::on_clear);
//! - state: [`can_undo`](UndoRedo::can_undo), [`can_redo`](UndoRedo::can_redo),
//!   [`subscribe`](UndoRedo::subscribe);
//! - lifecycle: [`tick`](UndoRedo::tick), [`dispose`](UndoRedo::dispose).
//!
//! # Lifecycle
//!
//! One controller per grid. Construct it when the grid mounts, call `tick`
//! from the event loop so debounced edit batches commit, and call `dispose`
//! when the grid unmounts. Disposal cancels the debounce timer and drops
//! uncommitted edits; it does not flush them.
//!
//! # Undo/redo state machine
//!
//! 1. Disabled or disposed: no-op.
//! 2. Undo: flush the pending batch, pop the undo stack, replay `undo`
//!    against the host's current rows, hand the result to
//!    [`GridHost::replace_data`], surface a notice.
//! 3. Redo: refused while edits are pending (they are new work and will
//!    discard the redo stack when they commit); otherwise pop the redo
//!    stack, replay `redo`, hand off, notice.
//!
//! # Example
//!
//! ```
//! use gridline_core::Record;
//! use gridline_history::{CellEdit, GridHost, HistoryConfig, MemoryGrid, UndoRedo};
//! use web_time::Instant;
//!
//! let mut grid = MemoryGrid::new(
//!     vec![Record::new("r1").with("name", "Ada")],
//!     |r: &Record| r.id.clone(),
//! );
//! let mut history = UndoRedo::new(HistoryConfig::default());
//! let now = Instant::now();
//!
//! grid.rows_mut()[0] = Record::new("r1").with("name", "Grace");
//! history.track_cells_update([CellEdit::new("r1", "name", "Ada", "Grace")], now);
//! assert!(history.can_undo());
//!
//! let notice = history.on_undo(&mut grid, now).expect("undone");
//! assert_eq!(notice.to_string(), "Undo: 1 cell");
//! assert_eq!(grid.data()[0], Record::new("r1").with("name", "Ada"));
//! ```

use std::fmt;
use std::rc::Rc;

use gridline_core::{GridRow, HistoryAction};
use tracing::{debug, info, info_span};
use web_time::Instant;

use crate::batcher::{DebounceTimer, EditBatcher};
use crate::command::{CellEdit, Command};
use crate::config::HistoryConfig;
use crate::host::GridHost;
use crate::notice::{NoticeSink, UndoNotice};
use crate::store::{HistoryReader, HistoryStatus, HistoryStore, Subscription};

/// Undo/redo controller for one grid.
pub struct UndoRedo<R> {
    config: HistoryConfig,
    store: HistoryStore<R>,
    batcher: EditBatcher<R>,
    notifier: Option<Box<dyn NoticeSink>>,
    disposed: bool,
}

impl<R> fmt::Debug for UndoRedo<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoRedo")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("has_notifier", &self.notifier.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<R: GridRow> UndoRedo<R> {
    /// Create a controller with its own store.
    ///
    /// Out-of-range config values are clamped.
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        let config = config.validated();
        let store = HistoryStore::new(config.max_history);
        let batcher = EditBatcher::new(store.clone(), config.debounce);
        debug!(
            max_history = config.max_history,
            enabled = config.enabled,
            debounce_ms = config.debounce.as_millis() as u64,
            "undo controller init"
        );
        Self {
            config,
            store,
            batcher,
            notifier: None,
            disposed: false,
        }
    }

    /// Builder: route notices to `sink`.
    #[must_use]
    pub fn with_notifier(mut self, sink: impl NoticeSink + 'static) -> Self {
        self.set_notifier(sink);
        self
    }

    /// Route notices to `sink`, replacing any previous one.
    pub fn set_notifier(&mut self, sink: impl NoticeSink + 'static) {
        self.notifier = Some(Box::new(sink));
    }

    fn active(&self) -> bool {
        self.config.enabled && !self.disposed
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Whether undo would do something: a committed command or a pending
    /// edit batch exists.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.active() && self.store.status().can_undo()
    }

    /// Whether redo would do something.
    ///
    /// False while an edit batch is pending: that batch discards the redo
    /// stack when it commits.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.active() && self.store.status().can_redo()
    }

    /// Current store summary.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.store.status()
    }

    /// Observe store transitions, e.g. to enable toolbar buttons.
    pub fn subscribe(&self, listener: impl Fn(&HistoryStatus) + 'static) -> Subscription {
        self.store.subscribe(listener)
    }

    /// Read-only view of the underlying store.
    #[must_use]
    pub fn store(&self) -> HistoryReader<'_, R> {
        HistoryReader::new(&self.store)
    }

    /// The armed debounce timer, for hosts that schedule their own wake-ups.
    #[must_use]
    pub fn pending_timer(&self) -> Option<DebounceTimer> {
        self.batcher.timer()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Record cell edits the host has already applied.
    ///
    /// Edits are batched; they commit after the debounce window or at the
    /// next boundary (row operation, undo, explicit flush).
    pub fn track_cells_update(&mut self, edits: impl IntoIterator<Item = CellEdit>, now: Instant) {
        if !self.active() {
            return;
        }
        self.batcher.track_cells_update(edits, now);
    }

    /// Record rows the host has already inserted.
    pub fn track_rows_add<H>(&mut self, host: &H, rows: Vec<R>, now: Instant)
    where
        H: GridHost<Row = R>,
    {
        if !self.active() || rows.is_empty() {
            return;
        }
        self.batcher.flush(now);
        let row_id = |r: &R| host.row_id(r);
        self.store.push(Rc::new(Command::rows_add(rows, &row_id, now)));
    }

    /// Record rows the host has already removed.
    pub fn track_rows_delete<H>(&mut self, host: &H, rows: Vec<R>, now: Instant)
    where
        H: GridHost<Row = R>,
    {
        if !self.active() || rows.is_empty() {
            return;
        }
        self.batcher.flush(now);
        let row_id = |r: &R| host.row_id(r);
        self.store.push(Rc::new(Command::rows_delete(rows, &row_id, now)));
    }

    /// Commit the pending edit batch now.
    pub fn flush(&mut self, now: Instant) -> Option<Rc<Command<R>>> {
        if !self.active() {
            return None;
        }
        self.batcher.flush(now)
    }

    /// Drive the debounce timer. Call from the host event loop.
    pub fn tick(&mut self, now: Instant) -> Option<Rc<Command<R>>> {
        if !self.active() {
            return None;
        }
        self.batcher.check_timeout(now)
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Step back one command.
    ///
    /// Returns the notice that was surfaced, or `None` when there was
    /// nothing to undo.
    pub fn on_undo<H>(&mut self, host: &mut H, now: Instant) -> Option<UndoNotice>
    where
        H: GridHost<Row = R>,
    {
        if !self.active() {
            return None;
        }
        self.batcher.flush(now);
        let command = self.store.undo()?;
        Some(self.replay(host, &command, HistoryAction::Undo))
    }

    /// Re-apply the last undone command.
    ///
    /// A no-op while an edit batch is pending.
    pub fn on_redo<H>(&mut self, host: &mut H) -> Option<UndoNotice>
    where
        H: GridHost<Row = R>,
    {
        if !self.active() || self.batcher.is_pending() {
            return None;
        }
        let command = self.store.redo()?;
        Some(self.replay(host, &command, HistoryAction::Redo))
    }

    /// Forget all history, including uncommitted edits.
    pub fn on_clear(&mut self) {
        if !self.active() {
            return;
        }
        self.batcher.dispose();
        self.store.clear();
        debug!("history cleared");
    }

    /// Tear down: cancel the debounce timer and discard uncommitted edits.
    ///
    /// Committed history stays readable through [`store`](Self::store), but
    /// every other operation becomes a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let dropped = self.batcher.dispose();
        self.disposed = true;
        debug!(dropped_cells = dropped, "undo controller disposed");
    }

    fn replay<H>(&mut self, host: &mut H, command: &Command<R>, action: HistoryAction) -> UndoNotice
    where
        H: GridHost<Row = R>,
    {
        let started = Instant::now();
        let span = info_span!(
            "gridline.replay",
            direction = action.label(),
            kind = command.debug_name(),
            count = command.count() as u64,
            duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        let next = {
            let row_id = |r: &R| host.row_id(r);
            match action {
                HistoryAction::Undo => command.undo(host.data(), &row_id),
                HistoryAction::Redo => command.redo(host.data(), &row_id),
            }
        };
        host.replace_data(next);

        span.record("duration_us", started.elapsed().as_micros() as u64);

        let notice = UndoNotice {
            action,
            kind: command.kind(),
            count: command.count(),
        };
        info!(notice = %notice, "history replayed");
        if let Some(sink) = self.notifier.as_mut() {
            sink.notify(&notice);
        }
        notice
    }
}

impl<R> Drop for UndoRedo<R> {
    fn drop(&mut self) {
        if !self.disposed {
            let dropped = self.batcher.dispose();
            debug!(dropped_cells = dropped, "undo controller dropped without dispose");
        }
    }
}
