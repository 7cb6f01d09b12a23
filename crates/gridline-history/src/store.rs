#![forbid(unsafe_code)]

//! Observable undo/redo stacks.
//!
//! [`HistoryStore`] holds the two command stacks and the "edits pending"
//! flag for one grid. It is a cheap, cloneable handle over shared
//! single-threaded state (`Rc<RefCell<..>>`); the controller and the edit
//! batcher both hold a handle to the same store.
//!
//! # Invariants
//!
//! 1. `undo_stack.len() <= max_history` after every operation; the oldest
//!    commands are evicted first.
//! 2. `push` clears the redo stack and the pending flag.
//! 3. Each `push`, successful `undo`/`redo`, and `clear` notifies every live
//!    subscriber exactly once. `undo`/`redo` on an empty stack and
//!    `set_pending_changes` with an unchanged value do not notify.
//!
//! # Memory Model
//!
//! ```text
//! push(c5)            undo() x2           push(c6)
//! undo: [c1..c5]      undo: [c1,c2,c3]    undo: [c1,c2,c3,c6]
//! redo: []            redo: [c5,c4]       redo: []   <-- branch discarded
//! ```
//!
//! # Failure Modes
//!
//! - **Re-entrant mutation**: a subscriber may read the store, and may even
//!   push, because callbacks run after the internal borrow is released. A
//!   push from inside a callback triggers a nested notification round.
//! - **Subscriber leak**: callbacks live as long as their [`Subscription`]
//!   guard. Dead entries are pruned on the next notification.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::command::Command;

type ListenerRc = Rc<dyn Fn(&HistoryStatus)>;
type ListenerWeak = Weak<dyn Fn(&HistoryStatus)>;

/// Summary of the store handed to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    /// Commands available to undo.
    pub undo_depth: usize,
    /// Commands available to redo.
    pub redo_depth: usize,
    /// Whether the edit batcher holds uncommitted edits.
    pub has_pending_changes: bool,
}

impl HistoryStatus {
    /// Undo is possible: a committed command or a pending batch exists.
    #[must_use]
    pub const fn can_undo(&self) -> bool {
        self.undo_depth > 0 || self.has_pending_changes
    }

    /// Redo is possible: a command was undone and no new edit is pending.
    ///
    /// A pending batch is new work; committing it discards the redo stack.
    #[must_use]
    pub const fn can_redo(&self) -> bool {
        self.redo_depth > 0 && !self.has_pending_changes
    }
}

/// Full snapshot of the store.
///
/// Stacks are ordered oldest first; the next command to undo is the last
/// element of `undo_stack`.
#[derive(Debug, Clone)]
pub struct HistoryState<R> {
    /// Committed commands, oldest first.
    pub undo_stack: Vec<Rc<Command<R>>>,
    /// Undone commands, oldest undo first.
    pub redo_stack: Vec<Rc<Command<R>>>,
    /// Whether the edit batcher holds uncommitted edits.
    pub has_pending_changes: bool,
}

struct StoreInner<R> {
    undo_stack: VecDeque<Rc<Command<R>>>,
    redo_stack: VecDeque<Rc<Command<R>>>,
    has_pending_changes: bool,
    max_history: usize,
    listeners: Vec<ListenerWeak>,
}

impl<R> StoreInner<R> {
    fn status(&self) -> HistoryStatus {
        HistoryStatus {
            undo_depth: self.undo_stack.len(),
            redo_depth: self.redo_stack.len(),
            has_pending_changes: self.has_pending_changes,
        }
    }
}

/// Shared undo/redo stacks with change notification.
pub struct HistoryStore<R> {
    inner: Rc<RefCell<StoreInner<R>>>,
}

impl<R> Clone for HistoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for HistoryStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("HistoryStore")
            .field("undo_depth", &inner.undo_stack.len())
            .field("redo_depth", &inner.redo_stack.len())
            .field("has_pending_changes", &inner.has_pending_changes)
            .field("max_history", &inner.max_history)
            .field("subscriber_count", &inner.listeners.len())
            .finish()
    }
}

impl<R> HistoryStore<R> {
    /// Create an empty store keeping at most `max_history` undo entries.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                undo_stack: VecDeque::new(),
                redo_stack: VecDeque::new(),
                has_pending_changes: false,
                max_history,
                listeners: Vec::new(),
            })),
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Push a committed command.
    ///
    /// Evicts the oldest entries beyond `max_history`, clears the redo stack
    /// and the pending flag, then notifies.
    pub fn push(&self, command: Rc<Command<R>>) {
        {
            let mut inner = self.inner.borrow_mut();
            debug!(
                command = command.debug_name(),
                count = command.count(),
                discarded_redo = inner.redo_stack.len(),
                "history push"
            );
            inner.undo_stack.push_back(command);
            while inner.undo_stack.len() > inner.max_history {
                if let Some(evicted) = inner.undo_stack.pop_front() {
                    trace!(command = evicted.debug_name(), "history evict oldest");
                }
            }
            inner.redo_stack.clear();
            inner.has_pending_changes = false;
        }
        self.notify();
    }

    /// Move the newest command from the undo stack to the redo stack.
    ///
    /// Returns `None`, without notifying, when there is nothing to undo.
    pub fn undo(&self) -> Option<Rc<Command<R>>> {
        let command = {
            let mut inner = self.inner.borrow_mut();
            let command = inner.undo_stack.pop_back()?;
            inner.redo_stack.push_back(Rc::clone(&command));
            command
        };
        self.notify();
        Some(command)
    }

    /// Move the newest command from the redo stack back to the undo stack.
    ///
    /// Returns `None`, without notifying, when there is nothing to redo.
    pub fn redo(&self) -> Option<Rc<Command<R>>> {
        let command = {
            let mut inner = self.inner.borrow_mut();
            let command = inner.redo_stack.pop_back()?;
            inner.undo_stack.push_back(Rc::clone(&command));
            command
        };
        self.notify();
        Some(command)
    }

    /// Drop both stacks and the pending flag.
    pub fn clear(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.undo_stack.clear();
            inner.redo_stack.clear();
            inner.has_pending_changes = false;
        }
        self.notify();
    }

    /// Set the pending flag. Notifies only when the value changes.
    pub fn set_pending_changes(&self, pending: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.has_pending_changes == pending {
                return;
            }
            inner.has_pending_changes = pending;
        }
        self.notify();
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Snapshot of both stacks and the pending flag.
    #[must_use]
    pub fn get_state(&self) -> HistoryState<R> {
        let inner = self.inner.borrow();
        HistoryState {
            undo_stack: inner.undo_stack.iter().cloned().collect(),
            redo_stack: inner.redo_stack.iter().cloned().collect(),
            has_pending_changes: inner.has_pending_changes,
        }
    }

    /// Cheap summary of the store.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.inner.borrow().status()
    }

    /// Register a listener called with the new status after every
    /// transition. Dropping the returned guard unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&HistoryStatus) + 'static) -> Subscription {
        let strong: ListenerRc = Rc::new(listener);
        self.inner
            .borrow_mut()
            .listeners
            .push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Number of registered listeners, including dropped ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn notify(&self) {
        let (callbacks, status) = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<ListenerRc> =
                inner.listeners.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.status())
        };
        trace!(
            listeners = callbacks.len(),
            undo_depth = status.undo_depth,
            redo_depth = status.redo_depth,
            pending = status.has_pending_changes,
            "history notify"
        );
        for cb in &callbacks {
            cb(&status);
        }
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Whether a committed command is available to undo.
    ///
    /// This ignores the pending flag; see [`HistoryStatus::can_undo`].
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.inner.borrow().undo_stack.is_empty()
    }

    /// Whether a command is available to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.inner.borrow().redo_stack.is_empty()
    }

    /// Current pending flag.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.inner.borrow().has_pending_changes
    }

    /// Undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.inner.borrow().undo_stack.len()
    }

    /// Redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.inner.borrow().redo_stack.len()
    }

    /// Configured bound on the undo stack.
    #[must_use]
    pub fn max_history(&self) -> usize {
        self.inner.borrow().max_history
    }

    /// Descriptions of undoable commands, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inner
            .borrow()
            .undo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.description())
            .collect()
    }

    /// Descriptions of redoable commands, most recent first.
    #[must_use]
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.inner
            .borrow()
            .redo_stack
            .iter()
            .rev()
            .take(limit)
            .map(|c| c.description())
            .collect()
    }

    /// Description of the next command to undo.
    #[must_use]
    pub fn next_undo_description(&self) -> Option<String> {
        self.inner.borrow().undo_stack.back().map(|c| c.description())
    }

    /// Description of the next command to redo.
    #[must_use]
    pub fn next_redo_description(&self) -> Option<String> {
        self.inner.borrow().redo_stack.back().map(|c| c.description())
    }
}

/// Read-only view of a [`HistoryStore`].
///
/// Handed out by [`UndoRedo::store`](crate::UndoRedo::store). The controller
/// owns every transition of its store, so the view exposes queries and
/// subscription only.
///
/// ```compile_fail
/// use gridline_core::Record;
/// use gridline_history::{HistoryConfig, UndoRedo};
///
/// let history: UndoRedo<Record> = UndoRedo::new(HistoryConfig::default());
/// history.store().clear();
/// ```
pub struct HistoryReader<'a, R> {
    store: &'a HistoryStore<R>,
}

impl<R> Clone for HistoryReader<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for HistoryReader<'_, R> {}

impl<R> fmt::Debug for HistoryReader<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HistoryReader").field(self.store).finish()
    }
}

impl<'a, R> HistoryReader<'a, R> {
    pub(crate) fn new(store: &'a HistoryStore<R>) -> Self {
        Self { store }
    }

    /// See [`HistoryStore::get_state`].
    #[must_use]
    pub fn get_state(&self) -> HistoryState<R> {
        self.store.get_state()
    }

    /// See [`HistoryStore::status`].
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        self.store.status()
    }

    /// See [`HistoryStore::subscribe`].
    pub fn subscribe(&self, listener: impl Fn(&HistoryStatus) + 'static) -> Subscription {
        self.store.subscribe(listener)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.store.subscriber_count()
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.store.has_pending_changes()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.store.undo_depth()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.store.redo_depth()
    }

    #[must_use]
    pub fn max_history(&self) -> usize {
        self.store.max_history()
    }

    /// Descriptions of undoable commands, most recent first.
    #[must_use]
    pub fn undo_descriptions(&self, limit: usize) -> Vec<String> {
        self.store.undo_descriptions(limit)
    }

    /// Descriptions of redoable commands, most recent first.
    #[must_use]
    pub fn redo_descriptions(&self, limit: usize) -> Vec<String> {
        self.store.redo_descriptions(limit)
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<String> {
        self.store.next_undo_description()
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<String> {
        self.store.next_redo_description()
    }
}

/// RAII guard for a store listener.
///
/// Dropping the guard (or calling [`Subscription::unsubscribe`]) makes the
/// listener unreachable; it is pruned on the next notification.
pub struct Subscription {
    _guard: ListenerRc,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
