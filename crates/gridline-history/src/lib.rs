#![forbid(unsafe_code)]

//! Gridline History
//!
//! Undo/redo for data grids whose rows may be sorted, filtered, or otherwise
//! reordered between an edit and its reversal.
//!
//! # Key Components
//!
//! - [`UndoRedo`] - Per-grid controller: tracking, stepping, lifecycle
//! - [`Command`] - Reversible record of a cell batch, row insert, or row delete
//! - [`HistoryStore`] - Bounded undo/redo stacks with change notification
//! - [`EditBatcher`] - Debounced coalescing of keystroke-level cell edits
//! - [`RowIndex`] - Fresh `RowId -> index` resolution for every replay
//! - [`InputDispatcher`] - Keyboard chords to undo/redo, with focus suppression
//! - [`HistoryConfig`] - Capacity, enablement, debounce window
//!
//! # Role in Gridline
//! The host grid owns its rows and applies edits itself. It then reports
//! what it did through the controller's `track_*` methods. On undo or redo
//! the engine reads the host's current rows through [`GridHost`], computes a
//! replacement array, and hands it back with [`GridHost::replace_data`].
//!
//! # How it fits in the system
//! `gridline-core` supplies identifiers, cell values, and key events. This
//! crate depends on it and on nothing host-specific: hosts implement
//! [`GridHost`] (or use [`MemoryGrid`]) and drive time with
//! [`UndoRedo::tick`].

pub mod batcher;
pub mod command;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod host;
pub mod notice;
pub mod resolver;
pub mod store;

pub use batcher::{DEFAULT_DEBOUNCE_MS, DebounceTimer, EditBatcher};
pub use command::{CellEdit, CellsUpdate, Command, CommandKind, RowsChange};
pub use config::{ConfigError, DEFAULT_MAX_HISTORY, HistoryConfig};
pub use controller::UndoRedo;
pub use dispatch::{InputDispatcher, KeyDisposition};
pub use host::{GridHost, MemoryGrid};
pub use notice::{NoticeSink, UndoNotice};
pub use resolver::{RowIdFn, RowIndex, append_rows, remove_rows};
pub use store::{HistoryReader, HistoryState, HistoryStatus, HistoryStore, Subscription};
