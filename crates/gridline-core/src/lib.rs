#![forbid(unsafe_code)]

//! Core: row identity, cell values, and input events for Gridline.
//!
//! # Role in Gridline
//! `gridline-core` is the leaf layer. It defines the vocabulary that both
//! the host grid and the history engine (`gridline-history`) speak: stable
//! row and column identifiers, the [`CellValue`] model, the [`GridRow`]
//! access trait, and the canonical key events used to trigger undo/redo.
//!
//! # How it fits in the system
//! The host owns its rows and renders them. The history engine never looks
//! at row positions; it addresses rows through [`RowId`] and cells through
//! [`ColumnId`], reading and writing values through [`GridRow`]. Hosts that
//! have no row type of their own can use [`Record`].

pub mod event;
pub mod ids;
pub mod keybinding;
pub mod row;
pub mod value;

pub use event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use ids::{ColumnId, RowId};
pub use keybinding::{ChordMapper, FocusTarget, HistoryAction, KeymapConfig, Platform};
pub use row::{GridRow, Record};
pub use value::CellValue;
