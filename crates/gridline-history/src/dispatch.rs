#![forbid(unsafe_code)]

//! Keyboard entry point for undo/redo.
//!
//! [`InputDispatcher`] resolves a key event with a [`ChordMapper`] and, when
//! it names a history action, drives the [`UndoRedo`] controller. The host
//! reads [`KeyDisposition::prevent_default`] to decide whether the event was
//! consumed; suppressed chords (focus in a text field or an open overlay)
//! are never consumed so native text undo keeps working.

use gridline_core::{ChordMapper, FocusTarget, GridRow, HistoryAction, KeyEvent, KeymapConfig};
use tracing::trace;
use web_time::Instant;

use crate::controller::UndoRedo;
use crate::host::GridHost;
use crate::notice::UndoNotice;

/// Host-facing summary of one key dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDisposition {
    /// The history action the chord resolved to, if any.
    pub action: Option<HistoryAction>,
    /// Whether the host should stop default handling of the event.
    pub prevent_default: bool,
    /// Notice surfaced by the action. `None` when a stack was empty.
    pub notice: Option<UndoNotice>,
}

impl KeyDisposition {
    const IGNORED: Self = Self {
        action: None,
        prevent_default: false,
        notice: None,
    };

    /// Whether the dispatcher consumed the event.
    #[must_use]
    pub const fn accepted(&self) -> bool {
        self.prevent_default
    }
}

/// Routes history chords to a controller.
#[derive(Debug, Clone, Default)]
pub struct InputDispatcher {
    mapper: ChordMapper,
}

impl InputDispatcher {
    /// Create a dispatcher for `keymap`.
    #[must_use]
    pub const fn new(keymap: KeymapConfig) -> Self {
        Self {
            mapper: ChordMapper::new(keymap),
        }
    }

    /// Resolve `event` without acting on it.
    #[must_use]
    pub fn resolve(&self, event: &KeyEvent, focus: FocusTarget) -> Option<HistoryAction> {
        self.mapper.map(event, focus)
    }

    /// Active keymap.
    #[must_use]
    pub fn keymap(&self) -> &KeymapConfig {
        self.mapper.config()
    }

    /// Handle one key event.
    ///
    /// A matched chord is consumed whenever the controller is enabled and
    /// not disposed, even if the corresponding stack is empty.
    pub fn dispatch<R, H>(
        &self,
        controller: &mut UndoRedo<R>,
        host: &mut H,
        event: &KeyEvent,
        focus: FocusTarget,
        now: Instant,
    ) -> KeyDisposition
    where
        R: GridRow,
        H: GridHost<Row = R>,
    {
        let Some(action) = self.resolve(event, focus) else {
            if focus.suppresses_history() {
                trace!(?focus, "history chord left to focused element");
            }
            return KeyDisposition::IGNORED;
        };
        if !controller.config().enabled || controller.is_disposed() {
            return KeyDisposition {
                action: Some(action),
                ..KeyDisposition::IGNORED
            };
        }
        let notice = match action {
            HistoryAction::Undo => controller.on_undo(host, now),
            HistoryAction::Redo => controller.on_redo(host),
        };
        trace!(action = action.label(), applied = notice.is_some(), "history chord");
        KeyDisposition {
            action: Some(action),
            prevent_default: true,
            notice,
        }
    }
}
