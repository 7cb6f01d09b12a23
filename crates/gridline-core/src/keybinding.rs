#![forbid(unsafe_code)]

//! Undo/redo chord recognition.
//!
//! # Key Concepts
//!
//! - **Platform**: which modifier is "primary" (Cmd on macOS, Ctrl elsewhere).
//! - **KeymapConfig**: which redo chords are accepted.
//! - **FocusTarget**: what currently holds keyboard focus. Text-editing
//!   surfaces and transient overlays keep their native undo, so chords that
//!   arrive while they are focused are left alone.
//! - **ChordMapper**: turns a [`KeyEvent`] plus the current [`FocusTarget`]
//!   into a [`HistoryAction`].
//!
//! # Chords
//!
//! | Chord | Action |
//! |-------|--------|
//! | Primary+Z | Undo |
//! | Primary+Shift+Z | Redo |
//! | Primary+Y | Redo (when `redo_with_y` is set) |
//!
//! # Example
//!
//! ```
//! use gridline_core::event::{KeyCode, KeyEvent, Modifiers};
//! use gridline_core::keybinding::{
//!     ChordMapper, FocusTarget, HistoryAction, KeymapConfig, Platform,
//! };
//!
//! let mapper = ChordMapper::new(KeymapConfig::for_platform(Platform::Other));
//! let ctrl_z = KeyEvent::new(KeyCode::Char('z')).with_modifiers(Modifiers::CTRL);
//!
//! assert_eq!(mapper.map(&ctrl_z, FocusTarget::Grid), Some(HistoryAction::Undo));
//! // Text inputs keep their own undo.
//! assert_eq!(mapper.map(&ctrl_z, FocusTarget::TextInput), None);
//! ```

use crate::event::{KeyEvent, KeyEventKind, Modifiers};

/// Host platform, deciding the primary chord modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// macOS / iOS: Cmd is primary.
    Mac,
    /// Everything else: Ctrl is primary.
    #[default]
    Other,
}

impl Platform {
    /// Platform of the current build target.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::Mac
        } else {
            Self::Other
        }
    }

    /// Modifier treated as primary on this platform.
    #[must_use]
    pub const fn primary_modifier(self) -> Modifiers {
        match self {
            Self::Mac => Modifiers::SUPER,
            Self::Other => Modifiers::CTRL,
        }
    }
}

/// Configuration for chord recognition.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `GRIDLINE_REDO_CTRL_Y` | bool | true | Accept Primary+Y as redo |
/// | `GRIDLINE_ACCEPT_EITHER_MODIFIER` | bool | false | Accept Ctrl and Cmd on every platform |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeymapConfig {
    /// Platform deciding the primary modifier.
    pub platform: Platform,

    /// Accept Primary+Y as redo in addition to Primary+Shift+Z.
    /// Default: true.
    pub redo_with_y: bool,

    /// Accept both Ctrl and Cmd regardless of platform (browser hosts that
    /// cannot reliably detect the OS).
    /// Default: false.
    pub accept_either_modifier: bool,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl KeymapConfig {
    /// Default keymap for a specific platform.
    #[must_use]
    pub const fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            redo_with_y: true,
            accept_either_modifier: false,
        }
    }

    /// Disable Primary+Y as redo.
    #[must_use]
    pub fn without_redo_y(mut self) -> Self {
        self.redo_with_y = false;
        self
    }

    /// Accept both Ctrl and Cmd as primary.
    #[must_use]
    pub fn accept_either_modifier(mut self) -> Self {
        self.accept_either_modifier = true;
        self
    }

    /// Load config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup.
    ///
    /// Unparseable values keep the default.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("GRIDLINE_REDO_CTRL_Y")
            && let Some(flag) = parse_flag(&val)
        {
            config.redo_with_y = flag;
        }

        if let Some(val) = lookup("GRIDLINE_ACCEPT_EITHER_MODIFIER")
            && let Some(flag) = parse_flag(&val)
        {
            config.accept_either_modifier = flag;
        }

        config
    }

    fn primary_held(&self, modifiers: Modifiers) -> bool {
        if self.accept_either_modifier {
            modifiers.intersects(Modifiers::CTRL | Modifiers::SUPER)
        } else {
            modifiers.contains(self.platform.primary_modifier())
        }
    }
}

/// Parse a boolean-ish environment value.
#[must_use]
pub fn parse_flag(val: &str) -> Option<bool> {
    match val.trim() {
        "1" => Some(true),
        "0" => Some(false),
        v if v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes") => Some(true),
        v if v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("no") => Some(false),
        _ => None,
    }
}

/// What currently holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// Nothing in particular (document body).
    #[default]
    None,
    /// The grid itself (cell selection, not editing).
    Grid,
    /// A single-line text input.
    TextInput,
    /// A multi-line textarea.
    TextArea,
    /// A `contenteditable` region.
    ContentEditable,
    /// An open transient overlay such as a popover or menu.
    Overlay,
}

impl FocusTarget {
    /// Whether history chords must be left to the focused element.
    #[must_use]
    pub const fn suppresses_history(self) -> bool {
        matches!(
            self,
            Self::TextInput | Self::TextArea | Self::ContentEditable | Self::Overlay
        )
    }
}

/// High-level history action resolved from a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    /// Step back one command.
    Undo,
    /// Re-apply the last undone command.
    Redo,
}

impl HistoryAction {
    /// Label used in notices ("Undo" / "Redo").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Undo => "Undo",
            Self::Redo => "Redo",
        }
    }
}

/// Maps key events to history actions.
#[derive(Debug, Clone, Default)]
pub struct ChordMapper {
    config: KeymapConfig,
}

impl ChordMapper {
    /// Create a mapper with the given keymap.
    #[must_use]
    pub const fn new(config: KeymapConfig) -> Self {
        Self { config }
    }

    /// Resolve a key event.
    ///
    /// Returns `None` when the event is not a history chord, is a key
    /// release, or arrives while `focus` suppresses history.
    #[must_use]
    pub fn map(&self, event: &KeyEvent, focus: FocusTarget) -> Option<HistoryAction> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        if !self.config.primary_held(event.modifiers) || event.alt() {
            return None;
        }
        let action = if event.is_char('z') {
            if event.shift() {
                HistoryAction::Redo
            } else {
                HistoryAction::Undo
            }
        } else if event.is_char('y') && !event.shift() && self.config.redo_with_y {
            HistoryAction::Redo
        } else {
            return None;
        };
        if focus.suppresses_history() {
            return None;
        }
        Some(action)
    }

    /// Current keymap.
    #[must_use]
    pub fn config(&self) -> &KeymapConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, KeyEvent};

    fn key(c: char, mods: Modifiers) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c)).with_modifiers(mods)
    }

    fn other() -> ChordMapper {
        ChordMapper::new(KeymapConfig::for_platform(Platform::Other))
    }

    fn mac() -> ChordMapper {
        ChordMapper::new(KeymapConfig::for_platform(Platform::Mac))
    }

    #[test]
    fn ctrl_z_is_undo() {
        assert_eq!(
            other().map(&key('z', Modifiers::CTRL), FocusTarget::Grid),
            Some(HistoryAction::Undo)
        );
    }

    #[test]
    fn ctrl_shift_z_is_redo_even_uppercase() {
        let ev = key('Z', Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(other().map(&ev, FocusTarget::None), Some(HistoryAction::Redo));
    }

    #[test]
    fn ctrl_y_is_redo_unless_disabled() {
        let ev = key('y', Modifiers::CTRL);
        assert_eq!(other().map(&ev, FocusTarget::Grid), Some(HistoryAction::Redo));
        let no_y = ChordMapper::new(KeymapConfig::for_platform(Platform::Other).without_redo_y());
        assert_eq!(no_y.map(&ev, FocusTarget::Grid), None);
    }

    #[test]
    fn mac_uses_cmd() {
        assert_eq!(
            mac().map(&key('z', Modifiers::SUPER), FocusTarget::Grid),
            Some(HistoryAction::Undo)
        );
        assert_eq!(mac().map(&key('z', Modifiers::CTRL), FocusTarget::Grid), None);
        assert_eq!(other().map(&key('z', Modifiers::SUPER), FocusTarget::Grid), None);
    }

    #[test]
    fn either_modifier_accepts_both() {
        let m = ChordMapper::new(
            KeymapConfig::for_platform(Platform::Mac).accept_either_modifier(),
        );
        assert_eq!(
            m.map(&key('z', Modifiers::CTRL), FocusTarget::Grid),
            Some(HistoryAction::Undo)
        );
        assert_eq!(
            m.map(&key('z', Modifiers::SUPER), FocusTarget::Grid),
            Some(HistoryAction::Undo)
        );
    }

    #[test]
    fn text_surfaces_and_overlays_suppress() {
        let ev = key('z', Modifiers::CTRL);
        for focus in [
            FocusTarget::TextInput,
            FocusTarget::TextArea,
            FocusTarget::ContentEditable,
            FocusTarget::Overlay,
        ] {
            assert_eq!(other().map(&ev, focus), None, "{focus:?}");
        }
    }

    #[test]
    fn release_and_plain_keys_ignored() {
        let release = key('z', Modifiers::CTRL).with_kind(KeyEventKind::Release);
        assert_eq!(other().map(&release, FocusTarget::Grid), None);
        assert_eq!(other().map(&key('z', Modifiers::NONE), FocusTarget::Grid), None);
        assert_eq!(other().map(&key('x', Modifiers::CTRL), FocusTarget::Grid), None);
        let non_char = KeyEvent::new(KeyCode::Other).with_modifiers(Modifiers::CTRL);
        assert_eq!(other().map(&non_char, FocusTarget::Grid), None);
        assert_eq!(
            other().map(&key('z', Modifiers::CTRL | Modifiers::ALT), FocusTarget::Grid),
            None
        );
    }

    #[test]
    fn repeat_counts() {
        let ev = key('z', Modifiers::CTRL).with_kind(KeyEventKind::Repeat);
        assert_eq!(other().map(&ev, FocusTarget::Grid), Some(HistoryAction::Undo));
    }

    #[test]
    fn from_vars_overrides() {
        let cfg = KeymapConfig::from_vars(|k| match k {
            "GRIDLINE_REDO_CTRL_Y" => Some("false".into()),
            "GRIDLINE_ACCEPT_EITHER_MODIFIER" => Some("1".into()),
            _ => None,
        });
        assert!(!cfg.redo_with_y);
        assert!(cfg.accept_either_modifier);
    }

    #[test]
    fn from_vars_ignores_garbage() {
        let cfg = KeymapConfig::from_vars(|_| Some("maybe".into()));
        assert!(cfg.redo_with_y);
        assert!(!cfg.accept_either_modifier);
    }

    #[test]
    fn parse_flag_values() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" no "), Some(false));
        assert_eq!(parse_flag("2"), None);
    }
}
