#![forbid(unsafe_code)]

//! Key events as seen by the history chord mapper.
//!
//! Hosts translate their platform key events (DOM `KeyboardEvent`, winit,
//! crossterm, ...) into [`KeyEvent`] before handing them to the dispatcher.
//! Only what chord recognition reads survives the translation: the
//! character, the held modifiers, and whether the key went down or up.
//! Anything that is not a character key becomes [`KeyCode::Other`].

use bitflags::bitflags;

/// A translated key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is the character key `c`, ignoring ASCII case.
    ///
    /// Browsers report `Z` rather than `z` while Shift is held.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch.eq_ignore_ascii_case(&c))
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

/// Which key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key, in whatever case the host reported.
    Char(char),
    /// Any non-character key. Never part of a history chord.
    Other,
}

/// Press, auto-repeat, or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Also used when the source cannot tell press from repeat.
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        /// Alt/Option.
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        /// Meta/Command/Windows.
        const SUPER = 0b1000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unmodified_press() {
        let e = KeyEvent::new(KeyCode::Char('z'));
        assert_eq!(e.kind, KeyEventKind::Press);
        assert_eq!(e.modifiers, Modifiers::NONE);
        assert_eq!(Modifiers::default(), Modifiers::NONE);
        assert!(!e.shift() && !e.alt());
    }

    #[test]
    fn is_char_ignores_case() {
        assert!(KeyEvent::new(KeyCode::Char('Z')).is_char('z'));
        assert!(KeyEvent::new(KeyCode::Char('y')).is_char('Y'));
        assert!(!KeyEvent::new(KeyCode::Other).is_char('z'));
    }
}
