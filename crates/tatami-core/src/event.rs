//! Input event types.
//!
//! A keypress is either a named key or a bare code point, with modifier
//! flags. Mouse events carry both window-relative and absolute coordinates;
//! the dispatcher rewrites the relative pair as it walks the window stack.

use bitflags::bitflags;

/// An input event delivered to the widget tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A keyboard event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// The controlling terminal was resized.
    Resize { width: u16, height: u16 },
}

/// Key codes: named keys plus bare code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    /// Function key (F1-F12).
    F(u8),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// Builder: attach modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Whether this is the given unmodified character.
    #[must_use]
    pub fn is_char(&self, ch: char) -> bool {
        self.modifiers.is_empty() && matches!(self.code, KeyCode::Char(c) if c == ch)
    }
}

bitflags! {
    /// Mouse button state carried by a mouse event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT       = 1 << 0;
        const MIDDLE     = 1 << 1;
        const RIGHT      = 1 << 2;
        const WHEEL_UP   = 1 << 3;
        const WHEEL_DOWN = 1 << 4;
    }
}

/// The kind of a mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down,
    Up,
    Motion,
}

/// A mouse event.
///
/// `(x, y)` is window-relative, `(absolute_x, absolute_y)` is grid-absolute.
/// Straight out of the decoder the two pairs are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: i32,
    pub y: i32,
    pub absolute_x: i32,
    pub absolute_y: i32,
    pub buttons: MouseButtons,
}

impl MouseEvent {
    /// Create an event at an absolute position (relative == absolute).
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: i32, y: i32, buttons: MouseButtons) -> Self {
        Self {
            kind,
            x,
            y,
            absolute_x: x,
            absolute_y: y,
            buttons,
        }
    }

    /// The same event with the relative coordinates shifted by `(-dx, -dy)`.
    #[must_use]
    pub const fn relative_to(mut self, dx: i32, dy: i32) -> Self {
        self.x = self.absolute_x - dx;
        self.y = self.absolute_y - dy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_builders() {
        let key = KeyEvent::new(KeyCode::F(5)).with_modifiers(Modifiers::CTRL);
        assert!(key.ctrl());
        assert!(!key.alt());
        assert!(!key.shift());
    }

    #[test]
    fn is_char_requires_no_modifiers() {
        assert!(KeyEvent::new(KeyCode::Char('q')).is_char('q'));
        assert!(
            !KeyEvent::new(KeyCode::Char('q'))
                .with_modifiers(Modifiers::ALT)
                .is_char('q')
        );
    }

    #[test]
    fn relative_to_preserves_absolute() {
        let ev = MouseEvent::new(MouseEventKind::Down, 10, 20, MouseButtons::LEFT);
        let rel = ev.relative_to(3, 5);
        assert_eq!((rel.x, rel.y), (7, 15));
        assert_eq!((rel.absolute_x, rel.absolute_y), (10, 20));
    }
}
