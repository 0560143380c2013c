//! Checkbox.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::Rect;
use unicode_width::UnicodeWidthStr;

use crate::widget::{DrawContext, Reaction, Widget};

/// `[x] label` toggle.
#[derive(Debug, Clone)]
pub struct Checkbox {
    bounds: Rect,
    label: String,
    checked: bool,
}

impl Checkbox {
    #[must_use]
    pub fn new(x: i32, y: i32, label: impl Into<String>, checked: bool) -> Self {
        let label = label.into();
        let width = (label.width() + 4).min(u16::MAX as usize) as u16;
        Self {
            bounds: Rect::new(x, y, width, 1),
            label,
            checked,
        }
    }

    #[must_use]
    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    pub fn toggle(&mut self) {
        self.checked = !self.checked;
    }
}

impl Widget for Checkbox {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn focusable(&self) -> bool {
        true
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let attrs = if ctx.focused {
            ctx.theme.field_focused
        } else {
            ctx.theme.label
        };
        let mark = if self.checked { 'x' } else { ' ' };
        let text = format!("[{mark}] {}", self.label);
        ctx.screen.put_str(0, 0, &text, attrs);
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter if key.modifiers.is_empty() => {
                self.toggle();
                Reaction::Handled
            }
            _ => Reaction::Unhandled,
        }
    }

    fn on_mouse_down(&mut self, _ev: MouseEvent) -> Reaction {
        self.toggle();
        Reaction::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatami_core::event::{MouseButtons, MouseEventKind};

    #[test]
    fn space_toggles() {
        let mut cb = Checkbox::new(0, 0, "opt", false);
        assert!(!cb.checked());
        cb.on_key(KeyEvent::new(KeyCode::Char(' ')));
        assert!(cb.checked());
        cb.on_key(KeyEvent::new(KeyCode::Char(' ')));
        assert!(!cb.checked());
    }

    #[test]
    fn click_toggles() {
        let mut cb = Checkbox::new(0, 0, "opt", false);
        cb.on_mouse_down(MouseEvent::new(MouseEventKind::Down, 0, 0, MouseButtons::LEFT));
        assert!(cb.checked());
    }

    #[test]
    fn other_keys_pass_through() {
        let mut cb = Checkbox::new(0, 0, "opt", true);
        assert_eq!(cb.on_key(KeyEvent::new(KeyCode::Tab)), Reaction::Unhandled);
        assert!(cb.checked());
    }
}
