//! Push button.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::Rect;
use unicode_width::UnicodeWidthStr;

use crate::widget::{Command, DrawContext, Reaction, Widget};

/// A button that emits its command on Enter, Space, or a mouse release
/// inside its bounds.
#[derive(Debug, Clone)]
pub struct Button {
    bounds: Rect,
    label: String,
    command: Command,
    /// A press started here and has not been released yet.
    armed: bool,
}

impl Button {
    #[must_use]
    pub fn new(x: i32, y: i32, label: impl Into<String>, command: Command) -> Self {
        let label = label.into();
        let width = (label.width() + 4).min(u16::MAX as usize) as u16;
        Self {
            bounds: Rect::new(x, y, width, 1),
            label,
            command,
            armed: false,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Widget for Button {
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
            ctx.theme.button_focused
        } else {
            ctx.theme.button
        };
        let text = format!("< {} >", self.label);
        ctx.screen.put_str(0, 0, &text, attrs);
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') if key.modifiers.is_empty() => {
                Reaction::Emit(self.command)
            }
            _ => Reaction::Unhandled,
        }
    }

    fn on_mouse_down(&mut self, _ev: MouseEvent) -> Reaction {
        self.armed = true;
        Reaction::Handled
    }

    fn on_mouse_up(&mut self, ev: MouseEvent) -> Reaction {
        let inside = ev.x >= 0 && ev.y >= 0 && ev.x < self.bounds.width as i32 && ev.y == 0;
        let was_armed = std::mem::take(&mut self.armed);
        if was_armed && inside {
            Reaction::Emit(self.command)
        } else {
            Reaction::Handled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatami_core::event::{Modifiers, MouseButtons, MouseEventKind};

    fn press(button: &mut Button) -> Reaction {
        button.on_key(KeyEvent::new(KeyCode::Enter))
    }

    #[test]
    fn enter_emits_command() {
        let mut button = Button::new(0, 0, "OK", Command(7));
        assert_eq!(press(&mut button), Reaction::Emit(Command(7)));
    }

    #[test]
    fn space_with_modifier_is_ignored() {
        let mut button = Button::new(0, 0, "OK", Command(7));
        let key = KeyEvent::new(KeyCode::Char(' ')).with_modifiers(Modifiers::ALT);
        assert_eq!(button.on_key(key), Reaction::Unhandled);
    }

    #[test]
    fn click_press_release_emits() {
        let mut button = Button::new(0, 0, "OK", Command(3));
        let down = MouseEvent::new(MouseEventKind::Down, 1, 0, MouseButtons::LEFT);
        let up = MouseEvent::new(MouseEventKind::Up, 1, 0, MouseButtons::LEFT);
        assert_eq!(button.on_mouse_down(down), Reaction::Handled);
        assert_eq!(button.on_mouse_up(up), Reaction::Emit(Command(3)));
    }

    #[test]
    fn release_outside_cancels() {
        let mut button = Button::new(0, 0, "OK", Command(3));
        let down = MouseEvent::new(MouseEventKind::Down, 1, 0, MouseButtons::LEFT);
        let mut up = MouseEvent::new(MouseEventKind::Up, 1, 0, MouseButtons::LEFT);
        up.x = 50;
        button.on_mouse_down(down);
        assert_eq!(button.on_mouse_up(up), Reaction::Handled);
        // A release without a press does nothing either.
        let up2 = MouseEvent::new(MouseEventKind::Up, 1, 0, MouseButtons::LEFT);
        assert_eq!(button.on_mouse_up(up2), Reaction::Handled);
    }

    #[test]
    fn width_wraps_label() {
        let button = Button::new(0, 0, "Cancel", Command(1));
        assert_eq!(button.bounds().width, 10);
    }
}
