//! Single-line text entry field.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::{Point, Rect};

use crate::widget::{Command, DrawContext, Reaction, Widget};

/// Editable one-line field with horizontal scrolling.
#[derive(Debug, Clone)]
pub struct Field {
    bounds: Rect,
    chars: Vec<char>,
    /// Insertion point, an index into `chars`.
    cursor: usize,
    /// First visible character index.
    scroll: usize,
    /// Command emitted on Enter, if any.
    on_enter: Option<Command>,
}

impl Field {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u16) -> Self {
        Self {
            bounds: Rect::new(x, y, width.max(1), 1),
            chars: Vec::new(),
            cursor: 0,
            scroll: 0,
            on_enter: None,
        }
    }

    /// Builder: emit a command when Enter is pressed.
    #[must_use]
    pub fn with_on_enter(mut self, command: Command) -> Self {
        self.on_enter = Some(command);
        self
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn set_text(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
        self.scroll = 0;
        self.scroll_to_cursor();
    }

    fn visible_width(&self) -> usize {
        self.bounds.width as usize
    }

    fn scroll_to_cursor(&mut self) {
        let width = self.visible_width();
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        // Keep one spare column so the cursor can sit past the last char.
        if self.cursor >= self.scroll + width {
            self.scroll = self.cursor + 1 - width;
        }
    }
}

impl Widget for Field {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.scroll_to_cursor();
    }

    fn focusable(&self) -> bool {
        true
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let attrs = if ctx.focused {
            ctx.theme.field_focused
        } else {
            ctx.theme.field
        };
        let width = self.visible_width();
        for x in 0..width {
            let ch = self.chars.get(self.scroll + x).copied().unwrap_or(' ');
            ctx.screen.put_char(x as i32, 0, ch, attrs);
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        if key.ctrl() || key.alt() {
            return Reaction::Unhandled;
        }
        match key.code {
            KeyCode::Char(ch) => {
                self.chars.insert(self.cursor, ch);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.chars.remove(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.chars.len() {
                    self.chars.remove(self.cursor);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.chars.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.chars.len(),
            KeyCode::Enter => {
                if let Some(command) = self.on_enter {
                    return Reaction::Emit(command);
                }
                return Reaction::Unhandled;
            }
            _ => return Reaction::Unhandled,
        }
        self.scroll_to_cursor();
        Reaction::Handled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        if ev.x >= 0 {
            self.cursor = (self.scroll + ev.x as usize).min(self.chars.len());
        }
        Reaction::Handled
    }

    fn cursor_position(&self) -> Option<Point> {
        Some(Point::new((self.cursor - self.scroll) as i32, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(field: &mut Field, text: &str) {
        for ch in text.chars() {
            field.on_key(KeyEvent::new(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn typing_appends() {
        let mut field = Field::new(0, 0, 10);
        type_str(&mut field, "abc");
        assert_eq!(field.text(), "abc");
        assert_eq!(field.cursor_position(), Some(Point::new(3, 0)));
    }

    #[test]
    fn backspace_and_delete() {
        let mut field = Field::new(0, 0, 10);
        type_str(&mut field, "abcd");
        field.on_key(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(field.text(), "abc");
        field.on_key(KeyEvent::new(KeyCode::Home));
        field.on_key(KeyEvent::new(KeyCode::Delete));
        assert_eq!(field.text(), "bc");
    }

    #[test]
    fn mid_string_insert() {
        let mut field = Field::new(0, 0, 10);
        type_str(&mut field, "ad");
        field.on_key(KeyEvent::new(KeyCode::Left));
        type_str(&mut field, "bc");
        assert_eq!(field.text(), "abcd");
    }

    #[test]
    fn scrolls_to_keep_cursor_visible() {
        let mut field = Field::new(0, 0, 5);
        type_str(&mut field, "0123456789");
        // Cursor at 10, window of 5: scroll must be 6.
        assert_eq!(field.cursor_position(), Some(Point::new(4, 0)));
        field.on_key(KeyEvent::new(KeyCode::Home));
        assert_eq!(field.cursor_position(), Some(Point::new(0, 0)));
    }

    #[test]
    fn enter_emits_configured_command() {
        let mut field = Field::new(0, 0, 5).with_on_enter(Command(9));
        assert_eq!(
            field.on_key(KeyEvent::new(KeyCode::Enter)),
            Reaction::Emit(Command(9))
        );
    }

    #[test]
    fn click_places_cursor() {
        use tatami_core::event::{MouseButtons, MouseEventKind};
        let mut field = Field::new(0, 0, 10);
        type_str(&mut field, "hello");
        field.on_mouse_down(MouseEvent::new(MouseEventKind::Down, 2, 0, MouseButtons::LEFT));
        assert_eq!(field.cursor_position(), Some(Point::new(2, 0)));
        // Past the end clamps.
        field.on_mouse_down(MouseEvent::new(MouseEventKind::Down, 9, 0, MouseButtons::LEFT));
        assert_eq!(field.cursor_position(), Some(Point::new(5, 0)));
    }
}
