//! Multi-line text editor widget.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::{Point, Rect};

use crate::widget::{DrawContext, Reaction, Widget};

/// Plain-text editor: insert/overwrite, line splitting and joining, and a
/// scrolling viewport.
#[derive(Debug, Clone)]
pub struct Editor {
    bounds: Rect,
    lines: Vec<String>,
    /// Cursor as (row, column) in character units.
    row: usize,
    col: usize,
    /// Viewport origin.
    top: usize,
    left: usize,
    overwrite: bool,
}

impl Editor {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            bounds: Rect::new(x, y, width.max(1), height.max(1)),
            lines: vec![String::new()],
            row: 0,
            col: 0,
            top: 0,
            left: 0,
            overwrite: false,
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.row = 0;
        self.col = 0;
        self.top = 0;
        self.left = 0;
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    #[must_use]
    pub fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |l| l.chars().count())
    }

    /// Byte offset of character `col` in the current line.
    fn byte_at(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices()
            .nth(col)
            .map_or(line.len(), |(i, _)| i)
    }

    fn clamp_col(&mut self) {
        self.col = self.col.min(self.line_len(self.row));
    }

    fn scroll_to_cursor(&mut self) {
        let height = self.bounds.height as usize;
        let width = self.bounds.width as usize;
        if self.row < self.top {
            self.top = self.row;
        }
        if self.row >= self.top + height {
            self.top = self.row + 1 - height;
        }
        if self.col < self.left {
            self.left = self.col;
        }
        if self.col >= self.left + width {
            self.left = self.col + 1 - width;
        }
    }

    fn insert_char(&mut self, ch: char) {
        let at = self.byte_at(self.row, self.col);
        if self.overwrite && self.col < self.line_len(self.row) {
            let next = self.byte_at(self.row, self.col + 1);
            self.lines[self.row].replace_range(at..next, &ch.to_string());
        } else {
            self.lines[self.row].insert(at, ch);
        }
        self.col += 1;
    }

    fn split_line(&mut self) {
        let at = self.byte_at(self.row, self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    fn backspace(&mut self) {
        if self.col > 0 {
            let from = self.byte_at(self.row, self.col - 1);
            let to = self.byte_at(self.row, self.col);
            self.lines[self.row].replace_range(from..to, "");
            self.col -= 1;
        } else if self.row > 0 {
            // Join with the previous line.
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
        }
    }

    fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let from = self.byte_at(self.row, self.col);
            let to = self.byte_at(self.row, self.col + 1);
            self.lines[self.row].replace_range(from..to, "");
        } else if self.row + 1 < self.lines.len() {
            let line = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&line);
        }
    }
}

impl Widget for Editor {
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
        let width = self.bounds.width as usize;
        for y in 0..self.bounds.height as usize {
            let visible: String = self
                .lines
                .get(self.top + y)
                .map(|line| line.chars().skip(self.left).take(width).collect())
                .unwrap_or_default();
            for x in 0..width {
                let ch = visible.chars().nth(x).unwrap_or(' ');
                ctx.screen.put_char(x as i32, y as i32, ch, attrs);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        if key.ctrl() || key.alt() {
            return Reaction::Unhandled;
        }
        let page = self.bounds.height as usize;
        match key.code {
            KeyCode::Char(ch) => self.insert_char(ch),
            KeyCode::Enter => self.split_line(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Insert => self.overwrite = !self.overwrite,
            KeyCode::Tab => {
                for _ in 0..4 {
                    self.insert_char(' ');
                }
            }
            KeyCode::Up => {
                self.row = self.row.saturating_sub(1);
                self.clamp_col();
            }
            KeyCode::Down => {
                self.row = (self.row + 1).min(self.lines.len() - 1);
                self.clamp_col();
            }
            KeyCode::Left => {
                if self.col > 0 {
                    self.col -= 1;
                } else if self.row > 0 {
                    self.row -= 1;
                    self.col = self.line_len(self.row);
                }
            }
            KeyCode::Right => {
                if self.col < self.line_len(self.row) {
                    self.col += 1;
                } else if self.row + 1 < self.lines.len() {
                    self.row += 1;
                    self.col = 0;
                }
            }
            KeyCode::Home => self.col = 0,
            KeyCode::End => self.col = self.line_len(self.row),
            KeyCode::PageUp => {
                self.row = self.row.saturating_sub(page);
                self.clamp_col();
            }
            KeyCode::PageDown => {
                self.row = (self.row + page).min(self.lines.len() - 1);
                self.clamp_col();
            }
            _ => return Reaction::Unhandled,
        }
        self.scroll_to_cursor();
        Reaction::Handled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        if ev.x >= 0 && ev.y >= 0 {
            self.row = (self.top + ev.y as usize).min(self.lines.len() - 1);
            self.col = (self.left + ev.x as usize).min(self.line_len(self.row));
        }
        Reaction::Handled
    }

    fn cursor_position(&self) -> Option<Point> {
        Some(Point::new(
            (self.col - self.left) as i32,
            (self.row - self.top) as i32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut Editor, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                editor.on_key(KeyEvent::new(KeyCode::Enter));
            } else {
                editor.on_key(KeyEvent::new(KeyCode::Char(ch)));
            }
        }
    }

    #[test]
    fn typing_and_newlines() {
        let mut editor = Editor::new(0, 0, 40, 10);
        type_str(&mut editor, "hello\nworld");
        assert_eq!(editor.text(), "hello\nworld");
        assert_eq!(editor.cursor_position(), Some(Point::new(5, 1)));
    }

    #[test]
    fn split_mid_line() {
        let mut editor = Editor::new(0, 0, 40, 10);
        type_str(&mut editor, "abcd");
        editor.on_key(KeyEvent::new(KeyCode::Left));
        editor.on_key(KeyEvent::new(KeyCode::Left));
        editor.on_key(KeyEvent::new(KeyCode::Enter));
        assert_eq!(editor.text(), "ab\ncd");
    }

    #[test]
    fn backspace_joins_lines() {
        let mut editor = Editor::new(0, 0, 40, 10);
        type_str(&mut editor, "ab\ncd");
        editor.on_key(KeyEvent::new(KeyCode::Home));
        editor.on_key(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor_position(), Some(Point::new(2, 0)));
    }

    #[test]
    fn delete_at_line_end_joins() {
        let mut editor = Editor::new(0, 0, 40, 10);
        editor.set_text("ab\ncd");
        editor.on_key(KeyEvent::new(KeyCode::End));
        editor.on_key(KeyEvent::new(KeyCode::Delete));
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn overwrite_mode_replaces() {
        let mut editor = Editor::new(0, 0, 40, 10);
        editor.set_text("abcd");
        editor.on_key(KeyEvent::new(KeyCode::Insert));
        assert!(editor.is_overwrite());
        type_str(&mut editor, "XY");
        assert_eq!(editor.text(), "XYcd");
    }

    #[test]
    fn arrows_cross_line_boundaries() {
        let mut editor = Editor::new(0, 0, 40, 10);
        editor.set_text("ab\ncd");
        editor.on_key(KeyEvent::new(KeyCode::End));
        editor.on_key(KeyEvent::new(KeyCode::Right));
        assert_eq!(editor.cursor_position(), Some(Point::new(0, 1)));
        editor.on_key(KeyEvent::new(KeyCode::Left));
        assert_eq!(editor.cursor_position(), Some(Point::new(2, 0)));
    }

    #[test]
    fn viewport_follows_cursor() {
        let mut editor = Editor::new(0, 0, 10, 3);
        let text = (0..10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        editor.set_text(&text);
        for _ in 0..8 {
            editor.on_key(KeyEvent::new(KeyCode::Down));
        }
        // Row 8 with a 3-row viewport: top must be 6.
        assert_eq!(editor.cursor_position(), Some(Point::new(0, 2)));
    }

    #[test]
    fn unicode_editing() {
        let mut editor = Editor::new(0, 0, 40, 10);
        type_str(&mut editor, "héllo");
        editor.on_key(KeyEvent::new(KeyCode::Backspace));
        assert_eq!(editor.text(), "héll");
        editor.on_key(KeyEvent::new(KeyCode::Home));
        editor.on_key(KeyEvent::new(KeyCode::Right));
        editor.on_key(KeyEvent::new(KeyCode::Delete));
        assert_eq!(editor.text(), "hll");
    }
}
