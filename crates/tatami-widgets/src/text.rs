//! Read-only scrolling text view.

use tatami_core::event::{KeyCode, KeyEvent, MouseButtons, MouseEvent};
use tatami_core::geometry::Rect;

use crate::widget::{DrawContext, Reaction, Widget};

/// Scrollable view over word-wrapped text.
#[derive(Debug, Clone)]
pub struct TextView {
    bounds: Rect,
    /// Wrapped lines, rebuilt when the text or width changes.
    lines: Vec<String>,
    raw: String,
    top: usize,
}

impl TextView {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u16, height: u16, text: impl Into<String>) -> Self {
        let raw = text.into();
        let mut view = Self {
            bounds: Rect::new(x, y, width.max(1), height.max(1)),
            lines: Vec::new(),
            raw,
            top: 0,
        };
        view.reflow();
        view
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.raw = text.into();
        self.top = 0;
        self.reflow();
    }

    /// Greedy word wrap to the current width.
    fn reflow(&mut self) {
        let width = self.bounds.width as usize;
        self.lines.clear();
        for paragraph in self.raw.lines() {
            if paragraph.is_empty() {
                self.lines.push(String::new());
                continue;
            }
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let need = if line.is_empty() { 0 } else { 1 } + word.chars().count();
                if !line.is_empty() && line.chars().count() + need > width {
                    self.lines.push(std::mem::take(&mut line));
                }
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            }
            self.lines.push(line);
        }
    }

    fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.bounds.height as usize)
    }

    pub fn scroll_to(&mut self, top: usize) {
        self.top = top.min(self.max_top());
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl Widget for TextView {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.reflow();
        self.top = self.top.min(self.max_top());
    }

    fn focusable(&self) -> bool {
        true
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let attrs = ctx.theme.label;
        for y in 0..self.bounds.height as usize {
            if let Some(line) = self.lines.get(self.top + y) {
                ctx.screen.put_str(0, y as i32, line, attrs);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        let page = self.bounds.height as usize;
        match key.code {
            KeyCode::Up => self.top = self.top.saturating_sub(1),
            KeyCode::Down => self.top = (self.top + 1).min(self.max_top()),
            KeyCode::PageUp => self.top = self.top.saturating_sub(page),
            KeyCode::PageDown => self.top = (self.top + page).min(self.max_top()),
            KeyCode::Home => self.top = 0,
            KeyCode::End => self.top = self.max_top(),
            _ => return Reaction::Unhandled,
        }
        Reaction::Handled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        if ev.buttons.contains(MouseButtons::WHEEL_UP) {
            self.top = self.top.saturating_sub(3);
        } else if ev.buttons.contains(MouseButtons::WHEEL_DOWN) {
            self.top = (self.top + 3).min(self.max_top());
        }
        Reaction::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_width() {
        let view = TextView::new(0, 0, 10, 4, "alpha beta gamma delta");
        assert_eq!(view.lines, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn blank_lines_preserved() {
        let view = TextView::new(0, 0, 20, 4, "one\n\ntwo");
        assert_eq!(view.lines, vec!["one", "", "two"]);
    }

    #[test]
    fn scrolling_clamps() {
        let text = (0..10).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        let mut view = TextView::new(0, 0, 20, 4, text);
        view.on_key(KeyEvent::new(KeyCode::End));
        assert_eq!(view.top, 6);
        view.on_key(KeyEvent::new(KeyCode::Down));
        assert_eq!(view.top, 6);
        view.on_key(KeyEvent::new(KeyCode::PageUp));
        assert_eq!(view.top, 2);
        view.on_key(KeyEvent::new(KeyCode::Home));
        assert_eq!(view.top, 0);
    }

    #[test]
    fn wheel_scrolls() {
        use tatami_core::event::{MouseEvent, MouseEventKind};
        let text = (0..20).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let mut view = TextView::new(0, 0, 20, 5, text);
        let wheel_down = MouseEvent::new(MouseEventKind::Down, 0, 0, MouseButtons::WHEEL_DOWN);
        view.on_mouse_down(wheel_down);
        assert_eq!(view.top, 3);
        let wheel_up = MouseEvent::new(MouseEventKind::Down, 0, 0, MouseButtons::WHEEL_UP);
        view.on_mouse_down(wheel_up);
        assert_eq!(view.top, 0);
    }
}
