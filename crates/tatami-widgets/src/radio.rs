//! Radio button group.

use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::Rect;

use crate::widget::{DrawContext, Reaction, Widget};

/// A titled group of mutually exclusive options.
#[derive(Debug, Clone)]
pub struct RadioGroup {
    bounds: Rect,
    title: String,
    options: Vec<String>,
    selected: usize,
}

impl RadioGroup {
    #[must_use]
    pub fn new(x: i32, y: i32, title: impl Into<String>, options: Vec<String>) -> Self {
        let title = title.into();
        let inner = options
            .iter()
            .map(|o| o.chars().count() + 4)
            .chain(std::iter::once(title.chars().count() + 2))
            .max()
            .unwrap_or(4);
        let height = options.len() as u16 + 2;
        Self {
            bounds: Rect::new(x, y, (inner + 2) as u16, height),
            title,
            options,
            selected: 0,
        }
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_label(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.options.len() {
            self.selected = index;
        }
    }
}

impl Widget for RadioGroup {
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
        let attrs = ctx.theme.label;
        let w = self.bounds.width as i32;
        let h = self.bounds.height as i32;
        ctx.screen.draw_box(
            0,
            0,
            w,
            h,
            attrs,
            Some(ctx.theme.window_background),
            tatami_render::BorderStyle::Single,
            false,
        );
        ctx.screen.put_str(2, 0, &self.title, attrs);
        for (i, option) in self.options.iter().enumerate() {
            let mark = if i == self.selected { '•' } else { ' ' };
            let line_attrs = if ctx.focused && i == self.selected {
                ctx.theme.selection
            } else {
                attrs
            };
            let text = format!("({mark}) {option}");
            ctx.screen.put_str(1, 1 + i as i32, &text, line_attrs);
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        match key.code {
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Reaction::Handled
            }
            KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.options.len().saturating_sub(1));
                Reaction::Handled
            }
            _ => Reaction::Unhandled,
        }
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        let row = ev.y - 1;
        if row >= 0 && (row as usize) < self.options.len() {
            self.selected = row as usize;
        }
        Reaction::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatami_core::event::{MouseButtons, MouseEventKind};

    fn group() -> RadioGroup {
        RadioGroup::new(
            0,
            0,
            "Speed",
            vec!["slow".into(), "medium".into(), "fast".into()],
        )
    }

    #[test]
    fn arrows_move_selection() {
        let mut g = group();
        g.on_key(KeyEvent::new(KeyCode::Down));
        g.on_key(KeyEvent::new(KeyCode::Down));
        assert_eq!(g.selected_label(), Some("fast"));
        // Clamped at the ends.
        g.on_key(KeyEvent::new(KeyCode::Down));
        assert_eq!(g.selected(), 2);
        g.on_key(KeyEvent::new(KeyCode::Up));
        assert_eq!(g.selected_label(), Some("medium"));
    }

    #[test]
    fn click_selects_row() {
        let mut g = group();
        g.on_mouse_down(MouseEvent::new(MouseEventKind::Down, 2, 3, MouseButtons::LEFT));
        assert_eq!(g.selected_label(), Some("fast"));
        // The border row selects nothing.
        g.on_mouse_down(MouseEvent::new(MouseEventKind::Down, 2, 0, MouseButtons::LEFT));
        assert_eq!(g.selected(), 2);
    }

    #[test]
    fn bounds_fit_widest_option() {
        let g = group();
        assert!(g.bounds().width as usize >= "medium".len() + 4);
        assert_eq!(g.bounds().height, 5);
    }
}
