//! Progress bar.

use tatami_core::geometry::Rect;

use crate::widget::{DrawContext, Widget};

/// Horizontal percentage bar.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bounds: Rect,
    percent: u8,
}

impl ProgressBar {
    #[must_use]
    pub fn new(x: i32, y: i32, width: u16) -> Self {
        Self {
            bounds: Rect::new(x, y, width.max(4), 1),
            percent: 0,
        }
    }

    /// Set completion, clamped to 0-100.
    pub fn set_percent(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }

    #[must_use]
    pub fn percent(&self) -> u8 {
        self.percent
    }
}

impl Widget for ProgressBar {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let width = self.bounds.width as usize;
        let filled = width * self.percent as usize / 100;
        for x in 0..width {
            let (ch, attrs) = if x < filled {
                ('█', ctx.theme.progress_done)
            } else {
                ('░', ctx.theme.progress_todo)
            };
            ctx.screen.put_char(x as i32, 0, ch, attrs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use tatami_render::Screen;

    fn render(bar: &mut ProgressBar) -> String {
        let mut screen = Screen::new(20, 1);
        let theme = Theme::default();
        let mut ctx = DrawContext {
            screen: &mut screen,
            theme: &theme,
            focused: false,
        };
        bar.draw(&mut ctx);
        (0..bar.bounds().width as usize)
            .map(|x| screen.logical_cell(x, 0).unwrap().ch)
            .collect()
    }

    #[test]
    fn half_full() {
        let mut bar = ProgressBar::new(0, 0, 10);
        bar.set_percent(50);
        assert_eq!(render(&mut bar), "█████░░░░░");
    }

    #[test]
    fn clamps_to_hundred() {
        let mut bar = ProgressBar::new(0, 0, 8);
        bar.set_percent(250);
        assert_eq!(bar.percent(), 100);
        assert_eq!(render(&mut bar), "████████");
    }

    #[test]
    fn empty_bar() {
        let mut bar = ProgressBar::new(0, 0, 6);
        assert_eq!(render(&mut bar), "░░░░░░");
    }
}
