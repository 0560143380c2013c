//! Static text label.

use tatami_core::cell::CellAttrs;
use tatami_core::geometry::Rect;
use unicode_width::UnicodeWidthStr;

use crate::widget::{DrawContext, Widget};

/// One line of static text.
#[derive(Debug, Clone)]
pub struct Label {
    bounds: Rect,
    text: String,
    /// Explicit attributes; `None` uses the theme's label role.
    attrs: Option<CellAttrs>,
}

impl Label {
    #[must_use]
    pub fn new(x: i32, y: i32, text: impl Into<String>) -> Self {
        let text = text.into();
        let width = text.width().min(u16::MAX as usize) as u16;
        Self {
            bounds: Rect::new(x, y, width, 1),
            text,
            attrs: None,
        }
    }

    /// Builder: override the theme attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: CellAttrs) -> Self {
        self.attrs = Some(attrs);
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.bounds.width = self.text.width().min(u16::MAX as usize) as u16;
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Widget for Label {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let attrs = self.attrs.unwrap_or(ctx.theme.label);
        ctx.screen.put_str(0, 0, &self.text, attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use tatami_render::Screen;

    #[test]
    fn draws_its_text() {
        let mut label = Label::new(0, 0, "hi there");
        let mut screen = Screen::new(20, 2);
        let theme = Theme::default();
        let mut ctx = DrawContext {
            screen: &mut screen,
            theme: &theme,
            focused: false,
        };
        label.draw(&mut ctx);
        assert_eq!(screen.logical_cell(0, 0).unwrap().ch, 'h');
        assert_eq!(screen.logical_cell(7, 0).unwrap().ch, 'e');
    }

    #[test]
    fn set_text_tracks_width() {
        let mut label = Label::new(0, 0, "ab");
        assert_eq!(label.bounds().width, 2);
        label.set_text("wider text");
        assert_eq!(label.bounds().width, 10);
    }
}
