//! Overlapping, movable, resizable windows.

use bitflags::bitflags;
use tatami_core::event::{KeyCode, KeyEvent, MouseEvent};
use tatami_core::geometry::{Point, Rect};
use tatami_render::BorderStyle;

use crate::widget::{DrawContext, Reaction, Widget};

bitflags! {
    /// Behavior flags for a window.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowFlags: u8 {
        /// Bottom-right corner drag resizes.
        const RESIZABLE = 1 << 0;
        /// Captures all events while on top.
        const MODAL     = 1 << 1;
    }
}

const MIN_WIDTH: u16 = 10;
const MIN_HEIGHT: u16 = 4;

/// Columns of the close box on the title row.
const CLOSE_BOX: std::ops::Range<i32> = 2..5;

#[derive(Debug, Clone, Copy)]
enum Drag {
    /// Grab offset from the window origin.
    Move { dx: i32, dy: i32 },
    Resize,
}

/// A framed window owning a flat list of child widgets.
pub struct Window {
    title: String,
    bounds: Rect,
    flags: WindowFlags,
    children: Vec<Box<dyn Widget>>,
    focus: Option<usize>,
    drag: Option<Drag>,
    close_armed: bool,
    closing: bool,
    /// Pre-maximize bounds while maximized.
    restore_bounds: Option<Rect>,
}

impl Window {
    #[must_use]
    pub fn new(title: impl Into<String>, x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            title: title.into(),
            bounds: Rect::new(x, y, width.max(MIN_WIDTH), height.max(MIN_HEIGHT)),
            flags: WindowFlags::RESIZABLE,
            children: Vec::new(),
            focus: None,
            drag: None,
            close_armed: false,
            closing: false,
            restore_bounds: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    #[must_use]
    pub fn is_modal(&self) -> bool {
        self.flags.contains(WindowFlags::MODAL)
    }

    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Ask the application to remove this window on the next tick.
    pub fn request_close(&mut self) {
        self.closing = true;
    }

    /// Add a child widget; the first focusable child takes the focus.
    pub fn add(&mut self, widget: impl Widget + 'static) {
        let focusable = widget.focusable();
        self.children.push(Box::new(widget));
        if self.focus.is_none() && focusable {
            self.focus = Some(self.children.len() - 1);
        }
    }

    /// Child widget count.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Toggle between maximized and the remembered bounds.
    pub fn toggle_maximize(&mut self, screen_width: u16, screen_height: u16) {
        match self.restore_bounds.take() {
            Some(old) => self.bounds = old,
            None => {
                self.restore_bounds = Some(self.bounds);
                // Row 0 belongs to the menu bar.
                self.bounds = Rect::new(0, 1, screen_width, screen_height.saturating_sub(1));
            }
        }
    }

    /// The interior (inside the frame), window-relative.
    fn interior(&self) -> Rect {
        Rect::new(
            1,
            1,
            self.bounds.width.saturating_sub(2),
            self.bounds.height.saturating_sub(2),
        )
    }

    fn cycle_focus(&mut self, backwards: bool) {
        let count = self.children.len();
        if count == 0 {
            return;
        }
        let start = self.focus.unwrap_or(0);
        let mut index = start;
        for _ in 0..count {
            index = if backwards {
                (index + count - 1) % count
            } else {
                (index + 1) % count
            };
            if self.children[index].focusable() {
                self.focus = Some(index);
                return;
            }
        }
    }

    /// Topmost child under a window-relative point.
    fn child_at(&self, x: i32, y: i32) -> Option<usize> {
        let interior = self.interior();
        if !interior.contains(x, y) {
            return None;
        }
        let (cx, cy) = (x - 1, y - 1);
        self.children
            .iter()
            .rposition(|c| c.bounds().contains(cx, cy))
    }

    /// Window-relative origin of a child's drawing area, grid-absolute.
    fn child_origin(&self, index: usize) -> (i32, i32) {
        let cb = self.children[index].bounds();
        (self.bounds.x + 1 + cb.x, self.bounds.y + 1 + cb.y)
    }
}

impl Widget for Window {
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
        let width = self.bounds.width as i32;
        let height = self.bounds.height as i32;
        let theme = ctx.theme;
        let border = if ctx.focused {
            theme.window_border_focused
        } else {
            theme.window_border
        };
        let style = if ctx.focused {
            BorderStyle::Double
        } else {
            BorderStyle::Single
        };
        ctx.screen.draw_box(
            0,
            0,
            width,
            height,
            border,
            Some(theme.window_background),
            style,
            true,
        );

        // Title, centered on the top border.
        let label = format!(" {} ", self.title);
        let label_width = label.chars().count() as i32;
        let x = ((width - label_width) / 2).max(CLOSE_BOX.end + 1);
        ctx.screen.put_str(x, 0, &label, theme.window_title);

        // Close box.
        ctx.screen.put_str(CLOSE_BOX.start, 0, "[■]", border);

        // Resize grip.
        if self.flags.contains(WindowFlags::RESIZABLE) {
            ctx.screen.put_char(width - 1, height - 1, '┛', border);
        }

        // Children, each clipped to the remaining interior.
        let interior = self.interior();
        let (ox, oy) = (self.bounds.x, self.bounds.y);
        for (index, child) in self.children.iter_mut().enumerate() {
            let cb = child.bounds();
            if cb.x >= interior.width as i32 || cb.y >= interior.height as i32 {
                continue;
            }
            let clip_w = (interior.width as i32 - cb.x).min(cb.width as i32);
            let clip_h = (interior.height as i32 - cb.y).min(cb.height as i32);
            ctx.screen.set_offset(ox + 1 + cb.x, oy + 1 + cb.y);
            ctx.screen.set_clip(clip_w, clip_h);
            let mut child_ctx = DrawContext {
                screen: &mut *ctx.screen,
                theme,
                focused: ctx.focused && self.focus == Some(index),
            };
            child.draw(&mut child_ctx);
        }
        // Restore the window's own drawing frame.
        ctx.screen.set_offset(ox, oy);
        ctx.screen
            .set_clip(self.bounds.width as i32, self.bounds.height as i32);
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        if let Some(focus) = self.focus {
            let reaction = self.children[focus].on_key(key);
            if reaction != Reaction::Unhandled {
                return reaction;
            }
        }
        match key.code {
            KeyCode::Tab if key.modifiers.is_empty() => {
                self.cycle_focus(false);
                Reaction::Handled
            }
            KeyCode::BackTab => {
                self.cycle_focus(true);
                Reaction::Handled
            }
            _ => Reaction::Unhandled,
        }
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        self.close_armed = false;
        if ev.y == 0 {
            if CLOSE_BOX.contains(&ev.x) {
                self.close_armed = true;
            } else {
                self.drag = Some(Drag::Move { dx: ev.x, dy: ev.y });
            }
            return Reaction::Handled;
        }
        if self.flags.contains(WindowFlags::RESIZABLE)
            && ev.x == self.bounds.width as i32 - 1
            && ev.y == self.bounds.height as i32 - 1
        {
            self.drag = Some(Drag::Resize);
            return Reaction::Handled;
        }
        if let Some(index) = self.child_at(ev.x, ev.y) {
            if self.children[index].focusable() {
                self.focus = Some(index);
            }
            let (ox, oy) = self.child_origin(index);
            return self.children[index].on_mouse_down(ev.relative_to(ox, oy));
        }
        Reaction::Handled
    }

    fn on_mouse_up(&mut self, ev: MouseEvent) -> Reaction {
        self.drag = None;
        if std::mem::take(&mut self.close_armed) && ev.y == 0 && CLOSE_BOX.contains(&ev.x) {
            self.closing = true;
            return Reaction::Handled;
        }
        if let Some(focus) = self.focus {
            let (ox, oy) = self.child_origin(focus);
            return self.children[focus].on_mouse_up(ev.relative_to(ox, oy));
        }
        Reaction::Handled
    }

    fn on_mouse_motion(&mut self, ev: MouseEvent) {
        match self.drag {
            Some(Drag::Move { dx, dy }) => {
                self.bounds.x = ev.absolute_x - dx;
                // Keep the title bar below the menu row.
                self.bounds.y = (ev.absolute_y - dy).max(1);
            }
            Some(Drag::Resize) => {
                let width = (ev.absolute_x - self.bounds.x + 1).max(MIN_WIDTH as i32);
                let height = (ev.absolute_y - self.bounds.y + 1).max(MIN_HEIGHT as i32);
                self.bounds.width = width.min(u16::MAX as i32) as u16;
                self.bounds.height = height.min(u16::MAX as i32) as u16;
                let (w, h) = (self.bounds.width, self.bounds.height);
                for child in &mut self.children {
                    child.on_resize(w.saturating_sub(2), h.saturating_sub(2));
                }
            }
            None => {
                if let Some(focus) = self.focus {
                    let (ox, oy) = self.child_origin(focus);
                    self.children[focus].on_mouse_motion(ev.relative_to(ox, oy));
                }
            }
        }
    }

    fn on_resize(&mut self, width: u16, height: u16) {
        // Keep at least the title bar on screen.
        self.bounds.x = self.bounds.x.min(width as i32 - 4);
        self.bounds.y = self.bounds.y.clamp(1, (height as i32 - 1).max(1));
    }

    fn on_idle(&mut self) {
        for child in &mut self.children {
            child.on_idle();
        }
    }

    fn on_close(&mut self) {
        for child in &mut self.children {
            child.on_close();
        }
    }

    fn cursor_position(&self) -> Option<Point> {
        let focus = self.focus?;
        let p = self.children[focus].cursor_position()?;
        let cb = self.children[focus].bounds();
        Some(Point::new(1 + cb.x + p.x, 1 + cb.y + p.y))
    }
}

/// Anything the application can stack: a window, or a composite that embeds
/// one.
pub trait WindowLike: Widget {
    fn window(&self) -> &Window;
    fn window_mut(&mut self) -> &mut Window;
}

impl WindowLike for Window {
    fn window(&self) -> &Window {
        self
    }

    fn window_mut(&mut self) -> &mut Window {
        self
    }
}
