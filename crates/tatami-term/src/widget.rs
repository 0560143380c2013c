//! The terminal window widget.
//!
//! Composes a toolkit [`Window`] with an [`Ecma48`] emulator and an
//! optional [`ChildProcess`]. On idle it pumps child output through the
//! emulator (capped per tick); key events translate through the emulator's
//! keyboard tables into child stdin; the draw pass renders the emulator's
//! display grid into the window body.

use tatami_core::event::{KeyEvent, MouseEvent};
use tatami_core::geometry::{Point, Rect};
use tatami_core::utf8::Utf8Decoder;
use tatami_vt::{DeviceType, Ecma48};
use tatami_widgets::widget::{DrawContext, Reaction, Widget};
use tatami_widgets::window::{Window, WindowLike};
use tracing::debug;

use crate::process::{ChildOutput, ChildProcess, READ_LIMIT};

/// A window hosting a child process behind a VT102 emulator.
pub struct TerminalWindow {
    window: Window,
    emulator: Ecma48,
    child: Option<ChildProcess>,
    utf8: Utf8Decoder,
    /// Whether the previous output byte was CR, for the lone-LF fixup.
    last_was_cr: bool,
    offline: bool,
    base_title: String,
}

impl TerminalWindow {
    /// Spawn the default shell in a new 80x24 VT102 terminal window.
    pub fn shell(title: impl Into<String>, x: i32, y: i32) -> std::io::Result<Self> {
        let child = ChildProcess::spawn_shell()?;
        Ok(Self::with_child(title, x, y, Some(child)))
    }

    /// Build a terminal window around an optional child; `None` starts
    /// offline (useful for tests and for replaying captures).
    #[must_use]
    pub fn with_child(
        title: impl Into<String>,
        x: i32,
        y: i32,
        child: Option<ChildProcess>,
    ) -> Self {
        let base_title = title.into();
        let offline = child.is_none();
        let mut window = Window::new(base_title.clone(), x, y, 82, 26);
        if offline {
            window.set_title(format!("{base_title} (offline)"));
        }
        Self {
            window,
            emulator: Ecma48::new(DeviceType::Vt102),
            child,
            utf8: Utf8Decoder::new(),
            last_was_cr: false,
            offline,
            base_title,
        }
    }

    #[must_use]
    pub fn emulator(&self) -> &Ecma48 {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Ecma48 {
        &mut self.emulator
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Feed raw output bytes as if the child had produced them, applying
    /// the lone-LF fixup. Replies the emulator generates go to the child if
    /// one is attached.
    pub fn feed_output(&mut self, bytes: &[u8]) {
        let mut replies: Vec<u8> = Vec::new();
        for &b in bytes {
            // No TTY sits between us and the child, so nobody performs the
            // NL -> CR NL output translation; do it here.
            if b == b'\n' && !self.last_was_cr {
                self.emulator.consume('\r', &mut replies);
            }
            self.last_was_cr = b == b'\r';
            if let Some(ch) = self.utf8.push(b) {
                self.emulator.consume(ch, &mut replies);
            }
        }
        if !replies.is_empty()
            && let Some(child) = &mut self.child
        {
            child.write_input(&replies);
        }
    }

    fn go_offline(&mut self) {
        if let Some(mut child) = self.child.take() {
            child.terminate();
        }
        self.offline = true;
        self.window
            .set_title(format!("{} (offline)", self.base_title));
        debug!(title = %self.base_title, "terminal went offline");
    }

    fn pump_child(&mut self) {
        if self.offline {
            return;
        }
        let mut buf = [0u8; READ_LIMIT];
        let outcome = match &mut self.child {
            Some(child) => child.read_available(&mut buf),
            None => return,
        };
        match outcome {
            ChildOutput::Bytes(0) => {}
            ChildOutput::Bytes(n) => self.feed_output(&buf[..n]),
            ChildOutput::Eof => self.go_offline(),
        }
    }

    /// The window interior where the grid renders.
    fn interior(&self) -> Rect {
        let b = self.window.bounds();
        Rect::new(
            b.x + 1,
            b.y + 1,
            b.width.saturating_sub(2),
            b.height.saturating_sub(2),
        )
    }
}

impl Widget for TerminalWindow {
    fn bounds(&self) -> Rect {
        self.window.bounds()
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.window.set_bounds(bounds);
    }

    fn focusable(&self) -> bool {
        true
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        self.window.draw(ctx);

        let interior = self.interior();
        ctx.screen.set_offset(interior.x, interior.y);
        ctx.screen
            .set_clip(interior.width as i32, interior.height as i32);

        let width = self.emulator.width();
        for (y, line) in self.emulator.display().iter().enumerate() {
            let columns = if line.double_width { width / 2 } else { width };
            for x in 0..columns {
                let cell = line.cell(x);
                let attrs = if line.reverse_color {
                    cell.attrs.reversed()
                } else {
                    cell.attrs
                };
                if line.double_width {
                    // Each glyph spans two columns.
                    ctx.screen
                        .put_char((x * 2) as i32, y as i32, cell.ch, attrs);
                    ctx.screen
                        .put_char((x * 2 + 1) as i32, y as i32, ' ', attrs);
                } else {
                    ctx.screen.put_char(x as i32, y as i32, cell.ch, attrs);
                }
            }
        }

        let b = self.window.bounds();
        ctx.screen.set_offset(b.x, b.y);
        ctx.screen.set_clip(b.width as i32, b.height as i32);
    }

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        if self.offline {
            return self.window.on_key(key);
        }
        let bytes = self.emulator.keypress(key);
        if bytes.is_empty() {
            return Reaction::Unhandled;
        }
        if let Some(child) = &mut self.child {
            child.write_input(&bytes);
        }
        Reaction::Handled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        self.window.on_mouse_down(ev)
    }

    fn on_mouse_up(&mut self, ev: MouseEvent) -> Reaction {
        self.window.on_mouse_up(ev)
    }

    fn on_mouse_motion(&mut self, ev: MouseEvent) {
        self.window.on_mouse_motion(ev);
    }

    fn on_resize(&mut self, width: u16, height: u16) {
        self.window.on_resize(width, height);
    }

    fn on_idle(&mut self) {
        self.pump_child();
        // Track the interior if the user resized the frame. The child gets
        // no WINCH without a PTY, but the emulator should still agree with
        // what is visible.
        let interior = self.interior();
        if interior.width > 0
            && interior.height > 0
            && (self.emulator.width() != interior.width as usize
                || self.emulator.height() != interior.height as usize)
        {
            self.emulator
                .set_size(interior.width as usize, interior.height as usize);
        }
    }

    fn on_close(&mut self) {
        self.go_offline();
    }

    fn cursor_position(&self) -> Option<Point> {
        if self.offline || !self.emulator.cursor_visible() {
            return None;
        }
        let (x, y) = self.emulator.cursor();
        let interior = self.interior();
        if x < interior.width as usize && y < interior.height as usize {
            Some(Point::new(1 + x as i32, 1 + y as i32))
        } else {
            None
        }
    }
}

impl WindowLike for TerminalWindow {
    fn window(&self) -> &Window {
        &self.window
    }

    fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatami_core::event::KeyCode;
    use tatami_render::Screen;
    use tatami_widgets::Theme;

    fn offline_terminal() -> TerminalWindow {
        TerminalWindow::with_child("term", 0, 1, None)
    }

    #[test]
    fn offline_title_is_annotated() {
        let term = offline_terminal();
        assert!(term.is_offline());
        assert_eq!(term.window().title(), "term (offline)");
    }

    #[test]
    fn lone_lf_gets_cr() {
        let mut term = offline_terminal();
        term.feed_output(b"ab\ncd");
        // Without the fixup "cd" would start at column 2.
        assert_eq!(&term.emulator().display()[1].text(80)[..2], "cd");
    }

    #[test]
    fn crlf_is_not_doubled() {
        let mut term = offline_terminal();
        term.feed_output(b"ab\r\ncd");
        assert_eq!(&term.emulator().display()[0].text(80)[..2], "ab");
        assert_eq!(&term.emulator().display()[1].text(80)[..2], "cd");
        assert_eq!(term.emulator().cursor(), (2, 1));
    }

    #[test]
    fn draw_renders_grid_into_interior() {
        let mut term = offline_terminal();
        term.feed_output(b"hi");
        let mut screen = Screen::new(100, 30);
        let theme = Theme::default();
        let b = term.bounds();
        screen.set_offset(b.x, b.y);
        screen.set_clip(b.width as i32, b.height as i32);
        let mut ctx = DrawContext {
            screen: &mut screen,
            theme: &theme,
            focused: true,
        };
        term.draw(&mut ctx);
        // Interior starts one cell in from the window origin (0, 1).
        assert_eq!(screen.logical_cell(1, 2).unwrap().ch, 'h');
        assert_eq!(screen.logical_cell(2, 2).unwrap().ch, 'i');
    }

    #[test]
    fn reverse_video_lines_render_inverted() {
        use tatami_core::cell::TermColor;
        let mut term = offline_terminal();
        term.feed_output(b"\x1b[31mX");
        term.feed_output(b"\x1b[?5h");
        let mut screen = Screen::new(100, 30);
        let theme = Theme::default();
        let b = term.bounds();
        screen.set_offset(b.x, b.y);
        screen.set_clip(b.width as i32, b.height as i32);
        let mut ctx = DrawContext {
            screen: &mut screen,
            theme: &theme,
            focused: true,
        };
        term.draw(&mut ctx);
        let cell = screen.logical_cell(1, 2).unwrap();
        assert_eq!(cell.ch, 'X');
        // Red foreground swapped into the background by reverse video.
        assert_eq!(cell.attrs.bg, TermColor::Red);
    }

    #[test]
    fn keypress_without_child_is_unhandled_only_when_offline() {
        let mut term = offline_terminal();
        // Offline: keys fall through to the window (focus traversal etc.).
        let reaction = term.on_key(KeyEvent::new(KeyCode::Char('x')));
        assert_eq!(reaction, Reaction::Unhandled);
    }

    #[test]
    fn da_reply_would_reach_child() {
        // With no child attached the reply is dropped, but the emulator
        // must still have generated it without panicking.
        let mut term = offline_terminal();
        term.feed_output(b"\x1b[c");
        assert_eq!(term.emulator().cursor(), (0, 0));
    }

    #[test]
    fn cursor_position_tracks_emulator() {
        let mut term = offline_terminal();
        term.feed_output(b"abc");
        assert_eq!(term.cursor_position(), None, "offline hides the cursor");

        let mut online = TerminalWindow::with_child("t", 0, 1, None);
        online.offline = false;
        online.feed_output(b"abc");
        assert_eq!(online.cursor_position(), Some(Point::new(4, 1)));
        online.feed_output(b"\x1b[?25l");
        assert_eq!(online.cursor_position(), None);
    }
}
