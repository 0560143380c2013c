//! The application: window stack, event dispatch, and the main loop.
//!
//! Single-threaded and cooperative. One loop owns the screen, the window
//! stack, and the input decoder; each iteration reads available input,
//! dispatches the decoded events, gives every window an idle tick, and
//! flushes the screen if anything went dirty.

use std::io;
use std::time::{Duration, Instant};

use tatami_core::event::{Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use tatami_core::input::InputDecoder;
use tatami_render::{Screen, ansi};
use tatami_tty::TtySession;
use tracing::{debug, info};

use crate::menu::MenuBar;
use crate::theme::Theme;
use crate::widget::{Command, DrawContext, Reaction, commands};
use crate::window::WindowLike;

/// Receives commands emitted by widgets and menu items.
pub trait AppHandler {
    fn on_command(&mut self, app: &mut Application, command: Command);
}

/// The top-level application state.
pub struct Application {
    screen: Screen,
    theme: Theme,
    menu_bar: MenuBar,
    /// Window stack, back to front; the last window has the focus.
    windows: Vec<Box<dyn WindowLike>>,
    decoder: InputDecoder,
    pending: Vec<Command>,
    quit: bool,
}

impl Application {
    /// Create an application with an initial (pre-session) screen size.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            screen: Screen::new(width, height),
            theme: Theme::default(),
            menu_bar: MenuBar::new(),
            windows: Vec::new(),
            decoder: InputDecoder::new(),
            pending: Vec::new(),
            quit: false,
        }
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn menu_bar_mut(&mut self) -> &mut MenuBar {
        &mut self.menu_bar
    }

    /// Push a window on top of the stack (it takes the focus).
    pub fn add_window(&mut self, window: impl WindowLike + 'static) {
        self.windows.push(Box::new(window));
    }

    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Ask the main loop to exit after the current tick.
    pub fn quit(&mut self) {
        self.quit = true;
    }

    /// Queue a command as if a widget had emitted it.
    pub fn post(&mut self, command: Command) {
        self.pending.push(command);
    }

    // ── Event dispatch ──────────────────────────────────────────────

    /// Route one event through menu, focus, and the window stack.
    pub fn dispatch(&mut self, event: Event) {
        match event {
            Event::Resize { width, height } => {
                self.screen.resize(width as usize, height as usize);
                for window in &mut self.windows {
                    window.on_resize(width, height);
                }
            }
            Event::Key(key) => self.dispatch_key(key),
            Event::Mouse(ev) => self.dispatch_mouse(ev),
        }
    }

    fn dispatch_key(&mut self, key: KeyEvent) {
        if self.menu_bar.is_active() {
            if let Reaction::Emit(command) = self.menu_bar.on_key(key) {
                self.pending.push(command);
            }
            return;
        }

        // Closing the focused window works even while a modal is on top —
        // it is how a modal dialog is dismissed.
        if let KeyCode::Char('W' | 'w') = key.code
            && key.ctrl()
        {
            self.close_focused();
            return;
        }

        let modal_on_top = self.windows.last().is_some_and(|w| w.window().is_modal());
        if !modal_on_top {
            match key.code {
                KeyCode::F(10) if key.modifiers.is_empty() => {
                    self.menu_bar.activate(0);
                    return;
                }
                KeyCode::Char(ch) if key.alt() && !key.ctrl() => {
                    if self.menu_bar.activate_by_initial(ch) {
                        return;
                    }
                }
                // Alt-Tab / F6: cycle the window stack.
                KeyCode::Tab if key.alt() => {
                    self.cycle_windows();
                    return;
                }
                KeyCode::F(6) if key.modifiers.is_empty() => {
                    self.cycle_windows();
                    return;
                }
                // F5: zoom the focused window.
                KeyCode::F(5) if key.modifiers.is_empty() => {
                    self.zoom_focused();
                    return;
                }
                _ => {}
            }
        }

        if let Some(window) = self.windows.last_mut()
            && let Reaction::Emit(command) = window.on_key(key)
        {
            self.pending.push(command);
        }
    }

    fn dispatch_mouse(&mut self, ev: MouseEvent) {
        // An open menu captures the mouse.
        if self.menu_bar.is_active() {
            if ev.kind == MouseEventKind::Down {
                if let Some(command) = self.menu_bar.click_item(ev.absolute_x, ev.absolute_y) {
                    self.pending.push(command);
                } else if ev.absolute_y == 0 {
                    match self.menu_bar.hit_title(ev.absolute_x) {
                        Some(index) => self.menu_bar.activate(index),
                        None => self.menu_bar.deactivate(),
                    }
                } else if self.menu_bar.hit_item(ev.absolute_x, ev.absolute_y).is_none() {
                    self.menu_bar.deactivate();
                }
            }
            return;
        }

        let modal_on_top = self.windows.last().is_some_and(|w| w.window().is_modal());

        if ev.absolute_y == 0 && ev.kind == MouseEventKind::Down && !modal_on_top {
            if let Some(index) = self.menu_bar.hit_title(ev.absolute_x) {
                self.menu_bar.activate(index);
            }
            return;
        }

        // Presses hit-test the stack top-down and raise the window they
        // land on; a press on the bare desktop goes nowhere.
        if ev.kind == MouseEventKind::Down {
            let target = if modal_on_top {
                self.windows.len().checked_sub(1)
            } else {
                self.windows
                    .iter()
                    .rposition(|w| w.bounds().contains(ev.absolute_x, ev.absolute_y))
            };
            let Some(target) = target else {
                return;
            };
            if target != self.windows.len() - 1 {
                let window = self.windows.remove(target);
                self.windows.push(window);
            }
        }

        // Drags and releases follow the focused window even when the
        // pointer leaves it.
        let Some(window) = self.windows.last_mut() else {
            return;
        };
        let b = window.bounds();
        let relative = ev.relative_to(b.x, b.y);
        let reaction = match ev.kind {
            MouseEventKind::Down => window.on_mouse_down(relative),
            MouseEventKind::Up => window.on_mouse_up(relative),
            MouseEventKind::Motion => {
                window.on_mouse_motion(relative);
                Reaction::Handled
            }
        };
        if let Reaction::Emit(command) = reaction {
            self.pending.push(command);
        }
    }

    /// Rotate the window stack: the bottom window comes to the top.
    pub fn cycle_windows(&mut self) {
        if self.windows.len() > 1 {
            let window = self.windows.remove(0);
            self.windows.push(window);
        }
    }

    /// Toggle maximize on the focused window.
    pub fn zoom_focused(&mut self) {
        let (w, h) = (self.screen.width() as u16, self.screen.height() as u16);
        if let Some(window) = self.windows.last_mut() {
            window.window_mut().toggle_maximize(w, h);
        }
    }

    /// Request close on the focused window.
    pub fn close_focused(&mut self) {
        if let Some(window) = self.windows.last_mut() {
            window.window_mut().request_close();
        }
    }

    // ── Drawing ─────────────────────────────────────────────────────

    /// Repaint everything into the logical grid.
    pub fn redraw(&mut self) {
        self.screen.reset();

        // Desktop.
        let width = self.screen.width();
        let height = self.screen.height();
        for y in 1..height {
            for x in 0..width {
                self.screen
                    .put_char(x as i32, y as i32, '░', self.theme.desktop);
            }
        }

        // Windows back to front; the focused window is drawn last.
        let top = self.windows.len().saturating_sub(1);
        for (index, window) in self.windows.iter_mut().enumerate() {
            let b = window.bounds();
            self.screen.set_offset(b.x, b.y);
            self.screen.set_clip(b.width as i32, b.height as i32);
            let mut ctx = DrawContext {
                screen: &mut self.screen,
                theme: &self.theme,
                focused: index == top,
            };
            window.draw(&mut ctx);
        }
        self.screen.set_offset(0, 0);
        self.screen.reset_clip();

        // Menu bar and any open drop-down paint over the windows.
        self.menu_bar.draw_bar(&mut self.screen, &self.theme, width);
        self.menu_bar.draw_dropdown(&mut self.screen, &self.theme);
    }

    /// Where the hardware cursor belongs, grid-absolute.
    fn hardware_cursor(&self) -> Option<(i32, i32)> {
        if self.menu_bar.is_active() {
            return None;
        }
        let window = self.windows.last()?;
        let p = window.cursor_position()?;
        let b = window.bounds();
        let (x, y) = (b.x + p.x, b.y + p.y);
        (x >= 0 && y >= 0 && x < self.screen.width() as i32 && y < self.screen.height() as i32)
            .then_some((x, y))
    }

    /// Direct access to the screen, for tests and embedding hosts.
    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run until [`Application::quit`]: the cooperative tick loop.
    pub fn run(&mut self, handler: &mut dyn AppHandler) -> io::Result<()> {
        let mut session = TtySession::open()?;
        let (width, height) = session.size();
        self.screen.resize(width as usize, height as usize);
        for window in &mut self.windows {
            window.on_resize(width, height);
        }
        info!(width, height, "application loop starting");

        while !self.quit {
            // 1. Input.
            let chars = session.poll_input(Duration::from_millis(20))?;
            let mut events = Vec::new();
            for ch in chars {
                events.extend(self.decoder.feed(ch));
            }
            if let Some(event) = self.decoder.pump_timeout(Instant::now()) {
                events.push(event);
            }
            if let Some((w, h)) = session.take_resize() {
                events.push(Event::Resize {
                    width: w,
                    height: h,
                });
            }

            // 2. Dispatch in arrival order.
            for event in events {
                self.dispatch(event);
            }

            // 3. Idle ticks.
            for window in &mut self.windows {
                window.on_idle();
            }

            // 4. Reap closed windows.
            let mut index = 0;
            while index < self.windows.len() {
                if self.windows[index].window().is_closing() {
                    let mut window = self.windows.remove(index);
                    window.on_close();
                    debug!(title = window.window().title(), "window closed");
                } else {
                    index += 1;
                }
            }

            // 5. Commands.
            let pending: Vec<Command> = self.pending.drain(..).collect();
            for command in pending {
                if command == commands::EXIT {
                    self.quit = true;
                } else {
                    handler.on_command(self, command);
                }
            }

            // 6. Repaint and flush the delta.
            self.redraw();
            if self.screen.dirty() {
                let delta = self.screen.flush();
                if !delta.is_empty() {
                    session.write_str(&delta)?;
                }
                match self.hardware_cursor() {
                    Some((x, y)) => {
                        let mut out = String::new();
                        ansi::cup(&mut out, y as usize, x as usize);
                        out.push_str(ansi::CURSOR_SHOW);
                        session.write_str(&out)?;
                    }
                    None => session.write_str(ansi::CURSOR_HIDE)?,
                }
                session.flush_output()?;
            }
        }
        info!("application loop finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::Button;
    use crate::menu::{Menu, MenuItem};
    use crate::widget::Command;
    use crate::window::Window;
    use tatami_core::event::{Modifiers, MouseButtons};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn mouse(kind: MouseEventKind, x: i32, y: i32) -> Event {
        Event::Mouse(MouseEvent::new(kind, x, y, MouseButtons::LEFT))
    }

    fn app_with_two_windows() -> Application {
        let mut app = Application::new(80, 24);
        let mut first = Window::new("first", 2, 2, 30, 10);
        first.add(Button::new(1, 1, "A", Command(1)));
        app.add_window(first);
        app.add_window(Window::new("second", 40, 5, 30, 10));
        app
    }

    #[test]
    fn key_goes_to_top_window() {
        let mut app = app_with_two_windows();
        // Enter on the top window (no button) does nothing; cycle, then the
        // button on the now-top window emits.
        app.dispatch(key(KeyCode::Enter));
        assert!(app.pending.is_empty());
        app.dispatch(key(KeyCode::F(6)));
        app.dispatch(key(KeyCode::Enter));
        assert_eq!(app.pending, vec![Command(1)]);
    }

    #[test]
    fn click_raises_window() {
        let mut app = app_with_two_windows();
        // The first window is below; clicking its title raises it.
        app.dispatch(mouse(MouseEventKind::Down, 10, 2));
        assert_eq!(app.windows.last().unwrap().window().title(), "first");
    }

    #[test]
    fn modal_window_captures_events() {
        let mut app = app_with_two_windows();
        let modal = Window::new("modal", 20, 8, 20, 6)
            .with_flags(crate::window::WindowFlags::MODAL);
        app.add_window(modal);
        // A click far outside the modal window does not raise the others.
        app.dispatch(mouse(MouseEventKind::Down, 3, 3));
        assert_eq!(app.windows.last().unwrap().window().title(), "modal");
    }

    #[test]
    fn f10_opens_menu_and_routes_keys() {
        let mut app = Application::new(80, 24);
        app.menu_bar_mut().add_menu(Menu::new(
            "File",
            vec![MenuItem::new("Exit", commands::EXIT)],
        ));
        app.dispatch(key(KeyCode::F(10)));
        assert!(app.menu_bar.is_active());
        app.dispatch(key(KeyCode::Enter));
        assert!(!app.menu_bar.is_active());
        assert_eq!(app.pending, vec![commands::EXIT]);
    }

    #[test]
    fn alt_letter_opens_menu() {
        let mut app = Application::new(80, 24);
        app.menu_bar_mut()
            .add_menu(Menu::new("File", vec![MenuItem::new("X", Command(9))]));
        app.dispatch(Event::Key(
            KeyEvent::new(KeyCode::Char('f')).with_modifiers(Modifiers::ALT),
        ));
        assert!(app.menu_bar.is_active());
    }

    #[test]
    fn ctrl_w_closes_top_window() {
        let mut app = app_with_two_windows();
        app.dispatch(Event::Key(
            KeyEvent::new(KeyCode::Char('w')).with_modifiers(Modifiers::CTRL),
        ));
        assert!(app.windows.last().unwrap().window().is_closing());
    }

    #[test]
    fn resize_updates_screen() {
        let mut app = app_with_two_windows();
        app.dispatch(Event::Resize {
            width: 100,
            height: 40,
        });
        assert_eq!(app.screen().width(), 100);
        assert_eq!(app.screen().height(), 40);
    }

    #[test]
    fn redraw_paints_desktop_and_windows() {
        let mut app = app_with_two_windows();
        app.redraw();
        // Desktop fill below the menu row.
        assert_eq!(app.screen().logical_cell(0, 23).unwrap().ch, '░');
        // Menu bar row is blank menu-colored cells.
        assert_eq!(app.screen().logical_cell(0, 0).unwrap().ch, ' ');
        // The second window's border lands at its origin.
        assert_eq!(app.screen().logical_cell(40, 5).unwrap().ch, '╔');
    }

    #[test]
    fn flush_after_redraw_converges() {
        let mut app = app_with_two_windows();
        app.redraw();
        let first = app.screen_mut().flush();
        assert!(!first.is_empty());
        // A second identical redraw produces no output.
        app.redraw();
        assert_eq!(app.screen_mut().flush(), "");
    }

    #[test]
    fn menu_click_outside_closes() {
        let mut app = Application::new(80, 24);
        app.menu_bar_mut()
            .add_menu(Menu::new("File", vec![MenuItem::new("X", Command(9))]));
        app.menu_bar.activate(0);
        app.dispatch(mouse(MouseEventKind::Down, 60, 15));
        assert!(!app.menu_bar.is_active());
    }
}
