//! Tatami showcase: windows, widgets, menus, and an embedded shell.
//!
//! Run in a real terminal. `F10` opens the menu, `F6` cycles windows,
//! `F5` zooms, `Ctrl-W` closes the focused window. Set `TATAMI_LOG=debug`
//! to write a trace log to `tatami-demo.log`.

use tatami::prelude::*;
use tatami::{
    Button, Checkbox, Command, Editor, Field, Label, Menu, MenuBar, MenuItem, ProgressBar,
    RadioGroup, TerminalWindow, TextView, TreeNode, TreeView, commands,
};
use tracing::warn;

const CMD_ABOUT: Command = Command(100);
const CMD_NEW_SHELL: Command = Command(101);
const CMD_NEW_FORM: Command = Command(102);
const CMD_NEW_EDITOR: Command = Command(103);
const CMD_NEW_TREE: Command = Command(104);
const CMD_FORM_OK: Command = Command(110);
const CMD_WIN_CYCLE: Command = Command(120);
const CMD_WIN_ZOOM: Command = Command(121);
const CMD_WIN_CLOSE: Command = Command(122);

fn main() -> std::io::Result<()> {
    init_logging();

    let mut app = Application::new(80, 24);
    build_menu(app.menu_bar_mut());
    app.add_window(form_window(4, 2));
    app.add_window(progress_window());

    app.run(&mut Demo { opened: 0 })
}

struct Demo {
    opened: u16,
}

impl AppHandler for Demo {
    fn on_command(&mut self, app: &mut Application, command: Command) {
        // Stagger new windows so they do not stack exactly.
        self.opened = (self.opened + 1) % 8;
        let (x, y) = (6 + self.opened as i32 * 2, 2 + self.opened as i32);
        match command {
            CMD_ABOUT => app.add_window(about_window()),
            CMD_NEW_FORM => app.add_window(form_window(x, y)),
            CMD_NEW_EDITOR => app.add_window(editor_window(x, y)),
            CMD_NEW_TREE => app.add_window(tree_window(x, y)),
            CMD_NEW_SHELL => match TerminalWindow::shell("Shell", x, y) {
                Ok(terminal) => app.add_window(terminal),
                Err(err) => warn!(%err, "could not spawn the shell"),
            },
            CMD_FORM_OK => app.add_window(message_window("Saved", "Form accepted.")),
            CMD_WIN_CYCLE => app.cycle_windows(),
            CMD_WIN_ZOOM => app.zoom_focused(),
            CMD_WIN_CLOSE => app.close_focused(),
            _ => {}
        }
    }
}

fn build_menu(bar: &mut MenuBar) {
    bar.add_menu(Menu::new(
        "File",
        vec![
            MenuItem::new("New form", CMD_NEW_FORM),
            MenuItem::new("New editor", CMD_NEW_EDITOR),
            MenuItem::new("New tree", CMD_NEW_TREE),
            MenuItem::new("Shell window", CMD_NEW_SHELL),
            MenuItem::separator(),
            MenuItem::new("Exit", commands::EXIT).with_accel("Ctrl-Q"),
        ],
    ));
    bar.add_menu(Menu::new(
        "Window",
        vec![
            MenuItem::new("Cycle", CMD_WIN_CYCLE).with_accel("F6"),
            MenuItem::new("Zoom", CMD_WIN_ZOOM).with_accel("F5"),
            MenuItem::new("Close", CMD_WIN_CLOSE).with_accel("Ctrl-W"),
            MenuItem::separator(),
            MenuItem::new("Tile", Command(999)).disabled(),
        ],
    ));
    bar.add_menu(Menu::new(
        "Help",
        vec![MenuItem::new("About", CMD_ABOUT).with_accel("F1")],
    ));
}

fn form_window(x: i32, y: i32) -> Window {
    let mut window = Window::new("Widgets", x, y, 44, 16);
    window.add(Label::new(1, 0, "Name:"));
    window.add(Field::new(8, 0, 24));
    window.add(Checkbox::new(1, 2, "Enable the mangler", true));
    window.add(RadioGroup::new(
        1,
        4,
        "Speed",
        vec!["slow".into(), "medium".into(), "fast".into()],
    ));
    window.add(Button::new(1, 11, "OK", CMD_FORM_OK));
    window.add(Button::new(10, 11, "Quit", commands::EXIT));
    window
}

fn message_window(title: &str, text: &str) -> Window {
    let mut window = Window::new(title, 26, 9, 30, 7).with_flags(WindowFlags::MODAL);
    window.add(Label::new(1, 1, text));
    window
}

fn progress_window() -> Window {
    let mut window = Window::new("Progress", 52, 14, 26, 6);
    window.add(Label::new(1, 0, "Working..."));
    window.add(Pulse::new(1, 2, 20));
    window
}

fn editor_window(x: i32, y: i32) -> Window {
    let mut window = Window::new("Editor", x, y, 50, 16);
    let mut editor = Editor::new(0, 0, 46, 12);
    editor.set_text("fn main() {\n    println!(\"hello\");\n}\n");
    window.add(editor);
    window
}

fn tree_window(x: i32, y: i32) -> Window {
    let mut window = Window::new("Tree", x, y, 36, 14);
    window.add(TreeView::new(
        0,
        0,
        32,
        10,
        vec![
            TreeNode::branch(
                "crates",
                vec![
                    TreeNode::branch(
                        "tatami-vt",
                        vec![TreeNode::leaf("emulator.rs"), TreeNode::leaf("charset.rs")],
                    ),
                    TreeNode::leaf("tatami-render"),
                ],
            ),
            TreeNode::leaf("Cargo.toml"),
        ],
    ));
    window
}

fn about_window() -> Window {
    let mut window = Window::new("About", 20, 6, 40, 11).with_flags(WindowFlags::MODAL);
    window.add(TextView::new(
        1,
        0,
        36,
        6,
        "Tatami is a text-mode windowing toolkit with overlapping windows, \
         menus, and an embedded ANSI/VT terminal emulator that can host a \
         child shell.\n\nPress Ctrl-W to dismiss this window.",
    ));
    window
}

/// A progress bar that advances on idle ticks.
struct Pulse {
    bar: ProgressBar,
    tick: u32,
}

impl Pulse {
    fn new(x: i32, y: i32, width: u16) -> Self {
        Self {
            bar: ProgressBar::new(x, y, width),
            tick: 0,
        }
    }
}

impl Widget for Pulse {
    fn bounds(&self) -> tatami::Rect {
        self.bar.bounds()
    }

    fn set_bounds(&mut self, bounds: tatami::Rect) {
        self.bar.set_bounds(bounds);
    }

    fn draw(&mut self, ctx: &mut tatami::widgets::DrawContext<'_>) {
        self.bar.draw(ctx);
    }

    fn on_idle(&mut self) {
        self.tick += 1;
        if self.tick % 5 == 0 {
            let next = (self.bar.percent() + 1) % 101;
            self.bar.set_percent(next);
        }
    }
}

fn init_logging() {
    let Ok(filter) = std::env::var("TATAMI_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create("tatami-demo.log") else {
        return;
    };
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
