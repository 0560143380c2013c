#![forbid(unsafe_code)]

//! Tatami public facade crate.
//!
//! Re-exports the commonly used types from the workspace crates so that
//! application code depends on one crate:
//!
//! - Input and cells: `tatami-core`
//! - Screen compositor: `tatami-render`
//! - Raw terminal session: `tatami-tty`
//! - ECMA-48 emulator: `tatami-vt`
//! - Windows, widgets, and the event loop: `tatami-widgets`
//! - The embedded shell window: `tatami-term`

// --- Core re-exports -------------------------------------------------------

pub use tatami_core::cell::{Cell, CellAttrs, TermColor};
pub use tatami_core::event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButtons, MouseEvent, MouseEventKind,
};
pub use tatami_core::geometry::{Point, Rect};
pub use tatami_core::input::InputDecoder;

// --- Render re-exports -----------------------------------------------------

pub use tatami_render::{BorderStyle, Screen};

// --- Emulator re-exports ---------------------------------------------------

pub use tatami_term::{ChildProcess, TerminalWindow};
pub use tatami_vt::{DeviceType, DisplayLine, Ecma48, RemoteSink};

// --- Toolkit re-exports ----------------------------------------------------

pub use tatami_tty::TtySession;
pub use tatami_widgets::{
    AppHandler, Application, Button, Checkbox, Command, Editor, Field, Label, Menu, MenuBar,
    MenuItem, ProgressBar, RadioGroup, Reaction, TextView, Theme, TreeNode, TreeView, Widget,
    Window, WindowFlags, WindowLike, commands,
};

/// A lightweight prelude for application authors.
pub mod prelude {
    pub use crate::{
        AppHandler, Application, Command, Event, KeyCode, KeyEvent, Modifiers, Reaction, Theme,
        Widget, Window, WindowFlags,
    };
}

pub use tatami_core as core;
pub use tatami_render as render;
pub use tatami_term as term;
pub use tatami_tty as tty;
pub use tatami_vt as vt;
pub use tatami_widgets as widgets;

#[cfg(test)]
mod tests {
    #[test]
    fn facade_re_exports_resolve() {
        use crate::prelude::*;
        let _ = Window::new("t", 0, 1, 20, 8);
        let _ = Command(1);
        let _ = Theme::default();
    }
}
