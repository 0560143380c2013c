//! The uniform widget interface.

use tatami_core::event::{KeyEvent, MouseEvent};
use tatami_core::geometry::{Point, Rect};
use tatami_render::Screen;

use crate::theme::Theme;

/// An application-defined command emitted by widgets (buttons, menu items)
/// and routed to the application's handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(pub u16);

/// Built-in command values.
pub mod commands {
    use super::Command;

    /// Shut the application down.
    pub const EXIT: Command = Command(0);
}

/// What a widget did with an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Not interested; the caller may route the event elsewhere.
    Unhandled,
    /// Consumed with no further effect.
    Handled,
    /// Consumed, and this command should reach the application.
    Emit(Command),
}

/// Everything a widget needs while drawing itself.
///
/// The screen arrives with its offset already at the widget's origin and
/// its clip window at the widget's size, so widgets draw in local
/// coordinates starting at `(0, 0)`.
pub struct DrawContext<'a> {
    pub screen: &'a mut Screen,
    pub theme: &'a Theme,
    /// Whether this widget currently holds the focus.
    pub focused: bool,
}

/// The uniform widget interface.
///
/// Mouse events arrive widget-relative in `(x, y)` with the grid-absolute
/// position preserved alongside.
pub trait Widget {
    fn bounds(&self) -> Rect;

    fn set_bounds(&mut self, bounds: Rect);

    /// Whether keyboard focus can land here.
    fn focusable(&self) -> bool {
        false
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>);

    fn on_key(&mut self, key: KeyEvent) -> Reaction {
        let _ = key;
        Reaction::Unhandled
    }

    fn on_mouse_down(&mut self, ev: MouseEvent) -> Reaction {
        let _ = ev;
        Reaction::Unhandled
    }

    fn on_mouse_up(&mut self, ev: MouseEvent) -> Reaction {
        let _ = ev;
        Reaction::Unhandled
    }

    fn on_mouse_motion(&mut self, ev: MouseEvent) {
        let _ = ev;
    }

    /// The enclosing surface changed size.
    fn on_resize(&mut self, width: u16, height: u16) {
        let _ = (width, height);
    }

    /// Called once per main-loop tick.
    fn on_idle(&mut self) {}

    /// The widget is being removed.
    fn on_close(&mut self) {}

    /// Where the hardware cursor belongs, widget-relative, when focused.
    fn cursor_position(&self) -> Option<Point> {
        None
    }
}
