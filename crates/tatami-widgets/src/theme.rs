//! Color theme: a table of cell attributes per UI role.

use tatami_core::cell::{CellAttrs, TermColor};

/// Attribute table consulted by every widget while drawing.
#[derive(Debug, Clone)]
pub struct Theme {
    pub desktop: CellAttrs,
    pub window_border: CellAttrs,
    pub window_border_focused: CellAttrs,
    pub window_background: CellAttrs,
    pub window_title: CellAttrs,
    pub menu: CellAttrs,
    pub menu_hotkey: CellAttrs,
    pub menu_selected: CellAttrs,
    pub menu_disabled: CellAttrs,
    pub label: CellAttrs,
    pub button: CellAttrs,
    pub button_focused: CellAttrs,
    pub field: CellAttrs,
    pub field_focused: CellAttrs,
    pub selection: CellAttrs,
    pub progress_done: CellAttrs,
    pub progress_todo: CellAttrs,
}

impl Default for Theme {
    /// The classic blue desktop scheme.
    fn default() -> Self {
        use TermColor::{Black, Blue, Cyan, Green, Red, White, Yellow};
        Self {
            desktop: CellAttrs::new(Cyan, Blue),
            window_border: CellAttrs::new(White, Blue),
            window_border_focused: CellAttrs::new(Yellow, Blue).with_bold(true),
            window_background: CellAttrs::new(White, Blue),
            window_title: CellAttrs::new(White, Blue).with_bold(true),
            menu: CellAttrs::new(Black, White),
            menu_hotkey: CellAttrs::new(Red, White),
            menu_selected: CellAttrs::new(White, Green),
            menu_disabled: CellAttrs::new(Black, White).with_bold(true),
            label: CellAttrs::new(White, Blue),
            button: CellAttrs::new(Black, Green),
            button_focused: CellAttrs::new(Yellow, Green).with_bold(true),
            field: CellAttrs::new(White, Black),
            field_focused: CellAttrs::new(Yellow, Black).with_bold(true),
            selection: CellAttrs::new(Black, Cyan),
            progress_done: CellAttrs::new(Green, Blue).with_bold(true),
            progress_todo: CellAttrs::new(White, Blue),
        }
    }
}
