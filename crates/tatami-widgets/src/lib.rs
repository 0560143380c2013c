#![forbid(unsafe_code)]

//! Windows, menus, and widgets for the tatami toolkit.
//!
//! The widget tree is flat by construction: an [`Application`] owns a stack
//! of window-like widgets, each window owns its child widgets as trait
//! objects, and every widget speaks the same small interface — draw plus
//! key/mouse/resize/idle/close hooks. Deep inheritance trees in comparable
//! toolkits flatten onto [`Widget`] implementations here; composites embed
//! a [`Window`] rather than subclassing one.

pub mod application;
pub mod button;
pub mod checkbox;
pub mod editor;
pub mod field;
pub mod label;
pub mod menu;
pub mod progress;
pub mod radio;
pub mod text;
pub mod theme;
pub mod tree;
pub mod widget;
pub mod window;

pub use application::{AppHandler, Application};
pub use button::Button;
pub use checkbox::Checkbox;
pub use editor::Editor;
pub use field::Field;
pub use label::Label;
pub use menu::{Menu, MenuBar, MenuItem};
pub use progress::ProgressBar;
pub use radio::RadioGroup;
pub use text::TextView;
pub use theme::Theme;
pub use tree::{TreeNode, TreeView};
pub use widget::{Command, DrawContext, Reaction, Widget, commands};
pub use window::{Window, WindowFlags, WindowLike};
