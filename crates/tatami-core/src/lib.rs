#![forbid(unsafe_code)]

//! Core vocabulary for the tatami toolkit.
//!
//! This crate holds the types every other tatami crate speaks:
//!
//! - [`cell`] — a screen cell (glyph + attributes) and the 8-color model
//! - [`geometry`] — points and rectangles
//! - [`event`] — keyboard and mouse events
//! - [`input`] — the terminal input decoder state machine
//! - [`utf8`] — incremental UTF-8 code-point assembly

pub mod cell;
pub mod event;
pub mod geometry;
pub mod input;
pub mod utf8;

pub use cell::{Cell, CellAttrs, TermColor};
pub use event::{Event, KeyCode, KeyEvent, Modifiers, MouseButtons, MouseEvent, MouseEventKind};
pub use geometry::{Point, Rect};
pub use input::InputDecoder;
pub use utf8::Utf8Decoder;
