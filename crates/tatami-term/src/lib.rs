#![forbid(unsafe_code)]

//! The embedded terminal: a window hosting a child shell through the
//! ECMA-48 emulator.
//!
//! [`ChildProcess`] owns the pipes and lifecycle of the child;
//! [`TerminalWindow`] composes a toolkit window with an [`tatami_vt::Ecma48`]
//! instance, pumping child output into the emulator on idle and key events
//! back into the child's stdin.

pub mod process;
pub mod widget;

pub use process::ChildProcess;
pub use widget::TerminalWindow;
