#![forbid(unsafe_code)]

//! ECMA-48 / VT terminal emulator.
//!
//! [`Ecma48`] is a byte-level state machine that parses VT100 / VT102 /
//! VT220 / XTerm control streams into display-line mutations and reply
//! bytes. It owns the visible display, a bounded scrollback ring, the
//! character-set machinery, and the key-to-bytes translation the hosting
//! widget uses to drive a child process.
//!
//! Replies (device attributes, status reports, answerback) go through the
//! [`RemoteSink`] the caller passes to [`Ecma48::consume`]; the hosting
//! widget points it at the child's stdin.

pub mod charset;
pub mod display_line;
pub mod emulator;
pub mod keys;
pub mod scrollback;

pub use charset::CharacterSet;
pub use display_line::{DisplayLine, DoubleHeight, MAX_LINE};
pub use emulator::{ArrowKeyMode, DeviceType, Ecma48, KeypadMode, Pen, SaveableState, Shift};
pub use scrollback::Scrollback;

/// Sink for bytes the emulator sends back toward the host: DA/DSR replies,
/// the answerback string, VT52 identify.
pub trait RemoteSink {
    fn write_remote(&mut self, bytes: &[u8]);
}

/// Collecting sink, used by tests and by hosts that batch replies.
impl RemoteSink for Vec<u8> {
    fn write_remote(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}
