//! ECMA-48 sequence emission helpers.
//!
//! Pure string-building functions; state tracking and diffing live in
//! [`crate::screen`]. Every "clear" helper is expected to be preceded by
//! [`normal`] so back-color-erase terminals blank with default colors.

use tatami_core::cell::{CellAttrs, TermColor};

/// Full-screen clear: `CSI 2 J`.
pub const CLEAR_ALL: &str = "\x1b[2J";

/// Clear from cursor to end of line: `CSI K`.
pub const CLEAR_TO_EOL: &str = "\x1b[K";

/// Clear from start of line through cursor: `CSI 1 K`.
pub const CLEAR_TO_BOL: &str = "\x1b[1K";

/// Clear the entire line: `CSI 2 K`.
pub const CLEAR_LINE: &str = "\x1b[2K";

/// Show the cursor: `CSI ? 25 h`.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// Hide the cursor: `CSI ? 25 l`.
pub const CURSOR_HIDE: &str = "\x1b[?25l";

/// Reset to the default rendition: explicit white on black so that
/// subsequent erase sequences blank to known colors.
pub fn normal(out: &mut String) {
    out.push_str("\x1b[0;37;40m");
}

/// Absolute cursor position (0-indexed in, 1-indexed on the wire).
pub fn cup(out: &mut String, row: usize, col: usize) {
    out.push_str(&format!("\x1b[{};{}H", row + 1, col + 1));
}

/// Full SGR: reset, colors, and any flags, in one sequence.
pub fn sgr_full(out: &mut String, attrs: CellAttrs) {
    out.push_str(&format!(
        "\x1b[0;{};{}",
        30 + attrs.fg.index(),
        40 + attrs.bg.index()
    ));
    if attrs.bold {
        out.push_str(";1");
    }
    if attrs.blink {
        out.push_str(";5");
    }
    out.push('m');
}

/// Foreground and background in one sequence.
pub fn sgr_colors(out: &mut String, fg: TermColor, bg: TermColor) {
    out.push_str(&format!("\x1b[{};{}m", 30 + fg.index(), 40 + bg.index()));
}

/// Foreground only.
pub fn sgr_fg(out: &mut String, fg: TermColor) {
    out.push_str(&format!("\x1b[{}m", 30 + fg.index()));
}

/// Background only.
pub fn sgr_bg(out: &mut String, bg: TermColor) {
    out.push_str(&format!("\x1b[{}m", 40 + bg.index()));
}
