//! Key-to-bytes translation for the child process side.
//!
//! Maps structured key events to the byte strings a real terminal would
//! send. Arrow keys and Home/End follow the emulator's arrow-key mode,
//! F1-F4 follow VT52 mode, and every shifted/ctrl function-key variant maps
//! to its own distinct xterm-style sequence.

use tatami_core::event::{KeyCode, KeyEvent};

use crate::emulator::ArrowKeyMode;

/// Per-keypress translation context snapshot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyContext {
    pub arrow_mode: ArrowKeyMode,
    pub vt52: bool,
    pub newline_mode: bool,
}

/// The xterm modifier parameter: 1 plus shift/alt/ctrl bits.
fn modifier_param(key: KeyEvent) -> u8 {
    let mut m = 1;
    if key.shift() {
        m += 1;
    }
    if key.alt() {
        m += 2;
    }
    if key.ctrl() {
        m += 4;
    }
    m
}

/// A cursor-style key: mode-dependent base, modifier-carrying CSI form.
fn cursor_key(key: KeyEvent, final_byte: char, ctx: &KeyContext) -> Vec<u8> {
    let m = modifier_param(key);
    if m > 1 && !ctx.vt52 {
        return format!("\x1b[1;{m}{final_byte}").into_bytes();
    }
    match ctx.arrow_mode {
        ArrowKeyMode::Vt52 => format!("\x1b{final_byte}").into_bytes(),
        ArrowKeyMode::Ansi => format!("\x1b[{final_byte}").into_bytes(),
        ArrowKeyMode::Vt100 => format!("\x1bO{final_byte}").into_bytes(),
    }
}

/// A `CSI n ~` key with its modifier variant.
fn tilde_key(key: KeyEvent, code: u8) -> Vec<u8> {
    let m = modifier_param(key);
    if m > 1 {
        format!("\x1b[{code};{m}~").into_bytes()
    } else {
        format!("\x1b[{code}~").into_bytes()
    }
}

/// F1-F4: SS3 finals on ANSI terminals, `ESC P`..`ESC S` on a VT52.
fn pf_key(key: KeyEvent, final_byte: char, ctx: &KeyContext) -> Vec<u8> {
    if ctx.vt52 {
        return format!("\x1b{final_byte}").into_bytes();
    }
    let m = modifier_param(key);
    if m > 1 {
        format!("\x1b[1;{m}{final_byte}").into_bytes()
    } else {
        format!("\x1bO{final_byte}").into_bytes()
    }
}

pub(crate) fn encode(key: KeyEvent, ctx: &KeyContext) -> Vec<u8> {
    match key.code {
        KeyCode::Up => cursor_key(key, 'A', ctx),
        KeyCode::Down => cursor_key(key, 'B', ctx),
        KeyCode::Right => cursor_key(key, 'C', ctx),
        KeyCode::Left => cursor_key(key, 'D', ctx),
        KeyCode::Home => cursor_key(key, 'H', ctx),
        KeyCode::End => cursor_key(key, 'F', ctx),
        KeyCode::F(1) => pf_key(key, 'P', ctx),
        KeyCode::F(2) => pf_key(key, 'Q', ctx),
        KeyCode::F(3) => pf_key(key, 'R', ctx),
        KeyCode::F(4) => pf_key(key, 'S', ctx),
        KeyCode::F(5) => tilde_key(key, 15),
        KeyCode::F(6) => tilde_key(key, 17),
        KeyCode::F(7) => tilde_key(key, 18),
        KeyCode::F(8) => tilde_key(key, 19),
        KeyCode::F(9) => tilde_key(key, 20),
        KeyCode::F(10) => tilde_key(key, 21),
        KeyCode::F(11) => tilde_key(key, 23),
        KeyCode::F(12) => tilde_key(key, 24),
        KeyCode::F(_) => Vec::new(),
        KeyCode::Insert => tilde_key(key, 2),
        KeyCode::Delete => tilde_key(key, 3),
        KeyCode::PageUp => tilde_key(key, 5),
        KeyCode::PageDown => tilde_key(key, 6),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Enter => {
            if ctx.newline_mode {
                b"\r\n".to_vec()
            } else {
                b"\r".to_vec()
            }
        }
        KeyCode::Escape => b"\x1b".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Char(ch) => encode_char(key, ch),
    }
}

fn encode_char(key: KeyEvent, ch: char) -> Vec<u8> {
    let mut out = Vec::new();
    if key.alt() {
        out.push(0x1b);
    }
    if key.ctrl() {
        // Fold to the control column: ctrl-A..Z and ctrl-@..-_.
        let upper = ch.to_ascii_uppercase();
        if ('@'..='_').contains(&upper) {
            out.push(upper as u8 - 0x40);
            return out;
        }
    }
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    out
}
