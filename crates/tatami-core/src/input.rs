//! Terminal input decoder state machine.
//!
//! Decodes the code-point stream read from the controlling terminal into
//! [`Event`]s: plain keys, escape-prefixed named keys, and xterm UTF-8
//! (mode 1005) mouse reports.
//!
//! # Design
//!
//! The decoder is fed one code point at a time (the tty layer assembles
//! UTF-8). States:
//!
//! - `Ground` — plain keys and C0 controls
//! - `Escape` — after ESC; a 250 ms timeout turns a bare ESC into a keypress
//! - `EscapeIntermediate` — after `ESC O` (SS3 function keys)
//! - `CsiEntry` / `CsiParam` — `ESC [` sequences with numeric parameters
//! - `Mouse` — consuming exactly three code points of an X10-style report
//!
//! The bare-ESC timeout is measured when the next input arrives; callers
//! that want a stalled ESC flushed promptly call [`InputDecoder::pump_timeout`]
//! from their idle loop.

use std::time::{Duration, Instant};

use crate::event::{
    Event, KeyCode, KeyEvent, Modifiers, MouseButtons, MouseEvent, MouseEventKind,
};

/// How long a lone ESC may sit before it is reported as a keypress.
pub const ESCAPE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecoderState {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    Mouse,
}

/// Input decoder with sticky mouse-button tracking.
#[derive(Debug)]
pub struct InputDecoder {
    state: DecoderState,
    /// CSI parameters as digit strings.
    params: Vec<String>,
    /// Code points of the in-flight mouse report (button, col, row).
    mouse: Vec<u32>,
    /// When the pending ESC arrived.
    escape_at: Option<Instant>,
    /// Buttons currently held, tracked across reports to tell a release
    /// from plain motion and to classify drags.
    mouse1: bool,
    mouse2: bool,
    mouse3: bool,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InputDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: DecoderState::Ground,
            params: Vec::new(),
            mouse: Vec::with_capacity(3),
            escape_at: None,
            mouse1: false,
            mouse2: false,
            mouse3: false,
        }
    }

    /// Feed one code point, producing zero or more events.
    pub fn feed(&mut self, ch: char) -> Vec<Event> {
        self.feed_at(ch, Instant::now())
    }

    /// Feed one code point with an explicit arrival time.
    pub fn feed_at(&mut self, ch: char, now: Instant) -> Vec<Event> {
        let mut out = Vec::new();
        if let Some(esc) = self.take_expired_escape(now) {
            out.push(esc);
        }
        match self.state {
            DecoderState::Ground => self.ground(ch, now, &mut out),
            DecoderState::Escape => self.escape(ch, &mut out),
            DecoderState::EscapeIntermediate => self.escape_intermediate(ch, &mut out),
            DecoderState::CsiEntry => self.csi_entry(ch, &mut out),
            DecoderState::CsiParam => self.csi_param(ch, &mut out),
            DecoderState::Mouse => self.mouse_report(ch, &mut out),
        }
        out
    }

    /// Flush a bare ESC that has sat past [`ESCAPE_TIMEOUT`].
    ///
    /// Call from an idle loop so a lone ESC keypress is not held hostage by
    /// an input stall.
    pub fn pump_timeout(&mut self, now: Instant) -> Option<Event> {
        self.take_expired_escape(now)
    }

    fn take_expired_escape(&mut self, now: Instant) -> Option<Event> {
        if self.state != DecoderState::Escape {
            return None;
        }
        let at = self.escape_at?;
        if now.duration_since(at) > ESCAPE_TIMEOUT {
            self.state = DecoderState::Ground;
            self.escape_at = None;
            Some(Event::Key(KeyEvent::new(KeyCode::Escape)))
        } else {
            None
        }
    }

    // ── Ground ─────────────────────────────────────────────────────

    fn ground(&mut self, ch: char, now: Instant, out: &mut Vec<Event>) {
        match ch {
            '\u{1b}' => {
                self.state = DecoderState::Escape;
                self.escape_at = Some(now);
            }
            _ if (ch as u32) < 0x20 => {
                out.push(Event::Key(control_key(ch, Modifiers::empty())));
            }
            '\u{7f}' => {
                out.push(Event::Key(KeyEvent::new(KeyCode::Backspace)));
            }
            _ => out.push(Event::Key(KeyEvent::new(KeyCode::Char(ch)))),
        }
    }

    // ── Escape ─────────────────────────────────────────────────────

    fn escape(&mut self, ch: char, out: &mut Vec<Event>) {
        self.escape_at = None;
        match ch {
            'O' => {
                self.state = DecoderState::EscapeIntermediate;
            }
            '[' => {
                self.state = DecoderState::CsiEntry;
                self.params.clear();
            }
            _ if (ch as u32) < 0x20 => {
                self.state = DecoderState::Ground;
                out.push(Event::Key(control_key(ch, Modifiers::ALT)));
            }
            _ => {
                self.state = DecoderState::Ground;
                out.push(Event::Key(
                    KeyEvent::new(KeyCode::Char(ch)).with_modifiers(Modifiers::ALT),
                ));
            }
        }
    }

    fn escape_intermediate(&mut self, ch: char, out: &mut Vec<Event>) {
        self.state = DecoderState::Ground;
        let code = match ch {
            'P' => KeyCode::F(1),
            'Q' => KeyCode::F(2),
            'R' => KeyCode::F(3),
            'S' => KeyCode::F(4),
            // Unrecognized SS3 final: discard.
            _ => return,
        };
        out.push(Event::Key(KeyEvent::new(code)));
    }

    // ── CSI ────────────────────────────────────────────────────────

    fn csi_entry(&mut self, ch: char, out: &mut Vec<Event>) {
        match ch {
            '0'..='9' | ';' => {
                self.state = DecoderState::CsiParam;
                self.params.clear();
                self.accumulate(ch);
            }
            'M' => {
                self.state = DecoderState::Mouse;
                self.mouse.clear();
            }
            _ => {
                self.state = DecoderState::Ground;
                if let Some(code) = csi_named_key(ch) {
                    out.push(Event::Key(KeyEvent::new(code)));
                }
            }
        }
    }

    fn csi_param(&mut self, ch: char, out: &mut Vec<Event>) {
        match ch {
            '0'..='9' | ';' => self.accumulate(ch),
            '~' => {
                self.state = DecoderState::Ground;
                let mods = self.modifier_param(1);
                if let Some(code) = tilde_key(self.param(0, 0)) {
                    out.push(Event::Key(KeyEvent::new(code).with_modifiers(mods)));
                }
            }
            _ => {
                self.state = DecoderState::Ground;
                // Arrows/Home/End also arrive with xterm modifier parameters,
                // e.g. CSI 1;5A for ctrl-up.
                if let Some(code) = csi_named_key(ch) {
                    let mods = self.modifier_param(1);
                    out.push(Event::Key(KeyEvent::new(code).with_modifiers(mods)));
                }
            }
        }
    }

    fn accumulate(&mut self, ch: char) {
        if ch == ';' {
            self.params.push(String::new());
            return;
        }
        if self.params.is_empty() {
            self.params.push(String::new());
        }
        let last = self.params.last_mut().expect("params is non-empty");
        // Bound parameter length so a hostile stream cannot grow memory.
        if last.len() < 8 {
            last.push(ch);
        }
    }

    fn param(&self, index: usize, default: u32) -> u32 {
        self.params
            .get(index)
            .and_then(|p| p.parse().ok())
            .unwrap_or(default)
    }

    /// Decode the xterm modifier parameter: bits of (value - 1) are
    /// shift / alt / ctrl, so 2 = shift, 3 = alt, 5 = ctrl.
    fn modifier_param(&self, index: usize) -> Modifiers {
        let value = self.param(index, 1);
        let bits = value.saturating_sub(1);
        let mut mods = Modifiers::empty();
        if bits & 1 != 0 {
            mods |= Modifiers::SHIFT;
        }
        if bits & 2 != 0 {
            mods |= Modifiers::ALT;
        }
        if bits & 4 != 0 {
            mods |= Modifiers::CTRL;
        }
        mods
    }

    // ── Mouse (xterm 1005, UTF-8 coordinates) ─────────────────────

    fn mouse_report(&mut self, ch: char, out: &mut Vec<Event>) {
        self.mouse.push(ch as u32);
        if self.mouse.len() < 3 {
            return;
        }
        self.state = DecoderState::Ground;

        let button = self.mouse[0].saturating_sub(32);
        let x = self.mouse[1].saturating_sub(33) as i32;
        let y = self.mouse[2].saturating_sub(33) as i32;

        let (kind, buttons) = match button {
            0 => {
                self.mouse1 = true;
                (MouseEventKind::Down, MouseButtons::LEFT)
            }
            1 => {
                self.mouse2 = true;
                (MouseEventKind::Down, MouseButtons::MIDDLE)
            }
            2 => {
                self.mouse3 = true;
                (MouseEventKind::Down, MouseButtons::RIGHT)
            }
            3 => {
                // Release of whichever button was down; plain motion if none.
                if self.mouse1 {
                    self.mouse1 = false;
                    (MouseEventKind::Up, MouseButtons::LEFT)
                } else if self.mouse2 {
                    self.mouse2 = false;
                    (MouseEventKind::Up, MouseButtons::MIDDLE)
                } else if self.mouse3 {
                    self.mouse3 = false;
                    (MouseEventKind::Up, MouseButtons::RIGHT)
                } else {
                    (MouseEventKind::Motion, MouseButtons::empty())
                }
            }
            32 => (MouseEventKind::Motion, MouseButtons::LEFT),
            33 => (MouseEventKind::Motion, MouseButtons::MIDDLE),
            34 => (MouseEventKind::Motion, MouseButtons::RIGHT),
            64 => (MouseEventKind::Down, MouseButtons::WHEEL_UP),
            65 => (MouseEventKind::Down, MouseButtons::WHEEL_DOWN),
            _ => (MouseEventKind::Motion, MouseButtons::empty()),
        };
        out.push(Event::Mouse(MouseEvent::new(kind, x, y, buttons)));
    }
}

/// Map a C0 control to a key event: CR, TAB, and ESC become named keys,
/// everything else is reported as ctrl + the code point plus 0x40.
fn control_key(ch: char, extra: Modifiers) -> KeyEvent {
    let code = match ch {
        '\r' => KeyCode::Enter,
        '\t' => KeyCode::Tab,
        '\u{1b}' => KeyCode::Escape,
        _ => {
            let shifted = char::from_u32(ch as u32 + 0x40).unwrap_or(' ');
            return KeyEvent::new(KeyCode::Char(shifted)).with_modifiers(extra | Modifiers::CTRL);
        }
    };
    KeyEvent::new(code).with_modifiers(extra)
}

/// Named keys reported with a bare CSI final byte.
fn csi_named_key(ch: char) -> Option<KeyCode> {
    match ch {
        'A' => Some(KeyCode::Up),
        'B' => Some(KeyCode::Down),
        'C' => Some(KeyCode::Right),
        'D' => Some(KeyCode::Left),
        'H' => Some(KeyCode::Home),
        'F' => Some(KeyCode::End),
        'Z' => Some(KeyCode::BackTab),
        _ => None,
    }
}

/// Named keys reported as `CSI n ~`.
fn tilde_key(n: u32) -> Option<KeyCode> {
    match n {
        1 => Some(KeyCode::Home),
        2 => Some(KeyCode::Insert),
        3 => Some(KeyCode::Delete),
        4 => Some(KeyCode::End),
        5 => Some(KeyCode::PageUp),
        6 => Some(KeyCode::PageDown),
        15 => Some(KeyCode::F(5)),
        17 => Some(KeyCode::F(6)),
        18 => Some(KeyCode::F(7)),
        19 => Some(KeyCode::F(8)),
        20 => Some(KeyCode::F(9)),
        21 => Some(KeyCode::F(10)),
        23 => Some(KeyCode::F(11)),
        24 => Some(KeyCode::F(12)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_str(dec: &mut InputDecoder, s: &str) -> Vec<Event> {
        let now = Instant::now();
        s.chars().flat_map(|ch| dec.feed_at(ch, now)).collect()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    #[test]
    fn printable_characters() {
        let mut dec = InputDecoder::new();
        assert_eq!(
            feed_str(&mut dec, "ab"),
            vec![key(KeyCode::Char('a')), key(KeyCode::Char('b'))]
        );
    }

    #[test]
    fn control_characters() {
        let mut dec = InputDecoder::new();
        assert_eq!(
            feed_str(&mut dec, "\r\t"),
            vec![key(KeyCode::Enter), key(KeyCode::Tab)]
        );
        assert_eq!(
            feed_str(&mut dec, "\u{03}"),
            vec![Event::Key(
                KeyEvent::new(KeyCode::Char('C')).with_modifiers(Modifiers::CTRL)
            )]
        );
    }

    #[test]
    fn arrow_key_round_trip() {
        let mut dec = InputDecoder::new();
        assert_eq!(feed_str(&mut dec, "\u{1b}[A"), vec![key(KeyCode::Up)]);
        assert_eq!(feed_str(&mut dec, "\u{1b}[D"), vec![key(KeyCode::Left)]);
        assert_eq!(feed_str(&mut dec, "\u{1b}[Z"), vec![key(KeyCode::BackTab)]);
    }

    #[test]
    fn ss3_function_keys() {
        let mut dec = InputDecoder::new();
        assert_eq!(feed_str(&mut dec, "\u{1b}OP"), vec![key(KeyCode::F(1))]);
        assert_eq!(feed_str(&mut dec, "\u{1b}OS"), vec![key(KeyCode::F(4))]);
    }

    #[test]
    fn tilde_keys_with_modifiers() {
        let mut dec = InputDecoder::new();
        assert_eq!(
            feed_str(&mut dec, "\u{1b}[15;5~"),
            vec![Event::Key(
                KeyEvent::new(KeyCode::F(5)).with_modifiers(Modifiers::CTRL)
            )]
        );
        assert_eq!(
            feed_str(&mut dec, "\u{1b}[3~"),
            vec![key(KeyCode::Delete)]
        );
        assert_eq!(
            feed_str(&mut dec, "\u{1b}[6;2~"),
            vec![Event::Key(
                KeyEvent::new(KeyCode::PageDown).with_modifiers(Modifiers::SHIFT)
            )]
        );
    }

    #[test]
    fn modified_arrow() {
        let mut dec = InputDecoder::new();
        assert_eq!(
            feed_str(&mut dec, "\u{1b}[1;3C"),
            vec![Event::Key(
                KeyEvent::new(KeyCode::Right).with_modifiers(Modifiers::ALT)
            )]
        );
    }

    #[test]
    fn alt_prefixed_character() {
        let mut dec = InputDecoder::new();
        assert_eq!(
            feed_str(&mut dec, "\u{1b}x"),
            vec![Event::Key(
                KeyEvent::new(KeyCode::Char('x')).with_modifiers(Modifiers::ALT)
            )]
        );
    }

    #[test]
    fn bare_escape_times_out() {
        let mut dec = InputDecoder::new();
        let t0 = Instant::now();
        assert!(dec.feed_at('\u{1b}', t0).is_empty());
        // Not yet expired.
        assert_eq!(dec.pump_timeout(t0 + Duration::from_millis(100)), None);
        assert_eq!(
            dec.pump_timeout(t0 + Duration::from_millis(300)),
            Some(key(KeyCode::Escape))
        );
        // Queue is drained.
        assert_eq!(dec.pump_timeout(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn expired_escape_flushes_before_next_key() {
        let mut dec = InputDecoder::new();
        let t0 = Instant::now();
        assert!(dec.feed_at('\u{1b}', t0).is_empty());
        let events = dec.feed_at('q', t0 + Duration::from_millis(500));
        assert_eq!(events, vec![key(KeyCode::Escape), key(KeyCode::Char('q'))]);
    }

    #[test]
    fn escape_within_timeout_starts_sequence() {
        let mut dec = InputDecoder::new();
        let t0 = Instant::now();
        assert!(dec.feed_at('\u{1b}', t0).is_empty());
        assert!(dec.feed_at('[', t0 + Duration::from_millis(10)).is_empty());
        assert_eq!(
            dec.feed_at('A', t0 + Duration::from_millis(20)),
            vec![key(KeyCode::Up)]
        );
    }

    #[test]
    fn mouse_down_packet() {
        let mut dec = InputDecoder::new();
        // button=0 (left down), col=10, row=20.
        let events = feed_str(&mut dec, "\u{1b}[M\u{20}\u{2b}\u{35}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Down,
                10,
                20,
                MouseButtons::LEFT
            ))]
        );
    }

    #[test]
    fn mouse_release_uses_sticky_button() {
        let mut dec = InputDecoder::new();
        // Middle down, then generic release (button 3).
        let _ = feed_str(&mut dec, "\u{1b}[M\u{21}\u{21}\u{21}");
        let events = feed_str(&mut dec, "\u{1b}[M\u{23}\u{21}\u{21}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Up,
                0,
                0,
                MouseButtons::MIDDLE
            ))]
        );
    }

    #[test]
    fn mouse_release_without_press_is_motion() {
        let mut dec = InputDecoder::new();
        let events = feed_str(&mut dec, "\u{1b}[M\u{23}\u{22}\u{22}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Motion,
                1,
                1,
                MouseButtons::empty()
            ))]
        );
    }

    #[test]
    fn mouse_drag_and_wheel() {
        let mut dec = InputDecoder::new();
        // Drag with left button (32 + 32 = 64 = '@').
        let events = feed_str(&mut dec, "\u{1b}[M\u{40}\u{22}\u{22}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Motion,
                1,
                1,
                MouseButtons::LEFT
            ))]
        );
        // Wheel up (64 + 32 = 96 = '`').
        let events = feed_str(&mut dec, "\u{1b}[M\u{60}\u{21}\u{21}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Down,
                0,
                0,
                MouseButtons::WHEEL_UP
            ))]
        );
    }

    #[test]
    fn mouse_utf8_coordinates_above_ascii() {
        let mut dec = InputDecoder::new();
        // Mode 1005 encodes large coordinates as multi-byte UTF-8 code
        // points; the decoder works on code points so col 0x9F - 33 = 126.
        let events = feed_str(&mut dec, "\u{1b}[M\u{20}\u{9f}\u{21}");
        assert_eq!(
            events,
            vec![Event::Mouse(MouseEvent::new(
                MouseEventKind::Down,
                126,
                0,
                MouseButtons::LEFT
            ))]
        );
    }

    #[test]
    fn sgr_mouse_mode_not_decoded() {
        let mut dec = InputDecoder::new();
        // Mode 1006 report: CSI < 0;10;20 M — the '<' is not a parameter
        // digit, so the sequence falls out of the CSI path undecoded.
        let events = feed_str(&mut dec, "\u{1b}[<0;10;20M");
        assert!(
            events
                .iter()
                .all(|ev| !matches!(ev, Event::Mouse(m) if m.kind == MouseEventKind::Down)),
            "SGR mouse packets must not decode as mouse events: {events:?}"
        );
    }

    #[test]
    fn unknown_csi_final_is_discarded() {
        let mut dec = InputDecoder::new();
        assert!(feed_str(&mut dec, "\u{1b}[5q").is_empty());
        // Decoder recovered: next key decodes normally.
        assert_eq!(feed_str(&mut dec, "x"), vec![key(KeyCode::Char('x'))]);
    }
}
