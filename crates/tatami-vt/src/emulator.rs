//! The ECMA-48 emulator state machine.
//!
//! `Ecma48::consume` takes the child process's output one code point at a
//! time and mutates the display. The parser follows the canonical ANSI
//! state diagram: CAN/SUB/ESC/CSI are recognized from almost any state,
//! DEL is discarded everywhere, and C1 controls act as the 8-bit
//! equivalents of their `ESC X` forms. Anything unrecognized is consumed
//! with no visible effect.

use smallvec::SmallVec;
use tatami_core::cell::{Cell, CellAttrs, TermColor};
use tatami_core::event::KeyEvent;
use tatami_core::utf8::Utf8Decoder;
use tracing::trace;

use crate::RemoteSink;
use crate::charset::{self, CharacterSet};
use crate::display_line::{DisplayLine, DoubleHeight};
use crate::keys::{self, KeyContext};
use crate::scrollback::Scrollback;

/// Default display width.
pub const DEFAULT_WIDTH: usize = 80;
/// Default display height.
pub const DEFAULT_HEIGHT: usize = 24;
/// DECCOLM wide-mode width.
const WIDTH_132: usize = 132;
/// Default scrollback line cap.
const DEFAULT_SCROLLBACK: usize = 2000;

/// Which terminal the emulator claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Vt100,
    Vt102,
    Vt220,
    Xterm,
}

/// How cursor keys encode, for the keyboard side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKeyMode {
    /// VT52 two-byte form (`ESC A`).
    Vt52,
    /// Normal CSI form (`CSI A`).
    Ansi,
    /// Application mode SS3 form (`ESC O A`).
    Vt100,
}

/// DECKPAM/DECKPNM keypad state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadMode {
    Numeric,
    Application,
}

/// A G-set slot selected into GL or GR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    G0,
    G1,
    G2,
    G3,
}

impl Shift {
    const fn index(self) -> usize {
        match self {
            Shift::G0 => 0,
            Shift::G1 => 1,
            Shift::G2 => 2,
            Shift::G3 => 3,
        }
    }
}

/// Current drawing attributes: cell attributes plus the reverse flag, which
/// is applied as a color swap when a glyph is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pen {
    pub attrs: CellAttrs,
    pub reverse: bool,
}

/// The emulator state covered by DECSC/DECRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveableState {
    pub origin_mode: bool,
    pub cursor_x: usize,
    pub cursor_y: usize,
    /// Designated character sets G0-G3.
    pub g: [CharacterSet; 4],
    /// GL lockshift: the slot invoked into the left half.
    pub gl: Shift,
    /// GR selection: the slot invoked into the right half.
    pub gr: Shift,
    pub pen: Pen,
}

impl Default for SaveableState {
    fn default() -> Self {
        Self {
            origin_mode: false,
            cursor_x: 0,
            cursor_y: 0,
            g: [CharacterSet::UsAscii; 4],
            gl: Shift::G0,
            gr: Shift::G2,
            pen: Pen::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsIntermediate,
    DcsParam,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    SosPmApcString,
    Vt52DirectCursorAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SingleShift {
    #[default]
    None,
    Ss2,
    Ss3,
}

/// CSI parameters as digit strings; most sequences carry at most four.
type CsiParams = SmallVec<[String; 4]>;

/// The terminal emulator.
pub struct Ecma48 {
    device: DeviceType,
    width: usize,
    height: usize,

    display: Vec<DisplayLine>,
    scrollback: Scrollback,

    parser: ParserState,
    params: CsiParams,
    csi_private: bool,
    csi_gt: bool,
    collect: String,
    osc: String,
    vt52_dca: Vec<u32>,
    utf8: Utf8Decoder,

    cur: SaveableState,
    saved: SaveableState,
    single_shift: SingleShift,

    scroll_top: usize,
    scroll_bottom: usize,
    right_margin: usize,

    s8c1t: bool,
    insert_mode: bool,
    vt52_mode: bool,
    wrap_line_flag: bool,
    reverse_video: bool,
    columns_132: bool,
    newline_mode: bool,
    autowrap: bool,
    cursor_visible: bool,
    arrow_key_mode: ArrowKeyMode,
    keypad_mode: KeypadMode,
    tab_stops: Vec<usize>,
    answerback: String,
    title: Option<String>,
}

impl std::fmt::Debug for Ecma48 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecma48")
            .field("device", &self.device)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("cursor", &(self.cur.cursor_x, self.cur.cursor_y))
            .field("parser", &self.parser)
            .finish_non_exhaustive()
    }
}

impl Ecma48 {
    /// Create an emulator with the default 80x24 display.
    #[must_use]
    pub fn new(device: DeviceType) -> Self {
        Self::with_size(device, DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create an emulator with an explicit display size.
    #[must_use]
    pub fn with_size(device: DeviceType, width: usize, height: usize) -> Self {
        let width = width.clamp(1, crate::MAX_LINE);
        let height = height.max(1);
        Self {
            device,
            width,
            height,
            display: (0..height).map(|_| DisplayLine::new(false)).collect(),
            scrollback: Scrollback::new(DEFAULT_SCROLLBACK),
            parser: ParserState::Ground,
            params: CsiParams::new(),
            csi_private: false,
            csi_gt: false,
            collect: String::new(),
            osc: String::new(),
            vt52_dca: Vec::with_capacity(2),
            utf8: Utf8Decoder::new(),
            cur: SaveableState::default(),
            saved: SaveableState::default(),
            single_shift: SingleShift::None,
            scroll_top: 0,
            scroll_bottom: height - 1,
            right_margin: width - 1,
            s8c1t: false,
            insert_mode: false,
            vt52_mode: false,
            wrap_line_flag: false,
            reverse_video: false,
            columns_132: false,
            newline_mode: false,
            autowrap: true,
            cursor_visible: true,
            arrow_key_mode: ArrowKeyMode::Ansi,
            keypad_mode: KeypadMode::Numeric,
            tab_stops: default_tab_stops(width),
            answerback: String::new(),
            title: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    #[must_use]
    pub fn device(&self) -> DeviceType {
        self.device
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The visible display, exactly `height` lines.
    #[must_use]
    pub fn display(&self) -> &[DisplayLine] {
        &self.display
    }

    #[must_use]
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn set_scrollback_capacity(&mut self, lines: usize) {
        self.scrollback.set_capacity(lines);
    }

    /// Cursor position as `(x, y)`.
    #[must_use]
    pub fn cursor(&self) -> (usize, usize) {
        (self.cur.cursor_x, self.cur.cursor_y)
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// Window title from OSC 0/2, if the application set one.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn arrow_key_mode(&self) -> ArrowKeyMode {
        self.arrow_key_mode
    }

    #[must_use]
    pub fn keypad_mode(&self) -> KeypadMode {
        self.keypad_mode
    }

    #[must_use]
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    #[must_use]
    pub fn is_vt52_mode(&self) -> bool {
        self.vt52_mode
    }

    #[must_use]
    pub fn is_132_columns(&self) -> bool {
        self.columns_132
    }

    /// The answerback string sent in response to ENQ.
    pub fn set_answerback(&mut self, answerback: impl Into<String>) {
        self.answerback = answerback.into();
    }

    /// A snapshot of the current saveable state, for tests and hosts.
    #[must_use]
    pub fn state(&self) -> &SaveableState {
        &self.cur
    }

    // ── Keyboard side ───────────────────────────────────────────────

    /// Translate a key event into the bytes to send to the child process.
    #[must_use]
    pub fn keypress(&self, key: KeyEvent) -> Vec<u8> {
        keys::encode(
            key,
            &KeyContext {
                arrow_mode: self.arrow_key_mode,
                vt52: self.vt52_mode,
                newline_mode: self.newline_mode,
            },
        )
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Feed raw bytes; UTF-8 sequences are assembled internally.
    pub fn consume_bytes(&mut self, bytes: &[u8], remote: &mut dyn RemoteSink) {
        for &b in bytes {
            // Multi-byte assembly only matters for GL-range text; control
            // bytes pass straight through.
            if self.utf8.is_pending() || b >= 0x80 {
                if let Some(ch) = self.utf8.push(b) {
                    self.consume(ch, remote);
                }
            } else {
                self.consume(b as char, remote);
            }
        }
    }

    /// Feed one code point through the parser.
    pub fn consume(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        let cp = match self.device {
            // VT100/VT102 are 7-bit devices: strip the high bit.
            DeviceType::Vt100 | DeviceType::Vt102 if (ch as u32) <= 0xFF => ch as u32 & 0x7F,
            _ => ch as u32,
        };

        // DEL is discarded in every state.
        if cp == 0x7F {
            return;
        }

        // CAN and SUB abort any sequence in progress.
        if cp == 0x18 || cp == 0x1A {
            self.to_ground();
            return;
        }

        // ESC is recognized from almost anywhere; string states dispatch
        // their content first so `ESC \` works as ST.
        if cp == 0x1B {
            if self.parser == ParserState::OscString {
                self.osc_dispatch();
            }
            self.collect.clear();
            self.parser = ParserState::Escape;
            return;
        }

        // 8-bit C1 controls, where the device honors them.
        if (0x80..=0x9F).contains(&cp) {
            if self.honors_c1() {
                self.dispatch_c1(cp as u8);
            }
            return;
        }

        // C0 controls execute in most states.
        if cp < 0x20 {
            match self.parser {
                ParserState::OscString => {
                    if cp == 0x07 {
                        self.osc_dispatch();
                        self.parser = ParserState::Ground;
                    }
                }
                ParserState::DcsPassthrough
                | ParserState::DcsIgnore
                | ParserState::SosPmApcString => {}
                _ => self.execute_c0(cp as u8, remote),
            }
            return;
        }

        let ch = char::from_u32(cp).unwrap_or(ch);
        match self.parser {
            ParserState::Ground => {
                let glyph = self.map_character(ch);
                self.print_character(glyph);
            }
            ParserState::Escape => self.escape_dispatch(ch, remote),
            ParserState::EscapeIntermediate => self.escape_intermediate_dispatch(ch),
            ParserState::CsiEntry => self.csi_entry(ch, remote),
            ParserState::CsiParam => self.csi_param_state(ch, remote),
            ParserState::CsiIntermediate => self.csi_intermediate(ch, remote),
            ParserState::CsiIgnore => {
                if ('\u{40}'..='\u{7e}').contains(&ch) {
                    self.parser = ParserState::Ground;
                }
            }
            ParserState::DcsEntry => match ch {
                '\u{20}'..='\u{2f}' => self.parser = ParserState::DcsIntermediate,
                '\u{30}'..='\u{3b}' => self.parser = ParserState::DcsParam,
                '\u{3c}'..='\u{3f}' => self.parser = ParserState::DcsParam,
                _ => self.parser = ParserState::DcsPassthrough,
            },
            ParserState::DcsIntermediate => match ch {
                '\u{20}'..='\u{2f}' => {}
                '\u{30}'..='\u{3f}' => self.parser = ParserState::DcsIgnore,
                _ => self.parser = ParserState::DcsPassthrough,
            },
            ParserState::DcsParam => match ch {
                '0'..='9' | ';' | ':' => {}
                '\u{20}'..='\u{2f}' => self.parser = ParserState::DcsIntermediate,
                '\u{3c}'..='\u{3f}' => self.parser = ParserState::DcsIgnore,
                _ => self.parser = ParserState::DcsPassthrough,
            },
            // DCS payloads (DECUDK, sixel) are unsupported: swallowed.
            ParserState::DcsPassthrough | ParserState::DcsIgnore => {}
            ParserState::OscString => {
                if self.osc.len() < 4096 {
                    self.osc.push(ch);
                }
            }
            ParserState::SosPmApcString => {}
            ParserState::Vt52DirectCursorAddress => {
                self.vt52_dca.push(ch as u32);
                if self.vt52_dca.len() == 2 {
                    let row = self.vt52_dca[0].saturating_sub(32) as usize;
                    let col = self.vt52_dca[1].saturating_sub(32) as usize;
                    self.vt52_dca.clear();
                    self.parser = ParserState::Ground;
                    self.cursor_position(row, col);
                }
            }
        }
    }

    fn to_ground(&mut self) {
        self.parser = ParserState::Ground;
        self.params.clear();
        self.csi_private = false;
        self.csi_gt = false;
        self.collect.clear();
        self.osc.clear();
        self.vt52_dca.clear();
    }

    fn honors_c1(&self) -> bool {
        match self.device {
            DeviceType::Vt100 | DeviceType::Vt102 => false,
            DeviceType::Vt220 => self.s8c1t,
            DeviceType::Xterm => true,
        }
    }

    // ── Controls ────────────────────────────────────────────────────

    fn execute_c0(&mut self, b: u8, remote: &mut dyn RemoteSink) {
        match b {
            // ENQ: answerback.
            0x05 => {
                if !self.answerback.is_empty() {
                    remote.write_remote(self.answerback.as_bytes());
                }
            }
            0x07 => {} // BEL: no bell surface
            0x08 => self.cursor_left(1, false),
            0x09 => self.advance_to_next_tab_stop(),
            0x0A | 0x0B | 0x0C => self.linefeed(),
            0x0D => {
                self.cur.cursor_x = 0;
                self.wrap_line_flag = false;
            }
            // SO/SI: lockshift G1/G0 into GL.
            0x0E => self.cur.gl = Shift::G1,
            0x0F => self.cur.gl = Shift::G0,
            _ => {}
        }
    }

    fn dispatch_c1(&mut self, b: u8) {
        match b {
            0x84 => self.index(),
            0x85 => {
                self.index();
                self.cur.cursor_x = 0;
            }
            0x88 => self.set_tab_stop(),
            0x8D => self.reverse_index(),
            0x8E => self.single_shift = SingleShift::Ss2,
            0x8F => self.single_shift = SingleShift::Ss3,
            0x90 => {
                self.parser = ParserState::DcsEntry;
            }
            0x9B => {
                self.clear_csi();
                self.parser = ParserState::CsiEntry;
            }
            0x9C => {
                // ST ends whatever string was open.
                if self.parser == ParserState::OscString {
                    self.osc_dispatch();
                }
                self.parser = ParserState::Ground;
            }
            0x9D => {
                self.osc.clear();
                self.parser = ParserState::OscString;
            }
            0x98 | 0x9E | 0x9F => {
                self.parser = ParserState::SosPmApcString;
            }
            _ => {}
        }
    }

    // ── ESC dispatch ────────────────────────────────────────────────

    fn escape_dispatch(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        if self.vt52_mode {
            return self.vt52_escape_dispatch(ch, remote);
        }
        match ch {
            '\u{20}'..='\u{2f}' => {
                self.collect.push(ch);
                self.parser = ParserState::EscapeIntermediate;
                return;
            }
            '[' => {
                self.clear_csi();
                self.parser = ParserState::CsiEntry;
                return;
            }
            ']' => {
                self.osc.clear();
                self.parser = ParserState::OscString;
                return;
            }
            'P' => {
                self.parser = ParserState::DcsEntry;
                return;
            }
            'X' | '^' | '_' => {
                self.parser = ParserState::SosPmApcString;
                return;
            }
            '7' => self.save_cursor(),
            '8' => self.restore_cursor(),
            'c' => self.reset(),
            'D' => self.index(),
            'E' => {
                self.index();
                self.cur.cursor_x = 0;
            }
            'H' => self.set_tab_stop(),
            'M' => self.reverse_index(),
            'N' => self.single_shift = SingleShift::Ss2,
            'O' => self.single_shift = SingleShift::Ss3,
            'Z' => self.device_attributes(remote),
            '=' => self.keypad_mode = KeypadMode::Application,
            '>' => self.keypad_mode = KeypadMode::Numeric,
            // Lockshifts.
            'n' => self.cur.gl = Shift::G2,
            'o' => self.cur.gl = Shift::G3,
            '|' => self.cur.gr = Shift::G3,
            '}' => self.cur.gr = Shift::G2,
            '~' => self.cur.gr = Shift::G1,
            '\\' => {} // ST with nothing open
            _ => {}
        }
        self.parser = ParserState::Ground;
    }

    fn escape_intermediate_dispatch(&mut self, ch: char) {
        if ('\u{20}'..='\u{2f}').contains(&ch) {
            self.collect.push(ch);
            return;
        }
        match (self.collect.as_str(), ch) {
            ("#", '3') => self.set_line_height(DoubleHeight::Top),
            ("#", '4') => self.set_line_height(DoubleHeight::Bottom),
            ("#", '5') => self.set_line_width(false),
            ("#", '6') => self.set_line_width(true),
            ("#", '8') => self.screen_alignment(),
            ("(", f) => self.designate_charset(0, f),
            (")", f) => self.designate_charset(1, f),
            ("*", f) => self.designate_charset(2, f),
            ("+", f) => self.designate_charset(3, f),
            (" ", 'F') => self.s8c1t = false,
            (" ", 'G') => self.s8c1t = true,
            _ => {}
        }
        self.collect.clear();
        self.parser = ParserState::Ground;
    }

    fn vt52_escape_dispatch(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        self.parser = ParserState::Ground;
        match ch {
            'A' => self.cursor_up(1, false),
            'B' => self.cursor_down(1, false),
            'C' => self.cursor_right(1, false),
            'D' => self.cursor_left(1, false),
            'F' => self.cur.g[0] = CharacterSet::Vt52Graphics,
            'G' => self.cur.g[0] = CharacterSet::UsAscii,
            'H' => self.cursor_position(0, 0),
            'I' => self.reverse_index(),
            'J' => self.erase_below(),
            'K' => self.erase_line_right(),
            'Y' => {
                self.vt52_dca.clear();
                self.parser = ParserState::Vt52DirectCursorAddress;
            }
            'Z' => remote.write_remote(b"\x1b/Z"),
            '=' => self.keypad_mode = KeypadMode::Application,
            '>' => self.keypad_mode = KeypadMode::Numeric,
            '<' => {
                // Back to ANSI operation.
                self.vt52_mode = false;
                self.arrow_key_mode = ArrowKeyMode::Ansi;
            }
            _ => {}
        }
    }

    fn designate_charset(&mut self, slot: usize, final_byte: char) {
        if let Some(set) = CharacterSet::from_final(final_byte) {
            self.cur.g[slot] = set;
        }
    }

    // ── CSI machinery ───────────────────────────────────────────────

    fn clear_csi(&mut self) {
        self.params.clear();
        self.csi_private = false;
        self.csi_gt = false;
        self.collect.clear();
    }

    fn csi_accumulate(&mut self, ch: char) {
        if ch == ';' {
            if self.params.is_empty() {
                self.params.push(String::new());
            }
            self.params.push(String::new());
            return;
        }
        if self.params.is_empty() {
            self.params.push(String::new());
        }
        let last = self.params.last_mut().expect("params is non-empty");
        if last.len() < 8 {
            last.push(ch);
        }
    }

    fn csi_entry(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        match ch {
            '0'..='9' | ';' => {
                self.csi_accumulate(ch);
                self.parser = ParserState::CsiParam;
            }
            '?' => {
                self.csi_private = true;
                self.parser = ParserState::CsiParam;
            }
            '>' => {
                self.csi_gt = true;
                self.parser = ParserState::CsiParam;
            }
            '<' | '=' => self.parser = ParserState::CsiIgnore,
            '\u{20}'..='\u{2f}' => {
                self.collect.push(ch);
                self.parser = ParserState::CsiIntermediate;
            }
            '\u{40}'..='\u{7e}' => self.csi_dispatch(ch, remote),
            _ => self.parser = ParserState::CsiIgnore,
        }
    }

    fn csi_param_state(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        match ch {
            '0'..='9' | ';' => self.csi_accumulate(ch),
            ':' | '<' | '=' | '>' | '?' => self.parser = ParserState::CsiIgnore,
            '\u{20}'..='\u{2f}' => {
                self.collect.push(ch);
                self.parser = ParserState::CsiIntermediate;
            }
            '\u{40}'..='\u{7e}' => self.csi_dispatch(ch, remote),
            _ => self.parser = ParserState::CsiIgnore,
        }
    }

    fn csi_intermediate(&mut self, ch: char, remote: &mut dyn RemoteSink) {
        match ch {
            '\u{20}'..='\u{2f}' => self.collect.push(ch),
            '\u{30}'..='\u{3f}' => self.parser = ParserState::CsiIgnore,
            '\u{40}'..='\u{7e}' => {
                if self.collect == "!" && ch == 'p' {
                    self.soft_reset();
                }
                // Any other intermediate+final combination is unsupported.
                self.parser = ParserState::Ground;
                self.clear_csi();
            }
            _ => self.parser = ParserState::CsiIgnore,
        }
    }

    /// Numeric parameter `idx`, with `default` for missing or empty.
    fn param(&self, idx: usize, default: usize) -> usize {
        self.params
            .get(idx)
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(default)
    }

    /// Count parameter: missing defaults to 1, and zero means 1.
    fn param_count(&self, idx: usize) -> usize {
        self.param(idx, 1).max(1)
    }

    fn csi_dispatch(&mut self, final_byte: char, remote: &mut dyn RemoteSink) {
        self.parser = ParserState::Ground;
        trace!(final_byte = %final_byte, params = ?self.params, private = self.csi_private, "CSI dispatch");
        match final_byte {
            '@' => self.insert_chars(self.param_count(0)),
            'A' => self.cursor_up(self.param_count(0), true),
            'B' => self.cursor_down(self.param_count(0), true),
            'C' => self.cursor_right(self.param_count(0), true),
            'D' => self.cursor_left(self.param_count(0), true),
            'E' => {
                self.cursor_down(self.param_count(0), true);
                self.cur.cursor_x = 0;
            }
            'F' => {
                self.cursor_up(self.param_count(0), true);
                self.cur.cursor_x = 0;
            }
            'G' | '`' => {
                let col = self.param_count(0) - 1;
                self.cur.cursor_x = col.min(self.effective_right_margin());
                self.wrap_line_flag = false;
            }
            'H' | 'f' => {
                let row = self.param_count(0) - 1;
                let col = self.param_count(1) - 1;
                self.cursor_position(row, col);
            }
            'I' => {
                for _ in 0..self.param_count(0) {
                    self.advance_to_next_tab_stop();
                }
            }
            'J' => self.erase_in_display(self.param(0, 0)),
            'K' => self.erase_in_line(self.param(0, 0)),
            'L' => self.insert_lines(self.param_count(0)),
            'M' => self.delete_lines(self.param_count(0)),
            'P' => self.delete_chars(self.param_count(0)),
            'S' => self.region_scroll_up(self.param_count(0)),
            'T' => self.region_scroll_down(self.param_count(0)),
            'X' => self.erase_chars(self.param_count(0)),
            'Z' => {
                for _ in 0..self.param_count(0) {
                    self.back_tab();
                }
            }
            'c' => {
                if !self.csi_gt && self.param(0, 0) == 0 {
                    self.device_attributes(remote);
                }
            }
            'd' => {
                let row = self.param_count(0) - 1;
                let row = if self.cur.origin_mode {
                    (row + self.scroll_top).min(self.scroll_bottom)
                } else {
                    row.min(self.height - 1)
                };
                self.cur.cursor_y = row;
                self.wrap_line_flag = false;
            }
            'g' => self.tab_clear(self.param(0, 0)),
            'h' => self.set_modes(true),
            'l' => self.set_modes(false),
            'm' => self.select_graphic_rendition(),
            'n' => self.device_status_report(remote),
            'q' => {} // DECLL: keyboard LEDs, nothing to light
            'r' => self.set_scroll_region(),
            's' => self.save_cursor(),
            'u' => self.restore_cursor(),
            _ => {}
        }
        self.clear_csi();
    }

    // ── Printing ────────────────────────────────────────────────────

    fn map_character(&mut self, ch: char) -> char {
        let cp = ch as u32;
        if cp > 0xFF {
            return ch;
        }
        let set = if (0xA0..=0xFF).contains(&cp) {
            self.cur.g[self.cur.gr.index()]
        } else {
            match std::mem::take(&mut self.single_shift) {
                SingleShift::Ss2 => self.cur.g[2],
                SingleShift::Ss3 => self.cur.g[3],
                SingleShift::None => self.cur.g[self.cur.gl.index()],
            }
        };
        charset::map_char(set, ch)
    }

    /// The right margin for the cursor's line: halved on double-width.
    fn effective_right_margin(&self) -> usize {
        if self.display[self.cur.cursor_y].double_width {
            (self.width / 2).saturating_sub(1)
        } else {
            self.right_margin
        }
    }

    fn print_character(&mut self, ch: char) {
        let margin = self.effective_right_margin();

        if !self.autowrap {
            let x = self.cur.cursor_x.min(margin);
            self.place_glyph(x, ch);
            if self.cur.cursor_x < margin {
                self.cur.cursor_x += 1;
            }
            return;
        }

        if self.cur.cursor_x == margin && !self.wrap_line_flag {
            // The VT100 quirk: printing at the margin leaves the cursor put
            // and arms the pending wrap.
            self.wrap_line_flag = true;
            self.place_glyph(self.cur.cursor_x, ch);
        } else if self.cur.cursor_x == margin && self.wrap_line_flag {
            // Wrap, then place at column 0 of the next line.
            if self.cur.cursor_y == self.scroll_bottom {
                self.linefeed();
            } else {
                self.cur.cursor_y += 1;
            }
            self.cur.cursor_x = 0;
            self.wrap_line_flag = false;
            self.place_glyph(0, ch);
            self.cur.cursor_x = 1.min(self.effective_right_margin());
        } else {
            if self.insert_mode {
                let width = self.width;
                let x = self.cur.cursor_x;
                self.display[self.cur.cursor_y].insert_blank(x, width);
            }
            self.place_glyph(self.cur.cursor_x, ch);
            self.wrap_line_flag = false;
            if self.cur.cursor_x < margin {
                self.cur.cursor_x += 1;
            }
        }
    }

    fn place_glyph(&mut self, x: usize, ch: char) {
        let attrs = if self.cur.pen.reverse {
            self.cur.pen.attrs.reversed()
        } else {
            self.cur.pen.attrs
        };
        let y = self.cur.cursor_y;
        self.display[y].set_cell(x, Cell::with_attrs(ch, attrs));
    }

    // ── Cursor motion ───────────────────────────────────────────────

    fn cursor_up(&mut self, n: usize, honor_region: bool) {
        if n == 0 {
            return;
        }
        let top = if honor_region && self.cur.cursor_y >= self.scroll_top {
            self.scroll_top
        } else {
            0
        };
        self.cur.cursor_y = self.cur.cursor_y.saturating_sub(n).max(top);
        self.wrap_line_flag = false;
    }

    fn cursor_down(&mut self, n: usize, honor_region: bool) {
        if n == 0 {
            return;
        }
        let bottom = if honor_region && self.cur.cursor_y <= self.scroll_bottom {
            self.scroll_bottom
        } else {
            self.height - 1
        };
        self.cur.cursor_y = (self.cur.cursor_y + n).min(bottom);
        self.wrap_line_flag = false;
    }

    fn cursor_left(&mut self, n: usize, _honor_region: bool) {
        if n == 0 {
            return;
        }
        self.cur.cursor_x = self.cur.cursor_x.saturating_sub(n);
        self.wrap_line_flag = false;
    }

    fn cursor_right(&mut self, n: usize, _honor_region: bool) {
        if n == 0 {
            return;
        }
        let margin = self.effective_right_margin();
        self.cur.cursor_x = (self.cur.cursor_x + n).min(margin);
        self.wrap_line_flag = false;
    }

    /// Absolute cursor positioning; origin mode offsets the row into the
    /// scroll region.
    fn cursor_position(&mut self, row: usize, col: usize) {
        let row = if self.cur.origin_mode {
            (row + self.scroll_top).min(self.scroll_bottom)
        } else {
            row.min(self.height - 1)
        };
        self.cur.cursor_y = row;
        self.cur.cursor_x = col.min(self.effective_right_margin());
        self.wrap_line_flag = false;
    }

    // ── Scrolling ───────────────────────────────────────────────────

    fn blank_line(&self) -> DisplayLine {
        DisplayLine::new(self.reverse_video)
    }

    /// Line feed: move down, scrolling (or spilling into scrollback) at the
    /// bottom of the scroll region.
    fn linefeed(&mut self) {
        self.index();
        if self.newline_mode {
            self.cur.cursor_x = 0;
        }
    }

    /// IND: like line feed, but never touches the column.
    fn index(&mut self) {
        if self.cur.cursor_y == self.scroll_bottom {
            if self.scroll_top == 0 && self.scroll_bottom == self.height - 1 {
                // Full-screen region: the top line retires to scrollback.
                let line = self.display.remove(0);
                self.scrollback.push(line);
                let blank = self.blank_line();
                self.display.push(blank);
            } else {
                self.scroll_region_lines_up(1);
            }
        } else if self.cur.cursor_y < self.height - 1 {
            self.cur.cursor_y += 1;
        }
        self.wrap_line_flag = false;
    }

    /// RI: move up, scrolling the region down at the top.
    fn reverse_index(&mut self) {
        if self.cur.cursor_y == self.scroll_top {
            self.scroll_region_lines_down(1);
        } else if self.cur.cursor_y > 0 {
            self.cur.cursor_y -= 1;
        }
        self.wrap_line_flag = false;
    }

    fn scroll_region_lines_up(&mut self, n: usize) {
        let span = self.scroll_bottom - self.scroll_top + 1;
        let n = n.min(span);
        for _ in 0..n {
            self.display.remove(self.scroll_top);
            let blank = self.blank_line();
            self.display.insert(self.scroll_bottom, blank);
        }
    }

    fn scroll_region_lines_down(&mut self, n: usize) {
        let span = self.scroll_bottom - self.scroll_top + 1;
        let n = n.min(span);
        for _ in 0..n {
            self.display.remove(self.scroll_bottom);
            let blank = self.blank_line();
            self.display.insert(self.scroll_top, blank);
        }
    }

    /// SU: scroll the region up without involving the cursor.
    fn region_scroll_up(&mut self, n: usize) {
        self.scroll_region_lines_up(n);
    }

    /// SD: scroll the region down.
    fn region_scroll_down(&mut self, n: usize) {
        self.scroll_region_lines_down(n);
    }

    /// IL: insert blank lines at the cursor row, within the scroll region.
    fn insert_lines(&mut self, n: usize) {
        let row = self.cur.cursor_y;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let n = n.min(self.scroll_bottom - row + 1);
        for _ in 0..n {
            self.display.remove(self.scroll_bottom);
            let blank = self.blank_line();
            self.display.insert(row, blank);
        }
    }

    /// DL: delete lines at the cursor row, within the scroll region.
    fn delete_lines(&mut self, n: usize) {
        let row = self.cur.cursor_y;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let n = n.min(self.scroll_bottom - row + 1);
        for _ in 0..n {
            self.display.remove(row);
            let blank = self.blank_line();
            self.display.insert(self.scroll_bottom, blank);
        }
    }

    // ── Erase ───────────────────────────────────────────────────────

    fn erase_in_display(&mut self, mode: usize) {
        match mode {
            0 => self.erase_below(),
            1 => self.erase_above(),
            2 => {
                for y in 0..self.height {
                    self.display[y].erase(0, self.width);
                }
            }
            _ => {}
        }
    }

    fn erase_below(&mut self) {
        let (x, y) = (self.cur.cursor_x, self.cur.cursor_y);
        self.display[y].erase(x, self.width);
        for row in y + 1..self.height {
            self.display[row].erase(0, self.width);
        }
    }

    fn erase_above(&mut self) {
        let (x, y) = (self.cur.cursor_x, self.cur.cursor_y);
        for row in 0..y {
            self.display[row].erase(0, self.width);
        }
        self.display[y].erase(0, x + 1);
    }

    fn erase_in_line(&mut self, mode: usize) {
        match mode {
            0 => self.erase_line_right(),
            1 => {
                let (x, y) = (self.cur.cursor_x, self.cur.cursor_y);
                self.display[y].erase(0, x + 1);
            }
            2 => {
                let y = self.cur.cursor_y;
                self.display[y].erase(0, self.width);
            }
            _ => {}
        }
    }

    fn erase_line_right(&mut self) {
        let (x, y) = (self.cur.cursor_x, self.cur.cursor_y);
        self.display[y].erase(x, self.width);
    }

    /// ECH: blank `n` cells at the cursor without moving anything.
    fn erase_chars(&mut self, n: usize) {
        let (x, y) = (self.cur.cursor_x, self.cur.cursor_y);
        let end = (x + n).min(self.width);
        self.display[y].erase(x, end);
    }

    /// ICH: shift the tail of the line right, blanking at the cursor.
    fn insert_chars(&mut self, n: usize) {
        let width = self.width;
        let x = self.cur.cursor_x;
        for _ in 0..n.min(width) {
            self.display[self.cur.cursor_y].insert_blank(x, width);
        }
    }

    /// DCH: shift the tail of the line left over the cursor.
    fn delete_chars(&mut self, n: usize) {
        let width = self.width;
        let x = self.cur.cursor_x;
        for _ in 0..n.min(width) {
            self.display[self.cur.cursor_y].delete_cell(x, width);
        }
    }

    // ── Line attributes ─────────────────────────────────────────────

    fn set_line_width(&mut self, double: bool) {
        let y = self.cur.cursor_y;
        self.display[y].double_width = double;
        if !double {
            self.display[y].double_height = DoubleHeight::None;
        }
        let margin = self.effective_right_margin();
        self.cur.cursor_x = self.cur.cursor_x.min(margin);
    }

    fn set_line_height(&mut self, half: DoubleHeight) {
        let y = self.cur.cursor_y;
        self.display[y].double_height = half;
        self.display[y].double_width = true;
        let margin = self.effective_right_margin();
        self.cur.cursor_x = self.cur.cursor_x.min(margin);
    }

    /// DECALN: fill the display with 'E'.
    fn screen_alignment(&mut self) {
        for line in &mut self.display {
            for x in 0..self.width {
                line.set_cell(x, Cell::new('E'));
            }
            line.double_width = false;
            line.double_height = DoubleHeight::None;
        }
        self.cursor_position(0, 0);
    }

    // ── Tabs ────────────────────────────────────────────────────────

    fn advance_to_next_tab_stop(&mut self) {
        let margin = self.effective_right_margin();
        let next = self
            .tab_stops
            .iter()
            .copied()
            .find(|&stop| stop > self.cur.cursor_x);
        self.cur.cursor_x = next.unwrap_or(margin).min(margin);
    }

    fn back_tab(&mut self) {
        let prev = self
            .tab_stops
            .iter()
            .rev()
            .copied()
            .find(|&stop| stop < self.cur.cursor_x);
        self.cur.cursor_x = prev.unwrap_or(0);
    }

    fn set_tab_stop(&mut self) {
        let x = self.cur.cursor_x;
        if let Err(pos) = self.tab_stops.binary_search(&x) {
            self.tab_stops.insert(pos, x);
        }
    }

    fn tab_clear(&mut self, mode: usize) {
        match mode {
            0 => {
                let x = self.cur.cursor_x;
                self.tab_stops.retain(|&stop| stop != x);
            }
            3 => self.tab_stops.clear(),
            _ => {}
        }
    }

    // ── Save / restore and resets ───────────────────────────────────

    /// DECSC.
    fn save_cursor(&mut self) {
        self.saved = self.cur.clone();
    }

    /// DECRC.
    fn restore_cursor(&mut self) {
        self.cur = self.saved.clone();
        self.cur.cursor_x = self.cur.cursor_x.min(self.width - 1);
        self.cur.cursor_y = self.cur.cursor_y.min(self.height - 1);
    }

    /// RIS: full reset. Dimensions are kept (DECCOLM reverts to 80) and the
    /// scrollback survives, matching xterm.
    pub fn reset(&mut self) {
        if self.columns_132 {
            self.set_width(DEFAULT_WIDTH);
            self.columns_132 = false;
        }
        self.display = (0..self.height).map(|_| DisplayLine::new(false)).collect();
        self.parser = ParserState::Ground;
        self.clear_csi();
        self.osc.clear();
        self.cur = SaveableState::default();
        self.saved = SaveableState::default();
        self.single_shift = SingleShift::None;
        self.scroll_top = 0;
        self.scroll_bottom = self.height - 1;
        self.right_margin = self.width - 1;
        self.s8c1t = false;
        self.insert_mode = false;
        self.vt52_mode = false;
        self.wrap_line_flag = false;
        self.reverse_video = false;
        self.newline_mode = false;
        self.autowrap = true;
        self.cursor_visible = true;
        self.arrow_key_mode = ArrowKeyMode::Ansi;
        self.keypad_mode = KeypadMode::Numeric;
        self.tab_stops = default_tab_stops(self.width);
        self.title = None;
    }

    /// DECSTR: soft reset — modes and attributes, but not the screen.
    fn soft_reset(&mut self) {
        self.cur.pen = Pen::default();
        self.cur.origin_mode = false;
        self.cur.g = [CharacterSet::UsAscii; 4];
        self.cur.gl = Shift::G0;
        self.cur.gr = Shift::G2;
        self.saved = SaveableState::default();
        self.insert_mode = false;
        self.autowrap = true;
        self.cursor_visible = true;
        self.scroll_top = 0;
        self.scroll_bottom = self.height - 1;
        self.single_shift = SingleShift::None;
    }

    // ── Modes ───────────────────────────────────────────────────────

    fn set_modes(&mut self, enable: bool) {
        for idx in 0..self.params.len().max(1) {
            let mode = self.param(idx, usize::MAX);
            if mode == usize::MAX {
                continue;
            }
            if self.csi_private {
                self.set_dec_mode(mode, enable);
            } else {
                self.set_ansi_mode(mode, enable);
            }
        }
    }

    fn set_ansi_mode(&mut self, mode: usize, enable: bool) {
        match mode {
            4 => self.insert_mode = enable,
            20 => self.newline_mode = enable,
            _ => {}
        }
    }

    fn set_dec_mode(&mut self, mode: usize, enable: bool) {
        match mode {
            // DECCKM: cursor key application mode.
            1 => {
                self.arrow_key_mode = if enable {
                    ArrowKeyMode::Vt100
                } else {
                    ArrowKeyMode::Ansi
                };
            }
            // DECANM: reset drops to VT52 operation.
            2 => {
                if !enable {
                    self.vt52_mode = true;
                    self.arrow_key_mode = ArrowKeyMode::Vt52;
                    self.cur.g = [CharacterSet::UsAscii; 4];
                    self.cur.gl = Shift::G0;
                    self.cur.gr = Shift::G2;
                }
            }
            // DECCOLM: 132/80 columns; clears the screen and homes.
            3 => {
                self.columns_132 = enable;
                self.set_width(if enable { WIDTH_132 } else { DEFAULT_WIDTH });
                self.erase_in_display(2);
                self.scroll_top = 0;
                self.scroll_bottom = self.height - 1;
                self.cursor_position(0, 0);
            }
            // DECSCNM: reverse video, applied to the visible lines.
            5 => {
                if self.reverse_video != enable {
                    self.reverse_video = enable;
                    for line in &mut self.display {
                        line.reverse_color = enable;
                    }
                }
            }
            // DECOM: origin mode homes the cursor.
            6 => {
                self.cur.origin_mode = enable;
                self.cursor_position(0, 0);
            }
            // DECAWM.
            7 => self.autowrap = enable,
            // DECARM: autorepeat is the keyboard's business.
            8 => {}
            // DECTCEM.
            25 => self.cursor_visible = enable,
            _ => {}
        }
    }

    fn set_width(&mut self, width: usize) {
        self.width = width.clamp(1, crate::MAX_LINE);
        self.right_margin = self.width - 1;
        self.cur.cursor_x = self.cur.cursor_x.min(self.right_margin);
        self.tab_stops = default_tab_stops(self.width);
    }

    /// Host-driven resize.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.set_width(width);
        let height = height.max(1);
        while self.display.len() > height {
            let line = self.display.remove(0);
            self.scrollback.push(line);
        }
        while self.display.len() < height {
            let blank = self.blank_line();
            self.display.push(blank);
        }
        self.height = height;
        self.scroll_top = 0;
        self.scroll_bottom = height - 1;
        self.cur.cursor_y = self.cur.cursor_y.min(height - 1);
    }

    // ── SGR ─────────────────────────────────────────────────────────

    fn select_graphic_rendition(&mut self) {
        if self.params.is_empty() {
            self.cur.pen = Pen::default();
            return;
        }
        let mut idx = 0;
        while idx < self.params.len() {
            let p = self.param(idx, 0);
            match p {
                0 => self.cur.pen = Pen::default(),
                1 => self.cur.pen.attrs.bold = true,
                5 => self.cur.pen.attrs.blink = true,
                7 => self.cur.pen.reverse = true,
                21 | 22 => self.cur.pen.attrs.bold = false,
                25 => self.cur.pen.attrs.blink = false,
                27 => self.cur.pen.reverse = false,
                30..=37 => self.cur.pen.attrs.fg = TermColor::from_index((p - 30) as u8),
                39 => self.cur.pen.attrs.fg = TermColor::White,
                40..=47 => self.cur.pen.attrs.bg = TermColor::from_index((p - 40) as u8),
                49 => self.cur.pen.attrs.bg = TermColor::Black,
                // Extended color introducers: skip their arguments so the
                // rest of the parameter list stays aligned.
                38 | 48 => {
                    let kind = self.param(idx + 1, 0);
                    idx += match kind {
                        5 => 2,
                        2 => 4,
                        _ => 1,
                    };
                }
                // Bright variants fold onto the base palette.
                90..=97 => self.cur.pen.attrs.fg = TermColor::from_index((p - 90) as u8),
                100..=107 => self.cur.pen.attrs.bg = TermColor::from_index((p - 100) as u8),
                _ => {}
            }
            idx += 1;
        }
    }

    // ── Replies ─────────────────────────────────────────────────────

    /// DA / DECID reply for the configured device type.
    fn device_attributes(&mut self, remote: &mut dyn RemoteSink) {
        let reply: &[u8] = match self.device {
            DeviceType::Vt100 | DeviceType::Xterm => b"\x1b[?1;2c",
            DeviceType::Vt102 => b"\x1b[?6c",
            DeviceType::Vt220 => {
                if self.s8c1t {
                    b"\x9b?62;1;6c"
                } else {
                    b"\x1b[?62;1;6c"
                }
            }
        };
        remote.write_remote(reply);
    }

    fn device_status_report(&mut self, remote: &mut dyn RemoteSink) {
        let p = self.param(0, 0);
        if self.csi_private {
            match p {
                // Printer status: none attached.
                15 => remote.write_remote(b"\x1b[?13n"),
                // UDK locked.
                25 => remote.write_remote(b"\x1b[?21n"),
                // Keyboard: North American.
                26 => remote.write_remote(b"\x1b[?27;1n"),
                _ => {}
            }
            return;
        }
        match p {
            5 => remote.write_remote(b"\x1b[0n"),
            6 => {
                let row = if self.cur.origin_mode {
                    self.cur.cursor_y - self.scroll_top + 1
                } else {
                    self.cur.cursor_y + 1
                };
                let col = self.cur.cursor_x + 1;
                remote.write_remote(format!("\x1b[{row};{col}R").as_bytes());
            }
            _ => {}
        }
    }

    // ── Regions and OSC ─────────────────────────────────────────────

    /// DECSTBM.
    fn set_scroll_region(&mut self) {
        let top = self.param(0, 1).max(1);
        let bottom = self.param(1, self.height).max(1).min(self.height);
        if top >= bottom {
            return;
        }
        self.scroll_top = top - 1;
        self.scroll_bottom = bottom - 1;
        self.cursor_position(0, 0);
    }

    fn osc_dispatch(&mut self) {
        let osc = std::mem::take(&mut self.osc);
        let Some((cmd, rest)) = osc.split_once(';') else {
            return;
        };
        match cmd {
            "0" | "2" => self.title = Some(rest.to_string()),
            _ => {}
        }
    }
}

fn default_tab_stops(width: usize) -> Vec<usize> {
    (0..width).step_by(8).collect()
}
