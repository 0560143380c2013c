//! Screen cell: the fundamental unit of display content.
//!
//! A cell stores one Unicode code point plus its SGR attributes. The color
//! model is the classic 8-index palette; bold applied to the foreground
//! yields the "bright" variant on standard terminals.

/// One of the eight indexed terminal colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl TermColor {
    /// The SGR color index (0-7).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            TermColor::Black => 0,
            TermColor::Red => 1,
            TermColor::Green => 2,
            TermColor::Yellow => 3,
            TermColor::Blue => 4,
            TermColor::Magenta => 5,
            TermColor::Cyan => 6,
            TermColor::White => 7,
        }
    }

    /// Map an SGR color index to a color. Out-of-range values are masked to 0-7.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => TermColor::Black,
            1 => TermColor::Red,
            2 => TermColor::Green,
            3 => TermColor::Yellow,
            4 => TermColor::Blue,
            5 => TermColor::Magenta,
            6 => TermColor::Cyan,
            _ => TermColor::White,
        }
    }
}

/// SGR attributes for a cell: foreground/background colors plus bold and blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAttrs {
    pub fg: TermColor,
    pub bg: TermColor,
    pub bold: bool,
    pub blink: bool,
}

impl Default for CellAttrs {
    /// White on black, not bold, not blinking.
    fn default() -> Self {
        Self {
            fg: TermColor::White,
            bg: TermColor::Black,
            bold: false,
            blink: false,
        }
    }
}

impl CellAttrs {
    /// Create attributes with the given colors and no flags.
    #[must_use]
    pub const fn new(fg: TermColor, bg: TermColor) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            blink: false,
        }
    }

    /// Builder: set the bold flag.
    #[must_use]
    pub const fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Builder: set the blink flag.
    #[must_use]
    pub const fn with_blink(mut self, blink: bool) -> Self {
        self.blink = blink;
        self
    }

    /// The same attributes with foreground and background swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            fg: self.bg,
            bg: self.fg,
            bold: self.bold,
            blink: self.blink,
        }
    }

    /// Reset to the default attributes.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single character position on the grid.
///
/// Equality is structural across the glyph and all attribute fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The glyph: a single Unicode code point.
    pub ch: char,
    /// SGR attributes.
    pub attrs: CellAttrs,
}

impl Default for Cell {
    /// A freshly reset cell: space, white on black, not bold, not blinking.
    fn default() -> Self {
        Self {
            ch: ' ',
            attrs: CellAttrs::default(),
        }
    }
}

impl Cell {
    /// Create a cell with the given glyph and default attributes.
    #[must_use]
    pub fn new(ch: char) -> Self {
        Self {
            ch,
            attrs: CellAttrs::default(),
        }
    }

    /// Create a cell with the given glyph and attributes.
    #[must_use]
    pub const fn with_attrs(ch: char, attrs: CellAttrs) -> Self {
        Self { ch, attrs }
    }

    /// Whether this cell equals a freshly reset cell.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Reset to the default blank cell.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_blank_space() {
        let cell = Cell::default();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.attrs.fg, TermColor::White);
        assert_eq!(cell.attrs.bg, TermColor::Black);
        assert!(!cell.attrs.bold);
        assert!(!cell.attrs.blink);
        assert!(cell.is_blank());
    }

    #[test]
    fn space_with_nondefault_attrs_is_not_blank() {
        let cell = Cell::with_attrs(' ', CellAttrs::new(TermColor::White, TermColor::Red));
        assert!(!cell.is_blank());
    }

    #[test]
    fn color_index_round_trip() {
        for i in 0..8 {
            assert_eq!(TermColor::from_index(i).index(), i);
        }
        // Out-of-range indices are masked.
        assert_eq!(TermColor::from_index(9), TermColor::Red);
    }

    #[test]
    fn reversed_swaps_colors_only() {
        let attrs = CellAttrs::new(TermColor::Yellow, TermColor::Blue).with_bold(true);
        let rev = attrs.reversed();
        assert_eq!(rev.fg, TermColor::Blue);
        assert_eq!(rev.bg, TermColor::Yellow);
        assert!(rev.bold);
        assert!(!rev.blink);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut cell = Cell::with_attrs('X', CellAttrs::new(TermColor::Red, TermColor::Green));
        cell.reset();
        assert_eq!(cell, Cell::default());
    }

    #[test]
    fn equality_covers_every_field() {
        let base = Cell::new('a');
        let mut other = base;
        other.attrs.blink = true;
        assert_ne!(base, other);
        other.attrs.blink = false;
        assert_eq!(base, other);
    }
}
