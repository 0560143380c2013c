//! The double-buffered screen.
//!
//! Widgets draw into the logical grid through an offset/clip window; the
//! physical grid mirrors what is on the terminal. `flush` walks the two
//! row-major and emits only what differs: stale cells in a row's leading
//! blank run collapse into clear-to-beginning-of-line, a stale blank tail
//! into clear-to-end-of-line, and a fully blank row into clear-line.
//!
//! Invariants:
//! - any mutation that lands in the logical grid sets `dirty`
//! - after `flush`, `physical == logical` and `dirty` is clear
//! - reallocation blanks both grids and forces a full repaint

use tatami_core::cell::{Cell, CellAttrs};

use crate::ansi;

/// Double-buffered cell grid with minimal-diff flush.
#[derive(Debug, Clone)]
pub struct Screen {
    width: usize,
    height: usize,
    logical: Vec<Cell>,
    physical: Vec<Cell>,
    dirty: bool,
    really_cleared: bool,
    offset_x: i32,
    offset_y: i32,
    clip_x: i32,
    clip_y: i32,
}

impl Screen {
    /// Create a screen of the given size, blank and due for a full repaint.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            logical: vec![Cell::default(); len],
            physical: vec![Cell::default(); len],
            dirty: true,
            really_cleared: true,
            offset_x: 0,
            offset_y: 0,
            clip_x: width as i32,
            clip_y: height as i32,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// The drawing offset added to every coordinate after the clip test.
    #[must_use]
    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    pub fn set_offset(&mut self, x: i32, y: i32) {
        self.offset_x = x;
        self.offset_y = y;
    }

    /// The clip rectangle: exclusive upper bounds on pre-offset coordinates.
    #[must_use]
    pub fn clip(&self) -> (i32, i32) {
        (self.clip_x, self.clip_y)
    }

    pub fn set_clip(&mut self, clip_x: i32, clip_y: i32) {
        self.clip_x = clip_x.max(0);
        self.clip_y = clip_y.max(0);
    }

    /// Reset the clip window to the full grid.
    pub fn reset_clip(&mut self) {
        self.clip_x = self.width as i32;
        self.clip_y = self.height as i32;
    }

    /// Read a logical cell at absolute (post-offset) coordinates.
    #[must_use]
    pub fn logical_cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.logical[y * self.width + x])
        } else {
            None
        }
    }

    /// Read a physical cell at absolute coordinates.
    #[must_use]
    pub fn physical_cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.physical[y * self.width + x])
        } else {
            None
        }
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Put a glyph with attributes at `(x, y)`.
    ///
    /// The pre-offset coordinate must fall inside the clip window and the
    /// post-offset coordinate inside the grid; otherwise the write is
    /// dropped.
    pub fn put_char(&mut self, x: i32, y: i32, ch: char, attrs: CellAttrs) {
        if !self.in_clip(x, y) {
            return;
        }
        self.put_absolute(
            x + self.offset_x,
            y + self.offset_y,
            Cell::with_attrs(ch, attrs),
        );
    }

    /// Put a string left-to-right starting at `(x, y)`, truncating at the
    /// grid edge.
    pub fn put_str(&mut self, x: i32, y: i32, s: &str, attrs: CellAttrs) {
        for (i, ch) in s.chars().enumerate() {
            let cx = x + i as i32;
            if cx + self.offset_x >= self.width as i32 {
                break;
            }
            self.put_char(cx, y, ch, attrs);
        }
    }

    /// Replace the attributes at `(x, y)`, leaving the glyph intact.
    pub fn put_attr(&mut self, x: i32, y: i32, attrs: CellAttrs) {
        if !self.in_clip(x, y) {
            return;
        }
        self.put_attr_absolute(x + self.offset_x, y + self.offset_y, attrs);
    }

    /// Attribute write that honors the offset but bypasses the clip window.
    ///
    /// Box shadows use this: a shadow must darken cells outside its owner's
    /// clip rectangle.
    pub fn put_attr_unclipped(&mut self, x: i32, y: i32, attrs: CellAttrs) {
        self.put_attr_absolute(x + self.offset_x, y + self.offset_y, attrs);
    }

    fn in_clip(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.clip_x && y < self.clip_y
    }

    fn put_absolute(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.logical[y as usize * self.width + x as usize] = cell;
        self.dirty = true;
    }

    fn put_attr_absolute(&mut self, x: i32, y: i32, attrs: CellAttrs) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.logical[y as usize * self.width + x as usize].attrs = attrs;
        self.dirty = true;
    }

    /// Reallocate both grids to the new size, blank, and force a full
    /// repaint on the next flush.
    pub fn resize(&mut self, width: usize, height: usize) {
        let len = width * height;
        self.width = width;
        self.height = height;
        self.logical = vec![Cell::default(); len];
        self.physical = vec![Cell::default(); len];
        self.clip_x = width as i32;
        self.clip_y = height as i32;
        self.offset_x = 0;
        self.offset_y = 0;
        self.dirty = true;
        self.really_cleared = true;
    }

    /// Blank the logical grid and clear the offset and clip window.
    pub fn reset(&mut self) {
        for cell in &mut self.logical {
            cell.reset();
        }
        self.offset_x = 0;
        self.offset_y = 0;
        self.reset_clip();
        self.dirty = true;
    }

    // ── Flush ───────────────────────────────────────────────────────

    /// Compute the escape-sequence delta from physical to logical, updating
    /// the physical grid and clearing the dirty flags.
    pub fn flush(&mut self) -> String {
        let mut out = String::new();
        let mut pen: Option<CellAttrs> = None;

        if self.really_cleared {
            ansi::normal(&mut out);
            out.push_str(ansi::CLEAR_ALL);
            pen = Some(CellAttrs::default());
            for cell in &mut self.physical {
                *cell = Cell::default();
            }
        }

        for y in 0..self.height {
            self.flush_row(y, &mut out, &mut pen);
        }

        self.dirty = false;
        self.really_cleared = false;
        out
    }

    fn flush_row(&mut self, y: usize, out: &mut String, pen: &mut Option<CellAttrs>) {
        let w = self.width;
        let row = y * w;

        // First and one-past-last non-blank logical cells in this row.
        let mut text_begin: Option<usize> = None;
        let mut text_end = 0usize;
        for x in 0..w {
            if !self.logical[row + x].is_blank() {
                if text_begin.is_none() {
                    text_begin = Some(x);
                }
                text_end = x + 1;
            }
        }

        // Entirely blank row: a single clear-line covers any stale content.
        if text_end == 0 {
            let stale = (0..w).any(|i| self.logical[row + i] != self.physical[row + i]);
            if stale {
                ansi::cup(out, y, 0);
                ansi::normal(out);
                out.push_str(ansi::CLEAR_LINE);
                *pen = Some(CellAttrs::default());
                for i in 0..w {
                    self.physical[row + i] = self.logical[row + i];
                }
            }
            return;
        }

        // Where the terminal cursor sits within this row, if known.
        let mut cursor: Option<usize> = None;

        // Stale cells in the leading blank run collapse into one
        // clear-to-beginning-of-line at the last stale column.
        let lead_end = text_begin.unwrap_or(w);
        if let Some(last_stale) = (0..lead_end)
            .rev()
            .find(|&i| self.logical[row + i] != self.physical[row + i])
        {
            ansi::cup(out, y, last_stale);
            ansi::normal(out);
            out.push_str(ansi::CLEAR_TO_BOL);
            *pen = Some(CellAttrs::default());
            for i in 0..=last_stale {
                self.physical[row + i] = self.logical[row + i];
            }
            cursor = Some(last_stale);
        }

        for x in lead_end..w {
            if x == text_end && text_end < w {
                // The rest of the row is blank in the logical grid: one
                // clear-to-end-of-line replaces any per-cell writes.
                let stale = (x..w).any(|i| self.logical[row + i] != self.physical[row + i]);
                if stale {
                    if cursor != Some(x) {
                        ansi::cup(out, y, x);
                    }
                    ansi::normal(out);
                    out.push_str(ansi::CLEAR_TO_EOL);
                    *pen = Some(CellAttrs::default());
                    for i in x..w {
                        self.physical[row + i] = self.logical[row + i];
                    }
                }
                return;
            }

            if self.logical[row + x] == self.physical[row + x] {
                continue;
            }

            if cursor != Some(x) {
                ansi::cup(out, y, x);
            }
            let cell = self.logical[row + x];
            emit_attr_delta(out, pen, cell.attrs);
            out.push(cell.ch);
            self.physical[row + x] = cell;
            cursor = Some(x + 1);
        }
    }
}

/// Emit the smallest SGR sequence that moves `pen` to `attrs`.
///
/// The first emitted cell of a flush pins the pen with a single reset.
/// Color-only changes use the short color forms; any flag change falls back
/// to the full reset form because bold/blink cannot be cleared piecemeal
/// across all terminals.
fn emit_attr_delta(out: &mut String, pen: &mut Option<CellAttrs>, attrs: CellAttrs) {
    let prev = match pen {
        Some(p) => *p,
        None => {
            ansi::normal(out);
            *pen = Some(CellAttrs::default());
            CellAttrs::default()
        }
    };

    if attrs == prev {
        return;
    }

    if attrs.bold != prev.bold || attrs.blink != prev.blink {
        ansi::sgr_full(out, attrs);
    } else if attrs.fg != prev.fg && attrs.bg != prev.bg {
        ansi::sgr_colors(out, attrs.fg, attrs.bg);
    } else if attrs.fg != prev.fg {
        ansi::sgr_fg(out, attrs.fg);
    } else {
        ansi::sgr_bg(out, attrs.bg);
    }
    *pen = Some(attrs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tatami_core::cell::TermColor;

    #[test]
    fn new_screen_needs_full_repaint() {
        let mut screen = Screen::new(10, 3);
        assert!(screen.dirty());
        let out = screen.flush();
        assert!(out.contains("\x1b[2J"));
        assert!(!screen.dirty());
    }

    #[test]
    fn put_char_sets_dirty_and_lands() {
        let mut screen = Screen::new(10, 3);
        let _ = screen.flush();
        screen.put_char(2, 1, 'x', CellAttrs::default());
        assert!(screen.dirty());
        assert_eq!(screen.logical_cell(2, 1).unwrap().ch, 'x');
    }

    #[test]
    fn offset_shifts_writes() {
        let mut screen = Screen::new(10, 3);
        screen.set_offset(3, 1);
        screen.put_char(0, 0, 'A', CellAttrs::default());
        assert_eq!(screen.logical_cell(3, 1).unwrap().ch, 'A');
    }

    #[test]
    fn clip_tests_pre_offset_coordinates() {
        let mut screen = Screen::new(10, 3);
        screen.set_offset(2, 0);
        screen.set_clip(3, 3);
        screen.put_char(2, 0, 'a', CellAttrs::default()); // inside clip, lands at x=4
        screen.put_char(3, 0, 'b', CellAttrs::default()); // outside clip
        assert_eq!(screen.logical_cell(4, 0).unwrap().ch, 'a');
        assert!(screen.logical_cell(5, 0).unwrap().is_blank());
    }

    #[test]
    fn negative_offset_clamps_at_grid_edge() {
        let mut screen = Screen::new(10, 3);
        screen.set_offset(-2, 0);
        screen.put_char(1, 0, 'x', CellAttrs::default()); // lands at -1: dropped
        screen.put_char(2, 0, 'y', CellAttrs::default()); // lands at 0
        assert_eq!(screen.logical_cell(0, 0).unwrap().ch, 'y');
    }

    #[test]
    fn put_str_truncates_at_width() {
        let mut screen = Screen::new(5, 1);
        screen.put_str(3, 0, "abcdef", CellAttrs::default());
        assert_eq!(screen.logical_cell(3, 0).unwrap().ch, 'a');
        assert_eq!(screen.logical_cell(4, 0).unwrap().ch, 'b');
    }

    #[test]
    fn put_attr_keeps_glyph() {
        let mut screen = Screen::new(5, 1);
        screen.put_char(1, 0, 'Q', CellAttrs::default());
        screen.put_attr(1, 0, CellAttrs::new(TermColor::Red, TermColor::Blue));
        let cell = screen.logical_cell(1, 0).unwrap();
        assert_eq!(cell.ch, 'Q');
        assert_eq!(cell.attrs.fg, TermColor::Red);
    }

    #[test]
    fn flush_converges_physical_to_logical() {
        let mut screen = Screen::new(10, 2);
        let _ = screen.flush();
        screen.put_str(0, 0, "hi", CellAttrs::default());
        let _ = screen.flush();
        assert_eq!(screen.physical_cell(0, 0).unwrap().ch, 'h');
        assert_eq!(screen.physical_cell(1, 0).unwrap().ch, 'i');
        assert!(!screen.dirty());
    }

    #[test]
    fn flush_twice_second_is_empty() {
        let mut screen = Screen::new(20, 4);
        let _ = screen.flush();
        screen.put_str(2, 1, "hello", CellAttrs::new(TermColor::Green, TermColor::Black));
        let first = screen.flush();
        assert!(!first.is_empty());
        assert_eq!(screen.flush(), "");
    }

    #[test]
    fn identical_redraw_flushes_empty() {
        let mut screen = Screen::new(20, 4);
        screen.put_str(0, 0, "same", CellAttrs::default());
        let _ = screen.flush();
        // Draw the identical content again: logical == physical.
        screen.put_str(0, 0, "same", CellAttrs::default());
        assert_eq!(screen.flush(), "");
    }

    #[test]
    fn same_attrs_emit_no_sgr_between_cells() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        let attrs = CellAttrs::new(TermColor::Yellow, TermColor::Blue);
        screen.put_char(0, 0, 'a', attrs);
        screen.put_char(1, 0, 'a', attrs);
        let out = screen.flush();
        // One positioning, one reset, one SGR, then the glyphs back to back.
        let after_sgr = out
            .rfind('m')
            .map(|i| &out[i + 1..])
            .expect("flush must emit at least one SGR");
        assert_eq!(after_sgr, "aa");
    }

    #[test]
    fn color_only_change_uses_short_form() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        screen.put_char(0, 0, 'a', CellAttrs::new(TermColor::Red, TermColor::Black));
        screen.put_char(1, 0, 'b', CellAttrs::new(TermColor::Green, TermColor::Black));
        let out = screen.flush();
        // fg-only delta between the cells: CSI 32 m, not a full reset.
        assert!(out.contains("a\x1b[32mb"), "unexpected flush: {out:?}");
    }

    #[test]
    fn bold_change_uses_full_reset_form() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        screen.put_char(0, 0, 'a', CellAttrs::default().with_bold(true));
        screen.put_char(1, 0, 'b', CellAttrs::default());
        let out = screen.flush();
        assert!(
            out.contains("a\x1b[0;37;40mb"),
            "dropping bold needs the reset form: {out:?}"
        );
    }

    #[test]
    fn blank_tail_collapses_to_clear_to_eol() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        screen.put_str(0, 0, "wide text!", CellAttrs::default());
        let _ = screen.flush();
        // Replace with shorter text: the stale tail must clear via EL0.
        screen.reset();
        screen.put_str(0, 0, "w", CellAttrs::default());
        let out = screen.flush();
        assert!(out.contains("\x1b[K"), "expected clear-to-EOL: {out:?}");
        assert!(screen.physical_cell(5, 0).unwrap().is_blank());
    }

    #[test]
    fn leading_blanks_collapse_to_clear_to_bol() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        screen.put_str(0, 0, "abcde", CellAttrs::default());
        let _ = screen.flush();
        // Blank the head, keep the tail: EL1 covers the stale cells.
        screen.reset();
        screen.put_str(3, 0, "de", CellAttrs::default());
        let out = screen.flush();
        assert!(out.contains("\x1b[1K"), "expected clear-to-BOL: {out:?}");
        assert!(screen.physical_cell(0, 0).unwrap().is_blank());
        assert_eq!(screen.physical_cell(3, 0).unwrap().ch, 'd');
    }

    #[test]
    fn blank_row_collapses_to_clear_line() {
        let mut screen = Screen::new(10, 2);
        let _ = screen.flush();
        screen.put_str(0, 1, "0123456789", CellAttrs::default());
        let _ = screen.flush();
        screen.reset();
        let out = screen.flush();
        assert!(out.contains("\x1b[2K"), "expected clear-line: {out:?}");
        assert!(screen.physical_cell(4, 1).unwrap().is_blank());
    }

    #[test]
    fn resize_blanks_and_forces_repaint() {
        let mut screen = Screen::new(10, 2);
        screen.put_str(0, 0, "junk", CellAttrs::default());
        let _ = screen.flush();
        screen.resize(6, 4);
        assert_eq!(screen.width(), 6);
        assert_eq!(screen.height(), 4);
        assert!(screen.logical_cell(0, 0).unwrap().is_blank());
        assert_eq!(screen.clip(), (6, 4));
        let out = screen.flush();
        assert!(out.contains("\x1b[2J"));
    }

    #[test]
    fn reset_clears_offset_and_clip() {
        let mut screen = Screen::new(8, 2);
        screen.set_offset(3, 1);
        screen.set_clip(2, 1);
        screen.put_char(0, 0, 'z', CellAttrs::default());
        screen.reset();
        assert_eq!(screen.offset(), (0, 0));
        assert_eq!(screen.clip(), (8, 2));
        assert!(screen.logical_cell(3, 1).unwrap().is_blank());
    }

    #[test]
    fn flush_positions_with_cup_for_gap() {
        let mut screen = Screen::new(20, 1);
        let _ = screen.flush();
        screen.put_char(0, 0, 'a', CellAttrs::default());
        screen.put_char(10, 0, 'b', CellAttrs::default());
        let out = screen.flush();
        assert!(out.contains("\x1b[1;1H"));
        assert!(out.contains("\x1b[1;11H"));
    }

    #[test]
    fn clear_sequences_restore_default_colors_first() {
        let mut screen = Screen::new(10, 1);
        let _ = screen.flush();
        // Colored text, then blank the tail: back-color-erase terminals
        // must see default colors before the clear.
        screen.put_str(0, 0, "colorful!!", CellAttrs::new(TermColor::White, TermColor::Red));
        let _ = screen.flush();
        screen.reset();
        screen.put_char(0, 0, 'c', CellAttrs::default());
        let out = screen.flush();
        let clear_at = out.find("\x1b[K").expect("expected clear-to-EOL");
        let before = &out[..clear_at];
        assert!(
            before.ends_with("\x1b[0;37;40m"),
            "clear must be preceded by a reset: {out:?}"
        );
    }
}
