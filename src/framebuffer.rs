//! Framebuffer differ (C6): two cell grids plus per-row FNV-1a hashes, and
//! the diff that turns two successive frames into the smallest set of cell
//! changes a renderer needs to paint.

use crate::cell::Cell;
use crate::geometry::Size;
use crate::style::TextStyle;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a_update(hash: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(hash, |h, &b| (h ^ u32::from(b)).wrapping_mul(FNV_PRIME))
}

/// 32-bit FNV-1a hash of arbitrary bytes.
pub fn fnv1a_hash(bytes: &[u8]) -> u32 {
    fnv1a_update(FNV_OFFSET_BASIS, bytes)
}

fn color_bytes(color: Option<crate::color::Color>) -> [u8; 4] {
    use crate::color::Color;
    match color {
        None => [0, 0, 0, 0],
        Some(Color::Default) => [1, 0, 0, 0],
        Some(Color::Indexed(i)) => [2, i, 0, 0],
        Some(Color::Rgb { r, g, b }) => [3, r, g, b],
    }
}

fn style_hash(hash: u32, style: &TextStyle) -> u32 {
    let flags: u8 = (style.bold as u8)
        | ((style.italic as u8) << 1)
        | ((style.underline as u8) << 2)
        | ((style.strikethrough as u8) << 3)
        | ((style.overline as u8) << 4)
        | ((style.blink as u8) << 5)
        | ((style.dim as u8) << 6)
        | ((style.inverse as u8) << 7);
    let mut h = fnv1a_update(hash, &[flags]);
    h = fnv1a_update(h, &color_bytes(style.fg));
    h = fnv1a_update(h, &color_bytes(style.bg));
    h = fnv1a_update(h, &style.link_id.unwrap_or(0).to_le_bytes());
    h
}

fn row_hash(cells: &[Cell]) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for cell in cells {
        h = fnv1a_update(h, cell.grapheme.as_bytes());
        h = fnv1a_update(h, &[cell.width]);
        h = style_hash(h, &cell.style);
    }
    h
}

/// A single cell change: position + new cell value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellChange {
    /// Column position.
    pub x: u16,
    /// Row position.
    pub y: u16,
    /// New cell value.
    pub cell: Cell,
}

/// The result of diffing two frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameDelta {
    /// The current frame's rows are a vertical shift of the previous frame's
    /// rows by `offset` (positive: content moved up), plus the per-cell
    /// changes needed to paint the band the shift newly exposed.
    ScrollShift {
        /// Row offset of the detected shift.
        offset: i32,
        /// Changes outside the shifted, already-correct band.
        changes: Vec<CellChange>,
    },
    /// No row-level shift was detected; a plain list of per-cell changes.
    CellChanges(Vec<CellChange>),
}

impl FrameDelta {
    /// Flatten into the underlying cell changes regardless of variant.
    pub fn into_changes(self) -> Vec<CellChange> {
        match self {
            FrameDelta::ScrollShift { changes, .. } => changes,
            FrameDelta::CellChanges(changes) => changes,
        }
    }

    /// Borrow the underlying cell changes regardless of variant.
    pub fn changes(&self) -> &[CellChange] {
        match self {
            FrameDelta::ScrollShift { changes, .. } => changes,
            FrameDelta::CellChanges(changes) => changes,
        }
    }
}

/// Two cell grids (`previous`, `current`) plus per-row hashes.
///
/// `current` is the grid a drawlist is interpreted into; after a successful
/// present, `previous` and `current` are swapped and `current` is reset to
/// blank for the next frame.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    current: Vec<Cell>,
    previous: Vec<Cell>,
    current_hashes: Vec<u32>,
    previous_hashes: Vec<u32>,
    width: u16,
    height: u16,
}

impl Framebuffer {
    /// Create a new framebuffer filled with blank cells in both grids.
    pub fn new(size: Size) -> Self {
        let len = usize::from(size.width) * usize::from(size.height);
        let blank_row_hash = if size.width == 0 {
            FNV_OFFSET_BASIS
        } else {
            row_hash(&vec![Cell::blank(); usize::from(size.width)])
        };
        Self {
            current: vec![Cell::blank(); len],
            previous: vec![Cell::blank(); len],
            current_hashes: vec![blank_row_hash; usize::from(size.height)],
            previous_hashes: vec![blank_row_hash; usize::from(size.height)],
            width: size.width,
            height: size.height,
        }
    }

    /// Dimensions of the framebuffer.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Width in columns.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize the framebuffer. Both grids are reset to blank.
    pub fn resize(&mut self, size: Size) {
        *self = Framebuffer::new(size);
    }

    /// Reset `current` to blank, recomputing its row hashes. Does not touch
    /// `previous`.
    pub fn clear_current(&mut self) {
        for cell in &mut self.current {
            *cell = Cell::blank();
        }
        self.recompute_all_current_hashes();
    }

    /// Read a cell from the current grid.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.current.get(self.index(x, y))
        } else {
            None
        }
    }

    /// Read a row from the current grid.
    pub fn get_row(&self, y: u16) -> Option<&[Cell]> {
        if y < self.height {
            let start = self.index(0, y);
            Some(&self.current[start..start + usize::from(self.width)])
        } else {
            None
        }
    }

    /// The stored FNV-1a hash for a row of the current grid.
    pub fn current_row_hash(&self, y: u16) -> Option<u32> {
        self.current_hashes.get(usize::from(y)).copied()
    }

    /// Set a cell in the current grid at `(x, y)`.
    ///
    /// Handles wide-character bookkeeping: writing a width-2 grapheme also
    /// writes a continuation sentinel into the next column, blanking
    /// whatever was there; overwriting one half of an existing wide
    /// character blanks its other half. A wide character that would have
    /// its continuation land past the last column is replaced with a blank.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.width || y >= self.height {
            return;
        }

        let is_wide = cell.is_wide();

        if is_wide && x + 1 >= self.width {
            let idx = self.index(x, y);
            self.current[idx] = Cell::blank();
            self.recompute_row_hash(y);
            return;
        }

        let idx = self.index(x, y);
        if self.current[idx].is_continuation() && x > 0 {
            let prev_idx = self.index(x - 1, y);
            self.current[prev_idx] = Cell::blank();
        }
        if self.current[idx].is_wide() {
            let next_idx = self.index(x + 1, y);
            self.current[next_idx] = Cell::blank();
        }

        self.current[idx] = cell;

        if is_wide {
            let next_x = x + 1;
            let next_idx = self.index(next_x, y);
            if self.current[next_idx].is_wide() {
                let after_next = next_x + 1;
                if after_next < self.width {
                    let after_idx = self.index(after_next, y);
                    self.current[after_idx] = Cell::blank();
                }
            }
            self.current[next_idx] = Cell::continuation();
        }

        self.recompute_row_hash(y);
    }

    fn recompute_row_hash(&mut self, y: u16) {
        if let Some(row) = self.get_row(y) {
            self.current_hashes[usize::from(y)] = row_hash(row);
        }
    }

    fn recompute_all_current_hashes(&mut self) {
        for y in 0..self.height {
            self.recompute_row_hash(y);
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    /// Diff `current` against `previous`.
    ///
    /// Unchanged rows (matching hash) are skipped entirely. If the
    /// dimensions changed since the last present, every current cell is
    /// reported as a change (full redraw). If `force_full` is set (after a
    /// resize, a backend write failure, or an ack timeout), every cell is
    /// reported as a change regardless of whether it actually differs, since
    /// the backend's own screen contents can no longer be trusted.
    pub fn diff(&self, force_full: bool) -> FrameDelta {
        if force_full || self.previous.len() != self.current.len() {
            return FrameDelta::CellChanges(self.full_redraw());
        }

        if let Some(offset) = detect_row_shift(&self.previous_hashes, &self.current_hashes) {
            let mut changes = Vec::new();
            for y in 0..self.height {
                let src_y = i32::from(y) + offset;
                let matched = src_y >= 0
                    && (src_y as u16) < self.height
                    && self.current_hashes[usize::from(y)]
                        == self.previous_hashes[src_y as usize];
                if !matched {
                    changes.extend(self.row_changes(y));
                }
            }
            return FrameDelta::ScrollShift { offset, changes };
        }

        let mut changes = Vec::new();
        for y in 0..self.height {
            if self.current_hashes[usize::from(y)] != self.previous_hashes[usize::from(y)] {
                changes.extend(self.row_changes(y));
            }
        }
        FrameDelta::CellChanges(changes)
    }

    fn row_changes(&self, y: u16) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for x in 0..self.width {
            let idx = self.index(x, y);
            if self.current[idx] != self.previous[idx] {
                changes.push(CellChange {
                    x,
                    y,
                    cell: self.current[idx].clone(),
                });
            }
        }
        changes
    }

    fn full_redraw(&self) -> Vec<CellChange> {
        let mut changes = Vec::with_capacity(self.current.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                changes.push(CellChange {
                    x,
                    y,
                    cell: self.current[idx].clone(),
                });
            }
        }
        changes
    }

    /// Swap `current` into `previous` and reset `current` to blank for the
    /// next frame. Call after the diff's bytes have been written
    /// successfully.
    pub fn present(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        std::mem::swap(&mut self.current_hashes, &mut self.previous_hashes);
        self.clear_current();
    }
}

/// Look for a vertical shift: does the set of current row hashes match the
/// previous row hashes offset by some small amount? Returns the offset of
/// the first fully-matching, non-empty overlap found, smallest magnitude
/// first. A positive offset means `current[y]` matches `previous[y + offset]`
/// (content moved up).
fn detect_row_shift(previous: &[u32], current: &[u32]) -> Option<i32> {
    let height = current.len();
    if height == 0 || previous.len() != height {
        return None;
    }

    for abs_offset in 1..height {
        for &offset in &[abs_offset as i32, -(abs_offset as i32)] {
            let mut overlap = 0usize;
            let mut all_match = true;
            for y in 0..height {
                let src_y = y as i32 + offset;
                if src_y < 0 || src_y as usize >= height {
                    continue;
                }
                overlap += 1;
                if current[y] != previous[src_y as usize] {
                    all_match = false;
                    break;
                }
            }
            if all_match && overlap > 0 {
                return Some(offset);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn new_buffer_all_blank() {
        let fb = Framebuffer::new(Size::new(10, 5));
        for y in 0..5 {
            for x in 0..10 {
                assert!(fb.get(x, y).is_some_and(|c| c.is_blank()));
            }
        }
    }

    #[test]
    fn set_and_get() {
        let mut fb = Framebuffer::new(Size::new(10, 5));
        let style = TextStyle::new().fg(Color::Indexed(1));
        let cell = Cell::new("A", style);
        fb.set(3, 2, cell.clone());
        assert_eq!(fb.get(3, 2), Some(&cell));
    }

    #[test]
    fn wide_char_sets_continuation() {
        let mut fb = Framebuffer::new(Size::new(10, 5));
        let wide = Cell::new("\u{4e16}", TextStyle::default());
        fb.set(3, 1, wide.clone());
        assert_eq!(fb.get(3, 1), Some(&wide));
        assert_eq!(fb.get(4, 1).map(|c| c.width), Some(0));
    }

    #[test]
    fn wide_char_at_right_edge_becomes_blank() {
        let mut fb = Framebuffer::new(Size::new(5, 1));
        fb.set(4, 0, Cell::new("\u{4e16}", TextStyle::default()));
        assert!(fb.get(4, 0).is_some_and(|c| c.is_blank()));
    }

    #[test]
    fn out_of_bounds_set_is_noop() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(10, 10, Cell::new("X", TextStyle::default()));
    }

    #[test]
    fn diff_no_changes_is_empty() {
        let fb = Framebuffer::new(Size::new(5, 3));
        assert!(fb.diff(false).changes().is_empty());
    }

    #[test]
    fn diff_single_cell_change() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(2, 1, Cell::new("A", TextStyle::default()));
        let changes = fb.diff(false).into_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].x, 2);
        assert_eq!(changes[0].y, 1);
    }

    #[test]
    fn diff_force_full_reports_every_cell_even_if_unchanged() {
        let fb = Framebuffer::new(Size::new(5, 3));
        let changes = fb.diff(true).into_changes();
        assert_eq!(changes.len(), 15);
    }

    #[test]
    fn diff_skips_unchanged_rows() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(2, 1, Cell::new("A", TextStyle::default()));
        // Rows 0 and 2 are untouched; their hash should still match previous.
        assert_eq!(fb.current_row_hash(0), fb.current_row_hash(2));
    }

    #[test]
    fn present_then_rediff_sees_revert_to_blank() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(0, 0, Cell::new("A", TextStyle::default()));
        fb.present();
        // current is now blank again; diffing against the presented "A" frame
        // should report the cell reverting to blank.
        let changes = fb.diff(false).into_changes();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].cell.is_blank());
    }

    #[test]
    fn resize_triggers_full_redraw_marker() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(0, 0, Cell::new("A", TextStyle::default()));
        fb.present();
        fb.resize(Size::new(10, 8));
        assert_eq!(fb.width(), 10);
        assert_eq!(fb.height(), 8);
    }

    #[test]
    fn row_hash_consistent_with_cells() {
        let mut fb = Framebuffer::new(Size::new(5, 3));
        fb.set(1, 1, Cell::new("X", TextStyle::default()));
        let row: Vec<Cell> = fb.get_row(1).unwrap().to_vec();
        assert_eq!(fb.current_row_hash(1), Some(row_hash(&row)));
    }

    #[test]
    fn scroll_shift_detected_for_shifted_rows() {
        let prev = vec![10, 20, 30, 40];
        let curr = vec![20, 30, 40, 99];
        assert_eq!(detect_row_shift(&prev, &curr), Some(1));
    }

    #[test]
    fn scroll_shift_none_when_unrelated() {
        let prev = vec![1, 2, 3];
        let curr = vec![9, 8, 7];
        assert_eq!(detect_row_shift(&prev, &curr), None);
    }

    #[test]
    fn fnv1a_is_deterministic() {
        assert_eq!(fnv1a_hash(b"hello"), fnv1a_hash(b"hello"));
        assert_ne!(fnv1a_hash(b"hello"), fnv1a_hash(b"world"));
    }
}
