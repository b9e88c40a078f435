//! ANSI escape sequence renderer — the SGR-emission half of the framebuffer
//! differ (C6). Takes row-level cell changes and produces the coalesced byte
//! stream handed to the backend.

use std::fmt::Write;

use crate::color::{Color, ColorTier};
use crate::framebuffer::CellChange;
use crate::style::TextStyle;

/// Renders cell changes into ANSI escape sequences, downgrading colors to
/// the given capability tier.
pub struct Renderer {
    tier: ColorTier,
    synchronized_output: bool,
}

impl Renderer {
    /// Create a new renderer targeting the given capability tier.
    pub fn new(tier: ColorTier, synchronized_output: bool) -> Self {
        Self {
            tier,
            synchronized_output,
        }
    }

    /// Render a set of cell changes into a byte stream. `row_width` is the
    /// framebuffer's column count, used to detect a batch that reaches the
    /// true end of its row so a blank tail can be cleared with CSI K instead
    /// of written as literal space cells.
    ///
    /// Changes are assumed to already be grouped in presentation order
    /// (row-major, left to right within a row). Continuation cells are
    /// skipped: writing a wide cluster implicitly occupies the next slot.
    pub fn render(&self, changes: &[CellChange], row_width: u16) -> String {
        let batches = batch_changes(changes, row_width);
        if batches.is_empty() {
            return String::new();
        }

        let mut output = String::with_capacity(changes.len() * 12);

        if self.synchronized_output {
            output.push_str("\x1b[?2026h");
        }

        let mut last_style = TextStyle::default();
        let mut style_active = false;
        let mut last_cursor: Option<(u16, u16)> = None;

        for batch in &batches {
            if last_cursor != Some((batch.x, batch.y)) {
                let _ = write!(output, "\x1b[{};{}H", batch.y + 1, batch.x + 1);
            }

            let mut cursor_x = batch.x;
            for cell in &batch.cells {
                if cell.width == 0 {
                    continue;
                }
                self.write_style_diff(&mut output, &last_style, &cell.style, style_active);
                last_style = cell.style;
                style_active = true;
                output.push_str(&cell.grapheme);
                cursor_x += u16::from(cell.width);
            }

            if batch.clear_to_eol {
                output.push_str("\x1b[K");
            }

            last_cursor = Some((cursor_x, batch.y));
        }

        if style_active && !last_style.is_empty() {
            output.push_str("\x1b[0m");
        }

        if self.synchronized_output {
            output.push_str("\x1b[?2026l");
        }

        output
    }

    fn write_style_diff(&self, output: &mut String, prev: &TextStyle, next: &TextStyle, active: bool) {
        if !active || needs_reset(prev, next) {
            if next.is_empty() {
                if active {
                    output.push_str("\x1b[0m");
                }
                return;
            }
            output.push_str("\x1b[0m");
            self.write_full_style(output, next);
            return;
        }
        if prev == next {
            return;
        }
        self.write_full_style(output, next);
    }

    fn write_full_style(&self, output: &mut String, style: &TextStyle) {
        let mut codes: Vec<String> = Vec::new();
        if style.bold {
            codes.push("1".into());
        }
        if style.dim {
            codes.push("2".into());
        }
        if style.italic {
            codes.push("3".into());
        }
        if style.underline {
            codes.push("4".into());
        }
        if style.blink {
            codes.push("5".into());
        }
        if style.inverse {
            codes.push("7".into());
        }
        if style.strikethrough {
            codes.push("9".into());
        }
        if style.overline {
            codes.push("53".into());
        }
        if let Some(fg) = style.fg {
            codes.extend(fg_color_codes(fg.downgrade(self.tier)));
        }
        if let Some(bg) = style.bg {
            codes.extend(bg_color_codes(bg.downgrade(self.tier)));
        }
        if codes.is_empty() {
            return;
        }
        let _ = write!(output, "\x1b[{}m", codes.join(";"));
    }
}

fn needs_reset(prev: &TextStyle, next: &TextStyle) -> bool {
    // An attribute present in `prev` but absent in `next` cannot be undone
    // by a single SGR code in all terminals, so fall back to a full reset.
    (prev.bold && !next.bold)
        || (prev.italic && !next.italic)
        || (prev.underline && !next.underline)
        || (prev.strikethrough && !next.strikethrough)
        || (prev.overline && !next.overline)
        || (prev.blink && !next.blink)
        || (prev.dim && !next.dim)
        || (prev.inverse && !next.inverse)
}

fn fg_color_codes(color: Color) -> Vec<String> {
    match color {
        Color::Default => vec!["39".into()],
        Color::Indexed(i) => vec!["38".into(), "5".into(), i.to_string()],
        Color::Rgb { r, g, b } => vec!["38".into(), "2".into(), r.to_string(), g.to_string(), b.to_string()],
    }
}

fn bg_color_codes(color: Color) -> Vec<String> {
    match color {
        Color::Default => vec!["49".into()],
        Color::Indexed(i) => vec!["48".into(), "5".into(), i.to_string()],
        Color::Rgb { r, g, b } => vec!["48".into(), "2".into(), r.to_string(), g.to_string(), b.to_string()],
    }
}

/// Build a standalone SGR sequence for a style, for callers that need one
/// escape sequence in isolation (e.g. tests, capability fixtures).
pub fn build_sgr_sequence(style: &TextStyle, tier: ColorTier) -> String {
    if style.is_empty() {
        return String::new();
    }
    let renderer = Renderer::new(tier, false);
    let mut output = String::new();
    renderer.write_full_style(&mut output, style);
    output
}

/// A run of same-row cells sharing one cursor-move, built from a list of
/// [`CellChange`]s sorted by row then column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaBatch {
    /// Starting column of the batch.
    pub x: u16,
    /// Row of the batch.
    pub y: u16,
    /// Cells in the batch, in column order.
    pub cells: Vec<crate::cell::Cell>,
    /// Whether the tail of the row was blank and can be cleared with CSI K
    /// instead of emitting literal space cells.
    pub clear_to_eol: bool,
}

/// Group cell changes into contiguous same-row runs, each with one cursor
/// move. A gap in columns, or a row boundary, starts a new batch. Batches
/// reaching `row_width` with a blank tail have that tail replaced by
/// [`DeltaBatch::clear_to_eol`].
pub fn batch_changes(changes: &[CellChange], row_width: u16) -> Vec<DeltaBatch> {
    let mut batches: Vec<DeltaBatch> = Vec::new();
    let mut expected_next: Option<(u16, u16)> = None;

    for change in changes {
        if change.cell.width == 0 {
            // Continuation cells ride along with their primary cell's batch.
            if let Some(batch) = batches.last_mut()
                && expected_next == Some((change.x, change.y))
            {
                batch.cells.push(change.cell.clone());
                expected_next = Some((change.x + 1, change.y));
                continue;
            }
        }

        if expected_next == Some((change.x, change.y))
            && let Some(batch) = batches.last_mut()
        {
            batch.cells.push(change.cell.clone());
            expected_next = Some((change.x + u16::from(change.cell.width.max(1)), change.y));
            continue;
        }

        expected_next = Some((change.x + u16::from(change.cell.width.max(1)), change.y));
        batches.push(DeltaBatch {
            x: change.x,
            y: change.y,
            cells: vec![change.cell.clone()],
            clear_to_eol: false,
        });
    }

    for batch in &mut batches {
        trim_blank_tail(batch, row_width);
    }

    batches
}

/// If `batch` reaches the row's last column and ends in a run of blank,
/// default-styled cells, drop that run and mark `clear_to_eol` so the
/// renderer emits CSI K instead of literal trailing spaces.
fn trim_blank_tail(batch: &mut DeltaBatch, row_width: u16) {
    let end_col = batch.x + batch.cells.iter().map(|c| u16::from(c.width.max(1))).sum::<u16>();
    if end_col != row_width {
        return;
    }
    let blank_run = batch.cells.iter().rev().take_while(|c| c.is_blank()).count();
    if blank_run < 2 {
        return;
    }
    batch.cells.truncate(batch.cells.len() - blank_run);
    batch.clear_to_eol = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn change(x: u16, y: u16, cell: Cell) -> CellChange {
        CellChange { x, y, cell }
    }

    #[test]
    fn render_empty_changes() {
        let r = Renderer::new(ColorTier::B, false);
        assert_eq!(r.render(&[], 80), "");
    }

    #[test]
    fn render_cursor_position() {
        let r = Renderer::new(ColorTier::B, false);
        let out = r.render(&[change(3, 2, Cell::new("A", TextStyle::default()))], 80);
        assert!(out.contains("\x1b[3;4H"));
        assert!(out.contains('A'));
    }

    #[test]
    fn render_fg_truecolor() {
        let r = Renderer::new(ColorTier::B, false);
        let style = TextStyle::new().fg(Color::Rgb { r: 10, g: 20, b: 30 });
        let out = r.render(&[change(0, 0, Cell::new("A", style))], 80);
        assert!(out.contains("38;2;10;20;30"));
    }

    #[test]
    fn render_downgrades_to_indexed_at_tier_a() {
        let r = Renderer::new(ColorTier::A, false);
        let style = TextStyle::new().fg(Color::Rgb { r: 255, g: 0, b: 0 });
        let out = r.render(&[change(0, 0, Cell::new("A", style))], 80);
        assert!(out.contains("38;5;"));
        assert!(!out.contains("38;2;"));
    }

    #[test]
    fn render_skip_continuation_cells() {
        let r = Renderer::new(ColorTier::B, false);
        let mut changes = vec![change(0, 0, Cell::new("\u{4e16}", TextStyle::default()))];
        changes.push(change(1, 0, Cell::continuation()));
        let out = r.render(&changes, 80);
        assert_eq!(out.matches("\x1b[1;1H").count(), 1);
    }

    #[test]
    fn synchronized_output_wrapping() {
        let r = Renderer::new(ColorTier::B, true);
        let out = r.render(&[change(0, 0, Cell::new("A", TextStyle::default()))], 80);
        assert!(out.starts_with("\x1b[?2026h"));
        assert!(out.ends_with("\x1b[?2026l"));
    }

    #[test]
    fn batch_changes_consecutive_same_row() {
        let changes = vec![
            change(0, 0, Cell::new("A", TextStyle::default())),
            change(1, 0, Cell::new("B", TextStyle::default())),
        ];
        let batches = batch_changes(&changes, 80);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].cells.len(), 2);
    }

    #[test]
    fn batch_changes_gap_starts_new_batch() {
        let changes = vec![
            change(0, 0, Cell::new("A", TextStyle::default())),
            change(5, 0, Cell::new("B", TextStyle::default())),
        ];
        let batches = batch_changes(&changes, 80);
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn blank_tail_reaching_row_end_clears_to_eol() {
        let changes = vec![
            change(3, 0, Cell::new("A", TextStyle::default())),
            change(4, 0, Cell::blank()),
            change(5, 0, Cell::blank()),
            change(6, 0, Cell::blank()),
        ];
        let batches = batch_changes(&changes, 7);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].clear_to_eol);
        assert_eq!(batches[0].cells.len(), 1);
    }

    #[test]
    fn blank_tail_not_reaching_row_end_is_not_cleared() {
        let changes = vec![
            change(0, 0, Cell::new("A", TextStyle::default())),
            change(1, 0, Cell::blank()),
            change(2, 0, Cell::blank()),
        ];
        let batches = batch_changes(&changes, 10);
        assert!(!batches[0].clear_to_eol);
        assert_eq!(batches[0].cells.len(), 3);
    }

    #[test]
    fn render_emits_clear_to_eol_escape() {
        let r = Renderer::new(ColorTier::B, false);
        let changes = vec![
            change(0, 0, Cell::new("A", TextStyle::default())),
            change(1, 0, Cell::blank()),
            change(2, 0, Cell::blank()),
        ];
        let out = r.render(&changes, 3);
        assert!(out.contains("\x1b[K"));
    }

    #[test]
    fn build_sgr_default_style_is_empty() {
        assert_eq!(build_sgr_sequence(&TextStyle::default(), ColorTier::B), "");
    }

    #[test]
    fn build_sgr_combined_bold_fg() {
        let style = TextStyle::new().bold(true).fg(Color::Indexed(1));
        let seq = build_sgr_sequence(&style, ColorTier::B);
        assert!(seq.contains('1'));
        assert!(seq.contains("38;5;1"));
    }
}
