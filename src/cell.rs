//! `Cell`: a single styled character cell in the framebuffer.

use crate::style::TextStyle;
use unicode_width::UnicodeWidthStr;

/// A single cell in the terminal cell grid.
///
/// A continuation slot — the second cell of a width-2 grapheme — is
/// represented by [`Cell::continuation`] and is never painted as a literal
/// space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    /// The grapheme cluster displayed in this cell. Empty for a continuation
    /// slot.
    pub grapheme: String,
    /// The style of this cell.
    pub style: TextStyle,
    /// Display width: 1 or 2 for an occupied cell, 0 for a continuation slot.
    pub width: u8,
}

impl Cell {
    /// Create a new cell, auto-detecting width from the grapheme.
    pub fn new(grapheme: impl Into<String>, style: TextStyle) -> Self {
        let grapheme = grapheme.into();
        let width = UnicodeWidthStr::width(grapheme.as_str()).clamp(1, 2) as u8;
        Self {
            grapheme,
            style,
            width,
        }
    }

    /// Create a blank cell (space, default style, width 1).
    pub fn blank() -> Self {
        Self {
            grapheme: " ".into(),
            style: TextStyle::default(),
            width: 1,
        }
    }

    /// Returns true if this is a blank cell (space with default style).
    pub fn is_blank(&self) -> bool {
        self.grapheme == " " && self.style.is_empty() && self.width == 1
    }

    /// Returns true if this is a wide character (width 2).
    pub fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// Returns true if this is a continuation slot.
    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Create a continuation cell: the sentinel occupying the second slot of
    /// a wide grapheme.
    pub fn continuation() -> Self {
        Self {
            grapheme: String::new(),
            style: TextStyle::default(),
            width: 0,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn blank_cell() {
        let c = Cell::blank();
        assert!(c.is_blank());
        assert_eq!(c.width, 1);
    }

    #[test]
    fn ascii_cell() {
        let c = Cell::new("A", TextStyle::default());
        assert_eq!(c.width, 1);
        assert!(!c.is_wide());
    }

    #[test]
    fn cjk_cell() {
        let c = Cell::new("\u{4e16}", TextStyle::default()); // 世
        assert_eq!(c.width, 2);
        assert!(c.is_wide());
    }

    #[test]
    fn continuation_cell() {
        let c = Cell::continuation();
        assert_eq!(c.width, 0);
        assert!(c.is_continuation());
        assert!(c.grapheme.is_empty());
    }

    #[test]
    fn styled_not_blank() {
        let c = Cell::new(" ", TextStyle::new().fg(Color::Indexed(1)));
        assert!(!c.is_blank());
    }

    #[test]
    fn space_default_is_blank() {
        let c = Cell::new(" ", TextStyle::default());
        assert!(c.is_blank());
    }
}
