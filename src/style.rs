//! `TextStyle`: color plus attribute bitset plus optional hyperlink target.

use crate::color::Color;

/// The union of color, attributes, and an optional interned hyperlink target,
/// as applied to a cell or a run of cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextStyle {
    /// Foreground color.
    pub fg: Option<Color>,
    /// Background color.
    pub bg: Option<Color>,
    /// Bold text.
    pub bold: bool,
    /// Italic text.
    pub italic: bool,
    /// Underlined text.
    pub underline: bool,
    /// Strikethrough text.
    pub strikethrough: bool,
    /// Overlined text.
    pub overline: bool,
    /// Blinking text.
    pub blink: bool,
    /// Dim/faint text.
    pub dim: bool,
    /// Inverse (swap fg/bg) video.
    pub inverse: bool,
    /// OSC 8 hyperlink target, as an index into the drawlist's string table.
    pub link_id: Option<u32>,
}

impl TextStyle {
    /// Create an empty style with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the foreground color.
    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Set the background color.
    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Set bold.
    #[must_use]
    pub fn bold(mut self, val: bool) -> Self {
        self.bold = val;
        self
    }

    /// Set italic.
    #[must_use]
    pub fn italic(mut self, val: bool) -> Self {
        self.italic = val;
        self
    }

    /// Set underline.
    #[must_use]
    pub fn underline(mut self, val: bool) -> Self {
        self.underline = val;
        self
    }

    /// Set strikethrough.
    #[must_use]
    pub fn strikethrough(mut self, val: bool) -> Self {
        self.strikethrough = val;
        self
    }

    /// Set overline.
    #[must_use]
    pub fn overline(mut self, val: bool) -> Self {
        self.overline = val;
        self
    }

    /// Set blink.
    #[must_use]
    pub fn blink(mut self, val: bool) -> Self {
        self.blink = val;
        self
    }

    /// Set dim.
    #[must_use]
    pub fn dim(mut self, val: bool) -> Self {
        self.dim = val;
        self
    }

    /// Set inverse video.
    #[must_use]
    pub fn inverse(mut self, val: bool) -> Self {
        self.inverse = val;
        self
    }

    /// Set the interned hyperlink target.
    #[must_use]
    pub fn link_id(mut self, string_ref: u32) -> Self {
        self.link_id = Some(string_ref);
        self
    }

    /// Merge another style on top of this one. The `other` style's set
    /// values take priority.
    #[must_use]
    pub fn merge(&self, other: &TextStyle) -> TextStyle {
        TextStyle {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            bold: other.bold || self.bold,
            italic: other.italic || self.italic,
            underline: other.underline || self.underline,
            strikethrough: other.strikethrough || self.strikethrough,
            overline: other.overline || self.overline,
            blink: other.blink || self.blink,
            dim: other.dim || self.dim,
            inverse: other.inverse || self.inverse,
            link_id: other.link_id.or(self.link_id),
        }
    }

    /// Returns true if no attributes are set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
