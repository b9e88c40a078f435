//! `Segment` — a run of styled text with grapheme-aware splitting.
//!
//! The drawlist builder (C5) reaches for [`Segment::split_at`] when a text
//! leaf clips its own overflow: a line that runs past the box's width is
//! trimmed to the visible portion rather than left to spill past the
//! column it was laid out into.

use crate::style::TextStyle;
use crate::text;

/// A piece of styled text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// The text content.
    pub text: String,
    /// The style applied to this segment.
    pub style: TextStyle,
    /// Whether this is a control sequence (not visible text).
    pub is_control: bool,
}

impl Segment {
    /// Create a new segment with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            is_control: false,
        }
    }

    /// Create a new segment with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            is_control: false,
        }
    }

    /// Create a control segment (not rendered as visible text).
    pub fn control(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
            is_control: true,
        }
    }

    /// Display width in terminal cells, using the grapheme/width oracle.
    pub fn width(&self) -> usize {
        if self.is_control {
            return 0;
        }
        text::advance(&self.text)
    }

    /// Returns true if the segment has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this segment at the given display-width offset.
    ///
    /// Returns (left, right) where left has the specified display width. If
    /// the offset falls in the middle of a wide grapheme, the cluster is
    /// dropped from the side it straddles and a padding space takes its
    /// place so cell columns stay aligned.
    pub fn split_at(&self, offset: usize) -> (Segment, Segment) {
        if offset == 0 {
            return (
                Segment::styled(String::new(), self.style),
                self.clone(),
            );
        }
        if offset >= self.width() {
            return (
                self.clone(),
                Segment::styled(String::new(), self.style),
            );
        }

        let mut left = String::new();
        let mut current_width = 0;
        for cluster in text::segment(&self.text) {
            let gw = usize::from(text::width(cluster));
            if current_width + gw > offset {
                if current_width < offset {
                    left.push(' ');
                }
                break;
            }
            left.push_str(cluster);
            current_width += gw;
            if current_width == offset {
                break;
            }
        }

        let mut right = String::new();
        let mut seen_width = 0;
        let mut past_split = false;
        for cluster in text::segment(&self.text) {
            let gw = usize::from(text::width(cluster));
            if past_split {
                right.push_str(cluster);
                continue;
            }
            seen_width += gw;
            if seen_width > offset {
                if seen_width - gw < offset {
                    right.push(' ');
                } else {
                    right.push_str(cluster);
                }
                past_split = true;
            } else if seen_width == offset {
                past_split = true;
            }
        }

        (
            Segment::styled(left, self.style),
            Segment::styled(right, self.style),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_width() {
        assert_eq!(Segment::new("hello").width(), 5);
    }

    #[test]
    fn empty_width() {
        assert_eq!(Segment::new("").width(), 0);
    }

    #[test]
    fn control_width_is_zero() {
        assert_eq!(Segment::control("ESC[1m").width(), 0);
    }

    #[test]
    fn cjk_width() {
        assert_eq!(Segment::new("\u{4e16}\u{754c}").width(), 4); // 世界
    }

    #[test]
    fn split_ascii() {
        let s = Segment::new("hello");
        let (l, r) = s.split_at(3);
        assert_eq!(l.text, "hel");
        assert_eq!(r.text, "lo");
    }

    #[test]
    fn split_at_zero() {
        let s = Segment::new("hello");
        let (l, r) = s.split_at(0);
        assert_eq!(l.text, "");
        assert_eq!(r.text, "hello");
    }

    #[test]
    fn split_at_end() {
        let s = Segment::new("hello");
        let (l, r) = s.split_at(5);
        assert_eq!(l.text, "hello");
        assert_eq!(r.text, "");
    }

    #[test]
    fn split_beyond_end() {
        let s = Segment::new("hi");
        let (l, r) = s.split_at(100);
        assert_eq!(l.text, "hi");
        assert_eq!(r.text, "");
    }

    #[test]
    fn is_empty() {
        assert!(Segment::new("").is_empty());
        assert!(!Segment::new("x").is_empty());
    }

    #[test]
    fn styled_preserves_style_on_split() {
        let s = Segment::styled("hello", TextStyle::new().bold(true));
        let (l, r) = s.split_at(2);
        assert!(l.style.bold);
        assert!(r.style.bold);
    }
}
