//! Text wrap policies used by the layout engine (C3) to measure a text
//! leaf's intrinsic height under a width hint.
//!
//! Wrapping is grapheme-cluster-aware via [`crate::text`]: a multi-codepoint
//! cluster (combining marks, ZWJ sequences, variation selectors) is never
//! split across visual lines.

use crate::text;

/// How a text leaf wraps when its content exceeds the available width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// Never wrap; the line overflows its container.
    None,
    /// Break anywhere, including mid-word, at the grapheme-cluster level.
    #[default]
    Grapheme,
    /// Break at grapheme clusters but never mid-word when a word boundary
    /// exists within the available width.
    Word,
    /// Break strictly at `char` boundaries (may split a grapheme cluster —
    /// provided for compatibility with content that is already
    /// byte/char-normalized upstream).
    Char,
}

/// Wrap a single logical line of text to the given display width under the
/// given policy. Returns one or more visual lines. `width == 0` or
/// `policy == WrapPolicy::None` returns the input unwrapped.
pub fn wrap_line(input: &str, width: u16, policy: WrapPolicy) -> Vec<String> {
    if input.is_empty() {
        return vec![String::new()];
    }
    if width == 0 || policy == WrapPolicy::None {
        return vec![input.to_string()];
    }

    match policy {
        WrapPolicy::None => unreachable!(),
        WrapPolicy::Char => wrap_by_unit(input.chars().map(|c| c.to_string()).collect(), width),
        WrapPolicy::Grapheme => {
            wrap_by_unit(text::segment(input).map(str::to_string).collect(), width)
        }
        WrapPolicy::Word => wrap_by_word(input, width),
    }
}

fn wrap_by_unit(units: Vec<String>, width: u16) -> Vec<String> {
    let width = usize::from(width);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for unit in units {
        let uw = text::advance(&unit);
        if current_width + uw > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push_str(&unit);
        current_width += uw;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn wrap_by_word(input: &str, width: u16) -> Vec<String> {
    let width = usize::from(width);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in input.split(' ') {
        let word_width = text::advance(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width > width {
            // The word alone overflows the width: break it at the
            // grapheme level rather than let it run off the edge.
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            let mut broken = wrap_by_unit(text::segment(word).map(str::to_string).collect(), width as u16);
            if let Some(last) = broken.pop() {
                lines.extend(broken);
                current = last;
                current_width = text::advance(&current);
            }
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Total visual-line height a block of text occupies when wrapped to
/// `width` under `policy` — the intrinsic-size input for the layout engine.
pub fn wrapped_line_count(text: &str, width: u16, policy: WrapPolicy) -> usize {
    text.split('\n')
        .map(|line| wrap_line(line, width, policy).len())
        .sum()
}
