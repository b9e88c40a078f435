//! Drawlist interpreter: the C5→C6 bridge. Walks a built [`Drawlist`]'s
//! command stream and paints it into a [`Framebuffer`]'s current grid, the
//! grid C6 then diffs against the previous frame.
//!
//! Only the commands a plain cell grid can represent are painted here.
//! `draw_canvas`/`draw_image` reserve their rect as blank cells — the actual
//! sixel/kitty/iterm2 escape sequences they need are emitted by a backend
//! alongside the cell diff, not encoded as cell content, since those
//! protocols position independently of the character grid.

use crate::cell::Cell;
use crate::drawlist::zrdl::{DrawCommand, Drawlist};
use crate::drawlist::CursorShape;
use crate::framebuffer::Framebuffer;
use crate::geometry::Rect;
use crate::style::TextStyle;
use crate::text;

/// Paint `dl` into `fb`'s current grid. Returns the cursor position and
/// shape from the drawlist's trailing `set_cursor` command, if any.
pub fn apply(dl: &Drawlist, fb: &mut Framebuffer) -> Option<(u16, u16, CursorShape, bool)> {
    let full = Rect::new(0, 0, fb.width(), fb.height());
    let mut clip_stack: Vec<Rect> = vec![full];
    let mut cursor = None;

    for command in &dl.commands {
        let clip = *clip_stack.last().unwrap_or(&full);
        match command {
            DrawCommand::Clear => fb.clear_current(),
            DrawCommand::FillRect { x, y, w, h, style } => {
                let Some(rect) = clip.intersection(&Rect::new(*x, *y, *w, *h)) else { continue };
                for row in rect.position.y..rect.bottom() {
                    for col in rect.position.x..rect.right() {
                        fb.set(col, row, Cell::new(" ", *style));
                    }
                }
            }
            DrawCommand::DrawText { x, y, string, style } => {
                let Some(bytes) = dl.strings.get(string.index) else { continue };
                let Ok(line) = std::str::from_utf8(bytes) else { continue };
                paint_run(fb, clip, *x, *y, line, *style);
            }
            DrawCommand::DrawTextRun { x, y, blob_index } => {
                let Some(bytes) = dl.blobs.get(*blob_index) else { continue };
                let Ok(line) = std::str::from_utf8(bytes) else { continue };
                paint_run(fb, clip, *x, *y, line, TextStyle::default());
            }
            DrawCommand::PushClip { x, y, w, h } => {
                let next = clip.intersection(&Rect::new(*x, *y, *w, *h)).unwrap_or(Rect::new(*x, *y, 0, 0));
                clip_stack.push(next);
            }
            DrawCommand::PopClip => {
                if clip_stack.len() > 1 {
                    clip_stack.pop();
                }
            }
            DrawCommand::SetCursor { x, y, shape, visible, .. } => {
                let shape = match shape {
                    1 => CursorShape::Bar,
                    2 => CursorShape::Underline,
                    _ => CursorShape::Block,
                };
                cursor = Some((*x, *y, shape, *visible));
            }
            DrawCommand::DrawCanvas { x, y, w, h, .. } | DrawCommand::DrawImage { x, y, w, h, .. } => {
                let Some(rect) = clip.intersection(&Rect::new(*x, *y, *w, *h)) else { continue };
                for row in rect.position.y..rect.bottom() {
                    for col in rect.position.x..rect.right() {
                        fb.set(col, row, Cell::blank());
                    }
                }
            }
        }
    }

    cursor
}

fn paint_run(fb: &mut Framebuffer, clip: Rect, x: u16, y: u16, line: &str, style: TextStyle) {
    if y < clip.position.y || y >= clip.bottom() {
        return;
    }
    let mut col = x;
    for cluster in text::segment(line) {
        let w = text::width(cluster);
        if w == 0 {
            continue;
        }
        if col >= clip.position.x && col < clip.right() {
            fb.set(col, y, Cell::new(cluster, style));
        }
        col = col.saturating_add(u16::from(w));
        if col >= clip.right() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawlist::zrdl::StringRef;
    use crate::geometry::Size;
    use crate::style::TextStyle;

    fn drawlist_with_text(x: u16, y: u16, text: &str) -> Drawlist {
        let mut dl = Drawlist::new();
        dl.commands.push(DrawCommand::Clear);
        let index = dl.strings.intern(text);
        dl.commands.push(DrawCommand::DrawText {
            x,
            y,
            string: StringRef { index, byte_off: 0, byte_len: text.len() as u32 },
            style: TextStyle::default(),
        });
        dl
    }

    #[test]
    fn draw_text_paints_cells() {
        let dl = drawlist_with_text(0, 0, "hi");
        let mut fb = Framebuffer::new(Size::new(5, 1));
        apply(&dl, &mut fb);
        assert_eq!(fb.get(0, 0).map(|c| c.grapheme.as_str()), Some("h"));
        assert_eq!(fb.get(1, 0).map(|c| c.grapheme.as_str()), Some("i"));
    }

    #[test]
    fn clip_stack_restricts_fill_rect() {
        let style = TextStyle::new().fg(crate::color::Color::Indexed(1));
        let mut dl = Drawlist::new();
        dl.commands.push(DrawCommand::Clear);
        dl.commands.push(DrawCommand::PushClip { x: 0, y: 0, w: 2, h: 1 });
        dl.commands.push(DrawCommand::FillRect { x: 0, y: 0, w: 5, h: 1, style });
        dl.commands.push(DrawCommand::PopClip);
        let mut fb = Framebuffer::new(Size::new(5, 1));
        apply(&dl, &mut fb);
        assert_eq!(fb.get(0, 0).unwrap().style, style);
        assert!(fb.get(3, 0).unwrap().is_blank());
    }

    #[test]
    fn set_cursor_is_reported() {
        let mut dl = Drawlist::new();
        dl.commands.push(DrawCommand::Clear);
        dl.commands.push(DrawCommand::SetCursor { x: 2, y: 0, shape: 1, visible: true, blink: false });
        let mut fb = Framebuffer::new(Size::new(5, 1));
        let cursor = apply(&dl, &mut fb);
        assert_eq!(cursor, Some((2, 0, CursorShape::Bar, true)));
    }

    #[test]
    fn unknown_string_index_is_skipped_not_panicking() {
        let mut dl = Drawlist::new();
        dl.commands.push(DrawCommand::Clear);
        dl.commands.push(DrawCommand::DrawText {
            x: 0,
            y: 0,
            string: StringRef { index: 99, byte_off: 0, byte_len: 0 },
            style: TextStyle::default(),
        });
        let mut fb = Framebuffer::new(Size::new(5, 1));
        apply(&dl, &mut fb);
        assert!(fb.get(0, 0).unwrap().is_blank());
    }
}
