//! Drawlist builder (C5): a stack-based depth-first walk over the laid-out
//! runtime tree, emitting ZRDL commands.
//!
//! The walk keeps its own explicit work stack (rather than recursing with
//! the Rust call stack) so a pathologically deep tree fails via
//! `DepthLimits`, already enforced by the layout pass, rather than a stack
//! overflow here. The stack's storage comes out of a bump arena reset at
//! the start of every `build()` call; the `Drawlist` it produces is plain
//! `Vec`-backed so it survives past that reset.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use crate::drawlist::zrdl::{DrawCommand, Drawlist, StringRef};
use crate::geometry::Rect;
use crate::instance::Instance;
use crate::segment::Segment;
use crate::style::TextStyle;
use crate::vnode::{BorderStyle, Edges, Overflow, VNodeKind};
use crate::wrap::wrap_line;

/// Cursor shape codes, matching the ZREV/ZRDL wire convention: block, bar,
/// underline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Bar,
    Underline,
}

impl CursorShape {
    fn code(self) -> u8 {
        match self {
            CursorShape::Block => 0,
            CursorShape::Bar => 1,
            CursorShape::Underline => 2,
        }
    }
}

/// Builds one frame's [`Drawlist`] from a laid-out instance tree.
pub struct DrawlistBuilder {
    arena: Bump,
}

impl DrawlistBuilder {
    pub fn new() -> Self {
        Self { arena: Bump::new() }
    }

    /// Build the drawlist for one frame. `cursor` places the terminal
    /// cursor over the focused instance's rect, if any instance is focused
    /// and wants a visible cursor.
    pub fn build(&mut self, root: &Instance, cursor: Option<(Rect, CursorShape)>) -> Drawlist {
        self.arena.reset();
        let mut dl = Drawlist::new();
        dl.commands.push(DrawCommand::Clear);

        // Explicit DFS stack: `Enter` pushes a node's own paint commands and
        // queues its children (back to front, so popping visits them front
        // to back) plus a matching `Exit` to pop any clip it pushed.
        enum Step<'i> {
            Enter(&'i Instance, Rect),
            Exit(bool),
        }
        let mut stack: BumpVec<'_, Step<'_>> = BumpVec::new_in(&self.arena);
        stack.push(Step::Enter(root, root.rect));

        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(instance, clip) => {
                    if instance.vnode.hidden || !instance.rect.intersects(&clip) {
                        continue;
                    }
                    paint_instance(instance, &mut dl);

                    let clips_children = matches!(instance.vnode.layout.overflow_x, Overflow::Hidden | Overflow::Scroll)
                        || matches!(instance.vnode.layout.overflow_y, Overflow::Hidden | Overflow::Scroll);
                    let child_clip = if clips_children {
                        let r = instance.rect;
                        dl.commands.push(DrawCommand::PushClip {
                            x: r.position.x,
                            y: r.position.y,
                            w: r.size.width,
                            h: r.size.height,
                        });
                        clip.intersection(&r).unwrap_or(Rect::new(r.position.x, r.position.y, 0, 0))
                    } else {
                        clip
                    };
                    stack.push(Step::Exit(clips_children));

                    // Paint order: document order, overlays last so they
                    // sit above normal-flow siblings regardless of z_layer
                    // ties; within overlays, higher z_layer paints later.
                    let mut children: BumpVec<'_, &Instance> = BumpVec::with_capacity_in(instance.children.len(), &self.arena);
                    children.extend(instance.children.iter());
                    children.sort_by_key(|c| {
                        let is_overlay = matches!(c.vnode.kind, VNodeKind::Overlay);
                        (is_overlay, c.vnode.layout.z_layer)
                    });
                    for child in children.iter().rev() {
                        stack.push(Step::Enter(*child, child_clip));
                    }
                }
                Step::Exit(had_clip) => {
                    if had_clip {
                        dl.commands.push(DrawCommand::PopClip);
                    }
                }
            }
        }

        if let Some((rect, shape)) = cursor {
            dl.commands.push(DrawCommand::SetCursor {
                x: rect.position.x,
                y: rect.position.y,
                shape: shape.code(),
                visible: true,
                blink: true,
            });
        }

        dl
    }
}

impl Default for DrawlistBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_instance(instance: &Instance, dl: &mut Drawlist) {
    let rect = instance.rect;
    if rect.is_empty() {
        return;
    }

    if let Some(bg) = instance.vnode.paint.background {
        dl.commands.push(DrawCommand::FillRect {
            x: rect.position.x,
            y: rect.position.y,
            w: rect.size.width,
            h: rect.size.height,
            style: TextStyle::new().bg(bg),
        });
    }

    paint_border(instance, dl);

    match &instance.vnode.kind {
        VNodeKind::Text { content, style, wrap } => paint_text(instance, rect, content, *style, *wrap, dl),
        VNodeKind::Canvas { blitter, pixel_size, payload } => {
            let blob_index = dl.blobs.intern_bytes(payload);
            dl.commands.push(DrawCommand::DrawCanvas {
                x: rect.position.x,
                y: rect.position.y,
                w: rect.size.width,
                h: rect.size.height,
                px_w: pixel_size.0,
                px_h: pixel_size.1,
                blob_index,
                blitter: *blitter,
            });
        }
        VNodeKind::Image { protocol, pixel_size, payload, image_id, z_layer } => {
            let blob_index = dl.blobs.intern_bytes(payload);
            dl.commands.push(DrawCommand::DrawImage {
                x: rect.position.x,
                y: rect.position.y,
                w: rect.size.width,
                h: rect.size.height,
                px_w: pixel_size.0,
                px_h: pixel_size.1,
                blob_index,
                image_id: *image_id,
                protocol: *protocol,
                z_layer: *z_layer,
            });
        }
        _ => {}
    }
}

fn intern_line(dl: &mut Drawlist, line: &str) -> StringRef {
    let index = dl.strings.find(line).unwrap_or_else(|| dl.strings.intern(line));
    StringRef { index, byte_off: 0, byte_len: line.len() as u32 }
}

/// `wrap` already keeps every visual line within `rect.size.width` for every
/// policy except [`crate::wrap::WrapPolicy::None`], which lets a line
/// overflow its container by design. When the text leaf itself clips its own
/// content (`overflow_x` is `Hidden`/`Scroll`), an overflowing line is
/// trimmed to the box's width with [`Segment::split_at`] rather than left to
/// spill into whatever sits to the right.
fn paint_text(instance: &Instance, rect: Rect, content: &str, style: TextStyle, wrap: crate::wrap::WrapPolicy, dl: &mut Drawlist) {
    if rect.size.width == 0 {
        return;
    }
    let clips_self = matches!(instance.vnode.layout.overflow_x, Overflow::Hidden | Overflow::Scroll);
    let mut y = rect.position.y;
    'lines: for logical_line in content.split('\n') {
        for visual_line in wrap_line(logical_line, rect.size.width, wrap) {
            if y >= rect.bottom() {
                break 'lines;
            }
            if !visual_line.is_empty() {
                let segment = Segment::styled(visual_line, style);
                let segment = if clips_self && segment.width() > usize::from(rect.size.width) {
                    segment.split_at(usize::from(rect.size.width)).0
                } else {
                    segment
                };
                if !segment.is_empty() {
                    let string = intern_line(dl, &segment.text);
                    dl.commands.push(DrawCommand::DrawText { x: rect.position.x, y, string, style: segment.style });
                }
            }
            y += 1;
        }
    }
}

struct BorderGlyphs {
    horizontal: &'static str,
    vertical: &'static str,
    top_left: &'static str,
    top_right: &'static str,
    bottom_left: &'static str,
    bottom_right: &'static str,
}

fn border_glyphs(style: BorderStyle) -> Option<BorderGlyphs> {
    match style {
        BorderStyle::None => None,
        BorderStyle::Plain => Some(BorderGlyphs {
            horizontal: "─",
            vertical: "│",
            top_left: "┌",
            top_right: "┐",
            bottom_left: "└",
            bottom_right: "┘",
        }),
        BorderStyle::Rounded => Some(BorderGlyphs {
            horizontal: "─",
            vertical: "│",
            top_left: "╭",
            top_right: "╮",
            bottom_left: "╰",
            bottom_right: "╯",
        }),
        BorderStyle::Double => Some(BorderGlyphs {
            horizontal: "═",
            vertical: "║",
            top_left: "╔",
            top_right: "╗",
            bottom_left: "╚",
            bottom_right: "╝",
        }),
        BorderStyle::Thick => Some(BorderGlyphs {
            horizontal: "━",
            vertical: "┃",
            top_left: "┏",
            top_right: "┓",
            bottom_left: "┗",
            bottom_right: "┛",
        }),
    }
}

/// Decomposes a box border into top/right/bottom/left runs. Edge widths
/// greater than one cell repeat the same line for each of the thickness's
/// rows/columns; corners are only drawn where two adjacent one-cell edges
/// meet.
fn paint_border(instance: &Instance, dl: &mut Drawlist) {
    let Edges { top, right, bottom, left } = instance.vnode.layout.border;
    if top == 0 && right == 0 && bottom == 0 && left == 0 {
        return;
    }
    let Some(glyphs) = border_glyphs(instance.vnode.paint.border_style) else {
        return;
    };
    let rect = instance.rect;
    let style = TextStyle::new().fg(instance.vnode.paint.border_color.unwrap_or(crate::color::Color::Default));
    let has_corners = top == 1 && bottom == 1 && left == 1 && right == 1;

    if top > 0 {
        let line = horizontal_run(&glyphs, rect.size.width, has_corners);
        for row in 0..top {
            let string = intern_line(dl, &line);
            let y = rect.position.y.saturating_add(row);
            dl.commands.push(DrawCommand::DrawText { x: rect.position.x, y, string, style });
        }
    }
    if bottom > 0 {
        let line = horizontal_run(&glyphs, rect.size.width, has_corners);
        for row in 0..bottom {
            let y = rect.bottom().saturating_sub(1).saturating_sub(row);
            let string = intern_line(dl, &line);
            dl.commands.push(DrawCommand::DrawText { x: rect.position.x, y, string, style });
        }
    }
    let interior_top = rect.position.y.saturating_add(u16::from(has_corners));
    let interior_bottom = rect.bottom().saturating_sub(u16::from(has_corners));
    if left > 0 {
        for col in 0..left {
            let x = rect.position.x.saturating_add(col);
            for y in interior_top..interior_bottom {
                let string = intern_line(dl, glyphs.vertical);
                dl.commands.push(DrawCommand::DrawText { x, y, string, style });
            }
        }
    }
    if right > 0 {
        for col in 0..right {
            let x = rect.right().saturating_sub(1).saturating_sub(col);
            for y in interior_top..interior_bottom {
                let string = intern_line(dl, glyphs.vertical);
                dl.commands.push(DrawCommand::DrawText { x, y, string, style });
            }
        }
    }
}

fn horizontal_run(glyphs: &BorderGlyphs, width: u16, has_corners: bool) -> String {
    let width = width as usize;
    if width == 0 {
        return String::new();
    }
    if has_corners && width >= 2 {
        let mid = width - 2;
        format!("{}{}{}", glyphs.top_left, glyphs.horizontal.repeat(mid), glyphs.top_right)
    } else {
        glyphs.horizontal.repeat(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use crate::vnode::{Direction, VNode, VNodeKind};
    use crate::wrap::WrapPolicy;

    fn mount_at(vnode: VNode, rect: Rect) -> Instance {
        let mut next_id = 0;
        let mut inst = Instance::mount(vnode, &mut next_id);
        inst.rect = rect;
        inst
    }

    #[test]
    fn clear_is_always_first_command() {
        let root = mount_at(VNode::text("hi"), Rect::new(0, 0, 10, 1));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        assert_eq!(dl.commands[0], DrawCommand::Clear);
    }

    #[test]
    fn text_node_emits_draw_text_with_wrapped_lines() {
        let mut vnode = VNode::text("hello world");
        if let VNodeKind::Text { wrap, .. } = &mut vnode.kind {
            *wrap = WrapPolicy::Word;
        }
        let root = mount_at(vnode, Rect::new(0, 0, 5, 3));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        let draw_texts: Vec<_> = dl.commands.iter().filter(|c| matches!(c, DrawCommand::DrawText { .. })).collect();
        assert_eq!(draw_texts.len(), 2); // "hello" / "world" at width 5
    }

    #[test]
    fn hidden_node_emits_nothing() {
        let mut vnode = VNode::text("hi");
        vnode.hidden = true;
        let root = mount_at(vnode, Rect::new(0, 0, 5, 1));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        assert_eq!(dl.commands, vec![DrawCommand::Clear]);
    }

    #[test]
    fn background_emits_fill_rect() {
        let mut vnode = VNode::stack(Direction::Row, vec![]);
        vnode.paint.background = Some(crate::color::Color::Indexed(4));
        let root = mount_at(vnode, Rect::new(0, 0, 4, 2));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        assert!(dl.commands.iter().any(|c| matches!(c, DrawCommand::FillRect { .. })));
    }

    #[test]
    fn hidden_overflow_pushes_and_pops_clip_around_children() {
        let mut parent = VNode::stack(Direction::Column, vec![VNode::text("child")]);
        parent.layout.overflow_y = Overflow::Hidden;
        let mut root = mount_at(parent, Rect::new(0, 0, 10, 1));
        root.children[0].rect = Rect::new(0, 0, 10, 1);
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        let push_pos = dl.commands.iter().position(|c| matches!(c, DrawCommand::PushClip { .. }));
        let pop_pos = dl.commands.iter().position(|c| matches!(c, DrawCommand::PopClip));
        assert!(push_pos.is_some() && pop_pos.is_some());
        assert!(push_pos.unwrap() < pop_pos.unwrap());
    }

    #[test]
    fn border_emits_corner_glyphs_in_top_run() {
        let mut vnode = VNode::stack(Direction::Row, vec![]);
        vnode.layout.border = Edges::all(1);
        vnode.paint.border_style = BorderStyle::Plain;
        let root = mount_at(vnode, Rect::new(0, 0, 6, 4));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        let mut top_run = None;
        for c in &dl.commands {
            if let DrawCommand::DrawText { y: 0, string, .. } = c {
                top_run = dl.strings.get(string.index);
                break;
            }
        }
        let top_run = top_run.expect("top border run present");
        assert_eq!(top_run, "┌────┐".as_bytes());
    }

    #[test]
    fn cursor_position_emits_set_cursor_last() {
        let root = mount_at(VNode::text("hi"), Rect::new(0, 0, 5, 1));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, Some((Rect::new(1, 0, 1, 1), CursorShape::Bar)));
        assert_eq!(dl.commands.last(), Some(&DrawCommand::SetCursor { x: 1, y: 0, shape: 1, visible: true, blink: true }));
    }

    #[test]
    fn overflowing_text_is_clipped_to_its_own_box_when_self_hidden() {
        let mut vnode = VNode::text("hello world");
        if let VNodeKind::Text { wrap, .. } = &mut vnode.kind {
            *wrap = WrapPolicy::None;
        }
        vnode.layout.overflow_x = Overflow::Hidden;
        let root = mount_at(vnode, Rect::new(0, 0, 5, 1));
        let mut builder = DrawlistBuilder::new();
        let dl = builder.build(&root, None);
        let drawn = dl
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::DrawText { string, .. } => dl.strings.get(string.index),
                _ => None,
            })
            .expect("text leaf draws something");
        assert_eq!(drawn, "hello".as_bytes());
    }

    #[test]
    fn reused_builder_resets_arena_between_frames() {
        let root = mount_at(VNode::text("hi"), Rect::new(0, 0, 5, 1));
        let mut builder = DrawlistBuilder::new();
        let _ = builder.build(&root, None);
        let dl2 = builder.build(&root, None);
        assert_eq!(dl2.commands[0], DrawCommand::Clear);
    }
}
