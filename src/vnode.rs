//! VNode tree: the declarative, ephemeral output of a view function, and
//! the layout-relevant props the layout engine and reconciler both read.

use crate::color::Color;
use crate::drawlist::zrdl::{BlitterKind, ImageProtocol};
use crate::framebuffer::fnv1a_hash;
use crate::style::TextStyle;
use crate::wrap::WrapPolicy;

/// A stable key distinguishing siblings of the same kind, for keyed child
/// matching in the reconciler.
pub type Key = String;

/// Length along one axis: an absolute cell count, a percentage of the
/// parent, or automatic sizing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Auto,
    Cells(u16),
    Percent(f32),
}

impl Default for Length {
    fn default() -> Self {
        Length::Auto
    }
}

/// Main-axis/cross-axis stacking direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Row,
    Column,
}

impl Direction {
    fn as_u8(self) -> u8 {
        match self {
            Direction::Row => 0,
            Direction::Column => 1,
        }
    }
}

/// Cross-axis alignment of children within their line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Stretch,
    Start,
    Center,
    End,
}

/// Main-axis distribution of children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
    SpaceAround,
}

/// Overflow behavior for a box that clips or scrolls its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
}

/// Positioning scheme: participates in normal flow, or is placed against
/// the nearest positioned ancestor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Relative,
    Absolute,
}

/// Box-edge insets in cells (padding, margin, border widths).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Edges {
    pub top: u16,
    pub right: u16,
    pub bottom: u16,
    pub left: u16,
}

impl Edges {
    pub fn all(value: u16) -> Self {
        Self { top: value, right: value, bottom: value, left: value }
    }
}

/// Layout-relevant properties shared by every VNode kind. Changes to any
/// field mark the owning instance's `layout` dirty flag in the reconciler.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LayoutProps {
    pub width: Length,
    pub height: Length,
    pub min_width: Length,
    pub min_height: Length,
    pub max_width: Length,
    pub max_height: Length,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Length,
    pub gap: u16,
    pub padding: Edges,
    pub margin: Edges,
    pub border: Edges,
    pub direction: Direction,
    pub wrap_lines: bool,
    pub align_items: Align,
    pub align_self: Option<Align>,
    pub justify_content: Justify,
    pub overflow_x: Overflow,
    pub overflow_y: Overflow,
    pub position: Position,
    pub inset_x: Option<i32>,
    pub inset_y: Option<i32>,
    pub scroll_x: u16,
    pub scroll_y: u16,
    pub z_layer: i32,
}

impl LayoutProps {
    /// This node's own layout-relevant fields, hashed with the framebuffer
    /// differ's FNV-1a oracle. The layout engine's stability signature for a
    /// subtree combines this with its children's signatures and the
    /// viewport hint (see [`crate::layout::stability_signature`]).
    pub fn stability_seed(&self) -> u32 {
        fnv1a_hash(&self.encode())
    }

    fn encode(&self) -> Vec<u8> {
        fn len_bytes(l: Length, out: &mut Vec<u8>) {
            match l {
                Length::Auto => out.push(0),
                Length::Cells(n) => {
                    out.push(1);
                    out.extend_from_slice(&n.to_le_bytes());
                }
                Length::Percent(p) => {
                    out.push(2);
                    out.extend_from_slice(&p.to_bits().to_le_bytes());
                }
            }
        }
        let mut out = Vec::new();
        len_bytes(self.width, &mut out);
        len_bytes(self.height, &mut out);
        len_bytes(self.min_width, &mut out);
        len_bytes(self.min_height, &mut out);
        len_bytes(self.max_width, &mut out);
        len_bytes(self.max_height, &mut out);
        out.extend_from_slice(&self.flex_grow.to_bits().to_le_bytes());
        out.extend_from_slice(&self.flex_shrink.to_bits().to_le_bytes());
        len_bytes(self.flex_basis, &mut out);
        out.extend_from_slice(&self.gap.to_le_bytes());
        out.push(self.direction.as_u8());
        out.push(self.wrap_lines as u8);
        out.push(self.align_items as u8);
        out.push(self.justify_content as u8);
        out.push(self.overflow_x as u8);
        out.push(self.overflow_y as u8);
        out.push(self.position as u8);
        out
    }
}

/// Border glyph set, pinned to a fixed Unicode box-drawing map per style so
/// two boxes with the same `border_style` always render identical corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Plain,
    Rounded,
    Double,
    Thick,
}

/// Paint-only appearance shared by every VNode kind: background fill and
/// border decoration. Unlike [`LayoutProps`], changes here only mark the
/// owning instance's `paint` dirty flag, never `layout`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BoxStyle {
    pub background: Option<Color>,
    pub border_color: Option<Color>,
    pub border_style: BorderStyle,
}

/// The kind-specific payload of a VNode.
#[derive(Clone, Debug, PartialEq)]
pub enum VNodeKind {
    /// A run of styled text.
    Text { content: String, style: TextStyle, wrap: WrapPolicy },
    /// A single-child container with its own box model.
    BoxContainer,
    /// A multi-child flex stack.
    Stack,
    /// A multi-child grid.
    Grid { columns: Vec<Length>, rows: Vec<Length> },
    /// A non-interactive leaf (spacer or divider).
    Leaf,
    /// Positioned above normal flow content (tooltips, modals).
    Overlay,
    /// An interactive leaf that participates in the focus ring.
    FocusableLeaf { tab_index: Option<i32>, disabled: bool },
    /// A user-defined component; `render_id` identifies the render function
    /// for stable identity across reconciliations.
    Composite { render_id: u64 },
    /// Sub-cell raster content, blitted with the given technique. `payload`
    /// is opaque pixel/cell data the builder interns into the blob table
    /// unchanged.
    Canvas { blitter: BlitterKind, pixel_size: (u16, u16), payload: Vec<u8> },
    /// Inline graphics via a terminal graphics protocol.
    Image { protocol: ImageProtocol, pixel_size: (u16, u16), payload: Vec<u8>, image_id: u32, z_layer: i32 },
}

/// A node in the ephemeral tree a view function produces each render.
#[derive(Clone, Debug, PartialEq)]
pub struct VNode {
    pub kind: VNodeKind,
    pub key: Option<Key>,
    pub id: Option<String>,
    pub hidden: bool,
    pub layout: LayoutProps,
    pub paint: BoxStyle,
    pub children: Vec<VNode>,
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: VNodeKind::Text {
                content: content.into(),
                style: TextStyle::default(),
                wrap: WrapPolicy::default(),
            },
            key: None,
            id: None,
            hidden: false,
            layout: LayoutProps::default(),
            paint: BoxStyle::default(),
            children: Vec::new(),
        }
    }

    pub fn stack(direction: Direction, children: Vec<VNode>) -> Self {
        Self {
            kind: VNodeKind::Stack,
            key: None,
            id: None,
            hidden: false,
            layout: LayoutProps { direction, ..LayoutProps::default() },
            paint: BoxStyle::default(),
            children,
        }
    }

    pub fn with_key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_paint(mut self, paint: BoxStyle) -> Self {
        self.paint = paint;
        self
    }

    /// Discriminant used for "kind matches" comparisons during
    /// reconciliation — coarser than full equality (e.g. two `Text` nodes
    /// with different content are still the same kind).
    pub fn kind_tag(&self) -> u8 {
        match &self.kind {
            VNodeKind::Text { .. } => 0,
            VNodeKind::BoxContainer => 1,
            VNodeKind::Stack => 2,
            VNodeKind::Grid { .. } => 3,
            VNodeKind::Leaf => 4,
            VNodeKind::Overlay => 5,
            VNodeKind::FocusableLeaf { .. } => 6,
            VNodeKind::Canvas { .. } => 7,
            VNodeKind::Image { .. } => 8,
            VNodeKind::Composite { render_id } => {
                // Distinguish composites by render function identity so a
                // different component type is always treated as a replace.
                (16 + (render_id % 240)) as u8
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_vnode_defaults() {
        let n = VNode::text("hi");
        assert!(matches!(n.kind, VNodeKind::Text { .. }));
        assert!(n.key.is_none());
    }

    #[test]
    fn kind_tag_distinguishes_composites_by_render_id() {
        let a = VNode { kind: VNodeKind::Composite { render_id: 1 }, ..VNode::text("") };
        let b = VNode { kind: VNodeKind::Composite { render_id: 2 }, ..VNode::text("") };
        assert_ne!(a.kind_tag(), b.kind_tag());
    }

    #[test]
    fn layout_props_hash_changes_with_width() {
        let a = LayoutProps { width: Length::Cells(5), ..LayoutProps::default() };
        let b = LayoutProps { width: Length::Cells(6), ..LayoutProps::default() };
        assert_ne!(a.stability_seed(), b.stability_seed());
    }

    #[test]
    fn layout_props_hash_stable_for_equal_props() {
        let a = LayoutProps { gap: 2, ..LayoutProps::default() };
        let b = LayoutProps { gap: 2, ..LayoutProps::default() };
        assert_eq!(a.stability_seed(), b.stability_seed());
    }

    #[test]
    fn with_key_and_id() {
        let n = VNode::text("x").with_key("row-1").with_id("save-button");
        assert_eq!(n.key.as_deref(), Some("row-1"));
        assert_eq!(n.id.as_deref(), Some("save-button"));
    }
}
