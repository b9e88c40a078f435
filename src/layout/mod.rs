//! Layout engine (C3): Taffy-backed constraint solving from the reconciled
//! runtime tree to absolute, integer-cell rectangles.

mod style_converter;

pub use style_converter::layout_props_to_taffy;

use std::collections::HashMap;

use taffy::prelude::*;
use taffy::{AvailableSpace, NodeId, TaffyTree};

use crate::config::DepthLimits;
use crate::error::{NodePath, RenderError, Result};
use crate::geometry::{Rect, Size};
use crate::instance::{DirtyFlags, Instance, InstanceId};
use crate::vnode::VNodeKind;
use crate::wrap::{wrapped_line_count, WrapPolicy};

/// Per-leaf context the measure function uses for intrinsic text sizing.
/// Non-text nodes carry `None` and measure to their Taffy-resolved size.
struct LeafContext {
    text: Option<(String, WrapPolicy)>,
}

/// Wraps a [`TaffyTree`] to compute layout for a runtime [`Instance`] tree,
/// caching node identity by [`InstanceId`] across frames.
pub struct LayoutEngine {
    taffy: TaffyTree<LeafContext>,
    id_to_node: HashMap<InstanceId, NodeId>,
    node_to_id: HashMap<NodeId, InstanceId>,
    cached_signature: Option<u32>,
    cached_rects: HashMap<InstanceId, Rect>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            taffy: TaffyTree::new(),
            id_to_node: HashMap::new(),
            node_to_id: HashMap::new(),
            cached_signature: None,
            cached_rects: HashMap::new(),
        }
    }

    /// Build (or rebuild) the Taffy tree from the runtime instance tree and
    /// compute layout against the given viewport. Returns a map from
    /// instance id to its resolved absolute [`Rect`].
    ///
    /// Before touching Taffy at all, this checks [`can_reuse_layout`] against
    /// the signature cached from the previous call: if the tree's
    /// layout-relevant props (and the viewport) are unchanged, the previous
    /// rect map is returned directly rather than rebuilding and re-solving
    /// the whole tree.
    ///
    /// `depth_limits` governs the instance tree's nesting depth: crossing
    /// `soft_warn` logs a warning and continues; reaching `nesting_fail`
    /// aborts the frame with [`RenderError::DepthExceeded`].
    pub fn compute(&mut self, root: &Instance, viewport: Size, depth_limits: DepthLimits) -> Result<HashMap<InstanceId, Rect>> {
        let viewport_seed = crate::framebuffer::fnv1a_hash(&[viewport.width.to_le_bytes(), viewport.height.to_le_bytes()].concat());
        let signature = stability_signature(root, viewport_seed);
        if let Some(previous_signature) = self.cached_signature
            && !self.cached_rects.is_empty()
            && can_reuse_layout(root, previous_signature, signature)
        {
            return Ok(self.cached_rects.clone());
        }

        self.taffy = TaffyTree::new();
        self.id_to_node.clear();
        self.node_to_id.clear();

        let mut path = vec!["root".to_string()];
        let node = self.build_node(root, &mut path, 0, depth_limits)?;

        let available = taffy::Size {
            width: AvailableSpace::Definite(f32::from(viewport.width)),
            height: AvailableSpace::Definite(f32::from(viewport.height)),
        };

        self.taffy
            .compute_layout_with_measure(node, available, measure_leaf)
            .map_err(|e| RenderError::LayoutImpossible {
                path: vec!["root".to_string()],
                reason: e.to_string(),
            })?;

        let mut out = HashMap::new();
        self.collect_rects(root, node, &mut out)?;
        self.cached_signature = Some(signature);
        self.cached_rects = out.clone();
        Ok(out)
    }

    fn build_node(&mut self, instance: &Instance, path: &mut NodePath, depth: usize, depth_limits: DepthLimits) -> Result<NodeId> {
        if depth == depth_limits.soft_warn {
            tracing::warn!(path = ?path, depth, "layout nesting depth crossed soft warning threshold");
        }
        if depth >= depth_limits.nesting_fail {
            return Err(RenderError::DepthExceeded { path: path.clone(), depth, limit: depth_limits.nesting_fail });
        }

        let style = layout_props_to_taffy(&instance.vnode.layout, matches!(instance.vnode.kind, VNodeKind::Grid { .. }));

        let leaf_ctx = match &instance.vnode.kind {
            VNodeKind::Text { content, wrap, .. } => Some(LeafContext { text: Some((content.clone(), *wrap)) }),
            _ => None,
        };

        let node = if instance.children.is_empty() {
            self.taffy
                .new_leaf_with_context(style, leaf_ctx.unwrap_or(LeafContext { text: None }))
                .map_err(|e| RenderError::LayoutImpossible { path: path.clone(), reason: e.to_string() })?
        } else {
            let mut child_nodes = Vec::with_capacity(instance.children.len());
            for (i, child) in instance.children.iter().enumerate() {
                path.push(format!("[{i}]"));
                child_nodes.push(self.build_node(child, path, depth + 1, depth_limits)?);
                path.pop();
            }
            self.taffy
                .new_with_children(style, &child_nodes)
                .map_err(|e| RenderError::LayoutImpossible { path: path.clone(), reason: e.to_string() })?
        };

        self.id_to_node.insert(instance.id, node);
        self.node_to_id.insert(node, instance.id);
        Ok(node)
    }

    fn collect_rects(&self, instance: &Instance, node: NodeId, out: &mut HashMap<InstanceId, Rect>) -> Result<()> {
        let layout = self
            .taffy
            .layout(node)
            .map_err(|e| RenderError::LayoutImpossible { path: vec![], reason: e.to_string() })?;

        let rect = Rect::new(
            round_position(layout.location.x),
            round_position(layout.location.y),
            round_size(layout.size.width),
            round_size(layout.size.height),
        );
        out.insert(instance.id, rect);

        let children = self
            .taffy
            .children(node)
            .map_err(|e| RenderError::LayoutImpossible { path: vec![], reason: e.to_string() })?;
        for (child_instance, child_node) in instance.children.iter().zip(children) {
            self.collect_rects(child_instance, child_node, out)?;
        }
        Ok(())
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn measure_leaf(
    known_dimensions: taffy::Size<Option<f32>>,
    available_space: taffy::Size<AvailableSpace>,
    _node_id: NodeId,
    node_context: Option<&mut LeafContext>,
    _style: &taffy::Style,
) -> taffy::Size<f32> {
    let Some(ctx) = node_context else {
        return taffy::Size::ZERO;
    };
    let Some((text, wrap)) = &ctx.text else {
        return taffy::Size::ZERO;
    };

    if let taffy::Size { width: Some(w), height: Some(h) } = known_dimensions {
        return taffy::Size { width: w, height: h };
    }

    let width_hint = match known_dimensions.width {
        Some(w) => w as u16,
        None => match available_space.width {
            AvailableSpace::Definite(w) => w as u16,
            _ => crate::text::advance(text) as u16,
        },
    };

    let lines = wrapped_line_count(text, width_hint.max(1), *wrap);
    let measured_width = text
        .split('\n')
        .map(crate::text::advance)
        .max()
        .unwrap_or(0)
        .min(usize::from(width_hint.max(1))) as f32;

    taffy::Size {
        width: known_dimensions.width.unwrap_or(measured_width),
        height: known_dimensions.height.unwrap_or(lines as f32),
    }
}

/// Stability signature for a subtree: the FNV-1a hash of the node's own
/// layout-relevant props folded with each child's signature, continued
/// from a viewport-derived seed. Reused from the previous frame when
/// unchanged and the resolved rect is also unchanged (the layout engine's
/// primary reuse optimization).
///
/// A text leaf's measured size depends on its content and wrap policy, not
/// just its `LayoutProps`, so both are folded in here too — otherwise an
/// edited label with unchanged layout props would hash identically to the
/// old one and wrongly be treated as reusable.
pub fn stability_signature(instance: &Instance, viewport_seed: u32) -> u32 {
    let mut bytes = instance.vnode.layout.stability_seed().to_le_bytes().to_vec();
    bytes.extend_from_slice(&viewport_seed.to_le_bytes());
    if let VNodeKind::Text { content, wrap, .. } = &instance.vnode.kind {
        bytes.extend_from_slice(content.as_bytes());
        bytes.push(*wrap as u8);
    }
    for child in &instance.children {
        bytes.extend_from_slice(&stability_signature(child, viewport_seed).to_le_bytes());
    }
    crate::framebuffer::fnv1a_hash(&bytes)
}

/// Whether a subtree's layout can be reused verbatim from the previous
/// frame: its stability signature is unchanged and it has no pending
/// layout-dirty flag.
pub fn can_reuse_layout(instance: &Instance, previous_signature: u32, current_signature: u32) -> bool {
    !instance.dirty.contains(DirtyFlags::LAYOUT) && previous_signature == current_signature
}

fn round_position(value: f32) -> u16 {
    if value < 0.0 {
        0
    } else if value > f32::from(u16::MAX) {
        u16::MAX
    } else {
        value.floor() as u16
    }
}

fn round_size(value: f32) -> u16 {
    if value < 0.0 {
        0
    } else if value > f32::from(u16::MAX) {
        u16::MAX
    } else {
        value.round() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{Direction, Length, VNode};

    fn mounted(vnode: VNode) -> Instance {
        let mut next_id = 0;
        Instance::mount(vnode, &mut next_id)
    }

    #[test]
    fn single_text_leaf_fills_viewport_width() {
        let inst = mounted(VNode::text("hello"));
        let mut engine = LayoutEngine::new();
        let rects = engine.compute(&inst, Size::new(20, 5), DepthLimits::default()).unwrap();
        let rect = rects.get(&inst.id).unwrap();
        assert_eq!(rect.position.x, 0);
        assert_eq!(rect.position.y, 0);
    }

    #[test]
    fn column_stack_places_children_in_sequence() {
        let tree = VNode::stack(
            Direction::Column,
            vec![
                { let mut n = VNode::text("a"); n.layout.height = Length::Cells(2); n },
                { let mut n = VNode::text("b"); n.layout.height = Length::Cells(3); n },
            ],
        );
        let inst = mounted(tree);
        let mut engine = LayoutEngine::new();
        let rects = engine.compute(&inst, Size::new(10, 10), DepthLimits::default()).unwrap();
        let first = rects.get(&inst.children[0].id).unwrap();
        let second = rects.get(&inst.children[1].id).unwrap();
        assert_eq!(first.position.y, 0);
        assert_eq!(second.position.y, 2);
    }

    #[test]
    fn depth_limit_exceeded_is_fatal() {
        let limits = DepthLimits::default();
        let mut node = VNode::text("leaf");
        for _ in 0..(limits.nesting_fail + 2) {
            node = VNode::stack(Direction::Column, vec![node]);
        }
        let inst = mounted(node);
        let mut engine = LayoutEngine::new();
        let err = engine.compute(&inst, Size::new(10, 10), limits).unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded { .. }));
    }

    #[test]
    fn stability_signature_changes_with_width() {
        let a = mounted(VNode::text("hi"));
        let mut b_node = VNode::text("hi");
        b_node.layout.width = Length::Cells(5);
        let b = mounted(b_node);
        assert_ne!(stability_signature(&a, 0), stability_signature(&b, 0));
    }

    #[test]
    fn stability_signature_stable_across_identical_trees() {
        let a = mounted(VNode::text("hi"));
        let b = mounted(VNode::text("hi"));
        assert_eq!(stability_signature(&a, 7), stability_signature(&b, 7));
    }

    #[test]
    fn stability_signature_changes_with_text_content() {
        let a = mounted(VNode::text("hi"));
        let b = mounted(VNode::text("bye"));
        assert_ne!(stability_signature(&a, 0), stability_signature(&b, 0));
    }

    #[test]
    fn unchanged_tree_reuses_cached_rects_without_rebuilding_taffy() {
        let inst = mounted(VNode::text("hello"));
        let mut engine = LayoutEngine::new();
        let first = engine.compute(&inst, Size::new(20, 5), DepthLimits::default()).unwrap();
        // The node map is cleared by a real rebuild but left untouched by a
        // cache hit, so checking it after a second identical call shows
        // whether `compute` actually took the reuse path.
        engine.id_to_node.clear();
        let second = engine.compute(&inst, Size::new(20, 5), DepthLimits::default()).unwrap();
        assert_eq!(first, second);
        assert!(engine.id_to_node.is_empty());
    }

    #[test]
    fn changed_viewport_invalidates_cached_layout() {
        let inst = mounted(VNode::text("hello"));
        let mut engine = LayoutEngine::new();
        let first = engine.compute(&inst, Size::new(20, 5), DepthLimits::default()).unwrap();
        let second = engine.compute(&inst, Size::new(3, 5), DepthLimits::default()).unwrap();
        assert_ne!(first.get(&inst.id).unwrap().size.width, second.get(&inst.id).unwrap().size.width);
    }
}
