//! The persistent runtime tree (C4): the reconciled counterpart of a VNode
//! tree. Instances outlive individual frames; VNodes do not.

use crate::geometry::Rect;
use crate::vnode::{Key, VNode, VNodeKind};

/// Identifies an instance for its lifetime. Stable across reconciliations
/// (an update never changes an instance's id; a replace always does).
pub type InstanceId = crate::focus::InstanceId;

bitflags::bitflags! {
    /// Which phases need to re-run for this instance before the frame can
    /// be considered complete.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const LAYOUT = 0b001;
        const PAINT = 0b010;
        const METADATA = 0b100;
    }
}

/// One slot of positional hook state belonging to a composite instance.
#[derive(Clone, Debug, PartialEq)]
pub enum HookSlot {
    State(HookValue),
    Effect { deps_hash: u64, ran: bool },
}

/// A boxed, type-erased hook value. Composites are expected to downcast via
/// their own typed wrapper; the reconciler only needs to count and compare
/// slots, never interpret them.
#[derive(Clone, Debug, PartialEq)]
pub struct HookValue(pub Vec<u8>);

/// A node in the persistent runtime tree.
#[derive(Clone, Debug)]
pub struct Instance {
    pub id: InstanceId,
    pub key: Option<Key>,
    pub vnode: VNode,
    pub children: Vec<Instance>,
    pub rect: Rect,
    pub stability_signature: u32,
    pub dirty: DirtyFlags,
    pub hooks: Vec<HookSlot>,
    pub focus_id: Option<String>,
}

impl Instance {
    /// Mount a fresh instance (and its subtree) from a VNode, with no prior
    /// runtime state to carry forward.
    pub fn mount(vnode: VNode, next_id: &mut InstanceId) -> Self {
        let id = *next_id;
        *next_id += 1;
        let focus_id = match &vnode.kind {
            VNodeKind::FocusableLeaf { .. } => vnode.id.clone(),
            _ => None,
        };
        let children = vnode
            .children
            .iter()
            .cloned()
            .map(|child| Instance::mount(child, next_id))
            .collect();
        Instance {
            id,
            key: vnode.key.clone(),
            vnode,
            children,
            rect: Rect::default(),
            stability_signature: 0,
            dirty: DirtyFlags::LAYOUT | DirtyFlags::PAINT | DirtyFlags::METADATA,
            hooks: Vec::new(),
            focus_id,
        }
    }

    /// Collect every focusable id in this subtree, paired with the
    /// instance id, for duplicate detection and focus-ring construction.
    pub fn collect_focusable_ids<'a>(&'a self, out: &mut Vec<(&'a str, InstanceId)>) {
        if let Some(id) = &self.focus_id {
            out.push((id.as_str(), self.id));
        }
        for child in &self.children {
            child.collect_focusable_ids(out);
        }
    }
}
