//! Reconciler (C4): commits a new VNode tree against the previous runtime
//! instance tree with minimum structural churn.

use std::collections::HashMap;

use crate::error::{NodePath, RenderError, Result};
use crate::instance::{DirtyFlags, Instance, InstanceId};
use crate::vnode::VNode;

/// Runs one reconciliation pass and owns the `next_id` counter across
/// frames so instance ids never collide or get reused.
pub struct Reconciler {
    next_id: InstanceId,
}

impl Reconciler {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Reconcile `new_root` against `previous`. `previous` is `None` on the
    /// very first frame (pure mount).
    pub fn reconcile(&mut self, previous: Option<Instance>, new_root: VNode) -> Result<Instance> {
        let mut path = vec!["root".to_string()];
        let instance = match previous {
            None => Instance::mount(new_root, &mut self.next_id),
            Some(prev) => self.reconcile_node(prev, new_root, &mut path)?,
        };
        check_duplicate_focus_ids(&instance)?;
        Ok(instance)
    }

    fn reconcile_node(&mut self, mut prev: Instance, next: VNode, path: &mut NodePath) -> Result<Instance> {
        if prev.vnode.kind_tag() != next.kind_tag() {
            // Replace: unmount releases nothing here (callers run release
            // effects separately using the dropped `prev` value), mount
            // fresh.
            return Ok(Instance::mount(next, &mut self.next_id));
        }

        let layout_changed = prev.vnode.layout != next.layout;
        let paint_changed = !layout_changed && prev.vnode != next;

        let new_children = self.reconcile_children(std::mem::take(&mut prev.children), next.children.clone(), path)?;

        let focus_id = match &next.kind {
            crate::vnode::VNodeKind::FocusableLeaf { .. } => next.id.clone(),
            _ => None,
        };

        let mut dirty = DirtyFlags::empty();
        if layout_changed {
            dirty |= DirtyFlags::LAYOUT | DirtyFlags::PAINT;
        }
        if paint_changed {
            dirty |= DirtyFlags::PAINT;
        }
        if focus_id != prev.focus_id {
            dirty |= DirtyFlags::METADATA;
        }

        Ok(Instance {
            id: prev.id,
            key: next.key.clone(),
            vnode: next,
            children: new_children,
            rect: prev.rect,
            stability_signature: prev.stability_signature,
            dirty,
            hooks: prev.hooks,
            focus_id,
        })
    }

    fn reconcile_children(
        &mut self,
        prev_children: Vec<Instance>,
        next_children: Vec<VNode>,
        path: &mut NodePath,
    ) -> Result<Vec<Instance>> {
        let any_keyed = next_children.iter().any(|c| c.key.is_some());

        if any_keyed {
            self.reconcile_keyed(prev_children, next_children, path)
        } else {
            self.reconcile_positional(prev_children, next_children, path)
        }
    }

    fn reconcile_positional(
        &mut self,
        mut prev_children: Vec<Instance>,
        next_children: Vec<VNode>,
        path: &mut NodePath,
    ) -> Result<Vec<Instance>> {
        let mut result = Vec::with_capacity(next_children.len());
        let mut prev_iter = prev_children.drain(..);
        for (i, next_child) in next_children.into_iter().enumerate() {
            path.push(format!("[{i}]"));
            let reconciled = match prev_iter.next() {
                Some(prev_child) if prev_child.vnode.kind_tag() == next_child.kind_tag() => {
                    self.reconcile_node(prev_child, next_child, path)?
                }
                Some(_stale) => Instance::mount(next_child, &mut self.next_id),
                None => Instance::mount(next_child, &mut self.next_id),
            };
            path.pop();
            result.push(reconciled);
        }
        Ok(result)
    }

    fn reconcile_keyed(
        &mut self,
        prev_children: Vec<Instance>,
        next_children: Vec<VNode>,
        path: &mut NodePath,
    ) -> Result<Vec<Instance>> {
        // Keyless children among keyed siblings use their previous position
        // as an implicit key.
        let mut by_key: HashMap<String, Instance> = HashMap::new();
        for (i, child) in prev_children.into_iter().enumerate() {
            let key = child.key.clone().unwrap_or_else(|| format!("__pos_{i}"));
            by_key.insert(key, child);
        }

        let mut result = Vec::with_capacity(next_children.len());
        for (i, next_child) in next_children.into_iter().enumerate() {
            let lookup_key = next_child.key.clone().unwrap_or_else(|| format!("__pos_{i}"));
            path.push(format!("[{lookup_key}]"));
            let reconciled = match by_key.remove(&lookup_key) {
                Some(prev_child) if prev_child.vnode.kind_tag() == next_child.kind_tag() => {
                    self.reconcile_node(prev_child, next_child, path)?
                }
                _ => Instance::mount(next_child, &mut self.next_id),
            };
            path.pop();
            result.push(reconciled);
        }
        // Remaining entries in `by_key` are unmounted; release effects are
        // the caller's responsibility (they still own the dropped values
        // until this function returns, but we don't need them further).
        Ok(result)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

fn check_duplicate_focus_ids(root: &Instance) -> Result<()> {
    let mut seen: HashMap<&str, NodePath> = HashMap::new();
    let mut path = vec!["root".to_string()];
    walk_focus_ids(root, &mut path, &mut seen)
}

fn walk_focus_ids<'a>(
    instance: &'a Instance,
    path: &mut NodePath,
    seen: &mut HashMap<&'a str, NodePath>,
) -> Result<()> {
    if let Some(id) = &instance.focus_id {
        if let Some(first_path) = seen.get(id.as_str()) {
            return Err(RenderError::DuplicateId {
                id: id.clone(),
                first_path: first_path.clone(),
                second_path: path.clone(),
            });
        }
        seen.insert(id.as_str(), path.clone());
    }
    for (i, child) in instance.children.iter().enumerate() {
        path.push(format!("[{i}]"));
        walk_focus_ids(child, path, seen)?;
        path.pop();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vnode::{Direction, VNodeKind};

    fn focusable(text: &str, id: &str) -> VNode {
        let mut n = VNode::text(text).with_id(id);
        n.kind = VNodeKind::FocusableLeaf { tab_index: None, disabled: false };
        n
    }

    #[test]
    fn first_frame_is_pure_mount() {
        let mut r = Reconciler::new();
        let inst = r.reconcile(None, VNode::text("hi")).unwrap();
        assert!(inst.dirty.contains(DirtyFlags::LAYOUT));
    }

    #[test]
    fn unchanged_tree_has_no_layout_dirty() {
        let mut r = Reconciler::new();
        let inst1 = r.reconcile(None, VNode::text("hi")).unwrap();
        let inst2 = r.reconcile(Some(inst1), VNode::text("hi")).unwrap();
        assert!(!inst2.dirty.contains(DirtyFlags::LAYOUT));
        assert!(!inst2.dirty.contains(DirtyFlags::PAINT));
    }

    #[test]
    fn content_only_change_marks_paint_dirty_not_layout() {
        let mut r = Reconciler::new();
        let inst1 = r.reconcile(None, VNode::text("hi")).unwrap();
        let inst2 = r.reconcile(Some(inst1), VNode::text("bye")).unwrap();
        assert!(inst2.dirty.contains(DirtyFlags::PAINT));
        assert!(!inst2.dirty.contains(DirtyFlags::LAYOUT));
    }

    #[test]
    fn kind_change_replaces_and_reassigns_id() {
        let mut r = Reconciler::new();
        let inst1 = r.reconcile(None, VNode::text("hi")).unwrap();
        let old_id = inst1.id;
        let mut composite = VNode::text("hi");
        composite.kind = VNodeKind::Composite { render_id: 1 };
        let inst2 = r.reconcile(Some(inst1), composite).unwrap();
        assert_ne!(inst2.id, old_id);
    }

    #[test]
    fn same_kind_preserves_instance_id() {
        let mut r = Reconciler::new();
        let inst1 = r.reconcile(None, VNode::text("hi")).unwrap();
        let id = inst1.id;
        let inst2 = r.reconcile(Some(inst1), VNode::text("bye")).unwrap();
        assert_eq!(inst2.id, id);
    }

    #[test]
    fn keyed_children_reordered_preserve_identity() {
        let mut r = Reconciler::new();
        let tree1 = VNode::stack(
            Direction::Column,
            vec![VNode::text("a").with_key("a"), VNode::text("b").with_key("b")],
        );
        let inst1 = r.reconcile(None, tree1).unwrap();
        let a_id = inst1.children[0].id;
        let b_id = inst1.children[1].id;

        let tree2 = VNode::stack(
            Direction::Column,
            vec![VNode::text("b").with_key("b"), VNode::text("a").with_key("a")],
        );
        let inst2 = r.reconcile(Some(inst1), tree2).unwrap();
        assert_eq!(inst2.children[0].id, b_id);
        assert_eq!(inst2.children[1].id, a_id);
    }

    #[test]
    fn duplicate_focusable_id_is_fatal() {
        let mut r = Reconciler::new();
        let tree = VNode::stack(
            Direction::Column,
            vec![focusable("a", "save"), focusable("b", "save")],
        );
        let err = r.reconcile(None, tree).unwrap_err();
        assert!(matches!(err, RenderError::DuplicateId { .. }));
    }

    #[test]
    fn unmounted_child_does_not_appear_in_result() {
        let mut r = Reconciler::new();
        let tree1 = VNode::stack(
            Direction::Column,
            vec![VNode::text("a").with_key("a"), VNode::text("b").with_key("b")],
        );
        let inst1 = r.reconcile(None, tree1).unwrap();
        let tree2 = VNode::stack(Direction::Column, vec![VNode::text("a").with_key("a")]);
        let inst2 = r.reconcile(Some(inst1), tree2).unwrap();
        assert_eq!(inst2.children.len(), 1);
    }
}
