//! Focus ring and hit-test index (C7), rebuilt after reconciliation and
//! layout whenever either marked the relevant dirty flags.

use std::collections::HashSet;

use crate::geometry::{Position, Rect};

/// Identifies an instance in the runtime tree.
pub type InstanceId = u64;

/// One candidate in the focus ring before ordering is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusCandidate {
    /// The instance this entry refers to.
    pub id: InstanceId,
    /// Explicit tab index, if the widget declared one.
    pub tab_index: Option<i32>,
    /// Disabled widgets are excluded from the ring.
    pub disabled: bool,
    /// Hidden widgets are excluded from the ring.
    pub hidden: bool,
}

/// The ordered, navigable set of focusable instances plus any active focus
/// traps (modal/dialog subtree boundaries).
#[derive(Clone, Debug, Default)]
pub struct FocusRing {
    order: Vec<InstanceId>,
    current: Option<usize>,
    /// Stack of `(start, end)` index ranges into `order`, inclusive, each
    /// bounding a trapped subtree. The top of the stack is active.
    trap_stack: Vec<(usize, usize)>,
}

impl FocusRing {
    /// Build a focus ring from document-order candidates.
    ///
    /// Disabled and hidden candidates are dropped. Remaining candidates are
    /// ordered: those with an explicit tab index first, ascending by index
    /// (ties broken by document order), then the rest in document order.
    pub fn build(candidates: &[FocusCandidate]) -> Self {
        let mut indexed: Vec<(usize, FocusCandidate)> = candidates
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, c)| !c.disabled && !c.hidden)
            .collect();

        indexed.sort_by_key(|(doc_pos, c)| (c.tab_index.unwrap_or(i32::MAX), *doc_pos));

        let order: Vec<InstanceId> = indexed.into_iter().map(|(_, c)| c.id).collect();
        let current = if order.is_empty() { None } else { Some(0) };

        Self {
            order,
            current,
            trap_stack: Vec::new(),
        }
    }

    /// The currently focused instance, if any.
    pub fn focused(&self) -> Option<InstanceId> {
        self.current.and_then(|i| self.order.get(i).copied())
    }

    /// Active navigation bounds: the top trap's range if one is pushed,
    /// else the whole ring.
    fn active_bounds(&self) -> Option<(usize, usize)> {
        if let Some(&(start, end)) = self.trap_stack.last() {
            if start <= end && end < self.order.len() {
                Some((start, end))
            } else {
                None
            }
        } else if self.order.is_empty() {
            None
        } else {
            Some((0, self.order.len() - 1))
        }
    }

    /// Move focus to the next instance (Tab), wrapping within the active
    /// trap's bounds if one is pushed.
    pub fn focus_next(&mut self) {
        let Some((start, end)) = self.active_bounds() else {
            return;
        };
        let span = end - start + 1;
        self.current = Some(match self.current {
            Some(i) if i >= start && i <= end => start + (i - start + 1) % span,
            _ => start,
        });
    }

    /// Move focus to the previous instance (Shift-Tab), wrapping within the
    /// active trap's bounds if one is pushed.
    pub fn focus_previous(&mut self) {
        let Some((start, end)) = self.active_bounds() else {
            return;
        };
        let span = end - start + 1;
        self.current = Some(match self.current {
            Some(i) if i >= start && i <= end => start + (i - start + span - 1) % span,
            _ => end,
        });
    }

    /// Set focus directly to a specific instance, if it is part of the
    /// ring and within the active trap's bounds.
    pub fn set_focus(&mut self, id: InstanceId) {
        let Some(pos) = self.order.iter().position(|&w| w == id) else {
            return;
        };
        if let Some((start, end)) = self.active_bounds()
            && (pos < start || pos > end)
        {
            return;
        }
        self.current = Some(pos);
    }

    /// Push a focus trap bounding navigation to the subtree whose
    /// descendant instance ids are listed in `members`. Focus jumps to the
    /// first member in ring order. No-op if no member is in the ring.
    pub fn push_trap(&mut self, members: &[InstanceId]) {
        let member_set: HashSet<InstanceId> = members.iter().copied().collect();
        let positions: Vec<usize> = self
            .order
            .iter()
            .enumerate()
            .filter(|(_, id)| member_set.contains(id))
            .map(|(i, _)| i)
            .collect();
        let (Some(&start), Some(&end)) = (positions.first(), positions.last()) else {
            return;
        };
        self.trap_stack.push((start, end));
        self.current = Some(start);
    }

    /// Pop the innermost focus trap, returning navigation to the next
    /// enclosing scope (another trap, or the full ring).
    pub fn pop_trap(&mut self) {
        self.trap_stack.pop();
    }

    /// Whether `id` lies within the currently active focus trap. Always
    /// true when no trap is pushed. The event router uses this to decide
    /// whether a mouse drag crossing the trap boundary should be cancelled.
    pub fn is_within_active_trap(&self, id: InstanceId) -> bool {
        let Some(&(start, end)) = self.trap_stack.last() else {
            return true;
        };
        match self.order.iter().position(|&w| w == id) {
            Some(pos) => pos >= start && pos <= end,
            None => false,
        }
    }

    /// Number of focusable instances in the ring.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the ring has no focusable instances.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One entry in the hit-test index: the rectangle an instance occupies,
/// its tree depth (used to prefer the deepest match), and the scroll
/// offset applied to descendants below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitRegion {
    /// The instance this region belongs to.
    pub id: InstanceId,
    /// The instance's absolute rectangle.
    pub rect: Rect,
    /// Tree depth, used to break ties in favor of the deepest match.
    pub depth: u32,
    /// Scroll offset this instance applies to its children's coordinates.
    pub scroll_offset: Position,
}

/// Maps cell coordinates to the deepest instance with a registered hit
/// region, threading pointer coordinates through ancestor scroll offsets.
#[derive(Clone, Debug, Default)]
pub struct HitTestIndex {
    regions: Vec<HitRegion>,
}

impl HitTestIndex {
    /// Build a hit-test index from regions in document order.
    pub fn build(regions: Vec<HitRegion>) -> Self {
        Self { regions }
    }

    /// Resolve a cell position to the deepest instance whose rectangle
    /// contains it, accounting for ancestor scroll offsets.
    pub fn hit_test(&self, pos: Position) -> Option<InstanceId> {
        let mut best: Option<&HitRegion> = None;
        for region in &self.regions {
            let adjusted = Position::new(
                pos.x.saturating_add(region.scroll_offset.x),
                pos.y.saturating_add(region.scroll_offset.y),
            );
            if region.rect.contains(adjusted)
                && best.is_none_or(|b| region.depth >= b.depth)
            {
                best = Some(region);
            }
        }
        best.map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: InstanceId) -> FocusCandidate {
        FocusCandidate {
            id,
            tab_index: None,
            disabled: false,
            hidden: false,
        }
    }

    #[test]
    fn empty_ring() {
        let ring = FocusRing::build(&[]);
        assert!(ring.focused().is_none());
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn build_auto_focuses_first() {
        let ring = FocusRing::build(&[candidate(1), candidate(2)]);
        assert_eq!(ring.focused(), Some(1));
    }

    #[test]
    fn focus_next_cycles() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3)]);
        ring.focus_next();
        assert_eq!(ring.focused(), Some(2));
        ring.focus_next();
        assert_eq!(ring.focused(), Some(3));
        ring.focus_next();
        assert_eq!(ring.focused(), Some(1));
    }

    #[test]
    fn focus_previous_wraps() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3)]);
        ring.focus_previous();
        assert_eq!(ring.focused(), Some(3));
    }

    #[test]
    fn disabled_and_hidden_excluded() {
        let candidates = vec![
            candidate(1),
            FocusCandidate { id: 2, tab_index: None, disabled: true, hidden: false },
            FocusCandidate { id: 3, tab_index: None, disabled: false, hidden: true },
            candidate(4),
        ];
        let ring = FocusRing::build(&candidates);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.focused(), Some(1));
    }

    #[test]
    fn explicit_tab_index_sorts_before_document_order() {
        let candidates = vec![
            candidate(1),
            FocusCandidate { id: 2, tab_index: Some(1), disabled: false, hidden: false },
        ];
        let ring = FocusRing::build(&candidates);
        assert_eq!(ring.focused(), Some(2));
    }

    #[test]
    fn trap_bounds_navigation() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3), candidate(4)]);
        ring.push_trap(&[2, 3]);
        assert_eq!(ring.focused(), Some(2));
        ring.focus_next();
        assert_eq!(ring.focused(), Some(3));
        ring.focus_next();
        assert_eq!(ring.focused(), Some(2)); // wraps within trap, not out to 4
    }

    #[test]
    fn pop_trap_restores_full_ring_navigation() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3)]);
        ring.push_trap(&[2]);
        ring.pop_trap();
        ring.set_focus(1);
        ring.focus_next();
        assert_eq!(ring.focused(), Some(2));
    }

    #[test]
    fn set_focus_outside_trap_ignored() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3)]);
        ring.push_trap(&[2]);
        ring.set_focus(3);
        assert_eq!(ring.focused(), Some(2));
    }

    #[test]
    fn hit_test_prefers_deepest_match() {
        let regions = vec![
            HitRegion { id: 1, rect: Rect::new(0, 0, 20, 20), depth: 0, scroll_offset: Position::default() },
            HitRegion { id: 2, rect: Rect::new(2, 2, 10, 10), depth: 1, scroll_offset: Position::default() },
        ];
        let index = HitTestIndex::build(regions);
        assert_eq!(index.hit_test(Position::new(5, 5)), Some(2));
        assert_eq!(index.hit_test(Position::new(15, 15)), Some(1));
    }

    #[test]
    fn hit_test_applies_scroll_offset() {
        let regions = vec![
            HitRegion { id: 1, rect: Rect::new(0, 0, 10, 10), depth: 0, scroll_offset: Position::new(5, 0) },
            HitRegion { id: 2, rect: Rect::new(8, 0, 5, 10), depth: 1, scroll_offset: Position::default() },
        ];
        let index = HitTestIndex::build(regions);
        // Pointer at (3, 0) plus parent's scroll offset of 5 lands at x=8,
        // inside the scrolled child.
        assert_eq!(index.hit_test(Position::new(3, 0)), Some(2));
    }

    #[test]
    fn no_trap_means_everything_is_in_bounds() {
        let ring = FocusRing::build(&[candidate(1), candidate(2)]);
        assert!(ring.is_within_active_trap(1));
        assert!(ring.is_within_active_trap(2));
    }

    #[test]
    fn trap_excludes_instances_outside_it() {
        let mut ring = FocusRing::build(&[candidate(1), candidate(2), candidate(3)]);
        ring.push_trap(&[2]);
        assert!(ring.is_within_active_trap(2));
        assert!(!ring.is_within_active_trap(1));
        assert!(!ring.is_within_active_trap(3));
    }

    #[test]
    fn hit_test_outside_all_regions() {
        let index = HitTestIndex::build(vec![HitRegion {
            id: 1,
            rect: Rect::new(0, 0, 5, 5),
            depth: 0,
            scroll_offset: Position::default(),
        }]);
        assert_eq!(index.hit_test(Position::new(10, 10)), None);
    }
}
