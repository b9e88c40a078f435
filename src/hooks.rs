//! Hook-state bookkeeping (C4): the render-order enforcement backing
//! `use_state`/`use_effect`-style APIs for composite instances.
//!
//! This crate does not run view functions itself — composite expansion is a
//! consumer concern. What it owns is the invariant that matters once a
//! composite does run: the same instance must invoke the same sequence of
//! hook kinds every render, and state must never change while a render is
//! in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{NodePath, RenderError, Result};
use crate::instance::{HookSlot, HookValue};

/// Shared across a whole render pass. State setters living outside this
/// crate check it to detect a mutation attempted from inside a view
/// function.
#[derive(Clone, Debug, Default)]
pub struct RenderLock(Arc<AtomicBool>);

impl RenderLock {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Enter a render scope. The returned guard clears the lock on drop,
    /// including on an early return or panic unwind.
    pub fn enter(&self) -> RenderGuard<'_> {
        self.0.store(true, Ordering::SeqCst);
        RenderGuard { flag: &self.0 }
    }

    /// Called by a state setter; fails if a render is currently in flight.
    pub fn ensure_not_rendering(&self, path: &NodePath) -> Result<()> {
        if self.0.load(Ordering::SeqCst) {
            Err(RenderError::UpdateDuringRender { path: path.clone() })
        } else {
            Ok(())
        }
    }
}

/// RAII guard marking a render pass in progress.
pub struct RenderGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Walks one composite instance's hook-state vector in call order.
///
/// Construct at the start of a composite's render, call `use_state`/
/// `use_effect` in exactly the order the view function calls them, then
/// call `finish` once the render is done.
pub struct HookCursor<'a> {
    slots: &'a mut Vec<HookSlot>,
    cursor: usize,
    previous_len: usize,
}

impl<'a> HookCursor<'a> {
    pub fn new(slots: &'a mut Vec<HookSlot>) -> Self {
        let previous_len = slots.len();
        Self { slots, cursor: 0, previous_len }
    }

    /// Consume the next hook slot as state, initializing it with `init` on
    /// first mount. Returns the stored bytes for the caller's typed wrapper
    /// to interpret.
    pub fn use_state(&mut self, path: &NodePath, init: impl FnOnce() -> Vec<u8>) -> Result<&mut HookValue> {
        let index = self.take_index();
        if index < self.previous_len && !matches!(self.slots[index], HookSlot::State(_)) {
            return Err(self.mismatch_error(path));
        }
        if index == self.slots.len() {
            self.slots.push(HookSlot::State(HookValue(init())));
        }
        match &mut self.slots[index] {
            HookSlot::State(value) => Ok(value),
            HookSlot::Effect { .. } => unreachable!("kind checked above"),
        }
    }

    /// Consume the next hook slot as an effect keyed by `deps_hash`. Returns
    /// whether the effect body should run this render: true on first mount
    /// or when `deps_hash` changed since the last render.
    pub fn use_effect(&mut self, path: &NodePath, deps_hash: u64) -> Result<bool> {
        let index = self.take_index();
        if index < self.previous_len && !matches!(self.slots[index], HookSlot::Effect { .. }) {
            return Err(self.mismatch_error(path));
        }
        if index == self.slots.len() {
            self.slots.push(HookSlot::Effect { deps_hash, ran: false });
        }
        match &mut self.slots[index] {
            HookSlot::Effect { deps_hash: stored, ran } => {
                let changed = *stored != deps_hash;
                *stored = deps_hash;
                let should_run = changed || !*ran;
                *ran = true;
                Ok(should_run)
            }
            HookSlot::State(_) => unreachable!("kind checked above"),
        }
    }

    fn take_index(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    fn mismatch_error(&self, path: &NodePath) -> RenderError {
        RenderError::HookOrderMismatch {
            path: path.clone(),
            expected: self.previous_len,
            actual: self.cursor,
        }
    }

    /// Confirm the render called exactly as many hooks as the previous one
    /// (first mount, where there is no previous count, always passes).
    pub fn finish(self, path: &NodePath) -> Result<()> {
        if self.previous_len != 0 && self.cursor != self.previous_len {
            return Err(RenderError::HookOrderMismatch {
                path: path.clone(),
                expected: self.previous_len,
                actual: self.cursor,
            });
        }
        Ok(())
    }
}
