//! Frame orchestrator (C9) — the single-threaded cooperative loop that owns
//! the render lifecycle: `idle → building → submitting → idle`.

use std::time::{Duration, Instant};

use crate::ansi::Renderer;
use crate::backend::Backend;
use crate::color::ColorTier;
use crate::config::RuntimeConfig;
use crate::drawlist::{interpret, CursorShape, DrawlistBuilder};
use crate::error::{RenderError, Result};
use crate::framebuffer::Framebuffer;
use crate::geometry::{Rect, Size};
use crate::instance::Instance;

/// Lifecycle state of the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Waiting for state changes, timers, or events.
    Idle,
    /// Running view → reconcile → layout → build → diff.
    Building,
    /// Frame bytes handed to the backend, awaiting acknowledgement.
    Submitting {
        /// Sequence number of the in-flight frame.
        seq: u64,
    },
}

/// Manages the double-buffered rendering pipeline and its state machine.
///
/// A caller drives it as:
/// 1. `request_frame()` — records that a frame is wanted; may coalesce.
/// 2. `begin_frame()` — transitions `idle → building`, clears the current
///    framebuffer for the caller to draw into.
/// 3. The caller reconciles and lays out its view into an instance tree
///    (C3/C4, outside this type's scope), then calls `paint()` to run it
///    through C5's drawlist builder and interpret the result into the
///    framebuffer — or writes cells directly via `framebuffer_mut()`.
/// 4. `submit_frame()` — diffs, renders, and hands bytes to the backend;
///    transitions `building → submitting`.
/// 5. `acknowledge(seq)` — the backend confirms the frame was applied;
///    transitions `submitting → idle`.
pub struct FrameOrchestrator {
    framebuffer: Framebuffer,
    config: RuntimeConfig,
    state: OrchestratorState,
    next_seq: u64,
    frame_requested: bool,
    last_submitted_at: Option<Instant>,
    submitted_at: Option<Instant>,
    force_full_invalidation: bool,
}

impl FrameOrchestrator {
    /// Create an orchestrator sized for the given backend, using its
    /// reported capabilities.
    pub fn new(backend: &dyn Backend, config: RuntimeConfig) -> Result<Self> {
        let size = backend.size()?;
        Ok(Self {
            framebuffer: Framebuffer::new(size),
            config,
            state: OrchestratorState::Idle,
            next_seq: 0,
            frame_requested: false,
            last_submitted_at: None,
            submitted_at: None,
            force_full_invalidation: false,
        })
    }

    /// Create an orchestrator with an explicit size, for testing without a
    /// live backend.
    pub fn with_size(size: Size, config: RuntimeConfig) -> Self {
        Self {
            framebuffer: Framebuffer::new(size),
            config,
            state: OrchestratorState::Idle,
            next_seq: 0,
            frame_requested: false,
            last_submitted_at: None,
            submitted_at: None,
            force_full_invalidation: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    /// Current framebuffer dimensions.
    pub fn size(&self) -> Size {
        self.framebuffer.size()
    }

    /// Mutable access to the framebuffer a caller draws the next frame into.
    /// Only meaningful while `state() == Building`.
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    /// Read-only access to the framebuffer.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Build the drawlist for `root` (an already-reconciled, already-laid-out
    /// instance tree) and interpret it into the current framebuffer.
    /// Only meaningful while `state() == Building`; a no-op otherwise.
    /// Returns the cursor position/shape/visibility the drawlist requested,
    /// if any.
    pub fn paint(
        &mut self,
        builder: &mut DrawlistBuilder,
        root: &Instance,
        cursor: Option<(Rect, CursorShape)>,
    ) -> Option<(u16, u16, CursorShape, bool)> {
        if self.state != OrchestratorState::Building {
            return None;
        }
        let drawlist = builder.build(root, cursor);
        interpret::apply(&drawlist, &mut self.framebuffer)
    }

    /// Record that a frame is wanted. If the orchestrator is already
    /// `building` or `submitting`, this coalesces: only the latest state
    /// will ever be submitted, and no second frame is queued.
    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    /// Respect the FPS cap: returns `true` if enough time has passed since
    /// the last submitted frame that a new one would not be dropped.
    pub fn fps_budget_available(&self) -> bool {
        match self.last_submitted_at {
            None => true,
            Some(last) => {
                let min_interval = Duration::from_secs_f64(1.0 / f64::from(self.config.fps_cap.max(1)));
                last.elapsed() >= min_interval
            }
        }
    }

    /// Transition `idle → building` if a frame was requested and the FPS
    /// cap allows it. Returns `true` if a build actually started.
    pub fn begin_frame(&mut self) -> bool {
        if self.state != OrchestratorState::Idle || !self.frame_requested {
            return false;
        }
        if !self.fps_budget_available() {
            // Dropped: latest-wins, but we keep frame_requested set so the
            // next poll picks it up once budget is available again.
            return false;
        }
        self.frame_requested = false;
        self.state = OrchestratorState::Building;
        self.framebuffer.clear_current();
        true
    }

    /// Diff the framebuffer, render to bytes, and hand them to the backend.
    /// Transitions `building → submitting`. No-op (returns `Ok(())`) if the
    /// diff produced no bytes — the orchestrator returns straight to idle.
    pub fn submit_frame(&mut self, backend: &mut dyn Backend, tier: ColorTier) -> Result<()> {
        if self.state != OrchestratorState::Building {
            return Ok(());
        }

        let delta = self.framebuffer.diff(self.force_full_invalidation);
        let caps = backend.capabilities();
        let renderer = Renderer::new(tier, caps.synchronized_output);
        let output = renderer.render(delta.changes(), self.framebuffer.width());

        if output.is_empty() {
            self.framebuffer.present();
            self.force_full_invalidation = false;
            self.state = OrchestratorState::Idle;
            return Ok(());
        }

        let bytes = output.as_bytes();
        match backend.write_raw(bytes) {
            Ok(()) => {
                backend.flush()?;
                let seq = self.next_seq;
                self.next_seq += 1;
                self.state = OrchestratorState::Submitting { seq };
                self.submitted_at = Some(Instant::now());
                Ok(())
            }
            Err(RenderError::BackendWrite { written, attempted }) => {
                self.force_full_invalidation = true;
                self.state = OrchestratorState::Idle;
                Err(RenderError::BackendWrite { written, attempted })
            }
            Err(other) => Err(other),
        }
    }

    /// The backend acknowledges a submitted frame. Transitions
    /// `submitting → idle`. A stale or mismatched `seq` is ignored.
    pub fn acknowledge(&mut self, seq: u64) {
        if let OrchestratorState::Submitting { seq: pending } = self.state
            && pending == seq
        {
            self.framebuffer.present();
            self.last_submitted_at = self.submitted_at.take();
            self.force_full_invalidation = false;
            self.state = OrchestratorState::Idle;
        }
    }

    /// Check whether the backend's ack deadline has expired for the
    /// in-flight frame. If so, force the orchestrator back to `idle` and
    /// mark the next frame for full invalidation.
    pub fn check_ack_timeout(&mut self) -> Option<RenderError> {
        if let OrchestratorState::Submitting { seq } = self.state
            && let Some(submitted_at) = self.submitted_at
            && submitted_at.elapsed() >= self.config.backend_ack_deadline
        {
            let elapsed_ms = submitted_at.elapsed().as_millis() as u64;
            self.force_full_invalidation = true;
            self.state = OrchestratorState::Idle;
            self.submitted_at = None;
            return Some(RenderError::BackendAckTimeout { seq, elapsed_ms });
        }
        None
    }

    /// Handle a terminal resize: update the framebuffer and force a full
    /// invalidation on the next frame.
    pub fn handle_resize(&mut self, new_size: Size) {
        self.framebuffer.resize(new_size);
        self.force_full_invalidation = true;
        self.frame_requested = true;
    }

    /// Drain to `idle`, discarding any in-flight or pending frame. Callers
    /// are responsible for running release effects in reverse mount order
    /// before dropping the orchestrator.
    pub fn stop(&mut self) {
        self.state = OrchestratorState::Idle;
        self.frame_requested = false;
        self.submitted_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::style::TextStyle;
    use crate::test_backend::TestBackend;

    #[test]
    fn starts_idle() {
        let orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        assert_eq!(orch.state(), OrchestratorState::Idle);
    }

    #[test]
    fn begin_frame_requires_request() {
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        assert!(!orch.begin_frame());
        orch.request_frame();
        assert!(orch.begin_frame());
        assert_eq!(orch.state(), OrchestratorState::Building);
    }

    #[test]
    fn submit_frame_writes_to_backend() {
        let mut backend = TestBackend::new(10, 5);
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();
        orch.framebuffer_mut().set(0, 0, Cell::new("A", TextStyle::default()));
        orch.submit_frame(&mut backend, ColorTier::B).unwrap();
        assert!(matches!(orch.state(), OrchestratorState::Submitting { .. }));
        assert!(!backend.buffer().is_empty());
    }

    #[test]
    fn acknowledge_returns_to_idle_and_presents() {
        let mut backend = TestBackend::new(10, 5);
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();
        orch.framebuffer_mut().set(0, 0, Cell::new("A", TextStyle::default()));
        orch.submit_frame(&mut backend, ColorTier::B).unwrap();
        let OrchestratorState::Submitting { seq } = orch.state() else {
            panic!("expected submitting state");
        };
        orch.acknowledge(seq);
        assert_eq!(orch.state(), OrchestratorState::Idle);
    }

    #[test]
    fn empty_diff_returns_directly_to_idle() {
        let mut backend = TestBackend::new(10, 5);
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();
        orch.submit_frame(&mut backend, ColorTier::B).unwrap();
        assert_eq!(orch.state(), OrchestratorState::Idle);
    }

    #[test]
    fn resize_forces_full_invalidation_and_request() {
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.handle_resize(Size::new(20, 10));
        assert_eq!(orch.size(), Size::new(20, 10));
        assert!(orch.begin_frame());
    }

    #[test]
    fn stop_drains_to_idle() {
        let mut backend = TestBackend::new(10, 5);
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();
        orch.framebuffer_mut().set(0, 0, Cell::new("A", TextStyle::default()));
        orch.submit_frame(&mut backend, ColorTier::B).unwrap();
        orch.stop();
        assert_eq!(orch.state(), OrchestratorState::Idle);
    }

    #[test]
    fn paint_interprets_instance_tree_into_framebuffer() {
        use crate::vnode::VNode;

        let mut orch = FrameOrchestrator::with_size(Size::new(10, 1), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();

        let mut next_id = 0;
        let mut root = Instance::mount(VNode::text("hi"), &mut next_id);
        root.rect = Rect::new(0, 0, 10, 1);

        let mut builder = DrawlistBuilder::new();
        let cursor = orch.paint(&mut builder, &root, None);
        assert!(cursor.is_none());
        assert_eq!(orch.framebuffer().get(0, 0).map(|c| c.grapheme.as_str()), Some("h"));
    }

    #[test]
    fn paint_is_noop_outside_building_state() {
        use crate::vnode::VNode;

        let mut orch = FrameOrchestrator::with_size(Size::new(10, 1), RuntimeConfig::default());
        let mut next_id = 0;
        let root = Instance::mount(VNode::text("hi"), &mut next_id);
        let mut builder = DrawlistBuilder::new();
        assert!(orch.paint(&mut builder, &root, None).is_none());
        assert!(orch.framebuffer().get(0, 0).is_some_and(|c| c.is_blank()));
    }

    #[test]
    fn second_request_during_building_coalesces() {
        let mut orch = FrameOrchestrator::with_size(Size::new(10, 5), RuntimeConfig::default());
        orch.request_frame();
        orch.begin_frame();
        orch.request_frame();
        // Still building: a second begin_frame should not re-enter building
        // from building (it's a no-op guard), proving the request coalesced
        // rather than queuing a second frame.
        assert!(!orch.begin_frame());
    }
}
