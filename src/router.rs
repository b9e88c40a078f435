//! Event router (C8): dispatch rules for decoded input events, sitting
//! between ZREV decode and whatever handler registry a consumer owns.
//!
//! This crate doesn't know what a handler does — it only knows the order
//! events are offered in, how chord sequences and click/drag state
//! machines work, and how to queue state mutations so they apply between
//! frames rather than mid-reconciliation.

use std::time::{Duration, Instant};

use crate::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use crate::focus::{FocusRing, HitTestIndex, InstanceId};

/// An opaque action identifier a keybinding resolves to. The router never
/// interprets this; it's handed back to the consumer to dispatch.
pub type ActionId = String;

/// A chord keybinding: the normalized key names that must be struck in
/// order (see [`KeyEvent::normalized_name`]) to trigger `action`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keybinding {
    pub chord: Vec<String>,
    pub action: ActionId,
}

/// One entry in the router's mode stack. Bindings in a mode closer to the
/// top of the stack are tried first (§4.8: "reverse mode-stack order").
#[derive(Clone, Debug, Default)]
pub struct KeybindingMode {
    pub name: String,
    pub bindings: Vec<Keybinding>,
}

impl KeybindingMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), bindings: Vec::new() }
    }

    #[must_use]
    pub fn bind(mut self, chord: Vec<&str>, action: impl Into<ActionId>) -> Self {
        self.bindings.push(Keybinding {
            chord: chord.into_iter().map(str::to_string).collect(),
            action: action.into(),
        });
        self
    }
}

/// How a key event resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyRoute {
    /// A keybinding chord completed; the consumer should run this action.
    Action(ActionId),
    /// The key extended a partial chord match; waiting on the next stroke.
    PendingChord,
    /// No active mode has a binding for this key (or partial chord).
    Unhandled,
}

/// How a mouse event resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MouseRoute {
    Press { target: Option<InstanceId> },
    Release { target: Option<InstanceId> },
    Click { target: InstanceId },
    DoubleClick { target: InstanceId },
    DragStart { origin: InstanceId },
    DragMove { origin: InstanceId, target: Option<InstanceId> },
    DragCancelled { origin: InstanceId },
    Wheel { target: Option<InstanceId>, delta: i16 },
    Unhandled,
}

/// The default window within which two same-target clicks count as a
/// double-click. Not named explicitly in the dispatch rules ("clicks
/// distinguish single/double by a bounded time"); chosen to match common
/// desktop double-click timing.
pub const DEFAULT_DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// Queues state mutations triggered by event handlers so they apply
/// between frames rather than mid-reconciliation (§4.8 rule 5).
#[derive(Default)]
pub struct StateMutationQueue {
    pending: Vec<Box<dyn FnOnce() + Send>>,
}

impl StateMutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a mutation to run on the next `drain_apply`.
    pub fn enqueue(&mut self, mutation: impl FnOnce() + Send + 'static) {
        self.pending.push(Box::new(mutation));
    }

    /// Number of mutations currently queued.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run every queued mutation in enqueue order, then clear the queue.
    pub fn drain_apply(&mut self) {
        for mutation in self.pending.drain(..) {
            mutation();
        }
    }

    /// Drop pending mutations without running them, in reverse enqueue
    /// order, as happens when the view is stopped before the next frame.
    /// Returns the number of mutations dropped.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.reverse();
        self.pending.clear();
        dropped
    }
}

/// Dispatches decoded events: chord keybinding resolution across a mode
/// stack, and the mouse press/release/click/drag state machine.
pub struct Router {
    mode_stack: Vec<KeybindingMode>,
    pending_chord: Vec<String>,
    chord_started_at: Option<Instant>,
    chord_timeout: Duration,
    double_click_window: Duration,
    press_origin: Option<(InstanceId, Instant)>,
    dragging: bool,
    last_click: Option<(InstanceId, Instant)>,
}

impl Router {
    pub fn new(chord_timeout: Duration) -> Self {
        Self {
            mode_stack: Vec::new(),
            pending_chord: Vec::new(),
            chord_started_at: None,
            chord_timeout,
            double_click_window: DEFAULT_DOUBLE_CLICK_WINDOW,
            press_origin: None,
            dragging: false,
            last_click: None,
        }
    }

    pub fn push_mode(&mut self, mode: KeybindingMode) {
        self.mode_stack.push(mode);
    }

    pub fn pop_mode(&mut self) -> Option<KeybindingMode> {
        self.mode_stack.pop()
    }

    /// Resolve a key event against the active keybinding modes, in reverse
    /// mode-stack order, maintaining the pending-chord buffer. Call this
    /// only when the key was not consumed by the focused widget's own
    /// handler (§4.8 rule 2 happens in the caller before this).
    pub fn dispatch_key(&mut self, key: &KeyEvent, now: Instant) -> KeyRoute {
        let expired = self
            .chord_started_at
            .is_some_and(|started| now.duration_since(started) > self.chord_timeout);
        if expired {
            self.pending_chord.clear();
        }

        self.pending_chord.push(key.normalized_name());
        self.chord_started_at = Some(now);

        let mut has_partial = false;
        for mode in self.mode_stack.iter().rev() {
            for binding in &mode.bindings {
                if binding.chord == self.pending_chord {
                    self.pending_chord.clear();
                    self.chord_started_at = None;
                    return KeyRoute::Action(binding.action.clone());
                }
                if binding.chord.len() > self.pending_chord.len()
                    && binding.chord[..self.pending_chord.len()] == self.pending_chord[..]
                {
                    has_partial = true;
                }
            }
        }

        if has_partial {
            KeyRoute::PendingChord
        } else {
            self.pending_chord.clear();
            self.chord_started_at = None;
            KeyRoute::Unhandled
        }
    }

    /// Resolve a mouse event: hit-test it, and run the press/release/
    /// click/double-click/drag state machine (§4.8 rule 4).
    pub fn dispatch_mouse(
        &mut self,
        event: &MouseEvent,
        hit_test: &HitTestIndex,
        focus_ring: &FocusRing,
        now: Instant,
    ) -> MouseRoute {
        let pos = crate::geometry::Position::new(event.x, event.y);
        let hit = hit_test.hit_test(pos);

        match event.kind {
            MouseEventKind::Wheel => MouseRoute::Wheel { target: hit, delta: event.wheel_delta },
            MouseEventKind::Move => MouseRoute::Unhandled,
            MouseEventKind::Press => {
                self.dragging = false;
                if let Some(id) = hit {
                    self.press_origin = Some((id, now));
                } else {
                    self.press_origin = None;
                }
                MouseRoute::Press { target: hit }
            }
            MouseEventKind::Drag => {
                let Some((origin, _)) = self.press_origin else {
                    return MouseRoute::Unhandled;
                };
                if !self.dragging {
                    self.dragging = true;
                    return MouseRoute::DragStart { origin };
                }
                let origin_trapped = focus_ring.is_within_active_trap(origin);
                let target_trapped = hit.is_none_or(|id| focus_ring.is_within_active_trap(id));
                if origin_trapped != target_trapped {
                    self.press_origin = None;
                    self.dragging = false;
                    return MouseRoute::DragCancelled { origin };
                }
                MouseRoute::DragMove { origin, target: hit }
            }
            MouseEventKind::Release => {
                let was_dragging = self.dragging;
                self.dragging = false;
                let Some((origin, _)) = self.press_origin.take() else {
                    return MouseRoute::Release { target: hit };
                };
                if was_dragging || hit != Some(origin) {
                    return MouseRoute::Release { target: hit };
                }
                let is_double = self
                    .last_click
                    .is_some_and(|(id, at)| id == origin && now.duration_since(at) <= self.double_click_window);
                if is_double {
                    self.last_click = None;
                    MouseRoute::DoubleClick { target: origin }
                } else {
                    self.last_click = Some((origin, now));
                    MouseRoute::Click { target: origin }
                }
            }
        }
    }

    /// `resize` events always force a full invalidation at the next frame
    /// (§4.8 rule 1); the router just normalizes the new viewport size for
    /// the caller to apply.
    pub fn dispatch_resize(&mut self, width: u16, height: u16) -> (u16, u16) {
        self.pending_chord.clear();
        self.chord_started_at = None;
        (width, height)
    }

    /// Whether the only button assumed relevant (`Left`) is the one that
    /// started the current press, for consumers that want to ignore
    /// secondary-button drags. Not part of the dispatch rules; a small
    /// convenience some backends need.
    pub fn pressed_with(&self, button: MouseButton) -> bool {
        self.press_origin.is_some() && button == MouseButton::Left
    }
}
