//! Runtime configuration, constructed explicitly by the host application.
//!
//! The core never reads from global or process-wide state: every tunable a
//! frame orchestrator needs is carried on a [`RuntimeConfig`] value passed
//! in by the caller.

use std::time::Duration;

/// Capability override flags layered on top of whatever a backend reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilityOverrides {
    /// Force-disable the Kitty keyboard protocol even if the backend
    /// reports support for it.
    pub disable_kitty_keyboard: bool,
    /// Force-disable Sixel/enhanced image graphics.
    pub disable_sixel: bool,
    /// Force-disable iTerm2 inline image protocol.
    pub disable_iterm2_images: bool,
    /// Force-disable OSC 8 hyperlinks.
    pub disable_hyperlinks: bool,
}

/// Depth limits guarding against runaway recursion in view composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthLimits {
    /// Tree nesting depth at which a warning is logged but rendering
    /// continues.
    pub soft_warn: usize,
    /// Tree nesting depth at which rendering aborts with `depth_exceeded`.
    pub nesting_fail: usize,
    /// Composite (component call stack) depth at which rendering aborts
    /// with `depth_exceeded`.
    pub composite_fail: usize,
}

impl Default for DepthLimits {
    fn default() -> Self {
        Self {
            soft_warn: 200,
            nesting_fail: 500,
            composite_fail: 100,
        }
    }
}

/// Configuration for a single frame orchestrator instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum frames per second; frames requested above this rate are
    /// coalesced (latest-wins).
    pub fps_cap: u32,
    /// How long the orchestrator waits for the backend to acknowledge a
    /// submitted frame before forcing a full invalidation on the next one.
    pub backend_ack_deadline: Duration,
    /// How long a pending key-chord buffer waits for its next stroke before
    /// being cleared.
    pub chord_timeout: Duration,
    /// Recursion depth limits for view composition.
    pub depth_limits: DepthLimits,
    /// Wire format version for the drawlist codec. Pinned to 5; any other
    /// version is rejected at decode time.
    pub drawlist_version: u8,
    /// Capability override flags layered over the backend's reported
    /// capabilities.
    pub capability_overrides: CapabilityOverrides,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            backend_ack_deadline: Duration::from_millis(250),
            chord_timeout: Duration::from_millis(500),
            depth_limits: DepthLimits::default(),
            drawlist_version: 5,
            capability_overrides: CapabilityOverrides::default(),
        }
    }
}
