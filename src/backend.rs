//! Backend trait and the capability surface it exposes to the frame
//! orchestrator.
//!
//! The crate does not perform live TTY detection: that belongs to whatever
//! concrete `Backend` a host application plugs in. What lives here is the
//! capability *data model* — the tiered color/graphics surface a backend
//! reports and the orchestrator uses to downgrade a drawlist before emission.

use crate::color::ColorTier;
use crate::error::Result;
use crate::geometry::Size;

/// Capabilities a backend reports for the terminal it is driving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TerminalCapabilities {
    /// Color and graphics capability tier.
    pub tier: ColorTier,
    /// Whether the terminal renders Unicode wide characters correctly.
    pub unicode: bool,
    /// Whether CSI 2026 synchronized output is supported.
    pub synchronized_output: bool,
    /// Whether the Kitty keyboard protocol is supported.
    pub kitty_keyboard: bool,
    /// Whether mouse events are available.
    pub mouse: bool,
    /// Whether bracketed paste mode is supported.
    pub bracketed_paste: bool,
    /// Whether focus in/out events are reported.
    pub focus_events: bool,
    /// Whether OSC 8 hyperlinks are supported.
    pub hyperlinks: bool,
}

impl Default for TerminalCapabilities {
    fn default() -> Self {
        Self {
            tier: ColorTier::B,
            unicode: true,
            synchronized_output: false,
            kitty_keyboard: false,
            mouse: true,
            bracketed_paste: true,
            focus_events: false,
            hyperlinks: false,
        }
    }
}

/// Abstraction over terminal transports the frame orchestrator writes to.
///
/// A `Backend` owns the raw I/O: entering/exiting raw mode, writing the
/// coalesced ANSI byte stream a frame produces, and reporting the
/// capabilities the orchestrator downgrades output for. It does not know
/// about drawlists, cells, or layout.
pub trait Backend: Send {
    /// Get the current terminal size in cells.
    fn size(&self) -> Result<Size>;

    /// Get the terminal's reported capabilities.
    fn capabilities(&self) -> &TerminalCapabilities;

    /// Enter raw mode (disable line buffering, echo, signal generation).
    fn enter_raw_mode(&mut self) -> Result<()>;

    /// Exit raw mode (restore normal terminal state).
    fn exit_raw_mode(&mut self) -> Result<()>;

    /// Write raw bytes to the terminal.
    fn write_raw(&mut self, data: &[u8]) -> Result<()>;

    /// Flush buffered output to the terminal.
    fn flush(&mut self) -> Result<()>;

    /// Enable mouse event capture.
    fn enable_mouse(&mut self) -> Result<()>;

    /// Disable mouse event capture.
    fn disable_mouse(&mut self) -> Result<()>;
}
