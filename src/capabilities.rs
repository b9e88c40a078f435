//! Fixed, named capability profiles for tests and record/replay fixtures.
//!
//! These are not detected from a live TTY — that is a concrete `Backend`'s
//! job. They exist so tests and replay tooling can pin a deterministic
//! capability surface without spinning up a real terminal.

use crate::backend::TerminalCapabilities;
use crate::color::ColorTier;

/// A conservative baseline: basic 16-color, no extended protocols.
pub fn conservative() -> TerminalCapabilities {
    TerminalCapabilities {
        tier: ColorTier::A,
        unicode: true,
        synchronized_output: false,
        kitty_keyboard: false,
        mouse: false,
        bracketed_paste: false,
        focus_events: false,
        hyperlinks: false,
    }
}

/// 256-color palette, no enhanced protocols. Typical of a plain `xterm`.
pub fn basic16() -> TerminalCapabilities {
    TerminalCapabilities {
        tier: ColorTier::A,
        unicode: true,
        synchronized_output: false,
        kitty_keyboard: false,
        mouse: true,
        bracketed_paste: true,
        focus_events: true,
        hyperlinks: false,
    }
}

/// 256-color-named but truecolor-capable profile, as widely deployed under
/// the name `xterm-256color`.
pub fn xterm_256() -> TerminalCapabilities {
    TerminalCapabilities {
        tier: ColorTier::B,
        unicode: true,
        synchronized_output: false,
        kitty_keyboard: false,
        mouse: true,
        bracketed_paste: true,
        focus_events: true,
        hyperlinks: false,
    }
}

/// Truecolor plus synchronized output, Kitty keyboard protocol, and
/// hyperlinks — the full enhanced-graphics tier.
pub fn truecolor_full() -> TerminalCapabilities {
    TerminalCapabilities {
        tier: ColorTier::C,
        unicode: true,
        synchronized_output: true,
        kitty_keyboard: true,
        mouse: true,
        bracketed_paste: true,
        focus_events: true,
        hyperlinks: true,
    }
}

/// Look up a named profile, for config-driven capability overrides.
///
/// Returns `None` for an unrecognized name; callers fall back to
/// [`TerminalCapabilities::default`].
pub fn by_name(name: &str) -> Option<TerminalCapabilities> {
    match name {
        "conservative" => Some(conservative()),
        "basic16" => Some(basic16()),
        "xterm-256" => Some(xterm_256()),
        "truecolor-full" => Some(truecolor_full()),
        _ => None,
    }
}
