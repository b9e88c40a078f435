//! rezi-core: the render pipeline core of a retained-mode terminal UI
//! framework.
//!
//! This crate owns everything between "a view function produced a VNode
//! tree" and "bytes went to a backend": reconciliation, layout, the binary
//! drawlist and input-event wire formats, the framebuffer differ, and the
//! frame orchestrator that sequences them. It does not own a widget
//! catalog, a CSS cascade, or a live terminal backend — those are
//! consumers of this crate, not part of it.

pub mod ansi;
pub mod backend;
pub mod capabilities;
pub mod cell;
pub mod color;
pub mod config;
pub mod drawlist;
pub mod error;
pub mod event;
pub mod focus;
pub mod framebuffer;
pub mod geometry;
pub mod hooks;
pub mod instance;
pub mod layout;
pub mod orchestrator;
pub mod reconciler;
pub mod router;
pub mod segment;
pub mod style;
pub mod test_backend;
pub mod text;
pub mod vnode;
pub mod wrap;

pub use backend::{Backend, TerminalCapabilities};
pub use cell::Cell;
pub use color::{Color, ColorTier};
pub use config::{CapabilityOverrides, DepthLimits, RuntimeConfig};
pub use drawlist::{zrdl, zrev, BlobTable, CursorShape, DrawCommand, Drawlist, DrawlistBuilder, StringTable};
pub use error::{NodePath, RenderError, Result};
pub use event::{CapabilityUpdate, Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use focus::{FocusCandidate, FocusRing, HitRegion, HitTestIndex, InstanceId};
pub use framebuffer::{CellChange, FrameDelta, Framebuffer};
pub use geometry::{Position, Rect, Size};
pub use hooks::{HookCursor, RenderGuard, RenderLock};
pub use instance::{DirtyFlags, HookSlot, HookValue, Instance};
pub use layout::{layout_props_to_taffy, stability_signature, LayoutEngine};
pub use orchestrator::{FrameOrchestrator, OrchestratorState};
pub use reconciler::Reconciler;
pub use router::{ActionId, KeyRoute, Keybinding, KeybindingMode, MouseRoute, Router, StateMutationQueue};
pub use segment::Segment;
pub use style::TextStyle;
pub use test_backend::TestBackend;
pub use vnode::{
    Align, BorderStyle, BoxStyle, Direction, Edges, Justify, Key, Length, LayoutProps, Overflow,
    Position as LayoutPosition, VNode, VNodeKind,
};
pub use wrap::WrapPolicy;
