//! Binary wire protocols (C2): ZRDL, the drawlist command stream, and ZREV,
//! the input-event batch format, plus the string/blob interning table both
//! formats share.

pub mod builder;
pub mod interpret;
pub mod table;
pub mod zrdl;
pub mod zrev;

pub use builder::{CursorShape, DrawlistBuilder};
pub use table::{BlobTable, StringTable};
pub use zrdl::{BlitterKind, DrawCommand, Drawlist, ImageProtocol, StringRef};
