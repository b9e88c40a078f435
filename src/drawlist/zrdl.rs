//! ZRDL: the binary drawlist wire format between the reconciler/builder and
//! the terminal backend (C2).
//!
//! Little-endian throughout. A container header points at three regions: a
//! command stream, a string table, and a blob table (both table shapes from
//! [`crate::drawlist::table`]). Each command in the stream starts with an
//! 8-byte header `(opcode: u16, reserved: u16, length: u32)` where `length`
//! is the authoritative total size of the command including its header, and
//! commands are padded with zero bytes to a 4-byte boundary.

use crate::color::Color;
use crate::drawlist::table::{read_bytes, read_u16, read_u32, read_u8, BlobTable, StringTable};
use crate::error::{RenderError, Result};
use crate::style::TextStyle;

const MAGIC: [u8; 4] = *b"ZRDL";
const VERSION: u16 = 5;
const HEADER_LEN: usize = 36;
const CMD_HEADER_LEN: usize = 8;

const OP_CLEAR: u16 = 0;
const OP_FILL_RECT: u16 = 1;
const OP_DRAW_TEXT: u16 = 2;
const OP_DRAW_TEXT_RUN: u16 = 3;
const OP_PUSH_CLIP: u16 = 4;
const OP_POP_CLIP: u16 = 5;
const OP_SET_CURSOR: u16 = 6;
const OP_DRAW_CANVAS: u16 = 7;
const OP_DRAW_IMAGE: u16 = 8;

/// A reference to a run of bytes already interned in the string table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringRef {
    /// Index into the string table.
    pub index: u32,
    /// Byte offset of the run within the interned string.
    pub byte_off: u32,
    /// Byte length of the run.
    pub byte_len: u32,
}

/// Sub-cell raster blitter used by `draw_canvas`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlitterKind {
    Braille,
    Sextant,
    Quadrant,
    Halfblock,
    Ascii,
}

/// Inline graphics protocol used by `draw_image`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageProtocol {
    Kitty,
    Sixel,
    Iterm2,
    Fallback,
}

/// One decoded or to-be-encoded ZRDL command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Reset the logical canvas to the default cell.
    Clear,
    /// Paint a rectangle with a given style.
    FillRect { x: u16, y: u16, w: u16, h: u16, style: TextStyle },
    /// Draw text from the string table.
    DrawText { x: u16, y: u16, string: StringRef, style: TextStyle },
    /// Draw a pre-measured styled run encoded as a blob.
    DrawTextRun { x: u16, y: u16, blob_index: u32 },
    /// Push a clip rectangle onto the clip stack.
    PushClip { x: u16, y: u16, w: u16, h: u16 },
    /// Pop the top clip rectangle.
    PopClip,
    /// Set terminal cursor state.
    SetCursor { x: u16, y: u16, shape: u8, visible: bool, blink: bool },
    /// Sub-cell raster via a blitter.
    DrawCanvas { x: u16, y: u16, w: u16, h: u16, px_w: u16, px_h: u16, blob_index: u32, blitter: BlitterKind },
    /// Inline graphics.
    DrawImage {
        x: u16,
        y: u16,
        w: u16,
        h: u16,
        px_w: u16,
        px_h: u16,
        blob_index: u32,
        image_id: u32,
        protocol: ImageProtocol,
        z_layer: i32,
    },
}

/// A full drawlist: the command sequence plus the string and blob tables its
/// commands reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Drawlist {
    pub commands: Vec<DrawCommand>,
    pub strings: StringTable,
    pub blobs: BlobTable,
}

impl Drawlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode to ZRDL bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut cmd_bytes = Vec::new();
        for cmd in &self.commands {
            encode_command(cmd, &mut cmd_bytes);
        }

        let mut strings_bytes = Vec::new();
        self.strings.encode(&mut strings_bytes);
        let mut blobs_bytes = Vec::new();
        self.blobs.encode(&mut blobs_bytes);

        let cmd_bytes_offset = HEADER_LEN as u32;
        let string_table_offset = cmd_bytes_offset + cmd_bytes.len() as u32;
        let blob_table_offset = string_table_offset + strings_bytes.len() as u32;

        let mut out = Vec::with_capacity(blob_table_offset as usize + blobs_bytes.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&(self.commands.len() as u32).to_le_bytes());
        out.extend_from_slice(&cmd_bytes_offset.to_le_bytes());
        out.extend_from_slice(&(cmd_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&string_table_offset.to_le_bytes());
        out.extend_from_slice(&(strings_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&blob_table_offset.to_le_bytes());
        out.extend_from_slice(&(blobs_bytes.len() as u32).to_le_bytes());
        debug_assert_eq!(out.len(), HEADER_LEN);

        out.extend_from_slice(&cmd_bytes);
        out.extend_from_slice(&strings_bytes);
        out.extend_from_slice(&blobs_bytes);
        out
    }

    /// Decode from ZRDL bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RenderError::ProtocolDecode { offset: 0, reason: "ZRDL header truncated".into() });
        }
        if bytes[0..4] != MAGIC {
            return Err(RenderError::ProtocolDecode { offset: 0, reason: "bad ZRDL magic".into() });
        }
        let mut cursor = 4usize;
        let version = read_u16(bytes, &mut cursor)?;
        if version != VERSION {
            return Err(RenderError::ProtocolDecode {
                offset: 4,
                reason: format!("unsupported ZRDL version {version}"),
            });
        }
        let _flags = read_u16(bytes, &mut cursor)?;
        let cmd_count = read_u32(bytes, &mut cursor)?;
        let cmd_bytes_offset = read_u32(bytes, &mut cursor)? as usize;
        let cmd_bytes_length = read_u32(bytes, &mut cursor)? as usize;
        let string_table_offset = read_u32(bytes, &mut cursor)? as usize;
        let _string_table_length = read_u32(bytes, &mut cursor)?;
        let blob_table_offset = read_u32(bytes, &mut cursor)? as usize;
        let _blob_table_length = read_u32(bytes, &mut cursor)?;

        let cmd_region = bytes.get(cmd_bytes_offset..cmd_bytes_offset + cmd_bytes_length).ok_or_else(|| {
            RenderError::ProtocolDecode { offset: cmd_bytes_offset, reason: "command stream out of bounds".into() }
        })?;

        let mut commands = Vec::with_capacity(cmd_count as usize);
        let mut pos = 0usize;
        for _ in 0..cmd_count {
            let (cmd, consumed) = decode_command(cmd_region, pos)?;
            commands.push(cmd);
            pos += consumed;
        }

        let (strings, _) = StringTable::decode(bytes, string_table_offset)?;
        let (blobs, _) = BlobTable::decode(bytes, blob_table_offset)?;

        Ok(Drawlist { commands, strings, blobs })
    }
}

fn pad4(buf: &mut Vec<u8>, header_start: usize) {
    let written = buf.len() - header_start;
    let padded = written.div_ceil(4) * 4;
    buf.resize(header_start + padded, 0);
}

fn with_command<F: FnOnce(&mut Vec<u8>)>(out: &mut Vec<u8>, opcode: u16, body: F) {
    let start = out.len();
    out.extend_from_slice(&opcode.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // length placeholder
    body(out);
    pad4(out, start);
    let length = (out.len() - start) as u32;
    out[start + 4..start + 8].copy_from_slice(&length.to_le_bytes());
}

fn encode_color(out: &mut Vec<u8>, color: Option<Color>) {
    match color {
        None | Some(Color::Default) => out.extend_from_slice(&[0, 0, 0, 0]),
        Some(Color::Indexed(i)) => out.extend_from_slice(&[1, i, 0, 0]),
        Some(Color::Rgb { r, g, b }) => out.extend_from_slice(&[2, r, g, b]),
    }
}

fn decode_color(bytes: &[u8], cursor: &mut usize) -> Result<Option<Color>> {
    let tag = read_u8(bytes, cursor)?;
    let a = read_u8(bytes, cursor)?;
    let b = read_u8(bytes, cursor)?;
    let c = read_u8(bytes, cursor)?;
    Ok(match tag {
        0 => None,
        1 => Some(Color::Indexed(a)),
        2 => Some(Color::Rgb { r: a, g: b, b: c }),
        other => {
            return Err(RenderError::ProtocolDecode {
                offset: *cursor - 4,
                reason: format!("unknown color tag {other}"),
            })
        }
    })
}

fn encode_style(out: &mut Vec<u8>, style: &TextStyle) {
    encode_color(out, style.fg);
    encode_color(out, style.bg);
    let mut attrs = 0u8;
    attrs |= (style.bold as u8) << 0;
    attrs |= (style.italic as u8) << 1;
    attrs |= (style.underline as u8) << 2;
    attrs |= (style.strikethrough as u8) << 3;
    attrs |= (style.overline as u8) << 4;
    attrs |= (style.blink as u8) << 5;
    attrs |= (style.dim as u8) << 6;
    attrs |= (style.inverse as u8) << 7;
    out.push(attrs);
    out.push(0); // reserved
    out.extend_from_slice(&style.link_id.unwrap_or(u32::MAX).to_le_bytes());
}

fn decode_style(bytes: &[u8], cursor: &mut usize) -> Result<TextStyle> {
    let fg = decode_color(bytes, cursor)?;
    let bg = decode_color(bytes, cursor)?;
    let attrs = read_u8(bytes, cursor)?;
    let _reserved = read_u8(bytes, cursor)?;
    let link_raw = read_u32(bytes, cursor)?;
    Ok(TextStyle {
        fg,
        bg,
        bold: attrs & (1 << 0) != 0,
        italic: attrs & (1 << 1) != 0,
        underline: attrs & (1 << 2) != 0,
        strikethrough: attrs & (1 << 3) != 0,
        overline: attrs & (1 << 4) != 0,
        blink: attrs & (1 << 5) != 0,
        dim: attrs & (1 << 6) != 0,
        inverse: attrs & (1 << 7) != 0,
        link_id: if link_raw == u32::MAX { None } else { Some(link_raw) },
    })
}

fn blitter_code(kind: BlitterKind) -> u8 {
    match kind {
        BlitterKind::Braille => 0,
        BlitterKind::Sextant => 1,
        BlitterKind::Quadrant => 2,
        BlitterKind::Halfblock => 3,
        BlitterKind::Ascii => 4,
    }
}

fn blitter_from_code(code: u8, cursor: usize) -> Result<BlitterKind> {
    Ok(match code {
        0 => BlitterKind::Braille,
        1 => BlitterKind::Sextant,
        2 => BlitterKind::Quadrant,
        3 => BlitterKind::Halfblock,
        4 => BlitterKind::Ascii,
        other => {
            return Err(RenderError::ProtocolDecode { offset: cursor, reason: format!("unknown blitter code {other}") })
        }
    })
}

fn protocol_code(protocol: ImageProtocol) -> u8 {
    match protocol {
        ImageProtocol::Kitty => 0,
        ImageProtocol::Sixel => 1,
        ImageProtocol::Iterm2 => 2,
        ImageProtocol::Fallback => 3,
    }
}

fn protocol_from_code(code: u8, cursor: usize) -> Result<ImageProtocol> {
    Ok(match code {
        0 => ImageProtocol::Kitty,
        1 => ImageProtocol::Sixel,
        2 => ImageProtocol::Iterm2,
        3 => ImageProtocol::Fallback,
        other => {
            return Err(RenderError::ProtocolDecode {
                offset: cursor,
                reason: format!("unknown image protocol code {other}"),
            })
        }
    })
}

fn encode_command(cmd: &DrawCommand, out: &mut Vec<u8>) {
    match cmd {
        DrawCommand::Clear => with_command(out, OP_CLEAR, |_| {}),
        DrawCommand::FillRect { x, y, w, h, style } => with_command(out, OP_FILL_RECT, |b| {
            b.extend_from_slice(&x.to_le_bytes());
            b.extend_from_slice(&y.to_le_bytes());
            b.extend_from_slice(&w.to_le_bytes());
            b.extend_from_slice(&h.to_le_bytes());
            encode_style(b, style);
        }),
        DrawCommand::DrawText { x, y, string, style } => with_command(out, OP_DRAW_TEXT, |b| {
            b.extend_from_slice(&x.to_le_bytes());
            b.extend_from_slice(&y.to_le_bytes());
            b.extend_from_slice(&string.index.to_le_bytes());
            b.extend_from_slice(&string.byte_off.to_le_bytes());
            b.extend_from_slice(&string.byte_len.to_le_bytes());
            encode_style(b, style);
        }),
        DrawCommand::DrawTextRun { x, y, blob_index } => with_command(out, OP_DRAW_TEXT_RUN, |b| {
            b.extend_from_slice(&x.to_le_bytes());
            b.extend_from_slice(&y.to_le_bytes());
            b.extend_from_slice(&blob_index.to_le_bytes());
        }),
        DrawCommand::PushClip { x, y, w, h } => with_command(out, OP_PUSH_CLIP, |b| {
            b.extend_from_slice(&x.to_le_bytes());
            b.extend_from_slice(&y.to_le_bytes());
            b.extend_from_slice(&w.to_le_bytes());
            b.extend_from_slice(&h.to_le_bytes());
        }),
        DrawCommand::PopClip => with_command(out, OP_POP_CLIP, |_| {}),
        DrawCommand::SetCursor { x, y, shape, visible, blink } => with_command(out, OP_SET_CURSOR, |b| {
            b.extend_from_slice(&x.to_le_bytes());
            b.extend_from_slice(&y.to_le_bytes());
            b.push(*shape);
            b.push(*visible as u8);
            b.push(*blink as u8);
            b.push(0);
        }),
        DrawCommand::DrawCanvas { x, y, w, h, px_w, px_h, blob_index, blitter } => {
            with_command(out, OP_DRAW_CANVAS, |b| {
                b.extend_from_slice(&x.to_le_bytes());
                b.extend_from_slice(&y.to_le_bytes());
                b.extend_from_slice(&w.to_le_bytes());
                b.extend_from_slice(&h.to_le_bytes());
                b.extend_from_slice(&px_w.to_le_bytes());
                b.extend_from_slice(&px_h.to_le_bytes());
                b.extend_from_slice(&blob_index.to_le_bytes());
                b.push(blitter_code(*blitter));
                b.push(0);
                b.push(0);
                b.push(0);
            })
        }
        DrawCommand::DrawImage { x, y, w, h, px_w, px_h, blob_index, image_id, protocol, z_layer } => {
            with_command(out, OP_DRAW_IMAGE, |b| {
                b.extend_from_slice(&x.to_le_bytes());
                b.extend_from_slice(&y.to_le_bytes());
                b.extend_from_slice(&w.to_le_bytes());
                b.extend_from_slice(&h.to_le_bytes());
                b.extend_from_slice(&px_w.to_le_bytes());
                b.extend_from_slice(&px_h.to_le_bytes());
                b.extend_from_slice(&blob_index.to_le_bytes());
                b.extend_from_slice(&image_id.to_le_bytes());
                b.push(protocol_code(*protocol));
                b.push(0);
                b.push(0);
                b.push(0);
                b.extend_from_slice(&z_layer.to_le_bytes());
            })
        }
    }
}

fn decode_command(bytes: &[u8], offset: usize) -> Result<(DrawCommand, usize)> {
    let mut cursor = offset;
    let opcode = read_u16(bytes, &mut cursor)?;
    let _reserved = read_u16(bytes, &mut cursor)?;
    let length = read_u32(bytes, &mut cursor)? as usize;
    if length < CMD_HEADER_LEN || offset + length > bytes.len() {
        return Err(RenderError::ProtocolDecode { offset, reason: "command length out of bounds".into() });
    }

    let cmd = match opcode {
        OP_CLEAR => DrawCommand::Clear,
        OP_FILL_RECT => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let w = read_u16(bytes, &mut cursor)?;
            let h = read_u16(bytes, &mut cursor)?;
            let style = decode_style(bytes, &mut cursor)?;
            DrawCommand::FillRect { x, y, w, h, style }
        }
        OP_DRAW_TEXT => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let index = read_u32(bytes, &mut cursor)?;
            let byte_off = read_u32(bytes, &mut cursor)?;
            let byte_len = read_u32(bytes, &mut cursor)?;
            let style = decode_style(bytes, &mut cursor)?;
            DrawCommand::DrawText { x, y, string: StringRef { index, byte_off, byte_len }, style }
        }
        OP_DRAW_TEXT_RUN => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let blob_index = read_u32(bytes, &mut cursor)?;
            DrawCommand::DrawTextRun { x, y, blob_index }
        }
        OP_PUSH_CLIP => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let w = read_u16(bytes, &mut cursor)?;
            let h = read_u16(bytes, &mut cursor)?;
            DrawCommand::PushClip { x, y, w, h }
        }
        OP_POP_CLIP => DrawCommand::PopClip,
        OP_SET_CURSOR => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let shape = read_u8(bytes, &mut cursor)?;
            let visible = read_u8(bytes, &mut cursor)? != 0;
            let blink = read_u8(bytes, &mut cursor)? != 0;
            let _reserved = read_u8(bytes, &mut cursor)?;
            DrawCommand::SetCursor { x, y, shape, visible, blink }
        }
        OP_DRAW_CANVAS => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let w = read_u16(bytes, &mut cursor)?;
            let h = read_u16(bytes, &mut cursor)?;
            let px_w = read_u16(bytes, &mut cursor)?;
            let px_h = read_u16(bytes, &mut cursor)?;
            let blob_index = read_u32(bytes, &mut cursor)?;
            let blitter = blitter_from_code(read_u8(bytes, &mut cursor)?, cursor)?;
            DrawCommand::DrawCanvas { x, y, w, h, px_w, px_h, blob_index, blitter }
        }
        OP_DRAW_IMAGE => {
            let x = read_u16(bytes, &mut cursor)?;
            let y = read_u16(bytes, &mut cursor)?;
            let w = read_u16(bytes, &mut cursor)?;
            let h = read_u16(bytes, &mut cursor)?;
            let px_w = read_u16(bytes, &mut cursor)?;
            let px_h = read_u16(bytes, &mut cursor)?;
            let blob_index = read_u32(bytes, &mut cursor)?;
            let image_id = read_u32(bytes, &mut cursor)?;
            let protocol = protocol_from_code(read_u8(bytes, &mut cursor)?, cursor)?;
            let _reserved = read_bytes(bytes, &mut cursor, 3)?;
            let z_layer = read_u32(bytes, &mut cursor)? as i32;
            DrawCommand::DrawImage { x, y, w, h, px_w, px_h, blob_index, image_id, protocol, z_layer }
        }
        other => {
            return Err(RenderError::ProtocolDecode { offset, reason: format!("unknown ZRDL opcode {other}") })
        }
    };

    Ok((cmd, length))
}
