//! ZREV: the binary input-event batch format a backend sends across the
//! core/backend boundary.
//!
//! Layout: `{magic: "ZREV", version: u16, event_count: u32}` header, then
//! `event_count` records of `{kind: u8, flags: u8, payload_length: u16,
//! payload}`, followed by a [`StringTable`] holding interned key names and
//! pasted text referenced from event payloads by index.

use crate::error::{RenderError, Result};
use crate::event::{
    CapabilityUpdate, Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crate::color::ColorTier;

use super::table::{read_bytes, read_i16, read_u16, read_u32, read_u8, StringTable};

const MAGIC: [u8; 4] = *b"ZREV";
const VERSION: u16 = 1;

const KIND_KEY: u8 = 0;
const KIND_MOUSE: u8 = 1;
const KIND_PASTE: u8 = 2;
const KIND_RESIZE: u8 = 3;
const KIND_FOCUS_CHANGE: u8 = 4;
const KIND_CAPABILITY_UPDATE: u8 = 5;

const MOUSE_ACTION_PRESS: u8 = 0;
const MOUSE_ACTION_RELEASE: u8 = 1;
const MOUSE_ACTION_MOVE: u8 = 2;
const MOUSE_ACTION_DRAG: u8 = 3;
const MOUSE_ACTION_WHEEL: u8 = 4;

const MOUSE_BUTTON_NONE: u8 = 0;
const MOUSE_BUTTON_LEFT: u8 = 1;
const MOUSE_BUTTON_RIGHT: u8 = 2;
const MOUSE_BUTTON_MIDDLE: u8 = 3;

/// Encode a batch of events into a ZREV byte stream.
pub fn encode(events: &[Event]) -> Vec<u8> {
    let mut strings = StringTable::new();
    let mut records = Vec::new();

    for event in events {
        let (kind, flags, payload) = encode_event(event, &mut strings);
        records.push((kind, flags, payload));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    for (kind, flags, payload) in &records {
        out.push(*kind);
        out.push(*flags);
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
    }
    strings.encode(&mut out);
    out
}

fn encode_event(event: &Event, strings: &mut StringTable) -> (u8, u8, Vec<u8>) {
    let mut payload = Vec::new();
    let kind = match event {
        Event::Key(key) => {
            let name = key.normalized_name();
            let idx = strings.find(&name).unwrap_or_else(|| strings.intern(&name));
            payload.extend_from_slice(&idx.to_le_bytes());
            payload.extend_from_slice(&key.modifiers.bits().to_le_bytes());
            payload.push(key.repeat as u8);
            payload.push(0); // reserved
            KIND_KEY
        }
        Event::Mouse(mouse) => {
            payload.extend_from_slice(&mouse.x.to_le_bytes());
            payload.extend_from_slice(&mouse.y.to_le_bytes());
            payload.push(encode_mouse_button(mouse.button));
            payload.push(encode_mouse_action(mouse.kind));
            payload.extend_from_slice(&mouse.modifiers.bits().to_le_bytes());
            payload.extend_from_slice(&mouse.wheel_delta.to_le_bytes());
            KIND_MOUSE
        }
        Event::Paste(text) => {
            let idx = strings.intern(text);
            payload.extend_from_slice(&idx.to_le_bytes());
            KIND_PASTE
        }
        Event::Resize(cols, rows) => {
            payload.extend_from_slice(&cols.to_le_bytes());
            payload.extend_from_slice(&rows.to_le_bytes());
            KIND_RESIZE
        }
        Event::FocusChange(focused) => {
            payload.push(*focused as u8);
            KIND_FOCUS_CHANGE
        }
        Event::CapabilityUpdate(update) => {
            payload.push(update.tier as u8);
            payload.push(update.kitty_keyboard as u8);
            KIND_CAPABILITY_UPDATE
        }
    };
    (kind, 0, payload)
}

fn encode_mouse_action(kind: MouseEventKind) -> u8 {
    match kind {
        MouseEventKind::Press => MOUSE_ACTION_PRESS,
        MouseEventKind::Release => MOUSE_ACTION_RELEASE,
        MouseEventKind::Move => MOUSE_ACTION_MOVE,
        MouseEventKind::Drag => MOUSE_ACTION_DRAG,
        MouseEventKind::Wheel => MOUSE_ACTION_WHEEL,
    }
}

fn encode_mouse_button(button: MouseButton) -> u8 {
    match button {
        MouseButton::None => MOUSE_BUTTON_NONE,
        MouseButton::Left => MOUSE_BUTTON_LEFT,
        MouseButton::Right => MOUSE_BUTTON_RIGHT,
        MouseButton::Middle => MOUSE_BUTTON_MIDDLE,
    }
}

/// Decode a ZREV byte stream into a batch of events.
pub fn decode(bytes: &[u8]) -> Result<Vec<Event>> {
    let mut cursor = 0usize;
    let magic = read_bytes(bytes, &mut cursor, 4)?;
    if magic != MAGIC {
        return Err(RenderError::ProtocolDecode {
            offset: 0,
            reason: "bad ZREV magic".into(),
        });
    }
    let version = read_u16(bytes, &mut cursor)?;
    if version != VERSION {
        return Err(RenderError::ProtocolDecode {
            offset: 4,
            reason: format!("unsupported ZREV version {version}"),
        });
    }
    let count = read_u32(bytes, &mut cursor)?;

    struct RawRecord {
        kind: u8,
        payload_start: usize,
        payload_len: usize,
    }
    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = read_u8(bytes, &mut cursor)?;
        let _flags = read_u8(bytes, &mut cursor)?;
        let payload_len = read_u16(bytes, &mut cursor)? as usize;
        let payload_start = cursor;
        read_bytes(bytes, &mut cursor, payload_len)?;
        records.push(RawRecord { kind, payload_start, payload_len });
    }

    let (strings, _) = StringTable::decode(bytes, cursor)?;

    let mut events = Vec::with_capacity(records.len());
    for record in records {
        let payload = &bytes[record.payload_start..record.payload_start + record.payload_len];
        events.push(decode_event(record.kind, payload, &strings)?);
    }
    Ok(events)
}

fn decode_event(kind: u8, payload: &[u8], strings: &StringTable) -> Result<Event> {
    let mut cursor = 0usize;
    match kind {
        KIND_KEY => {
            let name_ref = read_u32(payload, &mut cursor)?;
            let modifiers = Modifiers::from_bits(read_u16(payload, &mut cursor)?);
            let repeat = read_u8(payload, &mut cursor)? != 0;
            let _reserved = read_u8(payload, &mut cursor)?;
            let name = strings.get(name_ref).ok_or_else(|| RenderError::ProtocolDecode {
                offset: 0,
                reason: format!("key event references missing string {name_ref}"),
            })?;
            let name = std::str::from_utf8(name).map_err(|_| RenderError::ProtocolDecode {
                offset: 0,
                reason: "key name is not valid utf-8".into(),
            })?;
            let code = key_code_from_name(name);
            Ok(Event::Key(KeyEvent { code, modifiers, repeat }))
        }
        KIND_MOUSE => {
            let x = read_u16(payload, &mut cursor)?;
            let y = read_u16(payload, &mut cursor)?;
            let button_byte = read_u8(payload, &mut cursor)?;
            let action_byte = read_u8(payload, &mut cursor)?;
            let modifiers = Modifiers::from_bits(read_u16(payload, &mut cursor)?);
            let wheel_delta = read_i16(payload, &mut cursor)?;
            let button = decode_mouse_button(button_byte)?;
            let kind = decode_mouse_action(action_byte)?;
            Ok(Event::Mouse(MouseEvent { kind, x, y, button, modifiers, wheel_delta }))
        }
        KIND_PASTE => {
            let text_ref = read_u32(payload, &mut cursor)?;
            let bytes = strings.get(text_ref).ok_or_else(|| RenderError::ProtocolDecode {
                offset: 0,
                reason: format!("paste event references missing string {text_ref}"),
            })?;
            let text = std::str::from_utf8(bytes).map_err(|_| RenderError::ProtocolDecode {
                offset: 0,
                reason: "pasted text is not valid utf-8".into(),
            })?;
            Ok(Event::Paste(text.to_string()))
        }
        KIND_RESIZE => {
            let cols = read_u16(payload, &mut cursor)?;
            let rows = read_u16(payload, &mut cursor)?;
            Ok(Event::Resize(cols, rows))
        }
        KIND_FOCUS_CHANGE => {
            let focused = read_u8(payload, &mut cursor)? != 0;
            Ok(Event::FocusChange(focused))
        }
        KIND_CAPABILITY_UPDATE => {
            let tier_byte = read_u8(payload, &mut cursor)?;
            let kitty_keyboard = read_u8(payload, &mut cursor)? != 0;
            let tier = match tier_byte {
                0 => ColorTier::A,
                1 => ColorTier::B,
                2 => ColorTier::C,
                other => {
                    return Err(RenderError::ProtocolDecode {
                        offset: 0,
                        reason: format!("unknown color tier byte {other}"),
                    })
                }
            };
            Ok(Event::CapabilityUpdate(CapabilityUpdate { tier, kitty_keyboard }))
        }
        other => Err(RenderError::ProtocolDecode {
            offset: 0,
            reason: format!("unknown ZREV event kind {other}"),
        }),
    }
}

fn decode_mouse_action(byte: u8) -> Result<MouseEventKind> {
    match byte {
        MOUSE_ACTION_PRESS => Ok(MouseEventKind::Press),
        MOUSE_ACTION_RELEASE => Ok(MouseEventKind::Release),
        MOUSE_ACTION_MOVE => Ok(MouseEventKind::Move),
        MOUSE_ACTION_DRAG => Ok(MouseEventKind::Drag),
        MOUSE_ACTION_WHEEL => Ok(MouseEventKind::Wheel),
        other => Err(RenderError::ProtocolDecode {
            offset: 0,
            reason: format!("unknown mouse action byte {other}"),
        }),
    }
}

fn decode_mouse_button(byte: u8) -> Result<MouseButton> {
    match byte {
        MOUSE_BUTTON_NONE => Ok(MouseButton::None),
        MOUSE_BUTTON_LEFT => Ok(MouseButton::Left),
        MOUSE_BUTTON_RIGHT => Ok(MouseButton::Right),
        MOUSE_BUTTON_MIDDLE => Ok(MouseButton::Middle),
        other => Err(RenderError::ProtocolDecode {
            offset: 0,
            reason: format!("unknown mouse button byte {other}"),
        }),
    }
}

/// Reconstruct a [`KeyCode`] from a normalized key name's trailing segment
/// (after any `ctrl+`/`alt+`/`shift+`/`super+` prefixes have been stripped
/// by the caller's modifier bits, the name is still the full chord string —
/// this only looks at the final `+`-separated component).
fn key_code_from_name(name: &str) -> KeyCode {
    let base = name.rsplit('+').next().unwrap_or(name);
    match base {
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" => KeyCode::Delete,
        "escape" => KeyCode::Escape,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "insert" => KeyCode::Insert,
        other if other.len() == 1 => KeyCode::Char(other.chars().next().unwrap()),
        other if other.starts_with('f') && other[1..].parse::<u8>().is_ok() => {
            KeyCode::F(other[1..].parse().unwrap())
        }
        other => KeyCode::Char(other.chars().next().unwrap_or('\u{0}')),
    }
}
