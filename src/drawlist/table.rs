//! String/blob interning table shared by the ZRDL and ZREV wire formats:
//! a count-prefixed array of `(hash: u32, byte_length: u32, bytes)` entries.

use crate::error::{RenderError, Result};
use crate::framebuffer::fnv1a_hash;

/// An interning table of byte strings, indexed by insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<Vec<u8>>,
}

/// A blob table has the identical on-wire shape as a [`StringTable`]; ZRDL's
/// container header just carries the two at different offsets.
pub type BlobTable = StringTable;

impl StringTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its index. Does not deduplicate — callers
    /// that want hash-based dedup should consult [`StringTable::find`] first
    /// (the builder does this for repeated text runs).
    pub fn intern(&mut self, s: &str) -> u32 {
        self.intern_bytes(s.as_bytes())
    }

    /// Intern a raw byte payload (a blob, when this table is used as a blob
    /// table rather than a string table), returning its index.
    pub fn intern_bytes(&mut self, bytes: &[u8]) -> u32 {
        self.entries.push(bytes.to_vec());
        (self.entries.len() - 1) as u32
    }

    /// Find an existing entry with identical bytes, for dedup.
    pub fn find(&self, s: &str) -> Option<u32> {
        self.find_bytes(s.as_bytes())
    }

    /// Find an existing entry with identical raw bytes, for dedup.
    pub fn find_bytes(&self, bytes: &[u8]) -> Option<u32> {
        let target = fnv1a_hash(bytes);
        self.entries.iter().position(|e| fnv1a_hash(e) == target && e == bytes).map(|i| i as u32)
    }

    /// Look up an entry by index.
    pub fn get(&self, index: u32) -> Option<&[u8]> {
        self.entries.get(index as usize).map(Vec::as_slice)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize: `count: u32` then `(hash: u32, byte_length: u32, bytes)*`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&fnv1a_hash(entry).to_le_bytes());
            out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            out.extend_from_slice(entry);
        }
    }

    /// Deserialize from `bytes`, starting at `offset`. Returns the table and
    /// the number of bytes consumed.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut cursor = offset;
        let count = read_u32(bytes, &mut cursor)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let stored_hash = read_u32(bytes, &mut cursor)?;
            let len = read_u32(bytes, &mut cursor)? as usize;
            if cursor + len > bytes.len() {
                return Err(RenderError::ProtocolDecode {
                    offset: cursor,
                    reason: "string table entry truncated".into(),
                });
            }
            let data = bytes[cursor..cursor + len].to_vec();
            if fnv1a_hash(&data) != stored_hash {
                return Err(RenderError::ProtocolDecode {
                    offset: cursor,
                    reason: "string table entry hash mismatch".into(),
                });
            }
            cursor += len;
            entries.push(data);
        }
        Ok((Self { entries }, cursor - offset))
    }
}

pub(crate) fn read_u8(bytes: &[u8], cursor: &mut usize) -> Result<u8> {
    let b = *bytes.get(*cursor).ok_or_else(|| RenderError::ProtocolDecode {
        offset: *cursor,
        reason: "unexpected end of buffer reading u8".into(),
    })?;
    *cursor += 1;
    Ok(b)
}

pub(crate) fn read_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16> {
    let slice = bytes.get(*cursor..*cursor + 2).ok_or_else(|| RenderError::ProtocolDecode {
        offset: *cursor,
        reason: "unexpected end of buffer reading u16".into(),
    })?;
    *cursor += 2;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

pub(crate) fn read_i16(bytes: &[u8], cursor: &mut usize) -> Result<i16> {
    Ok(read_u16(bytes, cursor)? as i16)
}

pub(crate) fn read_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32> {
    let slice = bytes.get(*cursor..*cursor + 4).ok_or_else(|| RenderError::ProtocolDecode {
        offset: *cursor,
        reason: "unexpected end of buffer reading u32".into(),
    })?;
    *cursor += 4;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

pub(crate) fn read_u64(bytes: &[u8], cursor: &mut usize) -> Result<u64> {
    let slice = bytes.get(*cursor..*cursor + 8).ok_or_else(|| RenderError::ProtocolDecode {
        offset: *cursor,
        reason: "unexpected end of buffer reading u64".into(),
    })?;
    *cursor += 8;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    Ok(u64::from_le_bytes(buf))
}

pub(crate) fn read_bytes<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let slice = bytes.get(*cursor..*cursor + len).ok_or_else(|| RenderError::ProtocolDecode {
        offset: *cursor,
        reason: "unexpected end of buffer reading payload".into(),
    })?;
    *cursor += len;
    Ok(slice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_get() {
        let mut t = StringTable::new();
        let idx = t.intern("hello");
        assert_eq!(t.get(idx), Some(b"hello".as_slice()));
    }

    #[test]
    fn find_existing_entry() {
        let mut t = StringTable::new();
        let idx = t.intern("hello");
        assert_eq!(t.find("hello"), Some(idx));
        assert_eq!(t.find("missing"), None);
    }

    #[test]
    fn round_trip_encode_decode() {
        let mut t = StringTable::new();
        t.intern("abc");
        t.intern("");
        t.intern("unicode: \u{4e16}\u{754c}");

        let mut bytes = Vec::new();
        t.encode(&mut bytes);
        let (decoded, consumed) = StringTable::decode(&bytes, 0).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, t);
    }

    #[test]
    fn decode_truncated_is_protocol_decode_error() {
        let mut t = StringTable::new();
        t.intern("abc");
        let mut bytes = Vec::new();
        t.encode(&mut bytes);
        bytes.truncate(bytes.len() - 1);
        let err = StringTable::decode(&bytes, 0).unwrap_err();
        assert!(matches!(err, RenderError::ProtocolDecode { .. }));
    }

    #[test]
    fn empty_table_round_trips() {
        let t = StringTable::new();
        let mut bytes = Vec::new();
        t.encode(&mut bytes);
        let (decoded, _) = StringTable::decode(&bytes, 0).unwrap();
        assert!(decoded.is_empty());
    }
}
