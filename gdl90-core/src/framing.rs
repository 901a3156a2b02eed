//! HDLC-style byte-stuffed framing.
//!
//! A GDL-90 frame on the wire:
//!
//! ```text
//! 0x7E | id | escaped(body) | escaped(crc_lo) | escaped(crc_hi) | 0x7E
//! ```
//!
//! Flags and the id byte are never escaped. The CRC is computed over the
//! unescaped `[id, body]`.

use crate::crc;
use crate::types::{Gdl90Error, Result};

pub const FLAG_BYTE: u8 = 0x7E;
pub const ESCAPE_BYTE: u8 = 0x7D;
const ESCAPE_XOR: u8 = 0x20;

/// Headroom for the unescaped flags and id.
const FIXED_LEN: usize = 4;
const CRC_LEN: usize = 2;

// ---------------------------------------------------------------------------
// Byte stuffer
// ---------------------------------------------------------------------------

/// Escapes two reserved byte values out of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteStuffer {
    pub flag: u8,
    pub escape: u8,
}

/// The stuffer GDL-90 uses.
pub const GDL90_STUFFER: ByteStuffer = ByteStuffer {
    flag: FLAG_BYTE,
    escape: ESCAPE_BYTE,
};

impl ByteStuffer {
    pub const fn new(flag: u8, escape: u8) -> Self {
        ByteStuffer { flag, escape }
    }

    #[inline]
    pub fn is_reserved(&self, b: u8) -> bool {
        b == self.flag || b == self.escape
    }

    /// Append the escaped form of `data` to `out`. Returns bytes written.
    pub fn escape_into(&self, out: &mut Vec<u8>, data: &[u8]) -> usize {
        let start = out.len();
        for &b in data {
            if self.is_reserved(b) {
                out.push(self.escape);
                out.push(b ^ ESCAPE_XOR);
            } else {
                out.push(b);
            }
        }
        out.len() - start
    }

    pub fn escape(&self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() * 2);
        self.escape_into(&mut out, data);
        out
    }

    /// Inverse of [`ByteStuffer::escape`].
    ///
    /// Fails on a trailing escape byte or a literal flag inside the data.
    pub fn unescape(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len());
        let mut iter = data.iter().enumerate();
        while let Some((i, &b)) = iter.next() {
            if b == self.flag {
                return Err(Gdl90Error::Escape(format!("unescaped flag at offset {i}")));
            }
            if b == self.escape {
                match iter.next() {
                    Some((_, &next)) => out.push(next ^ ESCAPE_XOR),
                    None => {
                        return Err(Gdl90Error::Escape(format!(
                            "dangling escape at offset {i}"
                        )))
                    }
                }
            } else {
                out.push(b);
            }
        }
        Ok(out)
    }
}

impl Default for ByteStuffer {
    fn default() -> Self {
        GDL90_STUFFER
    }
}

// ---------------------------------------------------------------------------
// Frame assembly
// ---------------------------------------------------------------------------

/// Worst-case frame length for a body of `body_len` bytes (every body and
/// CRC byte escaped).
pub const fn max_frame_len(body_len: usize) -> usize {
    FIXED_LEN + 2 * (body_len + CRC_LEN)
}

/// Build a complete frame into `out`, replacing its contents.
///
/// Returns the number of bytes emitted. `out` keeps its allocation so a
/// caller can reuse one buffer across messages.
pub fn assemble_frame(out: &mut Vec<u8>, msg_id: u8, body: &[u8]) -> usize {
    let fcs = crc::fcs(msg_id, body);
    let fcs_lsb = (fcs & 0xFF) as u8;
    let fcs_msb = ((fcs >> 8) & 0xFF) as u8;

    out.clear();
    out.reserve(max_frame_len(body.len()));

    out.push(FLAG_BYTE);
    out.push(msg_id);
    GDL90_STUFFER.escape_into(out, body);
    GDL90_STUFFER.escape_into(out, &[fcs_lsb]);
    GDL90_STUFFER.escape_into(out, &[fcs_msb]);
    out.push(FLAG_BYTE);

    out.len()
}

/// Build a complete frame into a fresh buffer.
pub fn frame(msg_id: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_frame_len(body.len()));
    assemble_frame(&mut out, msg_id, body);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{hex_decode, hex_encode};

    #[test]
    fn test_escape_passthrough() {
        assert_eq!(GDL90_STUFFER.escape(&[0x00, 0x81, 0x7C, 0x7F]), vec![0x00, 0x81, 0x7C, 0x7F]);
    }

    #[test]
    fn test_escape_reserved() {
        assert_eq!(GDL90_STUFFER.escape(&[0x7E]), vec![0x7D, 0x5E]);
        assert_eq!(GDL90_STUFFER.escape(&[0x7D]), vec![0x7D, 0x5D]);
        assert_eq!(
            GDL90_STUFFER.escape(&[0x01, 0x7E, 0x7D, 0x02]),
            vec![0x01, 0x7D, 0x5E, 0x7D, 0x5D, 0x02]
        );
    }

    #[test]
    fn test_escape_roundtrip_all_bytes() {
        let data: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();
        let escaped = GDL90_STUFFER.escape(&data);
        assert_eq!(escaped.len(), data.len() + 4);
        assert!(!escaped.contains(&FLAG_BYTE));
        // Every 0x7D in the output introduces an escape, never a literal
        for (i, &b) in escaped.iter().enumerate() {
            if b == ESCAPE_BYTE {
                assert!(matches!(escaped[i + 1], 0x5D | 0x5E));
            }
        }
        assert_eq!(GDL90_STUFFER.unescape(&escaped).unwrap(), data);
    }

    #[test]
    fn test_unescape_errors() {
        assert!(GDL90_STUFFER.unescape(&[0x01, 0x7D]).is_err());
        assert!(GDL90_STUFFER.unescape(&[0x01, 0x7E, 0x02]).is_err());
    }

    #[test]
    fn test_custom_reserved_values() {
        // SLIP-like pair
        let slip = ByteStuffer::new(0xC0, 0xDB);
        let escaped = slip.escape(&[0xC0, 0x7E, 0xDB]);
        assert_eq!(escaped, vec![0xDB, 0xE0, 0x7E, 0xDB, 0xFB]);
        assert_eq!(slip.unescape(&escaped).unwrap(), vec![0xC0, 0x7E, 0xDB]);
    }

    #[test]
    fn test_reference_heartbeat_frame() {
        let body = hex_decode("8141DBD00802").unwrap();
        let out = frame(0x00, &body);
        assert_eq!(hex_encode(&out), "7E008141DBD00802B38B7E");
    }

    #[test]
    fn test_frame_shape() {
        let body = [0x7E; 6];
        let out = frame(0x00, &body);
        assert_eq!(out[0], FLAG_BYTE);
        assert_eq!(out[1], 0x00);
        assert_eq!(*out.last().unwrap(), FLAG_BYTE);
        assert!(out.len() >= 3 + body.len() + 2);
        assert!(out.len() <= max_frame_len(body.len()));
        // Only the two flags remain literal
        assert_eq!(out.iter().filter(|&&b| b == FLAG_BYTE).count(), 2);
    }

    #[test]
    fn test_escaped_traffic_frame() {
        let body = hex_decode("007E7D01000000000000000988000000FF01464C41524D00000000").unwrap();
        let out = frame(20, &body);
        assert_eq!(
            hex_encode(&out),
            "7E14007D5E7D5D01000000000000000988000000FF01464C41524D0000000022BC7E"
        );
    }

    #[test]
    fn test_assemble_reuses_buffer() {
        let mut buf = Vec::new();
        let n1 = assemble_frame(&mut buf, 10, &[0u8; 27]);
        assert_eq!(n1, buf.len());
        let n2 = assemble_frame(&mut buf, 0, &[0x81, 0, 0, 0, 0, 0]);
        assert_eq!(n2, buf.len());
        assert_eq!(hex_encode(&buf), "7E008100000000008CAB7E");
    }

    #[test]
    fn test_max_frame_len() {
        assert_eq!(max_frame_len(6), 20);
        assert_eq!(max_frame_len(27), 62);
    }
}
