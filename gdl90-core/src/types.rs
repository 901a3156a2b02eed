//! Shared types, error enum, and aircraft state for gdl90-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors produced by gdl90-core.
#[derive(Debug, Error)]
pub enum Gdl90Error {
    #[error("malformed escape sequence: {0}")]
    Escape(String),
    #[error("invalid aircraft record: {0}")]
    InvalidRecord(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Gdl90Error>;

// ---------------------------------------------------------------------------
// Message id metadata
// ---------------------------------------------------------------------------

pub const HEARTBEAT_MSG_ID: u8 = 0;
pub const OWNSHIP_MSG_ID: u8 = 10;
pub const TRAFFIC_MSG_ID: u8 = 20;

/// Metadata for an encodable GDL-90 message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgInfo {
    pub name: &'static str,
    /// Body length in bytes, excluding the id byte and CRC.
    pub body_len: usize,
}

/// Message ids this crate knows how to build.
pub const MSG_TABLE: &[(u8, MsgInfo)] = &[
    (
        HEARTBEAT_MSG_ID,
        MsgInfo {
            name: "Heartbeat",
            body_len: 6,
        },
    ),
    (
        OWNSHIP_MSG_ID,
        MsgInfo {
            name: "Ownship report",
            body_len: 27,
        },
    ),
    (
        TRAFFIC_MSG_ID,
        MsgInfo {
            name: "Traffic report",
            body_len: 27,
        },
    ),
];

/// Look up message metadata. Returns `None` for ids this crate does not encode.
pub fn msg_info(id: u8) -> Option<&'static MsgInfo> {
    MSG_TABLE
        .iter()
        .find(|(m, _)| *m == id)
        .map(|(_, info)| info)
}

// ---------------------------------------------------------------------------
// Aircraft state
// ---------------------------------------------------------------------------

/// Snapshot of one aircraft as handed to the encoder.
///
/// Owned by whatever tracks aircraft; the encoder only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    /// 24-bit address. Zero marks an unused tracking slot.
    pub addr: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Feet.
    #[serde(default)]
    pub altitude: f64,
    /// Degrees true, 0-360.
    #[serde(default)]
    pub course: f64,
    /// Unix seconds of the last update.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub emitter_category: u8,
    #[serde(default)]
    pub callsign: Option<String>,
}

impl AircraftState {
    pub fn new(addr: u32, latitude: f64, longitude: f64, timestamp: f64) -> Self {
        AircraftState {
            addr: addr & 0xFFFFFF,
            latitude,
            longitude,
            altitude: 0.0,
            course: 0.0,
            timestamp,
            emitter_category: 0,
            callsign: None,
        }
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    /// True once the last update is older than `expiration` seconds.
    pub fn is_expired(&self, now: f64, expiration: f64) -> bool {
        self.age(now) > expiration
    }
}

/// Format a 24-bit address as 6-char uppercase hex.
pub fn addr_to_string(addr: u32) -> String {
    format!("{:06X}", addr & 0xFFFFFF)
}

/// Parse up to 6 hex digits (optional `0x`) into a 24-bit address.
pub fn addr_from_hex(hex: &str) -> Option<u32> {
    let hex = hex.trim();
    let hex = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if !hex.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

/// Encode bytes as uppercase hex string.
pub fn hex_encode(data: &[u8]) -> String {
    let mut s = String::with_capacity(data.len() * 2);
    for &b in data {
        s.push(HEX_CHARS[(b >> 4) as usize] as char);
        s.push(HEX_CHARS[(b & 0x0F) as usize] as char);
    }
    s
}

const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_roundtrip() {
        let addr = addr_from_hex("4840D6").unwrap();
        assert_eq!(addr, 0x4840D6);
        assert_eq!(addr_to_string(addr), "4840D6");
    }

    #[test]
    fn test_addr_from_hex_rejects() {
        assert!(addr_from_hex("").is_none());
        assert!(addr_from_hex("1234567").is_none());
        assert!(addr_from_hex("XYZ").is_none());
        assert_eq!(addr_from_hex("0xABCDEF"), Some(0xABCDEF));
        assert_eq!(addr_from_hex("0Xabc"), Some(0xABC));
    }

    #[test]
    fn test_addr_from_hex_strict_prefix_and_digits() {
        assert!(addr_from_hex("0x0x12").is_none());
        assert!(addr_from_hex("+12").is_none());
        assert!(addr_from_hex("0x").is_none());
        assert!(addr_from_hex("12 34").is_none());
    }

    #[test]
    fn test_hex_decode() {
        assert_eq!(hex_decode("7E0081"), Some(vec![0x7E, 0x00, 0x81]));
        assert_eq!(hex_decode("odd"), None);
        assert_eq!(hex_decode("ZZZZ"), None);
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x7E, 0x0A, 0xD6]), "7E0AD6");
    }

    #[test]
    fn test_msg_info() {
        assert_eq!(msg_info(HEARTBEAT_MSG_ID).unwrap().body_len, 6);
        assert_eq!(msg_info(TRAFFIC_MSG_ID).unwrap().name, "Traffic report");
        assert_eq!(msg_info(OWNSHIP_MSG_ID).unwrap().body_len, 27);
        assert!(msg_info(7).is_none());
    }

    #[test]
    fn test_new_masks_address() {
        let ac = AircraftState::new(0x1ABCDEF, 0.0, 0.0, 0.0);
        assert_eq!(ac.addr, 0xABCDEF);
    }

    #[test]
    fn test_expiry() {
        let ac = AircraftState::new(1, 0.0, 0.0, 100.0);
        assert!(!ac.is_expired(105.0, 5.0));
        assert!(ac.is_expired(105.5, 5.0));
    }

    #[test]
    fn test_deserialize_minimal_record() {
        let ac: AircraftState =
            serde_json::from_str(r#"{"addr": 4735190, "latitude": 47.1, "longitude": 8.4}"#)
                .unwrap();
        assert_eq!(ac.addr, 0x4840D6);
        assert_eq!(ac.altitude, 0.0);
        assert!(ac.callsign.is_none());
    }
}
