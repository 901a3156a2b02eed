//! GDL-90 frame check sequence (CRC-16).
//!
//! CCITT polynomial: x^16 + x^12 + x^5 + 1
//! Generator: 0x1021, seed 0x0000.
//!
//! Covers the message id byte followed by the message body, computed on the
//! unescaped bytes. Transmitted least-significant byte first.

const GENERATOR: u16 = 0x1021;

// ---------------------------------------------------------------------------
// CRC lookup table (compile-time)
// ---------------------------------------------------------------------------

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ GENERATOR;
            } else {
                crc <<= 1;
            }
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

// ---------------------------------------------------------------------------
// Core CRC functions
// ---------------------------------------------------------------------------

/// Feed one byte into a running CRC.
#[inline]
pub fn update(crc: u16, byte: u8) -> u16 {
    CRC_TABLE[(crc >> 8) as usize] ^ (crc << 8) ^ byte as u16
}

/// CRC-16 over a byte slice, starting from seed 0.
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| update(crc, b))
}

/// Frame check sequence over `[msg_id, body...]`.
pub fn fcs(msg_id: u8, body: &[u8]) -> u16 {
    body.iter().fold(update(0, msg_id), |crc, &b| update(crc, b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hex_decode;

    #[test]
    fn test_crc_table_entries() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x1021);
        assert_eq!(CRC_TABLE[255], 0x1EF0);
    }

    #[test]
    fn test_reference_heartbeat() {
        // Example heartbeat from the GDL-90 ICD: 7E 00 81 41 DB D0 08 02 B3 8B 7E
        let body = hex_decode("8141DBD00802").unwrap();
        assert_eq!(fcs(0x00, &body), 0x8BB3);
    }

    #[test]
    fn test_zero_time_heartbeat() {
        let body = [0x81, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(fcs(0x00, &body), 0xAB8C);
    }

    #[test]
    fn test_fcs_matches_flat_crc() {
        let body = hex_decode("00ABCDEF216C16060B6006").unwrap();
        let mut flat = vec![20u8];
        flat.extend_from_slice(&body);
        assert_eq!(fcs(20, &body), crc16(&flat));
    }

    #[test]
    fn test_check_string() {
        assert_eq!(crc16(b"123456789"), 0xBEEF);
    }

    #[test]
    fn test_empty() {
        assert_eq!(crc16(&[]), 0);
        assert_eq!(fcs(0, &[]), 0);
    }

    #[test]
    fn test_id_changes_crc() {
        let body = [0u8; 27];
        assert_ne!(fcs(10, &body), fcs(20, &body));
    }
}
