//! Latitude/longitude to 24-bit two's-complement fixed point.
//!
//! Resolution is 180 / 2^23 degrees per LSB. The full circle [-180, 180)
//! spans the 24-bit value space; latitude simply uses half of it.

/// Degrees → LSB scale factor.
const SCALE: f64 = 0x800000 as f64 / 180.0;

const MASK_24: u32 = 0xFFFFFF;

/// Encode a latitude. Values outside [-90, 90] clamp to the boundary.
pub fn make_latitude(latitude: f64) -> u32 {
    encode_degrees(latitude.clamp(-90.0, 90.0))
}

/// Encode a longitude. Values outside [-180, 180] clamp to the boundary.
pub fn make_longitude(longitude: f64) -> u32 {
    encode_degrees(longitude.clamp(-180.0, 180.0))
}

fn encode_degrees(deg: f64) -> u32 {
    // `as` truncates toward zero (NaN → 0)
    let raw = (deg * SCALE) as i32;
    if raw < 0 {
        (0x1000000 + raw) as u32 & MASK_24
    } else {
        raw as u32
    }
}

/// Swap the first and third byte of a 24-bit quantity.
///
/// Writing the result least-significant byte first puts the original value
/// on the wire most-significant byte first.
pub fn pack24(num: u32) -> u32 {
    ((num & 0xFF0000) >> 16) | (num & 0x00FF00) | ((num & 0xFF) << 16)
}

/// Write a 24-bit field at `buf[0..3]` in wire order.
pub(crate) fn put_u24(buf: &mut [u8], value: u32) {
    let packed = pack24(value & MASK_24);
    buf[0] = (packed & 0xFF) as u8;
    buf[1] = ((packed >> 8) & 0xFF) as u8;
    buf[2] = ((packed >> 16) & 0xFF) as u8;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
