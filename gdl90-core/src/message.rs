//! Heartbeat and Traffic/Ownship report builders.
//!
//! Every field is placed with explicit shifts and masks over a byte array.
//! Bit numbering below follows the GDL-90 ICD: bit 7 is the MSB.

use crate::coord::{make_latitude, make_longitude, put_u24};
use crate::framing;
use crate::types::{AircraftState, HEARTBEAT_MSG_ID, OWNSHIP_MSG_ID, TRAFFIC_MSG_ID};

pub const HEARTBEAT_LEN: usize = 6;
pub const TRAFFIC_LEN: usize = 27;

const SECONDS_PER_DAY: u64 = 86_400;

/// Seconds since UTC midnight for a unix timestamp.
pub fn seconds_today(unix_secs: f64) -> u32 {
    if unix_secs <= 0.0 {
        return 0;
    }
    (unix_secs as u64 % SECONDS_PER_DAY) as u32
}

// ---------------------------------------------------------------------------
// Heartbeat
// ---------------------------------------------------------------------------

/// Heartbeat (id 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat {
    // Status byte 1
    pub gnss_pos_valid: bool,
    pub maint_reqd: bool,
    pub ident: bool,
    pub addr_type: bool,
    pub gnss_bat_low: bool,
    pub ratcs: bool,
    pub uat_init: bool,

    // Status byte 2
    /// Bit 16 of the seconds-since-midnight count.
    pub time_stamp_ms: bool,
    pub csa_req: bool,
    pub csa_not_avail: bool,
    pub utc_ok: bool,

    pub time_stamp: u16,
    pub message_counts: u16,
}

impl Heartbeat {
    /// Heartbeat with the status this feeder always reports.
    pub fn new(secs_today: u32) -> Self {
        Heartbeat {
            gnss_pos_valid: true,
            uat_init: true,
            time_stamp_ms: (secs_today >> 16) & 1 != 0,
            time_stamp: (secs_today & 0xFFFF) as u16,
            ..Default::default()
        }
    }

    pub fn encode(&self) -> [u8; HEARTBEAT_LEN] {
        let mut buf = [0u8; HEARTBEAT_LEN];

        buf[0] = bit(self.gnss_pos_valid, 7)
            | bit(self.maint_reqd, 6)
            | bit(self.ident, 5)
            | bit(self.addr_type, 4)
            | bit(self.gnss_bat_low, 3)
            | bit(self.ratcs, 2)
            | bit(self.uat_init, 0);

        buf[1] = bit(self.time_stamp_ms, 7)
            | bit(self.csa_req, 6)
            | bit(self.csa_not_avail, 5)
            | bit(self.utc_ok, 0);

        buf[2..4].copy_from_slice(&self.time_stamp.to_le_bytes());
        buf[4..6].copy_from_slice(&self.message_counts.to_le_bytes());
        buf
    }

    pub fn to_frame(&self) -> Vec<u8> {
        framing::frame(HEARTBEAT_MSG_ID, &self.encode())
    }
}

#[inline]
fn bit(set: bool, pos: u8) -> u8 {
    (set as u8) << pos
}

// ---------------------------------------------------------------------------
// Traffic / Ownship report
// ---------------------------------------------------------------------------

/// Field values that have no source in [`AircraftState`] yet.
pub mod defaults {
    /// Airborne, true track, report updated.
    pub const MISC: u8 = 9;
    pub const NIC: u8 = 8;
    pub const NACP: u8 = 8;
    /// Light aircraft.
    pub const EMITTER_CATEGORY: u8 = 1;
    pub const CALLSIGN: &[u8; 8] = b"FLARM\0\0\0";
}

/// Altitude code for invalid/unavailable altitude.
pub const ALTITUDE_INVALID: u16 = 0xFFF;
const ALTITUDE_MAX: i32 = 0xFFE;

/// Pressure altitude (feet) to 25 ft increments offset by -1000 ft.
pub fn altitude_code(altitude_ft: f64) -> u16 {
    ((altitude_ft as i32).saturating_add(1000) / 25).clamp(0, ALTITUDE_MAX) as u16
}

/// Course in degrees to the 360/256 degree track byte.
pub fn track_code(course: f64) -> u8 {
    ((course / (360.0 / 256.0)) as i32 & 0xFF) as u8
}

/// Traffic report (id 20) or ownship report (id 10); same layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficReport {
    pub alert_status: u8,
    pub addr_type: u8,
    pub addr: u32,
    /// Encoded 24-bit latitude.
    pub latitude: u32,
    /// Encoded 24-bit longitude.
    pub longitude: u32,
    /// 12-bit altitude code.
    pub altitude: u16,
    pub misc: u8,
    pub nic: u8,
    pub nacp: u8,
    /// 12-bit horizontal velocity, knots.
    pub horiz_vel: u16,
    /// 12-bit vertical velocity, 64 fpm units.
    pub vert_vel: u16,
    pub track: u8,
    pub emitter_category: u8,
    pub callsign: [u8; 8],
    pub emergency_code: u8,
}

impl TrafficReport {
    pub fn from_aircraft(aircraft: &AircraftState) -> Self {
        TrafficReport {
            alert_status: 0,
            addr_type: 0,
            addr: aircraft.addr & 0xFFFFFF,
            latitude: make_latitude(aircraft.latitude),
            longitude: make_longitude(aircraft.longitude),
            altitude: altitude_code(aircraft.altitude),
            misc: defaults::MISC,
            nic: defaults::NIC,
            nacp: defaults::NACP,
            horiz_vel: 0,
            vert_vel: 0,
            track: track_code(aircraft.course),
            emitter_category: defaults::EMITTER_CATEGORY,
            callsign: *defaults::CALLSIGN,
            emergency_code: 0,
        }
    }

    /// Pack into the 27-byte body.
    ///
    /// ```text
    /// [0]      alert_status:4 | addr_type:4
    /// [1..4]   addr
    /// [4..7]   latitude
    /// [7..10]  longitude
    /// [10]     altitude[11:4]
    /// [11]     altitude[3:0] | misc:4
    /// [12]     nic:4 | nacp:4
    /// [13]     horiz_vel[11:4]
    /// [14]     horiz_vel[3:0] | vert_vel[11:8]
    /// [15]     vert_vel[7:0]
    /// [16]     track
    /// [17]     emitter category
    /// [18..26] callsign
    /// [26]     emergency_code:4 | spare:4
    /// ```
    pub fn encode(&self) -> [u8; TRAFFIC_LEN] {
        let mut buf = [0u8; TRAFFIC_LEN];
        let alt = self.altitude & 0xFFF;
        let hv = self.horiz_vel & 0xFFF;
        let vv = self.vert_vel & 0xFFF;

        buf[0] = (self.alert_status & 0x0F) << 4 | (self.addr_type & 0x0F);
        put_u24(&mut buf[1..4], self.addr);
        put_u24(&mut buf[4..7], self.latitude);
        put_u24(&mut buf[7..10], self.longitude);

        buf[10] = ((alt >> 4) & 0xFF) as u8;
        buf[11] = ((alt & 0x0F) as u8) << 4 | (self.misc & 0x0F);

        buf[12] = (self.nic & 0x0F) << 4 | (self.nacp & 0x0F);

        buf[13] = ((hv >> 4) & 0xFF) as u8;
        buf[14] = ((hv & 0x0F) as u8) << 4 | ((vv >> 8) & 0x0F) as u8;
        buf[15] = (vv & 0xFF) as u8;

        buf[16] = self.track;
        buf[17] = self.emitter_category;
        buf[18..26].copy_from_slice(&self.callsign);
        buf[26] = (self.emergency_code & 0x0F) << 4;
        buf
    }

    pub fn to_frame(&self, msg_id: u8) -> Vec<u8> {
        framing::frame(msg_id, &self.encode())
    }
}

/// Framed ownship report for `aircraft`.
pub fn ownship_frame(aircraft: &AircraftState) -> Vec<u8> {
    TrafficReport::from_aircraft(aircraft).to_frame(OWNSHIP_MSG_ID)
}

/// Framed traffic report for `aircraft`.
pub fn traffic_frame(aircraft: &AircraftState) -> Vec<u8> {
    TrafficReport::from_aircraft(aircraft).to_frame(TRAFFIC_MSG_ID)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
