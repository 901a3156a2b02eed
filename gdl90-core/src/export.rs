//! Export cycle: heartbeat, ownship, then nearby fresh traffic.
//!
//! One datagram per frame. A failed send is logged and counted; the rest of
//! the cycle still goes out.

use std::io;

use tracing::{debug, warn};

use crate::framing::{assemble_frame, max_frame_len};
use crate::geo;
use crate::message::{seconds_today, Heartbeat, TrafficReport, TRAFFIC_LEN};
use crate::types::{addr_to_string, AircraftState, HEARTBEAT_MSG_ID, OWNSHIP_MSG_ID, TRAFFIC_MSG_ID};

/// Traffic older than this (seconds) is not exported.
pub const EXPORT_EXPIRATION_TIME: f64 = 5.0;

/// Traffic at or beyond this distance (meters) is not exported.
pub const EXPORT_DISTANCE_FAR: f64 = 10_000.0;

/// Well-known GDL-90 UDP port.
pub const GDL90_DST_PORT: u16 = 4000;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one frame as one datagram.
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Collects frames in memory.
impl Transport for Vec<Vec<u8>> {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.push(frame.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Export filter settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    pub expiration_secs: f64,
    pub max_distance_m: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            expiration_secs: EXPORT_EXPIRATION_TIME,
            max_distance_m: EXPORT_DISTANCE_FAR,
        }
    }
}

/// Outcome of one export cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub sent: u32,
    pub failed: u32,
    /// Traffic skipped for age.
    pub stale: u32,
    /// Traffic skipped for distance.
    pub out_of_range: u32,
}

/// Distance in meters between two aircraft.
pub type DistanceFn = fn(&AircraftState, &AircraftState) -> f64;

/// Builds and sends one cycle of frames.
///
/// Holds a single scratch buffer that every frame is assembled into.
pub struct Exporter {
    pub config: ExportConfig,
    distance: DistanceFn,
    scratch: Vec<u8>,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Self {
        Exporter {
            config,
            distance: geo::distance_between,
            scratch: Vec::with_capacity(max_frame_len(TRAFFIC_LEN)),
        }
    }

    /// Replace the great-circle distance function.
    pub fn with_distance(mut self, distance: DistanceFn) -> Self {
        self.distance = distance;
        self
    }

    /// Run one export cycle at unix time `now`.
    ///
    /// `traffic` is walked in order; entries with address 0 are empty slots.
    pub fn export<'a, T, I>(
        &mut self,
        now: f64,
        ownship: &AircraftState,
        traffic: I,
        transport: &mut T,
    ) -> ExportReport
    where
        T: Transport + ?Sized,
        I: IntoIterator<Item = &'a AircraftState>,
    {
        let mut report = ExportReport::default();

        let heartbeat = Heartbeat::new(seconds_today(now)).encode();
        self.send(transport, HEARTBEAT_MSG_ID, &heartbeat, &mut report);

        let own = TrafficReport::from_aircraft(ownship).encode();
        self.send(transport, OWNSHIP_MSG_ID, &own, &mut report);

        for ac in traffic {
            if ac.addr == 0 {
                continue;
            }
            if ac.is_expired(now, self.config.expiration_secs) {
                report.stale += 1;
                continue;
            }
            let distance = (self.distance)(ownship, ac);
            let in_range = distance < self.config.max_distance_m;
            if !in_range {
                debug!(addr = %addr_to_string(ac.addr), distance, "traffic out of range");
                report.out_of_range += 1;
                continue;
            }
            let body = TrafficReport::from_aircraft(ac).encode();
            self.send(transport, TRAFFIC_MSG_ID, &body, &mut report);
        }

        debug!(
            sent = report.sent,
            failed = report.failed,
            stale = report.stale,
            out_of_range = report.out_of_range,
            "export cycle done"
        );
        report
    }

    fn send<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        msg_id: u8,
        body: &[u8],
        report: &mut ExportReport,
    ) {
        let len = assemble_frame(&mut self.scratch, msg_id, body);
        match transport.send(&self.scratch[..len]) {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!(msg_id, error = %e, "GDL-90 send failed");
                report.failed += 1;
            }
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Exporter::new(ExportConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
