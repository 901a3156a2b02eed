//! Traffic input for the broadcast loop.
//!
//! A JSON-lines file, one `AircraftState` per line. Another process keeps
//! the file current; it is re-read every cycle.

use std::fs;
use std::path::Path;

use gdl90_core::{AircraftState, Gdl90Error, Result};
use tracing::warn;

/// Read all traffic records from `path`.
///
/// Bad lines are logged and skipped. Records without a timestamp are
/// stamped with `now`.
pub fn load_traffic(path: &Path, now: f64) -> Result<Vec<AircraftState>> {
    let content = fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (i, line) in content.lines().enumerate() {
        match parse_traffic_line(line, now) {
            Some(Ok(ac)) => records.push(ac),
            Some(Err(e)) => warn!(path = %path.display(), line = i + 1, error = %e, "skipping traffic record"),
            None => {}
        }
    }

    Ok(records)
}

/// Parse one line. `None` for blank lines and `#` comments.
pub fn parse_traffic_line(line: &str, now: f64) -> Option<Result<AircraftState>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let parsed = serde_json::from_str::<AircraftState>(line)
        .map_err(|e| Gdl90Error::InvalidRecord(e.to_string()))
        .and_then(|mut ac| {
            if ac.addr == 0 || ac.addr > 0xFFFFFF {
                return Err(Gdl90Error::InvalidRecord(format!(
                    "address out of range: {:#X}",
                    ac.addr
                )));
            }
            if ac.timestamp <= 0.0 {
                ac.timestamp = now;
            }
            Ok(ac)
        });
    Some(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
