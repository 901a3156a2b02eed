//! Fixed-capacity traffic table.
//!
//! Pure state container, no I/O. Slots keep insertion order, which is the
//! order the exporter reports traffic in.

use crate::types::AircraftState;

/// Number of traffic slots tracked by default.
pub const MAX_TRACKING_OBJECTS: usize = 8;

/// Tracked aircraft, one per slot.
#[derive(Debug, Clone)]
pub struct TrafficTable {
    slots: Vec<Option<AircraftState>>,
    expiration: f64,
}

impl TrafficTable {
    /// `expiration`: seconds after which a slot may be reused.
    pub fn new(capacity: usize, expiration: f64) -> Self {
        TrafficTable {
            slots: vec![None; capacity],
            expiration,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or refresh an aircraft. Returns the slot index used, or `None`
    /// when the record was dropped.
    ///
    /// Slot choice: same address, then an empty slot, then an expired one,
    /// then the least recently updated if it is older than `state`.
    /// Address 0, already-expired records, and updates older than the
    /// stored one are dropped.
    pub fn upsert(&mut self, state: AircraftState, now: f64) -> Option<usize> {
        if state.addr == 0 || state.is_expired(now, self.expiration) {
            return None;
        }

        if let Some(idx) = self.position(|ac| ac.addr == state.addr) {
            if self.slots[idx]
                .as_ref()
                .is_some_and(|ac| ac.timestamp > state.timestamp)
            {
                return None;
            }
            self.slots[idx] = Some(state);
            return Some(idx);
        }

        let idx = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .or_else(|| self.position(|ac| ac.is_expired(now, self.expiration)))
            .or_else(|| self.oldest().filter(|&(_, ts)| ts < state.timestamp).map(|(i, _)| i))?;

        self.slots[idx] = Some(state);
        Some(idx)
    }

    pub fn get(&self, addr: u32) -> Option<&AircraftState> {
        self.iter().find(|ac| ac.addr == addr)
    }

    pub fn remove(&mut self, addr: u32) -> Option<AircraftState> {
        let idx = self.position(|ac| ac.addr == addr)?;
        self.slots[idx].take()
    }

    /// Clear expired slots. Returns count removed.
    pub fn prune(&mut self, now: f64) -> usize {
        let expiration = self.expiration;
        let mut removed = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|ac| ac.is_expired(now, expiration)) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &AircraftState> {
        self.slots.iter().flatten()
    }

    fn position(&self, pred: impl Fn(&AircraftState) -> bool) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(&pred))
    }

    /// Slot index and timestamp of the least recently updated aircraft.
    fn oldest(&self) -> Option<(usize, f64)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|ac| (i, ac.timestamp)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl Default for TrafficTable {
    fn default() -> Self {
        TrafficTable::new(MAX_TRACKING_OBJECTS, crate::export::EXPORT_EXPIRATION_TIME)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
