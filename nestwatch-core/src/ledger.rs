//! Violation ledger — the registry of pilots known to have flown a drone
//! into the no-fly zone.
//!
//! Pure state machine: the caller (poller/resolver) merges observations in,
//! the web layer reads windowed snapshots out. One record per pilot;
//! `drone_ids` only grows and `min_distance_to_nest` only shrinks.

use std::collections::{BTreeSet, HashMap};

use crate::types::{DroneObservation, PilotIdentity};

/// Records older than this are excluded from query results (view filter).
pub const STALENESS_WINDOW_MS: i64 = 600_000;

/// Records unseen for this long are evicted outright to bound memory.
/// Well past the staleness window, so eviction is never observable
/// through `snapshot`.
pub const RETENTION_MS: i64 = 10 * STALENESS_WINDOW_MS;

/// One offending pilot and everything observed about them so far.
#[derive(Debug, Clone)]
pub struct ViolationRecord {
    pub pilot_id: String,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    /// Timestamp of the most recently merged observation, epoch millis.
    pub last_seen_at: i64,
    /// Every drone serial resolved to this pilot. Union, never shrinks.
    pub drone_ids: BTreeSet<String>,
    /// Closest approach to the nest over all merged observations.
    pub min_distance_to_nest: f64,
    /// Insertion order, for deterministic snapshot tie-breaks.
    seq: u64,
}

impl ViolationRecord {
    fn merge(&mut self, observation: &DroneObservation, distance: f64) {
        self.last_seen_at = observation.observed_at;
        if !self.drone_ids.contains(&observation.serial) {
            self.drone_ids.insert(observation.serial.clone());
        }
        self.min_distance_to_nest = self.min_distance_to_nest.min(distance);
    }
}

/// Registry of violation records keyed by pilot id.
#[derive(Debug, Default)]
pub struct ViolationLedger {
    records: HashMap<String, ViolationRecord>,
    next_seq: u64,
}

impl ViolationLedger {
    pub fn new() -> Self {
        ViolationLedger::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up the record owning a drone serial.
    pub fn find_by_drone(&self, serial: &str) -> Option<&ViolationRecord> {
        self.records.values().find(|r| r.drone_ids.contains(serial))
    }

    pub fn get(&self, pilot_id: &str) -> Option<&ViolationRecord> {
        self.records.get(pilot_id)
    }

    /// Merge an observation into the record owning its drone serial.
    ///
    /// Returns true on a match (the synchronous cache-hit path). False means
    /// the serial has no known pilot yet and a remote lookup is needed.
    pub fn merge_by_drone(&mut self, observation: &DroneObservation, distance: f64) -> bool {
        let pilot_id = match self.find_by_drone(&observation.serial) {
            Some(r) => r.pilot_id.clone(),
            None => return false,
        };
        if let Some(record) = self.records.get_mut(&pilot_id) {
            record.merge(observation, distance);
        }
        true
    }

    /// Insert a freshly resolved identity seeded from its first observation.
    ///
    /// If the pilot already has a record (another of their drones resolved
    /// first), the observation merges into it instead of creating a
    /// duplicate.
    pub fn record_identity(
        &mut self,
        identity: PilotIdentity,
        observation: &DroneObservation,
        distance: f64,
    ) {
        if let Some(record) = self.records.get_mut(&identity.pilot_id) {
            record.merge(observation, distance);
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let record = ViolationRecord {
            pilot_id: identity.pilot_id.clone(),
            name: identity.full_name(),
            email: identity.email,
            phone_number: identity.phone_number,
            last_seen_at: observation.observed_at,
            drone_ids: BTreeSet::from([observation.serial.clone()]),
            min_distance_to_nest: distance,
            seq,
        };
        self.records.insert(identity.pilot_id, record);
    }

    /// Records seen within `window_ms` of `now_ms`, most recent first.
    /// Ties broken by insertion order.
    pub fn snapshot(&self, window_ms: i64, now_ms: i64) -> Vec<&ViolationRecord> {
        let mut recent: Vec<&ViolationRecord> = self
            .records
            .values()
            .filter(|r| now_ms - r.last_seen_at < window_ms)
            .collect();
        recent.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at).then(a.seq.cmp(&b.seq)));
        recent
    }

    /// Evict records unseen for longer than `horizon_ms`. Returns count removed.
    pub fn prune(&mut self, horizon_ms: i64, now_ms: i64) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, r| now_ms - r.last_seen_at <= horizon_ms);
        before - self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn identity(pilot_id: &str) -> PilotIdentity {
        PilotIdentity {
            pilot_id: pilot_id.to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "a@x.com".to_string(),
            phone_number: "555".to_string(),
        }
    }

    fn observation(serial: &str, ts: i64) -> DroneObservation {
        DroneObservation {
            serial: serial.to_string(),
            position: Point::new(250_000.0, 160_000.0),
            observed_at: ts,
        }
    }

    #[test]
    fn test_record_identity_seeds_fields() {
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", 1000), 90_000.0);

        let record = ledger.get("P1").unwrap();
        assert_eq!(record.name, "Ann Lee");
        assert_eq!(record.email, "a@x.com");
        assert_eq!(record.phone_number, "555");
        assert_eq!(record.last_seen_at, 1000);
        assert_eq!(record.min_distance_to_nest, 90_000.0);
        assert!(record.drone_ids.contains("SN-1"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_min_distance_monotone() {
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", 1000), 90_000.0);

        ledger.merge_by_drone(&observation("SN-1", 2000), 95_000.0);
        assert_eq!(ledger.get("P1").unwrap().min_distance_to_nest, 90_000.0);

        ledger.merge_by_drone(&observation("SN-1", 3000), 40_000.0);
        assert_eq!(ledger.get("P1").unwrap().min_distance_to_nest, 40_000.0);
    }

    #[test]
    fn test_remerge_identical_observation_idempotent() {
        let mut ledger = ViolationLedger::new();
        let obs = observation("SN-1", 1000);
        ledger.record_identity(identity("P1"), &obs, 90_000.0);
        assert!(ledger.merge_by_drone(&obs, 90_000.0));

        let record = ledger.get("P1").unwrap();
        assert_eq!(record.drone_ids.len(), 1);
        assert_eq!(record.min_distance_to_nest, 90_000.0);
        assert_eq!(record.last_seen_at, 1000);
    }

    #[test]
    fn test_last_seen_tracks_latest_merge() {
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", 1000), 90_000.0);
        ledger.merge_by_drone(&observation("SN-1", 5000), 99_000.0);
        assert_eq!(ledger.get("P1").unwrap().last_seen_at, 5000);
    }

    #[test]
    fn test_two_drones_same_pilot_one_record() {
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", 1000), 90_000.0);
        // Second drone of the same pilot resolves later
        ledger.record_identity(identity("P1"), &observation("SN-2", 2000), 80_000.0);

        assert_eq!(ledger.len(), 1);
        let record = ledger.get("P1").unwrap();
        assert!(record.drone_ids.contains("SN-1"));
        assert!(record.drone_ids.contains("SN-2"));
        assert_eq!(record.min_distance_to_nest, 80_000.0);
    }

    #[test]
    fn test_merge_by_drone_unknown_serial() {
        let mut ledger = ViolationLedger::new();
        assert!(!ledger.merge_by_drone(&observation("SN-9", 1000), 50_000.0));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_drone_never_reassigned() {
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", 1000), 90_000.0);

        // A later observation for SN-1 always lands on P1's record
        assert!(ledger.merge_by_drone(&observation("SN-1", 2000), 85_000.0));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.find_by_drone("SN-1").unwrap().pilot_id, "P1");
    }

    #[test]
    fn test_snapshot_window_boundaries() {
        let now = 10_000_000;
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", now - 601_000), 90_000.0);
        ledger.record_identity(identity("P2"), &observation("SN-2", now - 599_000), 80_000.0);

        let snap = ledger.snapshot(STALENESS_WINDOW_MS, now);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].pilot_id, "P2");
        // Stale record is filtered from the view, not deleted
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_snapshot_ordering_most_recent_first() {
        let mut ledger = ViolationLedger::new();
        for (pilot, serial, ts) in [("P1", "SN-1", 1000), ("P2", "SN-2", 3000), ("P3", "SN-3", 2000)] {
            ledger.record_identity(identity(pilot), &observation(serial, ts), 90_000.0);
        }

        let snap = ledger.snapshot(STALENESS_WINDOW_MS, 4000);
        let order: Vec<&str> = snap.iter().map(|r| r.pilot_id.as_str()).collect();
        assert_eq!(order, vec!["P2", "P3", "P1"]);
    }

    #[test]
    fn test_snapshot_ties_by_insertion_order() {
        let mut ledger = ViolationLedger::new();
        for (pilot, serial) in [("P1", "SN-1"), ("P2", "SN-2"), ("P3", "SN-3")] {
            ledger.record_identity(identity(pilot), &observation(serial, 1000), 90_000.0);
        }

        let snap = ledger.snapshot(STALENESS_WINDOW_MS, 2000);
        let order: Vec<&str> = snap.iter().map(|r| r.pilot_id.as_str()).collect();
        assert_eq!(order, vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_snapshot_empty_ledger() {
        let ledger = ViolationLedger::new();
        assert!(ledger.snapshot(STALENESS_WINDOW_MS, 1_000_000).is_empty());
    }

    #[test]
    fn test_prune_retention() {
        let now = 100_000_000;
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", now - RETENTION_MS - 1), 90_000.0);
        ledger.record_identity(identity("P2"), &observation("SN-2", now - 1000), 80_000.0);

        assert_eq!(ledger.prune(RETENTION_MS, now), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.get("P2").is_some());
    }

    #[test]
    fn test_prune_never_touches_window() {
        // A record old enough to be hidden from snapshot must survive prune
        let now = 100_000_000;
        let mut ledger = ViolationLedger::new();
        ledger.record_identity(identity("P1"), &observation("SN-1", now - 601_000), 90_000.0);

        assert_eq!(ledger.prune(RETENTION_MS, now), 0);
        assert!(ledger.snapshot(STALENESS_WINDOW_MS, now).is_empty());
        assert_eq!(ledger.len(), 1);
    }
}
