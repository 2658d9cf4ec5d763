//! The canonical, time-ordered dataset built from one snapshot.

use std::ops::Deref;

use tracing::{debug, warn};

use super::record::{normalize, CanonicalRecord, RejectReason};
use crate::source::RawSnapshot;

/// Records from one snapshot, non-decreasing by timestamp.
///
/// Records sharing a timestamp keep their snapshot iteration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalDataset {
    records: Vec<CanonicalRecord>,
}

/// Result of building a dataset from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub dataset: CanonicalDataset,
    /// Ids of the entries that failed normalization, with the reason.
    pub rejected: Vec<(String, RejectReason)>,
}

impl CanonicalDataset {
    /// An empty dataset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sort `records` into a dataset.
    pub fn from_records(mut records: Vec<CanonicalRecord>) -> Self {
        sort_records(&mut records);
        Self { records }
    }

    /// Normalize every entry of `snapshot` and sort the survivors.
    ///
    /// Malformed entries are dropped and logged; they never abort the build.
    pub fn from_snapshot(snapshot: &RawSnapshot) -> BuildOutcome {
        let mut records = Vec::with_capacity(snapshot.len());
        let mut rejected = Vec::new();

        for (id, raw) in snapshot {
            match normalize(id, raw) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(id = %id, %reason, "dropping malformed sensor entry");
                    rejected.push((id.clone(), reason));
                }
            }
        }

        debug!(
            accepted = records.len(),
            rejected = rejected.len(),
            "normalized snapshot"
        );

        BuildOutcome {
            dataset: Self::from_records(records),
            rejected,
        }
    }

    /// The records in timestamp order.
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// The most recent record, if any.
    pub fn latest(&self) -> Option<&CanonicalRecord> {
        self.records.last()
    }
}

impl Deref for CanonicalDataset {
    type Target = [CanonicalRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

/// Stable ascending sort by timestamp.
pub fn sort_records(records: &mut [CanonicalRecord]) {
    records.sort_by_key(|r| r.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T: i64 = 1_700_000_000;

    fn snapshot(value: serde_json::Value) -> RawSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_drops_malformed_entries() {
        let raw = snapshot(json!({
            "a": { "distance": 40, "unixTimestamp": T },
            "b": { "distance": "x", "unixTimestamp": T + 1 }
        }));

        let outcome = CanonicalDataset::from_snapshot(&raw);
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.dataset[0].id, "a");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, "b");
    }

    #[test]
    fn test_build_sorts_by_timestamp() {
        let raw = snapshot(json!({
            "a": { "distance": 10, "unixTimestamp": T + 300 },
            "b": { "distance": 20, "unixTimestamp": T },
            "c": { "distance": 30, "unixTimestamp": T + 100 },
            "d": { "distance": 40, "unixTimestamp": T - 50 }
        }));

        let dataset = CanonicalDataset::from_snapshot(&raw).dataset;
        let ids: Vec<&str> = dataset.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "c", "a"]);
        assert!(dataset.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(dataset.latest().unwrap().id, "a");
    }

    #[test]
    fn test_equal_timestamps_keep_iteration_order() {
        let raw = snapshot(json!({
            "k1": { "distance": 1, "unixTimestamp": T + 10 },
            "k2": { "distance": 2, "unixTimestamp": T },
            "k3": { "distance": 3, "unixTimestamp": T },
            "k4": { "distance": 4, "unixTimestamp": T }
        }));

        let dataset = CanonicalDataset::from_snapshot(&raw).dataset;
        let ids: Vec<&str> = dataset.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["k2", "k3", "k4", "k1"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let outcome = CanonicalDataset::from_snapshot(&RawSnapshot::new());
        assert!(outcome.dataset.is_empty());
        assert!(outcome.rejected.is_empty());
        assert!(outcome.dataset.latest().is_none());
    }
}
