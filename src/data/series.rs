//! Display scalars derived from a record series.

use std::collections::BTreeMap;

use super::classify::HazardStage;
use super::record::CanonicalRecord;

/// Number of axis labels the chart aims to show.
const TARGET_LABELS: usize = 5;

/// Distance of the latest record, or 0 when there are none.
pub fn current_value(records: &[CanonicalRecord]) -> f64 {
    records.last().map_or(0.0, |r| r.distance_cm)
}

/// Label interval for a series of `n` points: `round(n / 5)`.
///
/// Zero means every label is shown.
pub fn tick_interval(n: usize) -> usize {
    (n + TARGET_LABELS / 2) / TARGET_LABELS
}

/// Number of records in each hazard stage. Every stage is present, possibly with 0.
pub fn stage_counts(records: &[CanonicalRecord]) -> BTreeMap<HazardStage, usize> {
    let mut counts: BTreeMap<HazardStage, usize> =
        HazardStage::ALL.iter().map(|&stage| (stage, 0)).collect();
    for record in records {
        *counts.entry(record.stage()).or_default() += 1;
    }
    counts
}
