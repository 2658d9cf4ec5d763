//! Date window filtering.

use chrono::{DateTime, FixedOffset, Utc};
use tracing::warn;

use super::record::CanonicalRecord;
use super::timefmt::{parse_bound, BoundSide};

/// Optional inclusive bounds on record timestamps.
///
/// An absent bound leaves that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    /// A window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a window from viewer-supplied text.
    ///
    /// Blank input means no bound. Input that does not parse is also treated
    /// as no bound, and logged.
    pub fn parse(start: &str, end: &str, offset: FixedOffset) -> Self {
        Self {
            start: parse_text_bound(start, BoundSide::Start, offset),
            end: parse_text_bound(end, BoundSide::End, offset),
        }
    }

    /// Returns true when neither side is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns true when `ts` lies inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts <= end)
    }
}

fn parse_text_bound(s: &str, side: BoundSide, offset: FixedOffset) -> Option<DateTime<Utc>> {
    if s.trim().is_empty() {
        return None;
    }
    let parsed = parse_bound(s, side, offset);
    if parsed.is_none() {
        warn!(bound = s, ?side, "ignoring unparsable date bound");
    }
    parsed
}

/// Select the records inside `window`, preserving their order.
pub fn filter(records: &[CanonicalRecord], window: &DateWindow) -> Vec<CanonicalRecord> {
    records
        .iter()
        .filter(|r| window.contains(r.timestamp))
        .cloned()
        .collect()
}
