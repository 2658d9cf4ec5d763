//! Canonical sensor records and the normalization step that produces them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::classify::{classify, HazardStage};

/// A validated water-level reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    /// Sensor-assigned record id, unique within one snapshot.
    pub id: String,
    /// Distance between the sensor and the water surface, in centimeters.
    pub distance_cm: f64,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Hazard stage of this reading under the default thresholds.
    pub fn stage(&self) -> HazardStage {
        classify(self.distance_cm)
    }
}

/// Why a raw entry was rejected by [`normalize`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("entry is not an object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("distance is not a finite number: {0}")]
    InvalidDistance(String),

    #[error("distance is negative: {0}")]
    NegativeDistance(f64),

    #[error("unixTimestamp is not an integer: {0}")]
    InvalidTimestamp(String),

    #[error("unixTimestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}

/// Convert one raw keyed entry into a canonical record.
///
/// The entry must be an object with a finite, non-negative numeric
/// `distance` and an integral `unixTimestamp` (seconds since the epoch).
pub fn normalize(id: &str, raw: &Value) -> Result<CanonicalRecord, RejectReason> {
    let fields = raw.as_object().ok_or(RejectReason::NotAnObject)?;

    let distance = fields
        .get("distance")
        .ok_or(RejectReason::MissingField("distance"))?;
    let distance_cm = parse_distance(distance)?;

    let timestamp = fields
        .get("unixTimestamp")
        .ok_or(RejectReason::MissingField("unixTimestamp"))?;
    let timestamp = parse_timestamp(timestamp)?;

    Ok(CanonicalRecord {
        id: id.to_string(),
        distance_cm,
        timestamp,
    })
}

fn parse_distance(value: &Value) -> Result<f64, RejectReason> {
    let distance = value
        .as_f64()
        .filter(|d| d.is_finite())
        .ok_or_else(|| RejectReason::InvalidDistance(value.to_string()))?;

    if distance < 0.0 {
        return Err(RejectReason::NegativeDistance(distance));
    }
    Ok(distance)
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, RejectReason> {
    let seconds = if let Some(secs) = value.as_i64() {
        secs
    } else if let Some(secs) = value.as_f64() {
        // Integral floats such as 1700000000.0 are accepted; fractions are not.
        if !secs.is_finite() || secs.fract() != 0.0 {
            return Err(RejectReason::InvalidTimestamp(value.to_string()));
        }
        if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
            return Err(RejectReason::InvalidTimestamp(value.to_string()));
        }
        secs as i64
    } else {
        return Err(RejectReason::InvalidTimestamp(value.to_string()));
    };

    DateTime::from_timestamp(seconds, 0).ok_or(RejectReason::TimestampOutOfRange(seconds))
}
