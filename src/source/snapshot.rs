//! Raw snapshot types delivered by telemetry stores.
//!
//! A snapshot is the complete value stored under the subscribed path,
//! as sent by the sensor: a map from record id to an object holding
//! `distance` and `unixTimestamp`. Entries are kept as untyped JSON so that
//! one malformed record can be rejected without discarding the rest.

use std::collections::BTreeMap;

use serde_json::Value;

/// The full value under the subscribed path, keyed by record id.
pub type RawSnapshot = BTreeMap<String, Value>;

/// A single push from a telemetry store.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// The path holds no data.
    NoData,
    /// The path holds this snapshot.
    Snapshot(RawSnapshot),
}

impl FeedEvent {
    /// Interpret a JSON value found at the subscribed path.
    ///
    /// An array is read as entries keyed by their index, which is how the
    /// database returns children with sequential integer keys. `null` holes
    /// are skipped. `null`, an empty collection and any scalar all mean there
    /// is no usable data at the path.
    pub fn from_value(value: Value) -> Self {
        let snapshot: RawSnapshot = match value {
            Value::Object(map) => map.into_iter().collect(),
            Value::Array(items) => index_entries(items).collect(),
            _ => return FeedEvent::NoData,
        };
        if snapshot.is_empty() {
            FeedEvent::NoData
        } else {
            FeedEvent::Snapshot(snapshot)
        }
    }

    /// Look up `path` inside a database root object and interpret the child.
    ///
    /// Paths are slash separated; leading and trailing slashes are ignored.
    pub fn from_root(root: &Value, path: &str) -> Self {
        let mut node = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let child = match node {
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => node.get(segment),
            };
            match child {
                Some(child) => node = child,
                None => return FeedEvent::NoData,
            }
        }
        FeedEvent::from_value(node.clone())
    }

    /// Number of raw entries carried by this event.
    pub fn len(&self) -> usize {
        match self {
            FeedEvent::NoData => 0,
            FeedEvent::Snapshot(snapshot) => snapshot.len(),
        }
    }

    /// Returns true when the event carries no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entries of an array keyed by index, without `null` holes.
pub(crate) fn index_entries(items: Vec<Value>) -> impl Iterator<Item = (String, Value)> {
    items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| !item.is_null())
        .map(|(index, item)| (index.to_string(), item))
}
