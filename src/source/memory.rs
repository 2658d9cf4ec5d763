//! In-memory telemetry store.
//!
//! Holds path values in process and pushes them to listeners on every
//! change. Useful for tests, demos and for bridging snapshots that arrive
//! through some other channel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{FeedEvent, FeedSubscription, SourceError, TelemetryStore};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, Value>,
    listeners: HashMap<String, Vec<(u64, mpsc::UnboundedSender<FeedEvent>)>>,
    next_id: u64,
}

/// A store whose paths live in memory.
///
/// Clones share the same data, so one clone can be handed to an ingestor
/// while another publishes values. New subscribers immediately receive the
/// current value of their path.
///
/// # Example
///
/// ```
/// use floodwatch::{FeedEvent, MemoryStore, TelemetryStore};
/// use serde_json::json;
///
/// let store = MemoryStore::new("memory");
/// let mut subscription = store.clone().subscribe("water-level").unwrap();
/// assert_eq!(subscription.try_next().unwrap(), Some(FeedEvent::NoData));
///
/// store.set("water-level", json!({ "a": { "distance": 40, "unixTimestamp": 1700000000 } }));
/// assert!(matches!(subscription.try_next().unwrap(), Some(FeedEvent::Snapshot(_))));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    description: String,
}

fn key(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new(source_description: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            description: format!("memory: {}", source_description),
        }
    }

    /// Replace the value at `path` and push it to every listener.
    ///
    /// Returns the number of listeners that received it.
    pub fn set(&self, path: &str, value: Value) -> usize {
        let path = key(path);
        let mut inner = self.inner.lock();
        let event = FeedEvent::from_value(value.clone());
        inner.values.insert(path.clone(), value);
        Self::notify(&mut inner, &path, event)
    }

    /// Remove the value at `path`; listeners are told there is no data.
    pub fn remove(&self, path: &str) -> usize {
        let path = key(path);
        let mut inner = self.inner.lock();
        inner.values.remove(&path);
        Self::notify(&mut inner, &path, FeedEvent::NoData)
    }

    /// Number of active listeners on `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        self.inner.lock().listeners.get(&key(path)).map_or(0, Vec::len)
    }

    fn notify(inner: &mut Inner, path: &str, event: FeedEvent) -> usize {
        let Some(listeners) = inner.listeners.get_mut(path) else {
            return 0;
        };
        listeners.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        listeners.len()
    }
}

impl TelemetryStore for MemoryStore {
    fn subscribe(&mut self, path: &str) -> Result<FeedSubscription, SourceError> {
        let path = key(path);
        let (tx, rx) = mpsc::unbounded_channel();

        let id = {
            let mut inner = self.inner.lock();
            let current = inner
                .values
                .get(&path)
                .cloned()
                .map_or(FeedEvent::NoData, FeedEvent::from_value);
            // The receiver is alive, so this cannot fail.
            let _ = tx.send(current);

            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.entry(path.clone()).or_default().push((id, tx));
            id
        };

        let inner = Arc::clone(&self.inner);
        let release_path = path.clone();
        Ok(FeedSubscription::new(&path, rx).on_release(move || {
            let mut inner = inner.lock();
            if let Some(listeners) = inner.listeners.get_mut(&release_path) {
                listeners.retain(|(listener, _)| *listener != id);
            }
        }))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({ "a": { "distance": 40, "unixTimestamp": 1_700_000_000 } })
    }

    #[test]
    fn test_subscribe_receives_current_value() {
        let mut store = MemoryStore::new("test");
        store.set("water-level", sample());

        let mut subscription = store.subscribe("water-level").unwrap();
        let event = subscription.try_next().unwrap().unwrap();
        assert_eq!(event.len(), 1);

        // No change, nothing pending
        assert!(subscription.try_next().unwrap().is_none());
    }

    #[test]
    fn test_set_pushes_to_listeners() {
        let mut store = MemoryStore::new("test");
        let mut first = store.subscribe("water-level").unwrap();
        let mut second = store.subscribe("/water-level/").unwrap();
        let mut other = store.subscribe("rainfall").unwrap();
        let _ = (first.try_next(), second.try_next(), other.try_next());

        assert_eq!(store.set("water-level", sample()), 2);
        assert!(matches!(first.try_next().unwrap(), Some(FeedEvent::Snapshot(_))));
        assert!(matches!(second.try_next().unwrap(), Some(FeedEvent::Snapshot(_))));
        assert!(other.try_next().unwrap().is_none());

        assert_eq!(store.remove("water-level"), 2);
        assert_eq!(first.try_next().unwrap(), Some(FeedEvent::NoData));
    }

    #[test]
    fn test_release_detaches_listener() {
        let mut store = MemoryStore::new("test");
        let mut subscription = store.subscribe("water-level").unwrap();
        assert_eq!(store.listener_count("water-level"), 1);

        subscription.release();
        subscription.release();
        assert_eq!(store.listener_count("water-level"), 0);
        assert_eq!(store.set("water-level", sample()), 0);
    }

    #[test]
    fn test_description() {
        let store = MemoryStore::new("demo");
        assert_eq!(store.description(), "memory: demo");
    }
}
