//! Snapshot ingestion.
//!
//! The [`StreamIngestor`] owns the subscription to a telemetry store and
//! the canonical dataset built from it. Every push replaces the dataset
//! in full; consumers observe replacements through a watch channel and
//! never see a partially built dataset.
//!
//! ```text
//! Unsubscribed ──subscribe──▶ Empty ◀───── no data ─────┐
//!                               │                       │
//!                               └──── snapshot ────▶ Populated ◀─┐
//!                                                       └─snapshot┘
//!
//! Empty | Populated ──unsubscribe──▶ TornDown
//! ```

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::data::CanonicalDataset;
use crate::source::{FeedEvent, FeedSubscription, SourceError, TelemetryStore};

/// Database path holding the sensor readings.
pub const DEFAULT_FEED_PATH: &str = "water-level";

/// Lifecycle of an ingestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Not yet subscribed.
    Unsubscribed,
    /// Subscribed; the last push (if any) carried no data.
    Empty,
    /// Subscribed; the last push carried data.
    Populated,
    /// Torn down. Terminal for this ingestor.
    TornDown,
}

impl IngestState {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, IngestState::Empty | IngestState::Populated)
    }
}

/// What the last push looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Nothing received yet.
    Waiting,
    /// The path holds no data.
    Empty,
    /// The path holds entries; `rejected` of them failed normalization.
    Populated { accepted: usize, rejected: usize },
}

/// A published dataset replacement.
#[derive(Debug, Clone)]
pub struct DatasetUpdate {
    pub dataset: Arc<CanonicalDataset>,
    pub status: FeedStatus,
    /// Number of pushes processed so far; 0 for the initial empty dataset.
    pub sequence: u64,
    pub received_at: Instant,
}

impl DatasetUpdate {
    fn initial() -> Self {
        Self {
            dataset: Arc::new(CanonicalDataset::empty()),
            status: FeedStatus::Waiting,
            sequence: 0,
            received_at: Instant::now(),
        }
    }
}

/// Errors returned by [`StreamIngestor::subscribe`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("ingestor is already subscribed")]
    AlreadySubscribed,

    #[error("ingestor has been torn down")]
    TornDown,

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Subscribes to a store path and republishes the canonical dataset.
///
/// Pushes are processed sequentially through `&mut self`, so at most one
/// replacement is ever in flight.
///
/// # Example
///
/// ```
/// use floodwatch::{MemoryStore, StreamIngestor};
/// use serde_json::json;
///
/// let mut store = MemoryStore::new("demo");
/// store.set("water-level", json!({ "a": { "distance": 40, "unixTimestamp": 1700000000 } }));
///
/// let mut ingestor = StreamIngestor::new("water-level");
/// let updates = ingestor.updates();
/// ingestor.subscribe(&mut store).unwrap();
/// ingestor.pump();
///
/// assert_eq!(updates.borrow().dataset.len(), 1);
/// ingestor.unsubscribe();
/// ```
#[derive(Debug)]
pub struct StreamIngestor {
    path: String,
    state: IngestState,
    subscription: Option<FeedSubscription>,
    publisher: watch::Sender<DatasetUpdate>,
    sequence: u64,
    feed_closed: bool,
}

impl StreamIngestor {
    /// Create an unsubscribed ingestor for `path`, holding an empty dataset.
    pub fn new(path: &str) -> Self {
        let (publisher, _) = watch::channel(DatasetUpdate::initial());
        Self {
            path: path.to_string(),
            state: IngestState::Unsubscribed,
            subscription: None,
            publisher,
            sequence: 0,
            feed_closed: false,
        }
    }

    /// The store path this ingestor listens on.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Returns true once the store hung up on the subscription.
    pub fn feed_closed(&self) -> bool {
        self.feed_closed
    }

    /// A receiver observing every dataset replacement.
    pub fn updates(&self) -> watch::Receiver<DatasetUpdate> {
        self.publisher.subscribe()
    }

    /// The most recently published dataset.
    pub fn dataset(&self) -> Arc<CanonicalDataset> {
        self.publisher.borrow().dataset.clone()
    }

    /// Register on the store path.
    pub fn subscribe(&mut self, store: &mut dyn TelemetryStore) -> Result<(), IngestError> {
        match self.state {
            IngestState::Unsubscribed => {}
            IngestState::TornDown => return Err(IngestError::TornDown),
            IngestState::Empty | IngestState::Populated => {
                return Err(IngestError::AlreadySubscribed)
            }
        }

        let subscription = store.subscribe(&self.path)?;
        info!(path = %self.path, store = store.description(), "subscribed to feed");
        self.subscription = Some(subscription);
        self.state = IngestState::Empty;
        Ok(())
    }

    /// Process one push. Returns false when it was ignored because the
    /// ingestor is not subscribed.
    pub fn handle_event(&mut self, event: FeedEvent) -> bool {
        if !self.state.is_subscribed() {
            debug!(state = ?self.state, "ignoring push outside a subscription");
            return false;
        }

        self.sequence += 1;
        let (dataset, status) = match event {
            FeedEvent::NoData => {
                info!(path = %self.path, "no data available");
                self.state = IngestState::Empty;
                (CanonicalDataset::empty(), FeedStatus::Empty)
            }
            FeedEvent::Snapshot(snapshot) => {
                let outcome = CanonicalDataset::from_snapshot(&snapshot);
                let status = FeedStatus::Populated {
                    accepted: outcome.dataset.len(),
                    rejected: outcome.rejected.len(),
                };
                self.state = IngestState::Populated;
                (outcome.dataset, status)
            }
        };

        debug!(sequence = self.sequence, records = dataset.len(), "publishing dataset");
        self.publisher.send_replace(DatasetUpdate {
            dataset: Arc::new(dataset),
            status,
            sequence: self.sequence,
            received_at: Instant::now(),
        });
        true
    }

    /// Process every pending push without waiting. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let Some(subscription) = self.subscription.as_mut() else {
                return applied;
            };
            match subscription.try_next() {
                Ok(Some(event)) => {
                    if self.handle_event(event) {
                        applied += 1;
                    }
                }
                Ok(None) => return applied,
                Err(e) => {
                    self.mark_closed(&e);
                    return applied;
                }
            }
        }
    }

    /// Wait for the next push and apply it. Returns false once the feed has
    /// closed or the ingestor is not subscribed.
    pub async fn next_update(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        match subscription.next().await {
            Some(event) => self.handle_event(event),
            None => {
                self.mark_closed(&SourceError::Closed(self.path.clone()));
                false
            }
        }
    }

    fn mark_closed(&mut self, error: &SourceError) {
        if !self.feed_closed {
            warn!(path = %self.path, %error, "feed closed");
            self.feed_closed = true;
        }
    }

    /// Release the listener. Idempotent; later pushes are ignored.
    pub fn unsubscribe(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
            info!(path = %self.path, "unsubscribed from feed");
        }
        self.state = IngestState::TornDown;
    }
}

impl Drop for StreamIngestor {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{classify, current_value, HazardStage};
    use crate::source::MemoryStore;
    use serde_json::json;

    const T: i64 = 1_700_000_000;

    fn populated_store() -> MemoryStore {
        let store = MemoryStore::new("test");
        store.set(
            DEFAULT_FEED_PATH,
            json!({
                "a": { "distance": 40, "unixTimestamp": T },
                "b": { "distance": "x", "unixTimestamp": T + 1 }
            }),
        );
        store
    }

    #[test]
    fn test_starts_unsubscribed_and_empty() {
        let ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        assert_eq!(ingestor.state(), IngestState::Unsubscribed);
        assert!(ingestor.dataset().is_empty());
        assert_eq!(ingestor.updates().borrow().status, FeedStatus::Waiting);
    }

    #[test]
    fn test_push_with_malformed_entry() {
        let mut store = populated_store();
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        let updates = ingestor.updates();

        ingestor.subscribe(&mut store).unwrap();
        assert_eq!(ingestor.state(), IngestState::Empty);
        assert_eq!(ingestor.pump(), 1);
        assert_eq!(ingestor.state(), IngestState::Populated);

        let update = updates.borrow();
        assert_eq!(update.dataset.len(), 1);
        assert_eq!(update.dataset[0].id, "a");
        assert_eq!(update.status, FeedStatus::Populated { accepted: 1, rejected: 1 });
        assert_eq!(current_value(&update.dataset), 40.0);
        assert_eq!(classify(current_value(&update.dataset)), HazardStage::Submerged);
    }

    #[test]
    fn test_no_data_push_empties_dataset() {
        let mut store = populated_store();
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        ingestor.subscribe(&mut store).unwrap();
        ingestor.pump();
        assert_eq!(ingestor.dataset().len(), 1);

        store.remove(DEFAULT_FEED_PATH);
        assert_eq!(ingestor.pump(), 1);
        assert_eq!(ingestor.state(), IngestState::Empty);
        assert!(ingestor.dataset().is_empty());
        assert_eq!(ingestor.updates().borrow().status, FeedStatus::Empty);
    }

    #[test]
    fn test_every_push_replaces_dataset() {
        let mut store = MemoryStore::new("test");
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        ingestor.subscribe(&mut store).unwrap();

        for n in 1..=3_i64 {
            let entries: serde_json::Map<String, serde_json::Value> = (0..n)
                .map(|i| {
                    (
                        format!("k{i}"),
                        json!({ "distance": 100 + i, "unixTimestamp": T + (n - i) }),
                    )
                })
                .collect();
            store.set(DEFAULT_FEED_PATH, serde_json::Value::Object(entries));
        }

        // Initial NoData plus three snapshots
        assert_eq!(ingestor.pump(), 4);
        let update = ingestor.updates().borrow().clone();
        assert_eq!(update.sequence, 4);
        assert_eq!(update.dataset.len(), 3);
        assert!(update.dataset.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_pump_before_any_push() {
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        assert_eq!(ingestor.pump(), 0);
        assert!(ingestor.dataset().is_empty());
    }

    #[test]
    fn test_unsubscribe_twice_and_ignore_later_pushes() {
        let mut store = populated_store();
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        let updates = ingestor.updates();
        ingestor.subscribe(&mut store).unwrap();
        ingestor.pump();
        let sequence = updates.borrow().sequence;

        ingestor.unsubscribe();
        ingestor.unsubscribe();
        assert_eq!(ingestor.state(), IngestState::TornDown);
        assert_eq!(store.listener_count(DEFAULT_FEED_PATH), 0);

        store.set(DEFAULT_FEED_PATH, json!({ "c": { "distance": 10, "unixTimestamp": T } }));
        assert_eq!(ingestor.pump(), 0);
        assert!(!ingestor.handle_event(FeedEvent::NoData));
        assert_eq!(updates.borrow().sequence, sequence);
        assert_eq!(ingestor.dataset().len(), 1);
    }

    #[test]
    fn test_subscribe_rules() {
        let mut store = MemoryStore::new("test");
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        ingestor.subscribe(&mut store).unwrap();
        assert!(matches!(
            ingestor.subscribe(&mut store),
            Err(IngestError::AlreadySubscribed)
        ));

        ingestor.unsubscribe();
        assert!(matches!(ingestor.subscribe(&mut store), Err(IngestError::TornDown)));
    }

    #[test]
    fn test_push_before_subscribe_is_ignored() {
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        assert!(!ingestor.handle_event(FeedEvent::NoData));
        assert_eq!(ingestor.updates().borrow().sequence, 0);
    }

    #[tokio::test]
    async fn test_next_update_reports_closed_feed() {
        let (tx, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(4);
        let mut store = crate::source::StreamStore::from_bytes_channel(rx, "test");
        let mut ingestor = StreamIngestor::new(DEFAULT_FEED_PATH);
        ingestor.subscribe(&mut store).unwrap();

        tx.send(br#"{"a":{"distance":250,"unixTimestamp":1700000000}}"#.to_vec())
            .await
            .unwrap();
        assert!(ingestor.next_update().await);
        assert_eq!(ingestor.dataset().len(), 1);

        drop(tx);
        assert!(!ingestor.next_update().await);
        assert!(ingestor.feed_closed());
    }
}
