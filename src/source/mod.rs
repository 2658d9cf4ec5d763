//! Telemetry store abstraction for receiving water-level snapshots.
//!
//! A store delivers full snapshots of one path whenever it changes. This
//! module provides the [`TelemetryStore`] trait and its implementations for
//! in-memory use, JSON files, newline-delimited JSON streams and the
//! Firebase Realtime Database.

mod file;
mod firebase;
mod memory;
mod snapshot;
mod stream;

pub use file::FileStore;
pub use firebase::{FirebaseStore, Mirror, MirrorChange};
pub use memory::MemoryStore;
pub use snapshot::{FeedEvent, RawSnapshot};
pub use stream::StreamStore;

use std::fmt::{self, Debug};

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by telemetry stores.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading the underlying file or socket failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// The store returned data that is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP request to a remote store failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The remote store ended the stream.
    #[error("Stream closed: {0}")]
    Closed(String),

    /// The store can only be subscribed once.
    #[error("Store already subscribed: {0}")]
    AlreadySubscribed(String),

    /// Background delivery needs a tokio runtime.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err.to_string())
    }
}

/// A remote store holding sensor snapshots under named paths.
///
/// Subscribing registers a push listener on a path. Every change to the
/// path is delivered as a complete [`FeedEvent`], never as a delta.
///
/// # Example
///
/// ```
/// use floodwatch::{MemoryStore, TelemetryStore};
///
/// let mut store = MemoryStore::new("memory");
/// let mut subscription = store.subscribe("water-level").unwrap();
/// assert!(subscription.try_next().unwrap().is_some());
/// subscription.release();
/// ```
pub trait TelemetryStore: Send + Debug {
    /// Register a listener on `path`.
    fn subscribe(&mut self, path: &str) -> Result<FeedSubscription, SourceError>;

    /// Returns a human-readable description of the store.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// A live listener registration on a store path.
///
/// Events arrive in push order. [`release`](Self::release) detaches the
/// listener; it runs the store's release hook exactly once and is safe to
/// call repeatedly. Dropping the subscription releases it.
pub struct FeedSubscription {
    path: String,
    receiver: mpsc::UnboundedReceiver<FeedEvent>,
    release: Option<ReleaseHook>,
    released: bool,
}

impl FeedSubscription {
    /// Wrap the receiving end of a store's event channel.
    pub fn new(path: &str, receiver: mpsc::UnboundedReceiver<FeedEvent>) -> Self {
        Self {
            path: path.to_string(),
            receiver,
            release: None,
            released: false,
        }
    }

    /// Attach a hook the store runs when the listener is released.
    pub fn on_release<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    /// The subscribed path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Take the next pending event without blocking.
    ///
    /// Returns `Ok(None)` when nothing is pending or the subscription was
    /// released, and `Err(SourceError::Closed)` once the store hung up.
    pub fn try_next(&mut self) -> Result<Option<FeedEvent>, SourceError> {
        if self.released {
            return Ok(None);
        }
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Err(SourceError::Closed(self.path.clone()))
            }
        }
    }

    /// Wait for the next event. Returns `None` once the store hung up or
    /// the subscription was released.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        if self.released {
            return None;
        }
        self.receiver.recv().await
    }

    /// Detach the listener. Returns true only for the call that released it.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.receiver.close();
        // Anything already queued is discarded.
        while self.receiver.try_recv().is_ok() {}
        if let Some(hook) = self.release.take() {
            hook();
        }
        true
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl Debug for FeedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSubscription")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish()
    }
}

/// Handle of the current tokio runtime, for stores that spawn background tasks.
fn runtime_handle() -> Result<tokio::runtime::Handle, SourceError> {
    tokio::runtime::Handle::try_current().map_err(|e| SourceError::NoRuntime(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_release_runs_hook_once() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut subscription = FeedSubscription::new("water-level", rx).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(subscription.release());
        assert!(!subscription.release());
        drop(subscription);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_discards_queued_events() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = FeedSubscription::new("water-level", rx);
        tx.send(FeedEvent::NoData).unwrap();

        subscription.release();
        assert!(subscription.try_next().unwrap().is_none());
        assert!(tx.send(FeedEvent::NoData).is_err());
    }

    #[test]
    fn test_try_next_reports_closed_store() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = FeedSubscription::new("water-level", rx);
        tx.send(FeedEvent::NoData).unwrap();
        drop(tx);

        assert_eq!(subscription.try_next().unwrap(), Some(FeedEvent::NoData));
        assert!(matches!(subscription.try_next(), Err(SourceError::Closed(_))));
    }
}
