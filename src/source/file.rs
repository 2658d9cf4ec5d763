//! File-based telemetry store.
//!
//! Polls a JSON export of the database for changes.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{runtime_handle, FeedEvent, FeedSubscription, SourceError, TelemetryStore};

/// A store backed by a JSON file holding the database root.
///
/// The subscribed path is looked up inside the root object, so a file
/// exported from the database (`{"water-level": {...}}`) works as is.
/// The file is polled on a background task and a snapshot is pushed
/// whenever its modification time advances. Read and parse errors are
/// logged and the previous snapshot stays in effect.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    description: String,
    refresh: Duration,
}

impl FileStore {
    /// Create a new file store for the given path, polled every second.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            refresh: Duration::from_secs(1),
        }
    }

    /// Set how often the file is checked for changes.
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_root(path: &Path) -> Result<Value, SourceError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Change detection over a file's modification time.
#[derive(Debug)]
struct FileWatch {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl FileWatch {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_modified: None,
        }
    }

    async fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).await.ok()?.modified().ok()
    }

    /// Returns the parsed root when the file changed since the last successful read.
    async fn poll(&mut self) -> Result<Option<Value>, SourceError> {
        let current_modified = self.modified_time().await;

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep what we have
            (Some(last), Some(current)) => current > last,
        };

        if !file_changed {
            return Ok(None);
        }

        let root = read_root(&self.path).await?;
        self.last_modified = current_modified;
        Ok(Some(root))
    }
}

impl TelemetryStore for FileStore {
    fn subscribe(&mut self, path: &str) -> Result<FeedSubscription, SourceError> {
        let handle = runtime_handle()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watch = FileWatch::new(self.path.clone());
        let db_path = path.to_string();
        let refresh = self.refresh;

        let task = handle.spawn(async move {
            let mut interval = tokio::time::interval(refresh);
            let mut last_error: Option<String> = None;
            loop {
                interval.tick().await;
                match watch.poll().await {
                    Ok(Some(root)) => {
                        last_error = None;
                        let event = FeedEvent::from_root(&root, &db_path);
                        debug!(entries = event.len(), "file changed");
                        if tx.send(event).is_err() {
                            // Listener released
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let message = e.to_string();
                        if last_error.as_deref() != Some(message.as_str()) {
                            warn!(file = %watch.path.display(), error = %message, "failed to read snapshot file");
                        }
                        last_error = Some(message);
                    }
                }
            }
        });

        Ok(FeedSubscription::new(path, rx).on_release(move || task.abort()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
