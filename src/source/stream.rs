//! Stream-based telemetry store.
//!
//! Receives snapshots from an async byte stream, such as a TCP connection
//! to a sensor bridge, or from a channel of raw JSON payloads.

use std::fmt;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{runtime_handle, FeedEvent, FeedSubscription, SourceError, TelemetryStore};

enum StreamInput {
    Reader(Box<dyn AsyncRead + Unpin + Send>),
    Bytes(mpsc::Receiver<Vec<u8>>),
}

/// A store that reads snapshots from an async stream.
///
/// Each newline-delimited JSON document (or each payload, for byte
/// channels) is the complete value of the subscribed path; `null` means
/// the path holds no data. Malformed documents are logged and skipped.
/// The stream can be subscribed once.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use floodwatch::{StreamStore, TelemetryStore};
///
/// # tokio_test::block_on(async {
/// let data = b"null\n";
/// let mut store = StreamStore::new(Cursor::new(data.to_vec()), "example");
/// let subscription = store.subscribe("water-level").unwrap();
/// # });
/// ```
pub struct StreamStore {
    input: Option<StreamInput>,
    description: String,
}

impl StreamStore {
    /// Read newline-delimited JSON from `reader`.
    pub fn new<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            input: Some(StreamInput::Reader(Box::new(reader))),
            description: format!("stream: {}", description),
        }
    }

    /// Read one JSON payload per message from a bytes channel.
    ///
    /// This is useful when payloads come from another transport
    /// without an `AsyncRead`.
    pub fn from_bytes_channel(rx: mpsc::Receiver<Vec<u8>>, description: &str) -> Self {
        Self {
            input: Some(StreamInput::Bytes(rx)),
            description: format!("stream: {}", description),
        }
    }
}

fn parse_payload(bytes: &[u8]) -> Result<FeedEvent, SourceError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(FeedEvent::from_value(value))
}

async fn pump_reader<R>(reader: R, tx: mpsc::UnboundedSender<FeedEvent>, description: String)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => {
                info!(source = %description, "stream closed");
                break;
            }
            Ok(_) => {
                let trimmed = line.trim_ascii();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_payload(trimmed) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            // Listener released
                            break;
                        }
                    }
                    Err(e) => warn!(source = %description, error = %e, "skipping malformed snapshot"),
                }
            }
            Err(e) => {
                warn!(source = %description, error = %e, "stream read failed");
                break;
            }
        }
    }
}

async fn pump_bytes(
    mut rx: mpsc::Receiver<Vec<u8>>,
    tx: mpsc::UnboundedSender<FeedEvent>,
    description: String,
) {
    while let Some(bytes) = rx.recv().await {
        match parse_payload(&bytes) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Err(e) => warn!(source = %description, error = %e, "skipping malformed snapshot"),
        }
    }
}

impl TelemetryStore for StreamStore {
    fn subscribe(&mut self, path: &str) -> Result<FeedSubscription, SourceError> {
        let handle = runtime_handle()?;
        let input = self
            .input
            .take()
            .ok_or_else(|| SourceError::AlreadySubscribed(self.description.clone()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let description = self.description.clone();

        let task = match input {
            StreamInput::Reader(reader) => handle.spawn(pump_reader(reader, tx, description)),
            StreamInput::Bytes(bytes) => handle.spawn(pump_bytes(bytes, tx, description)),
        };

        Ok(FeedSubscription::new(path, rx).on_release(move || task.abort()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for StreamStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamStore")
            .field("description", &self.description)
            .field("subscribed", &self.input.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    fn sample_json() -> &'static str {
        r#"{"-Na1":{"distance":120,"unixTimestamp":1700000000}}"#
    }

    async fn next_event(subscription: &mut FeedSubscription) -> Option<FeedEvent> {
        tokio::time::timeout(Duration::from_secs(2), subscription.next())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_stream_store_reads_lines() {
        let data = format!("{}\nnull\n", sample_json());
        let mut store = StreamStore::new(Cursor::new(data), "test");
        let mut subscription = store.subscribe("water-level").unwrap();

        assert_eq!(next_event(&mut subscription).await.unwrap().len(), 1);
        assert_eq!(next_event(&mut subscription).await, Some(FeedEvent::NoData));
        // EOF closes the feed
        assert_eq!(next_event(&mut subscription).await, None);
    }

    #[tokio::test]
    async fn test_stream_store_skips_invalid_json() {
        let data = format!("not valid json\n\n{}\n", sample_json());
        let mut store = StreamStore::new(Cursor::new(data), "test");
        let mut subscription = store.subscribe("water-level").unwrap();

        assert_eq!(next_event(&mut subscription).await.unwrap().len(), 1);
        assert_eq!(next_event(&mut subscription).await, None);
    }

    #[tokio::test]
    async fn test_stream_store_skips_non_utf8_line() {
        let mut data = format!("{}\n", sample_json()).into_bytes();
        data.extend_from_slice(b"\xff\xfe garbage\n");
        data.extend_from_slice(
            br#"{"-Na2":{"distance":90,"unixTimestamp":1700000060},"-Na3":{"distance":80,"unixTimestamp":1700000120}}"#,
        );
        data.push(b'\n');
        let mut store = StreamStore::new(Cursor::new(data), "test");
        let mut subscription = store.subscribe("water-level").unwrap();

        assert_eq!(next_event(&mut subscription).await.unwrap().len(), 1);
        assert_eq!(next_event(&mut subscription).await.unwrap().len(), 2);
        assert_eq!(next_event(&mut subscription).await, None);
    }

    #[tokio::test]
    async fn test_stream_store_subscribes_once() {
        let mut store = StreamStore::new(Cursor::new(""), "test");
        let _subscription = store.subscribe("water-level").unwrap();
        assert!(matches!(
            store.subscribe("water-level"),
            Err(SourceError::AlreadySubscribed(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_store_description() {
        let store = StreamStore::new(Cursor::new(""), "tcp://localhost:9090");
        assert_eq!(store.description(), "stream: tcp://localhost:9090");
    }

    #[tokio::test]
    async fn test_from_bytes_channel() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
        let mut store = StreamStore::from_bytes_channel(rx, "test-channel");
        let mut subscription = store.subscribe("water-level").unwrap();

        tx.send(b"garbage".to_vec()).await.unwrap();
        tx.send(sample_json().as_bytes().to_vec()).await.unwrap();

        assert_eq!(next_event(&mut subscription).await.unwrap().len(), 1);
    }
}
