//! Firebase Realtime Database store.
//!
//! Subscribes to a database path through the REST streaming API
//! (server-sent events). The server sends the initial value as a `put` on
//! `/` followed by `put`/`patch` events for every change below the path.
//! A local [`Mirror`] applies those changes so listeners always receive the
//! full value of the path.

use std::fmt;
use std::pin::pin;

use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::snapshot::index_entries;
use super::{runtime_handle, FeedEvent, FeedSubscription, SourceError, TelemetryStore};

#[derive(Debug, Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

/// What applying an event did to the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorChange {
    /// The mirrored value changed.
    Updated,
    /// The event carried no data change.
    Ignored,
    /// The server ended the subscription.
    Closed(String),
}

/// Local copy of the value under the subscribed path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    root: Value,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mirrored value.
    pub fn value(&self) -> &Value {
        &self.root
    }

    /// The mirrored value as a feed event.
    pub fn snapshot(&self) -> FeedEvent {
        FeedEvent::from_value(self.root.clone())
    }

    /// Apply one server-sent event.
    pub fn apply(&mut self, event: &Event) -> Result<MirrorChange, SourceError> {
        match event.event.as_str() {
            "put" => {
                let payload: StreamPayload = serde_json::from_str(&event.data)?;
                set_at(&mut self.root, &segments(&payload.path), payload.data);
                Ok(MirrorChange::Updated)
            }
            "patch" => {
                let payload: StreamPayload = serde_json::from_str(&event.data)?;
                let Value::Object(children) = payload.data else {
                    return Err(SourceError::Parse(format!(
                        "patch data is not an object at {}",
                        payload.path
                    )));
                };
                let base = segments(&payload.path);
                for (key, value) in children {
                    let mut path = base.clone();
                    path.extend(segments(&key));
                    set_at(&mut self.root, &path, value);
                }
                Ok(MirrorChange::Updated)
            }
            "cancel" => Ok(MirrorChange::Closed(format!(
                "subscription cancelled by server: {}",
                event.data
            ))),
            "auth_revoked" => Ok(MirrorChange::Closed("credential revoked".to_string())),
            _ => Ok(MirrorChange::Ignored),
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Write `data` at `path` below `node`. `null` deletes, and emptied parents are pruned.
fn set_at(node: &mut Value, path: &[&str], data: Value) {
    let Some((first, rest)) = path.split_first() else {
        *node = data;
        return;
    };

    if let Value::Array(items) = node {
        *node = Value::Object(index_entries(std::mem::take(items)).collect());
    }
    if !node.is_object() {
        if data.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let child = map.entry(first.to_string()).or_insert(Value::Null);
    set_at(child, rest, data);
    if child.is_null() || child.as_object().is_some_and(Map::is_empty) {
        map.remove(*first);
    }
}

/// A store backed by a Firebase Realtime Database.
///
/// Reconnection is left to the caller: when the stream ends the
/// subscription reports the feed as closed.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    database_url: String,
    auth: Option<String>,
    description: String,
}

impl FirebaseStore {
    /// Create a store for the database at `database_url`.
    pub fn new(database_url: &str) -> Self {
        let database_url = database_url.trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            description: format!("firebase: {}", database_url),
            database_url,
            auth: None,
        }
    }

    /// Authenticate requests with a database secret or ID token.
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(token.into());
        self
    }

    /// REST URL streamed for `path`.
    pub fn stream_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.database_url, path.trim_matches('/'))
    }
}

async fn run_stream(
    client: Client,
    url: String,
    auth: Option<String>,
    tx: mpsc::UnboundedSender<FeedEvent>,
) -> Result<(), SourceError> {
    let mut request = client.get(&url).header(ACCEPT, "text/event-stream");
    if let Some(token) = auth {
        request = request.query(&[("auth", token)]);
    }

    let response = request.send().await?.error_for_status()?;
    info!(%url, "connected to database stream");

    forward_events(response.bytes_stream().eventsource(), &tx).await
}

/// Apply each event to a fresh mirror and send the value after every change.
///
/// Returns `Ok` when the listener is released, otherwise the reason the
/// stream ended.
async fn forward_events<S, E>(
    events: S,
    tx: &mpsc::UnboundedSender<FeedEvent>,
) -> Result<(), SourceError>
where
    S: Stream<Item = Result<Event, EventStreamError<E>>>,
    E: Into<SourceError> + fmt::Display,
{
    let mut events = pin!(events);
    let mut mirror = Mirror::new();

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(EventStreamError::Transport(e)) => return Err(e.into()),
            Err(e) => return Err(SourceError::Parse(e.to_string())),
        };
        match mirror.apply(&event) {
            Ok(MirrorChange::Updated) => {
                debug!(event = %event.event, "database value changed");
                if tx.send(mirror.snapshot()).is_err() {
                    // Listener released
                    return Ok(());
                }
            }
            Ok(MirrorChange::Ignored) => {}
            Ok(MirrorChange::Closed(reason)) => return Err(SourceError::Closed(reason)),
            Err(e) => warn!(event = %event.event, error = %e, "skipping malformed stream event"),
        }
    }

    Err(SourceError::Closed("server ended the stream".to_string()))
}

impl TelemetryStore for FirebaseStore {
    fn subscribe(&mut self, path: &str) -> Result<FeedSubscription, SourceError> {
        let handle = runtime_handle()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let url = self.stream_url(path);
        let client = self.client.clone();
        let auth = self.auth.clone();

        let task = handle.spawn(async move {
            if let Err(e) = run_stream(client, url.clone(), auth, tx).await {
                error!(%url, error = %e, "database stream ended");
            }
        });

        Ok(FeedSubscription::new(path, rx).on_release(move || task.abort()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
