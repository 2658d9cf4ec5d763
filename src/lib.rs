//! # floodwatch
//!
//! A terminal dashboard and library for river water-level sensors.
//!
//! A sensor writes readings (distance from the sensor down to the water
//! surface, plus a Unix timestamp) into a realtime database path. This
//! crate subscribes to that path, turns every pushed snapshot into a
//! validated, time-ordered dataset, classifies readings into flood hazard
//! stages and serves filtered, paginated views of them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//! │  │  app    │───▶│   view   │───▶│    ui    │───▶│Terminal │  │
//! │  │ (state) │    │ (query)  │    │(rendering)│    │         │  │
//! │  └────┬────┘    └──────────┘    └──────────┘    └─────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐    ┌──────────┐                                 │
//! │  │ ingest  │◀───│  source  │◀── Memory | File | Stream |     │
//! │  │         │    │ (input)  │    Firebase                     │
//! │  └─────────┘    └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Store abstraction ([`TelemetryStore`] trait) with
//!   in-memory, JSON file, newline-delimited stream and Firebase implementations
//! - **[`ingest`]**: [`StreamIngestor`], which owns the subscription and
//!   republishes a fresh [`CanonicalDataset`] on every push
//! - **[`data`]**: Normalization, hazard classification, date filtering,
//!   pagination and time formatting
//! - **[`view`]**: [`DashboardView`], the filter and page state over the latest dataset
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The interactive terminal dashboard
//! - **[`config`]**: Layered [`Settings`]
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a database export on disk
//! floodwatch --file database.json
//!
//! # Stream from a Firebase Realtime Database
//! floodwatch --firebase https://example-default-rtdb.firebaseio.com
//!
//! # Write the readings of March 2024 to JSON and exit
//! floodwatch --file database.json --export march.json --start 2024-03-01 --end 2024-03-31
//! ```
//!
//! ### As a library
//!
//! ```
//! use floodwatch::{DashboardView, HazardStage, MemoryStore, StreamIngestor};
//! use serde_json::json;
//!
//! let mut store = MemoryStore::new("example");
//! store.set("water-level", json!({
//!     "a": { "distance": 40, "unixTimestamp": 1700000000 },
//!     "b": { "distance": "x", "unixTimestamp": 1700000001 }
//! }));
//!
//! let mut ingestor = StreamIngestor::new("water-level");
//! ingestor.subscribe(&mut store).unwrap();
//! ingestor.pump();
//!
//! let mut view = DashboardView::default();
//! let derived = view.replace_dataset(ingestor.dataset());
//! assert_eq!(derived.filtered.len(), 1);
//! assert_eq!(derived.current_value, 40.0);
//! assert_eq!(derived.filtered[0].stage(), HazardStage::Submerged);
//! ```
//!
//! ### Bridging from another transport
//!
//! ```no_run
//! use floodwatch::{StreamIngestor, StreamStore};
//! use tokio::sync::mpsc;
//!
//! # tokio_test::block_on(async {
//! let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
//! let mut store = StreamStore::from_bytes_channel(rx, "bridge");
//! let mut ingestor = StreamIngestor::new("water-level");
//! ingestor.subscribe(&mut store).unwrap();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod ingest;
pub mod source;
pub mod ui;
pub mod view;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    classify, CanonicalDataset, CanonicalRecord, DateWindow, HazardStage, RejectReason, Thresholds,
};
pub use ingest::{DatasetUpdate, FeedStatus, IngestError, IngestState, StreamIngestor};
pub use source::{
    FeedEvent, FeedSubscription, FileStore, FirebaseStore, MemoryStore, RawSnapshot, SourceError,
    StreamStore, TelemetryStore,
};
pub use view::{DashboardView, DerivedView};
