//! Data models and processing for water-level snapshots.
//!
//! This module turns raw sensor snapshots into canonical, time-ordered
//! records and derives everything the dashboard displays from them.
//!
//! ## Submodules
//!
//! - [`classify`]: Hazard stage thresholds ([`HazardStage`], [`Thresholds`])
//! - [`record`]: Canonical records and the per-entry [`normalize`] step
//! - [`dataset`]: Building a sorted [`CanonicalDataset`] from a snapshot
//! - [`filter`]: Inclusive [`DateWindow`] filtering
//! - [`page`]: Pagination ([`paginate`], [`PageState`])
//! - [`series`]: Current value, axis tick interval and stage counts
//! - [`timefmt`]: Parsing viewer date bounds and formatting timestamps
//!
//! ## Data Flow
//!
//! ```text
//! RawSnapshot (JSON map)
//!        │
//!        ▼
//! CanonicalDataset::from_snapshot()  ── normalize() per entry, stable sort
//!        │
//!        ▼
//! filter(DateWindow) ──▶ paginate() / current_value() / tick_interval()
//! ```

pub mod classify;
pub mod dataset;
pub mod filter;
pub mod page;
pub mod record;
pub mod series;
pub mod timefmt;

pub use classify::{classify, HazardStage, Thresholds};
pub use dataset::{sort_records, BuildOutcome, CanonicalDataset};
pub use filter::{filter, DateWindow};
pub use page::{paginate, total_pages, Page, PageState, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
pub use record::{normalize, CanonicalRecord, RejectReason};
pub use series::{current_value, stage_counts, tick_interval};
