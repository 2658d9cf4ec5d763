//! The viewer's query surface over the latest dataset.
//!
//! [`DashboardView`] keeps the active date window and page position across
//! dataset replacements. Every mutating operation hands back a
//! [`DerivedView`] with the values a renderer needs.

use std::sync::Arc;

use chrono::FixedOffset;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::data::timefmt::{format_detail, format_log_entry, utc_offset};
use crate::data::{
    current_value, filter, paginate, stage_counts, tick_interval, total_pages, CanonicalDataset,
    CanonicalRecord, DateWindow, PageState, DEFAULT_PAGE_SIZE,
};

/// Values derived from the dataset, window and page position.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    /// Records inside the active window, in timestamp order.
    pub filtered: &'a [CanonicalRecord],
    /// Records on the current page.
    pub items: &'a [CanonicalRecord],
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Distance of the latest record in the full dataset.
    pub current_value: f64,
    /// Axis label interval for the filtered series.
    pub tick_interval: usize,
}

/// Filter and pagination state over a shared dataset.
#[derive(Debug, Clone)]
pub struct DashboardView {
    dataset: Arc<CanonicalDataset>,
    window: DateWindow,
    filtered: Vec<CanonicalRecord>,
    page: PageState,
    offset: FixedOffset,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, utc_offset())
    }
}

impl DashboardView {
    /// An empty view with `page_size` entries per page. Bounds typed by the
    /// viewer are read in `offset`.
    pub fn new(page_size: usize, offset: FixedOffset) -> Self {
        Self {
            dataset: Arc::new(CanonicalDataset::empty()),
            window: DateWindow::unbounded(),
            filtered: Vec::new(),
            page: PageState::new(page_size),
            offset,
        }
    }

    pub fn dataset(&self) -> &Arc<CanonicalDataset> {
        &self.dataset
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn page(&self) -> PageState {
        self.page
    }

    /// Distance of the latest record, ignoring the window. 0 when empty.
    pub fn current_value(&self) -> f64 {
        current_value(self.dataset.records())
    }

    /// Install a new dataset, re-applying the active window.
    pub fn replace_dataset(&mut self, dataset: Arc<CanonicalDataset>) -> DerivedView<'_> {
        self.dataset = dataset;
        self.refilter();
        self.derived()
    }

    /// Restrict the view to `window`.
    pub fn apply_filter(&mut self, window: DateWindow) -> DerivedView<'_> {
        self.window = window;
        self.refilter();
        self.derived()
    }

    /// Restrict the view to bounds typed by the viewer. Blank or unparsable
    /// text leaves that side unbounded.
    pub fn apply_filter_text(&mut self, start: &str, end: &str) -> DerivedView<'_> {
        let window = DateWindow::parse(start, end, self.offset);
        self.apply_filter(window)
    }

    /// Drop both bounds.
    pub fn clear_filter(&mut self) -> DerivedView<'_> {
        self.apply_filter(DateWindow::unbounded())
    }

    /// Change the page size and return to page 1.
    pub fn set_page_size(&mut self, size: usize) -> DerivedView<'_> {
        self.page.set_size(size);
        self.derived()
    }

    /// Move to page `n`. Out-of-range requests leave the page unchanged.
    pub fn go_to_page(&mut self, n: usize) -> DerivedView<'_> {
        let total = self.total_pages();
        self.page.go_to(n, total);
        self.derived()
    }

    pub fn next_page(&mut self) -> DerivedView<'_> {
        self.go_to_page(self.page.index() + 1)
    }

    pub fn prev_page(&mut self) -> DerivedView<'_> {
        self.go_to_page(self.page.index().saturating_sub(1))
    }

    pub fn first_page(&mut self) -> DerivedView<'_> {
        self.go_to_page(1)
    }

    pub fn last_page(&mut self) -> DerivedView<'_> {
        self.go_to_page(self.total_pages())
    }

    /// Cycle to the next offered page size.
    pub fn grow_page_size(&mut self) -> DerivedView<'_> {
        let size = self.page.next_size_option();
        self.set_page_size(size)
    }

    /// Cycle to the previous offered page size.
    pub fn shrink_page_size(&mut self) -> DerivedView<'_> {
        let size = self.page.prev_size_option();
        self.set_page_size(size)
    }

    /// Current derived values.
    pub fn derived(&self) -> DerivedView<'_> {
        let page = paginate(&self.filtered, self.page.size(), self.page.index());
        DerivedView {
            filtered: &self.filtered,
            items: page.items,
            page_index: self.page.index(),
            page_size: self.page.size(),
            total_pages: page.total_pages,
            current_value: self.current_value(),
            tick_interval: tick_interval(self.filtered.len()),
        }
    }

    /// Build the export document for the filtered records.
    ///
    /// The summary counts records per hazard stage; each record carries its
    /// stage and a formatted local time.
    pub fn export_json(&self) -> Value {
        let mut summary = Map::new();
        summary.insert("total_records".to_string(), json!(self.dataset.len()));
        summary.insert("filtered_records".to_string(), json!(self.filtered.len()));
        summary.insert("current_distance_cm".to_string(), json!(self.current_value()));
        if let Some(latest) = self.dataset.latest() {
            summary.insert("current_stage".to_string(), json!(latest.stage()));
        }
        summary.insert(
            "window".to_string(),
            json!({
                "start": self.window.start,
                "end": self.window.end,
            }),
        );

        let counts: Map<String, Value> = stage_counts(&self.filtered)
            .into_iter()
            .map(|(stage, count)| (stage.label().to_lowercase(), json!(count)))
            .collect();
        summary.insert("stages".to_string(), Value::Object(counts));

        let records: Vec<Value> = self
            .filtered
            .iter()
            .map(|r| {
                json!({
                    "id": r.id,
                    "distance_cm": r.distance_cm,
                    "timestamp": r.timestamp,
                    "time": format_log_entry(r.timestamp, self.offset),
                    "detail": format_detail(r.timestamp, self.offset),
                    "stage": r.stage(),
                })
            })
            .collect();

        json!({
            "summary": Value::Object(summary),
            "records": records,
        })
    }

    fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.page.size())
    }

    fn refilter(&mut self) {
        self.filtered = filter(self.dataset.records(), &self.window);
        let total = self.total_pages();
        self.page.revalidate(total);
        debug!(
            filtered = self.filtered.len(),
            total = self.dataset.len(),
            page = self.page.index(),
            "view refiltered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    const DAY: i64 = 86_400;
    const T: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z

    fn daily(n: usize) -> Arc<CanonicalDataset> {
        let records = (0..n)
            .map(|i| CanonicalRecord {
                id: format!("r{i}"),
                distance_cm: 100.0 + i as f64,
                timestamp: DateTime::from_timestamp(T + i as i64 * DAY, 0).unwrap(),
            })
            .collect();
        Arc::new(CanonicalDataset::from_records(records))
    }

    fn view_with(n: usize) -> DashboardView {
        let mut view = DashboardView::default();
        view.replace_dataset(daily(n));
        view
    }

    #[test]
    fn test_empty_view() {
        let view = DashboardView::default();
        let derived = view.derived();
        assert!(derived.filtered.is_empty());
        assert!(derived.items.is_empty());
        assert_eq!(derived.page_index, 1);
        assert_eq!(derived.total_pages, 0);
        assert_eq!(derived.current_value, 0.0);
    }

    #[test]
    fn test_twelve_records_paginate_ten_and_two() {
        let mut view = view_with(12);
        let first = view.derived();
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 10);

        let second = view.next_page();
        assert_eq!(second.page_index, 2);
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.items[0].id, "r10");
    }

    #[test]
    fn test_out_of_range_page_is_noop() {
        let mut view = view_with(25);
        view.go_to_page(2);
        let derived = view.go_to_page(99);
        assert_eq!(derived.total_pages, 3);
        assert_eq!(derived.page_index, 2);

        assert_eq!(view.go_to_page(0).page_index, 2);
    }

    #[test]
    fn test_prev_and_next_stop_at_edges() {
        let mut view = view_with(25);
        assert_eq!(view.prev_page().page_index, 1);
        assert_eq!(view.last_page().page_index, 3);
        assert_eq!(view.next_page().page_index, 3);
        assert_eq!(view.first_page().page_index, 1);
    }

    #[test]
    fn test_set_page_size_resets_to_first_page() {
        let mut view = view_with(60);
        view.go_to_page(4);
        let derived = view.set_page_size(25);
        assert_eq!(derived.page_index, 1);
        assert_eq!(derived.page_size, 25);
        assert_eq!(derived.total_pages, 3);
    }

    #[test]
    fn test_page_size_cycles_through_options() {
        let mut view = view_with(5);
        assert_eq!(view.grow_page_size().page_size, 25);
        assert_eq!(view.grow_page_size().page_size, 50);
        assert_eq!(view.grow_page_size().page_size, 100);
        assert_eq!(view.grow_page_size().page_size, 10);
        assert_eq!(view.shrink_page_size().page_size, 100);
    }

    #[test]
    fn test_filter_text_bounds_are_inclusive() {
        let mut view = view_with(12);
        let derived = view.apply_filter_text("2024-01-03", "2024-01-05");
        let ids: Vec<&str> = derived.filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r3", "r4"]);
        // The current value ignores the window
        assert_eq!(derived.current_value, 111.0);
    }

    #[test]
    fn test_unparsable_bound_is_ignored() {
        let mut view = view_with(12);
        let derived = view.apply_filter_text("yesterday", "2024-01-02");
        assert_eq!(derived.filtered.len(), 2);
    }

    #[test]
    fn test_clear_filter_restores_everything() {
        let mut view = view_with(12);
        view.apply_filter_text("2024-01-03", "2024-01-05");
        let derived = view.clear_filter();
        assert_eq!(derived.filtered.len(), 12);
        assert!(view.window().is_unbounded());
    }

    #[test]
    fn test_replace_dataset_keeps_window() {
        let mut view = DashboardView::default();
        view.apply_filter_text("2024-01-03", "");
        let derived = view.replace_dataset(daily(5));
        assert_eq!(derived.filtered.len(), 3);
        assert_eq!(derived.filtered[0].id, "r2");
    }

    #[test]
    fn test_replace_dataset_keeps_valid_page() {
        let mut view = view_with(30);
        view.go_to_page(2);
        assert_eq!(view.replace_dataset(daily(35)).page_index, 2);
        // Only one page left
        assert_eq!(view.replace_dataset(daily(4)).page_index, 1);
    }

    #[test]
    fn test_filter_respects_offset() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let mut view = DashboardView::new(10, offset);
        let records = vec![CanonicalRecord {
            id: "late".to_string(),
            distance_cm: 80.0,
            // 2024-01-01 20:00 UTC is 2024-01-02 03:00 at +07:00
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
        }];
        view.replace_dataset(Arc::new(CanonicalDataset::from_records(records)));

        assert_eq!(view.apply_filter_text("2024-01-02", "").filtered.len(), 1);
        assert_eq!(view.apply_filter_text("", "2024-01-01").filtered.len(), 0);
    }

    #[test]
    fn test_tick_interval_follows_filtered_length() {
        let mut view = view_with(12);
        assert_eq!(view.derived().tick_interval, 2);
        assert_eq!(view.apply_filter_text("2024-01-11", "").tick_interval, 0);
    }

    #[test]
    fn test_export_json() {
        let mut view = view_with(3);
        view.apply_filter_text("2024-01-02", "");
        let export = view.export_json();

        assert_eq!(export["summary"]["total_records"], 3);
        assert_eq!(export["summary"]["filtered_records"], 2);
        assert_eq!(export["summary"]["current_distance_cm"], 102.0);
        assert_eq!(export["summary"]["current_stage"], "Watch");
        assert_eq!(export["summary"]["stages"]["watch"], 2);
        assert_eq!(export["summary"]["stages"]["safe"], 0);

        let records = export["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "r1");
        assert_eq!(records[0]["time"], "00:00 | 02 January 2024");
        assert_eq!(records[0]["stage"], "Watch");
    }
}
