//! Application state and interaction logic.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use crate::data::HazardStage;
use crate::ingest::{DatasetUpdate, FeedStatus, StreamIngestor};
use crate::source::TelemetryStore;
use crate::ui::Theme;
use crate::view::DashboardView;

/// How long a status message stays on screen.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Which date bound the viewer is typing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Start,
    End,
}

impl InputField {
    /// Returns the display label for this field.
    pub fn label(&self) -> &'static str {
        match self {
            InputField::Start => "Start",
            InputField::End => "End",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,

    // Feed
    store: Box<dyn TelemetryStore>,
    ingestor: StreamIngestor,
    updates: watch::Receiver<DatasetUpdate>,
    pub status: FeedStatus,
    pub last_update: Option<Instant>,

    // Query state
    pub view: DashboardView,

    // Date bound inputs
    pub start_input: String,
    pub end_input: String,
    pub editing: Option<InputField>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app over a subscribed ingestor.
    ///
    /// The store is kept alive for as long as the app runs.
    pub fn new(store: Box<dyn TelemetryStore>, ingestor: StreamIngestor, view: DashboardView) -> Self {
        let updates = ingestor.updates();
        Self {
            running: true,
            show_help: false,
            store,
            ingestor,
            updates,
            status: FeedStatus::Waiting,
            last_update: None,
            view,
            start_input: String::new(),
            end_input: String::new(),
            editing: None,
            theme: Theme::dark(),
            status_message: None,
        }
    }

    /// Use `theme` instead of the default dark theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Returns a description of the current store.
    pub fn source_description(&self) -> &str {
        self.store.description()
    }

    /// Returns true once the store stopped delivering.
    pub fn feed_closed(&self) -> bool {
        self.ingestor.feed_closed()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Apply pending pushes and pick up the latest dataset.
    ///
    /// Returns true if a new dataset was installed.
    pub fn reload_data(&mut self) -> bool {
        self.ingestor.pump();
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }

        let update = self.updates.borrow_and_update().clone();
        self.status = update.status;
        self.last_update = Some(update.received_at);
        self.view.replace_dataset(update.dataset);
        true
    }

    /// Stage of the latest reading, if there is one.
    pub fn current_stage(&self) -> Option<HazardStage> {
        self.view.dataset().latest().map(|r| r.stage())
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Start typing into a date bound.
    pub fn start_editing(&mut self, field: InputField) {
        self.editing = Some(field);
    }

    /// Stop typing without applying.
    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    fn input_mut(&mut self) -> Option<&mut String> {
        match self.editing? {
            InputField::Start => Some(&mut self.start_input),
            InputField::End => Some(&mut self.end_input),
        }
    }

    /// Append a character to the bound being edited.
    pub fn input_push(&mut self, c: char) {
        if let Some(input) = self.input_mut() {
            input.push(c);
        }
    }

    /// Remove the last character from the bound being edited.
    pub fn input_pop(&mut self) {
        if let Some(input) = self.input_mut() {
            input.pop();
        }
    }

    /// Switch between the start and end inputs.
    pub fn toggle_input_field(&mut self) {
        self.editing = match self.editing {
            Some(InputField::Start) => Some(InputField::End),
            Some(InputField::End) => Some(InputField::Start),
            None => None,
        };
    }

    /// Filter the view by the typed bounds.
    pub fn apply_filter(&mut self) {
        self.editing = None;
        let count = self
            .view
            .apply_filter_text(&self.start_input, &self.end_input)
            .filtered
            .len();
        let window = self.view.window();
        let message = if window.is_unbounded() {
            format!("Showing all {} readings", count)
        } else {
            format!("Filter applied: {} readings", count)
        };
        self.set_status_message(message);
    }

    /// Clear both bounds and show everything.
    pub fn clear_filter(&mut self) {
        self.editing = None;
        self.start_input.clear();
        self.end_input.clear();
        self.view.clear_filter();
        self.set_status_message("Filter cleared".to_string());
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Release the feed subscription.
    pub fn shutdown(&mut self) {
        self.ingestor.unsubscribe();
    }

    /// Export the filtered readings to a file. Returns how many were written.
    pub fn export_state(&self, path: &Path) -> Result<usize> {
        let count = self.view.derived().filtered.len();
        write_export(&self.view, path)?;
        info!(path = %path.display(), records = count, "exported readings");
        Ok(count)
    }
}

/// Write the view's export document to `path` as pretty JSON.
pub fn write_export(view: &DashboardView, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&view.export_json())?;
    std::fs::write(path, json)?;
    Ok(())
}
