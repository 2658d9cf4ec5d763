//! Layered settings.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `FLOODWATCH_`-prefixed environment variables (nested keys separated by
//! `__`), and finally command line flags applied by the binary.
//!
//! ```toml
//! [feed]
//! path = "water-level"
//! database_url = "https://example-default-rtdb.firebaseio.com"
//!
//! [view]
//! page_size = 25
//! utc_offset_minutes = 420
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::FixedOffset;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::timefmt::offset_from_minutes;
use crate::data::DEFAULT_PAGE_SIZE;
use crate::ingest::DEFAULT_FEED_PATH;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FLOODWATCH";

/// Where snapshots come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Database path holding the readings.
    pub path: String,
    /// Firebase Realtime Database URL, when streaming from Firebase.
    pub database_url: Option<String>,
    /// Database secret or ID token for authenticated databases.
    pub auth_token: Option<String>,
    /// Poll interval for file feeds, in seconds.
    pub refresh_secs: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_FEED_PATH.to_string(),
            database_url: None,
            auth_token: None,
            refresh_secs: 1,
        }
    }
}

/// How the dashboard presents data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    /// Initial number of log entries per page.
    pub page_size: usize,
    /// Offset from UTC, in minutes, used to read date bounds and format times.
    pub utc_offset_minutes: i32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset_minutes: 0,
        }
    }
}

/// All settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: FeedSettings,
    pub view: ViewSettings,
}

impl Settings {
    /// Load settings from an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Load settings with an explicit environment map instead of the process environment.
    pub fn load_from(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);
        let config = builder.add_source(environment).build()?;
        Ok(config.try_deserialize()?)
    }

    /// The configured UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.view.utc_offset_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(None, Some(HashMap::new())).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.feed.path, "water-level");
        assert_eq!(settings.view.page_size, 10);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[feed]
database_url = "https://example-default-rtdb.firebaseio.com"

[view]
page_size = 25
utc_offset_minutes = 420
"#
        )
        .unwrap();

        let settings = Settings::load_from(Some(file.path()), Some(HashMap::new())).unwrap();
        assert_eq!(settings.feed.path, "water-level");
        assert_eq!(
            settings.feed.database_url.as_deref(),
            Some("https://example-default-rtdb.firebaseio.com")
        );
        assert_eq!(settings.view.page_size, 25);
        assert_eq!(settings.utc_offset().local_minus_utc(), 420 * 60);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[view]\npage_size = 25").unwrap();

        let env = HashMap::from([
            ("FLOODWATCH_VIEW__PAGE_SIZE".to_string(), "50".to_string()),
            ("FLOODWATCH_FEED__PATH".to_string(), "sites/north".to_string()),
        ]);
        let settings = Settings::load_from(Some(file.path()), Some(env)).unwrap();
        assert_eq!(settings.view.page_size, 50);
        assert_eq!(settings.feed.path, "sites/north");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_from(Some(Path::new("/nonexistent/floodwatch.toml")), None);
        assert!(result.is_err());
    }
}
