//! Run configuration.
//!
//! Defaults describe the Idea Refinery dev server and its UI contracts. A
//! YAML file may override any subset of fields; the CLI applies its flags on
//! top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::browser::BrowserConfig;
use crate::record::{StoreTarget, DEFAULT_RECORD_PREFIX};
use crate::result::{SmokeError, SmokeResult};
use crate::wait::Pacing;

/// Default target address
pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";

/// One local-storage entry written before the first reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    /// Key
    pub key: String,
    /// Value
    pub value: String,
}

impl StorageEntry {
    /// Create a new entry
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Upper bounds for waits that fail the run when exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Wait for the page body after the first navigation
    pub body_ms: u64,
    /// Wait for the record label and the preview heading
    pub selector_ms: u64,
    /// Auto-wait before each click
    pub click_ms: u64,
    /// Polling interval for all bounded waits
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            body_ms: 10_000,
            selector_ms: 10_000,
            click_ms: 5_000,
            poll_interval_ms: 50,
        }
    }
}

/// Settle delays between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    /// After the reload that follows local-storage seeding
    pub reload_ms: u64,
    /// After typing the PIN
    pub pin_ms: u64,
    /// After the record injection
    pub post_inject_ms: u64,
    /// After the reload that triggers the history fetch
    pub history_reload_ms: u64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            reload_ms: 3_000,
            pin_ms: 2_000,
            post_inject_ms: 1_000,
            history_reload_ms: 5_000,
        }
    }
}

impl Delays {
    /// All delays set to zero
    #[must_use]
    pub const fn none() -> Self {
        Self {
            reload_ms: 0,
            pin_ms: 0,
            post_inject_ms: 0,
            history_reload_ms: 0,
        }
    }
}

/// Configuration for one verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmokeConfig {
    /// Address of the running application
    pub base_url: String,
    /// PIN typed at the setup or unlock prompt
    pub pin: String,
    /// Entries simulating completed onboarding and an authenticated session
    pub local_storage: Vec<StorageEntry>,
    /// Prompts shown when no PIN has been set yet
    pub pin_setup_prompts: Vec<String>,
    /// Prompt shown when the app is locked
    pub pin_unlock_prompt: String,
    /// Database and store receiving the injected record
    pub store: StoreTarget,
    /// Label prefix of the injected record
    pub record_prefix: String,
    /// Tag marking optimization log lines
    pub optimization_tag: String,
    /// Text a tagged line must contain for the optimization to count
    pub optimization_needle: String,
    /// Text of the history navigation entry
    pub history_label: String,
    /// Heading of the mockup preview pane
    pub preview_heading: String,
    /// CSS selector counting preview frames
    pub preview_frame_selector: String,
    /// Bounded waits
    pub timeouts: Timeouts,
    /// Settle delays
    pub delays: Delays,
    /// Settle strategy
    pub pacing: Pacing,
    /// Directory receiving screenshots
    pub output_dir: PathBuf,
    /// Screenshot file name when the run completes
    pub success_screenshot: String,
    /// Screenshot file name when the run aborts
    pub error_screenshot: String,
    /// Browser launch options
    pub browser: BrowserConfig,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pin: "1234".to_string(),
            local_storage: vec![
                StorageEntry::new("onboarding_complete", "true"),
                StorageEntry::new("auth_token", "dummy_token"),
            ],
            pin_setup_prompts: vec!["Set Your PIN".to_string(), "Create a PIN".to_string()],
            pin_unlock_prompt: "Enter PIN".to_string(),
            store: StoreTarget::default(),
            record_prefix: DEFAULT_RECORD_PREFIX.to_string(),
            optimization_tag: "[DB_OPT]".to_string(),
            optimization_needle: "stripping from summary".to_string(),
            history_label: "History".to_string(),
            preview_heading: "Design Mockup Preview".to_string(),
            preview_frame_selector: "iframe".to_string(),
            timeouts: Timeouts::default(),
            delays: Delays::default(),
            pacing: Pacing::Fixed,
            output_dir: PathBuf::from("verification"),
            success_screenshot: "db_opt_result.png".to_string(),
            error_screenshot: "error.png".to_string(),
            browser: BrowserConfig::default(),
        }
    }
}

impl SmokeConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML document; missing fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> SmokeResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| SmokeError::config(e.to_string()))
    }

    /// Load a YAML file
    pub fn from_yaml_file(path: &Path) -> SmokeResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SmokeError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Set the target address
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the PIN
    #[must_use]
    pub fn with_pin(mut self, pin: impl Into<String>) -> Self {
        self.pin = pin.into();
        self
    }

    /// Set the settle strategy
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the settle delays
    #[must_use]
    pub const fn with_delays(mut self, delays: Delays) -> Self {
        self.delays = delays;
        self
    }

    /// Set the bounded-wait timeouts
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set browser launch options
    #[must_use]
    pub fn with_browser(mut self, browser: BrowserConfig) -> Self {
        self.browser = browser;
        self
    }

    /// Path of the screenshot written when the run completes
    #[must_use]
    pub fn success_path(&self) -> PathBuf {
        self.output_dir.join(&self.success_screenshot)
    }

    /// Path of the screenshot written when the run aborts
    #[must_use]
    pub fn error_path(&self) -> PathBuf {
        self.output_dir.join(&self.error_screenshot)
    }

    /// Reject configurations the runner cannot use
    pub fn validate(&self) -> SmokeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SmokeError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.pin.is_empty() {
            return Err(SmokeError::config("pin must not be empty"));
        }
        if self.store.database.is_empty() || self.store.store.is_empty() {
            return Err(SmokeError::config("database and store names must not be empty"));
        }
        if self.optimization_tag.is_empty() || self.optimization_needle.is_empty() {
            return Err(SmokeError::config("optimization tag and needle must not be empty"));
        }
        if self.timeouts.poll_interval_ms == 0 {
            return Err(SmokeError::config("poll_interval_ms must be positive"));
        }
        if self.success_screenshot.is_empty() || self.error_screenshot.is_empty() {
            return Err(SmokeError::config("screenshot names must not be empty"));
        }
        Ok(())
    }
}
