//! SmokeDriver - abstract browser automation trait.
//!
//! The runner only talks to this trait, so the same step sequence runs
//! against a real Chromium ([`crate::ChromiumDriver`], feature `browser`) or
//! against [`MockDriver`], an in-memory stand-in for the application under
//! test.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::console::ConsoleLog;
use crate::locator::Selector;
use crate::record::{ConversationRecord, InjectionOutcome, StoreTarget};
use crate::result::{SmokeError, SmokeResult};
use crate::scripts;

/// Abstract driver trait for browser automation
#[async_trait]
pub trait SmokeDriver: Send + Sync {
    /// Navigate to URL
    async fn goto(&mut self, url: &str) -> SmokeResult<()>;

    /// Reload the current page
    async fn reload(&mut self) -> SmokeResult<()>;

    /// Current document title
    async fn title(&self) -> SmokeResult<String>;

    /// Evaluate an expression in the page, awaiting promises
    async fn evaluate(&self, script: &str) -> SmokeResult<serde_json::Value>;

    /// Number of elements matching `selector`
    async fn match_count(&self, selector: &Selector) -> SmokeResult<usize>;

    /// Whether any element matching `selector` is visible right now
    async fn is_visible(&self, selector: &Selector) -> SmokeResult<bool>;

    /// Click the `index`-th element matching `selector`
    async fn click_nth(&mut self, selector: &Selector, index: usize) -> SmokeResult<()>;

    /// Type literal keystrokes into the focused element
    async fn type_text(&mut self, text: &str) -> SmokeResult<()>;

    /// Start collecting console messages; the returned log fills as they arrive
    async fn capture_console(&mut self) -> SmokeResult<ConsoleLog>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> SmokeResult<Vec<u8>>;

    /// Close the browser session
    async fn close(&mut self) -> SmokeResult<()>;

    /// Write one local-storage entry
    async fn set_local_storage(&mut self, key: &str, value: &str) -> SmokeResult<()> {
        let script = scripts::set_local_storage(key, value)?;
        self.evaluate(&script).await?;
        Ok(())
    }

    /// Put `record` into `target`, suspending until the in-page promise settles
    async fn put_record(
        &mut self,
        target: &StoreTarget,
        record: &ConversationRecord,
    ) -> SmokeResult<()> {
        let script = scripts::put_record(target, record)?;
        tracing::debug!(bytes = script.len(), "evaluating record injection");
        let value = self.evaluate(&script).await?;
        let outcome: InjectionOutcome = serde_json::from_value(value)?;
        outcome.into_result()
    }
}

/// Behaviour of the application simulated by [`MockDriver`]
#[derive(Debug, Clone)]
pub struct MockApp {
    /// Document title
    pub title: String,
    /// Prompt shown while locked (`None` = never locked)
    pub pin_prompt: Option<String>,
    /// PIN that unlocks the app
    pub pin: String,
    /// Whether typing the PIN dismisses the prompt
    pub accepts_pin: bool,
    /// Whether a reload locks the app again
    pub relock_on_reload: bool,
    /// Prompt shown instead of `pin_prompt` after a reload
    pub relock_prompt: String,
    /// Whether the conversations store exists
    pub store_present: bool,
    /// Console line emitted on reload while a stored record has a mockup
    pub optimization_log: Option<String>,
    /// Number of "History" navigation entries rendered
    pub history_nav_entries: usize,
    /// Whether opening a record renders the mockup preview heading
    pub renders_preview: bool,
    /// Frames rendered inside the preview
    pub preview_frames: usize,
}

impl Default for MockApp {
    fn default() -> Self {
        Self {
            title: "Idea Refinery".to_string(),
            pin_prompt: Some("Enter PIN".to_string()),
            pin: "1234".to_string(),
            accepts_pin: true,
            relock_on_reload: true,
            relock_prompt: "Enter PIN".to_string(),
            store_present: true,
            optimization_log: Some("[DB_OPT] stripping from summary: mockup".to_string()),
            history_nav_entries: 2,
            renders_preview: true,
            preview_frames: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MockView {
    Home,
    History,
    Record(usize),
}

#[derive(Debug, Clone)]
enum MockAction {
    None,
    OpenHistory,
    OpenRecord(usize),
}

/// Mock driver for unit testing
#[derive(Debug)]
pub struct MockDriver {
    /// Simulated application behaviour
    pub app: MockApp,
    /// Current URL
    pub current_url: String,
    /// Local storage contents
    pub local_storage: BTreeMap<String, String>,
    /// Records written to the store
    pub records: Vec<ConversationRecord>,
    /// Call history for verification
    pub call_history: Vec<String>,
    /// Whether `close` was called
    pub closed: bool,
    /// Screenshot bytes returned by `screenshot`
    pub screenshot_data: Vec<u8>,
    lock_prompt: Option<String>,
    typed: String,
    view: MockView,
    console: Option<ConsoleLog>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(MockApp::default())
    }
}

impl MockDriver {
    /// Create a mock driver simulating `app`
    #[must_use]
    pub fn new(app: MockApp) -> Self {
        Self {
            app,
            current_url: String::new(),
            local_storage: BTreeMap::new(),
            records: Vec::new(),
            call_history: Vec::new(),
            closed: false,
            screenshot_data: vec![0x89, 0x50, 0x4E, 0x47],
            lock_prompt: None,
            typed: String::new(),
            view: MockView::Home,
            console: None,
        }
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Whether the PIN screen is currently shown
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock_prompt.is_some()
    }

    /// Rendered text elements with what clicking them does
    fn elements(&self) -> Vec<(String, MockAction)> {
        if let Some(prompt) = &self.lock_prompt {
            return vec![(prompt.clone(), MockAction::None)];
        }
        let mut elements: Vec<(String, MockAction)> = (0..self.app.history_nav_entries)
            .map(|_| ("History".to_string(), MockAction::OpenHistory))
            .collect();
        match self.view {
            MockView::Home => {}
            MockView::History => {
                elements.push(("Project History".to_string(), MockAction::None));
                elements.extend(
                    self.records
                        .iter()
                        .enumerate()
                        .map(|(i, r)| (r.idea.clone(), MockAction::OpenRecord(i))),
                );
            }
            MockView::Record(i) => {
                if self.preview_rendered(i) {
                    elements.push(("Design Mockup Preview".to_string(), MockAction::None));
                }
            }
        }
        elements
    }

    fn preview_rendered(&self, index: usize) -> bool {
        self.app.renders_preview && self.records.get(index).is_some_and(|r| r.has_mockup())
    }

    fn css_count(&self, css: &str) -> usize {
        match (css, &self.view) {
            ("body", _) => 1,
            ("iframe", MockView::Record(i)) if self.lock_prompt.is_none() && self.preview_rendered(*i) => {
                self.app.preview_frames
            }
            _ => 0,
        }
    }

    fn matches(&self, selector: &Selector) -> Vec<MockAction> {
        match selector {
            Selector::Css(css) => vec![MockAction::None; self.css_count(css)],
            Selector::Text { .. } => self
                .elements()
                .into_iter()
                .filter(|(text, _)| selector.matches_text(text))
                .map(|(_, action)| action)
                .collect(),
        }
    }
}

#[async_trait]
impl SmokeDriver for MockDriver {
    async fn goto(&mut self, url: &str) -> SmokeResult<()> {
        self.call_history.push(format!("goto:{url}"));
        self.current_url = url.to_string();
        self.lock_prompt = self.app.pin_prompt.clone();
        self.view = MockView::Home;
        Ok(())
    }

    async fn reload(&mut self) -> SmokeResult<()> {
        self.call_history.push("reload".to_string());
        self.view = MockView::Home;
        self.typed.clear();
        if self.lock_prompt.is_none() && self.app.relock_on_reload && self.app.pin_prompt.is_some() {
            self.lock_prompt = Some(self.app.relock_prompt.clone());
        }
        if let (Some(console), Some(line)) = (&self.console, &self.app.optimization_log) {
            if self.records.iter().any(ConversationRecord::has_mockup) {
                console.push(line.clone());
            }
        }
        Ok(())
    }

    async fn title(&self) -> SmokeResult<String> {
        Ok(self.app.title.clone())
    }

    async fn evaluate(&self, script: &str) -> SmokeResult<serde_json::Value> {
        if script == scripts::READY_STATE {
            return Ok(serde_json::Value::String("complete".to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    async fn match_count(&self, selector: &Selector) -> SmokeResult<usize> {
        Ok(self.matches(selector).len())
    }

    async fn is_visible(&self, selector: &Selector) -> SmokeResult<bool> {
        Ok(!self.matches(selector).is_empty())
    }

    async fn click_nth(&mut self, selector: &Selector, index: usize) -> SmokeResult<()> {
        self.call_history.push(format!("click:{selector}"));
        let action = self
            .matches(selector)
            .into_iter()
            .nth(index)
            .ok_or_else(|| SmokeError::page(format!("no element matches {selector}")))?;
        match action {
            MockAction::None => {}
            MockAction::OpenHistory => self.view = MockView::History,
            MockAction::OpenRecord(i) => self.view = MockView::Record(i),
        }
        Ok(())
    }

    async fn type_text(&mut self, text: &str) -> SmokeResult<()> {
        self.call_history.push(format!("type:{text}"));
        if self.lock_prompt.is_none() {
            return Ok(());
        }
        self.typed.push_str(text);
        if self.typed.len() >= self.app.pin.len() {
            if self.app.accepts_pin && self.typed == self.app.pin {
                self.lock_prompt = None;
            }
            self.typed.clear();
        }
        Ok(())
    }

    async fn capture_console(&mut self) -> SmokeResult<ConsoleLog> {
        self.call_history.push("capture_console".to_string());
        let log = ConsoleLog::new();
        self.console = Some(log.clone());
        Ok(log)
    }

    async fn screenshot(&self) -> SmokeResult<Vec<u8>> {
        Ok(self.screenshot_data.clone())
    }

    async fn close(&mut self) -> SmokeResult<()> {
        self.call_history.push("close".to_string());
        self.closed = true;
        Ok(())
    }

    async fn set_local_storage(&mut self, key: &str, value: &str) -> SmokeResult<()> {
        self.call_history.push(format!("set_local_storage:{key}"));
        self.local_storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn put_record(
        &mut self,
        target: &StoreTarget,
        record: &ConversationRecord,
    ) -> SmokeResult<()> {
        self.call_history
            .push(format!("put_record:{}/{}", target.database, target.store));
        if !self.app.store_present {
            return Err(SmokeError::InjectionRejected {
                reason: format!("Store {} not found", target.store),
            });
        }
        self.records.push(record.clone());
        Ok(())
    }
}
