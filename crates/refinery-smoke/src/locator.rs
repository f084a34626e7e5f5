//! Locator abstraction for element selection and interaction.
//!
//! Selectors render to in-page query expressions. Locators add the waiting
//! and strictness rules on top of a [`SmokeDriver`]:
//!
//! - **Auto-waiting**: `click` and `wait_for` poll until a match is visible
//! - **Strict selection**: a strict locator fails if several elements match
//! - **Instant probes**: `is_visible` and `count` never wait

use std::fmt;
use std::time::{Duration, Instant};

use crate::driver::SmokeDriver;
use crate::result::{SmokeError, SmokeResult};

/// Default timeout for auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Shared in-page helpers prepended to text queries
const TEXT_HELPERS: &str = "const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim(); \
const skip = (el) => ['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE'].includes(el.tagName);";

/// Visibility predicate used by the visibility probe
const VISIBLE_FN: &str = "(el) => { const r = el.getBoundingClientRect(); \
const s = getComputedStyle(el); \
return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "iframe")
    Css(String),
    /// Text content selector
    Text {
        /// Text to match (whitespace is normalized)
        text: String,
        /// Exact, case-sensitive match instead of case-insensitive containment
        exact: bool,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a case-insensitive containment text selector
    #[must_use]
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Text {
            text: normalize_whitespace(text.as_ref()),
            exact: false,
        }
    }

    /// Create an exact text selector
    #[must_use]
    pub fn exact_text(text: impl AsRef<str>) -> Self {
        Self::Text {
            text: normalize_whitespace(text.as_ref()),
            exact: true,
        }
    }

    /// Expression evaluating to the array of matching elements.
    ///
    /// Text selectors keep only the innermost elements whose text matches.
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::Text { text, exact } => {
                let hit = if *exact {
                    format!(
                        "(el) => !skip(el) && norm(el.textContent) === {}",
                        js_string(text)
                    )
                } else {
                    format!(
                        "(el) => !skip(el) && norm(el.textContent).toLowerCase().includes({})",
                        js_string(&text.to_lowercase())
                    )
                };
                format!(
                    "(() => {{ {TEXT_HELPERS} const hit = {hit}; \
return Array.from(document.querySelectorAll('body *'))\
.filter((el) => hit(el) && !Array.from(el.children).some(hit)); }})()"
                )
            }
        }
    }

    /// Expression evaluating to the number of matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_query_all())
    }

    /// Expression evaluating to whether any match is visible
    #[must_use]
    pub fn to_visible_query(&self) -> String {
        format!("{}.some({VISIBLE_FN})", self.to_query_all())
    }

    /// Expression scrolling the `index`-th match into view and returning its
    /// center point as `{ x, y }`, or `null` when there is no such match
    #[must_use]
    pub fn to_click_point_query(&self, index: usize) -> String {
        format!(
            "(() => {{ const el = {}[{index}]; if (!el) {{ return null; }} \
el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
const r = el.getBoundingClientRect(); \
return {{ x: r.left + r.width / 2, y: r.top + r.height / 2 }}; }})()",
            self.to_query_all()
        )
    }

    /// Decode the result of [`Self::to_count_query`]
    ///
    /// # Errors
    ///
    /// Returns an evaluation error when the page did not yield a count
    pub fn parse_count(&self, value: &serde_json::Value) -> SmokeResult<usize> {
        value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| SmokeError::evaluation(format!("count of {self} was {value}")))
    }

    /// Decode the result of [`Self::to_visible_query`]
    ///
    /// # Errors
    ///
    /// Returns an evaluation error when the page did not yield a boolean
    pub fn parse_visible(&self, value: &serde_json::Value) -> SmokeResult<bool> {
        value
            .as_bool()
            .ok_or_else(|| SmokeError::evaluation(format!("visibility of {self} was {value}")))
    }

    /// Whether rendered text `candidate` satisfies this selector.
    ///
    /// CSS selectors never match on text.
    #[must_use]
    pub fn matches_text(&self, candidate: &str) -> bool {
        match self {
            Self::Css(_) => false,
            Self::Text { text, exact: true } => normalize_whitespace(candidate) == *text,
            Self::Text { text, exact: false } => normalize_whitespace(candidate)
                .to_lowercase()
                .contains(&text.to_lowercase()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::Text { text, exact: true } => write!(f, "text=\"{text}\""),
            Self::Text { text, exact: false } => write!(f, "text={text}"),
        }
    }
}

/// JSON string literal, which is also a valid JS string literal
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Collapse runs of whitespace and trim
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locator options for customizing behavior
#[derive(Debug, Clone)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strict: true,
        }
    }
}

/// A locator for finding and interacting with elements.
#[derive(Debug, Clone)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Locator matching a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::css(selector))
    }

    /// Locator matching text by case-insensitive containment
    #[must_use]
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Locator matching text exactly
    #[must_use]
    pub fn exact_text(text: impl AsRef<str>) -> Self {
        Self::from_selector(Selector::exact_text(text))
    }

    /// Target the first match, disabling strictness
    #[must_use]
    pub fn first(mut self) -> Self {
        self.options.strict = false;
        self
    }

    /// Set the auto-wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Instantaneous visibility probe (no waiting)
    pub async fn is_visible<D: SmokeDriver + ?Sized>(&self, driver: &D) -> SmokeResult<bool> {
        driver.is_visible(&self.selector).await
    }

    /// Number of elements currently matching
    pub async fn count<D: SmokeDriver + ?Sized>(&self, driver: &D) -> SmokeResult<usize> {
        driver.match_count(&self.selector).await
    }

    /// Wait until a match is visible, failing with a timeout error
    pub async fn wait_for<D: SmokeDriver + ?Sized>(&self, driver: &D) -> SmokeResult<()> {
        let start = Instant::now();
        loop {
            if driver.is_visible(&self.selector).await? {
                tracing::debug!(selector = %self.selector, elapsed_ms = start.elapsed().as_millis() as u64, "selector visible");
                return Ok(());
            }
            if start.elapsed() >= self.options.timeout {
                return Err(SmokeError::timeout(
                    self.selector.to_string(),
                    self.options.timeout.as_millis() as u64,
                ));
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Wait for a visible match, enforce strictness, and click the first match
    pub async fn click<D: SmokeDriver + ?Sized>(&self, driver: &mut D) -> SmokeResult<()> {
        self.wait_for(&*driver).await?;
        if self.options.strict {
            let count = driver.match_count(&self.selector).await?;
            if count > 1 {
                return Err(SmokeError::StrictModeViolation {
                    selector: self.selector.to_string(),
                    count,
                });
            }
        }
        driver.click_nth(&self.selector, 0).await
    }
}
