//! Wait mechanisms and pacing between steps.
//!
//! Two pacing strategies share the same upper bounds:
//!
//! - [`Pacing::Fixed`] sleeps for the whole delay, unconditionally
//! - [`Pacing::Poll`] polls a condition and returns as soon as it holds

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::result::{SmokeError, SmokeResult};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// How the runner lets the application settle between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pacing {
    /// Sleep for the full delay
    #[default]
    Fixed,
    /// Poll for the expected state, bounded by the same delay
    Poll,
}

impl std::fmt::Display for Pacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result of a wait operation
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the condition was observed
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
        }
    }

    /// Create a timeout wait result
    #[must_use]
    pub fn timeout(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: false,
            elapsed,
            waited_for: waited_for.into(),
        }
    }
}

/// Poll `probe` until it yields `true` or the timeout elapses.
///
/// Returns a timeout error when the condition is never observed. Probe
/// errors are propagated immediately.
pub async fn poll_until<F, Fut>(
    mut probe: F,
    options: &WaitOptions,
    waited_for: &str,
) -> SmokeResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SmokeResult<bool>>,
{
    let start = Instant::now();
    loop {
        if probe().await? {
            return Ok(WaitResult::success(start.elapsed(), waited_for));
        }
        if start.elapsed() >= options.timeout() {
            return Err(SmokeError::timeout(waited_for, options.timeout_ms));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Let the application settle for at most `options.timeout_ms`.
///
/// With [`Pacing::Fixed`] this sleeps for the whole window. With
/// [`Pacing::Poll`] it polls `probe` every `options.poll_interval_ms` and
/// returns once it holds. Probe errors count as "not yet"; running out of
/// time is not an error, it only ends the wait.
pub async fn settle<F, Fut>(pacing: Pacing, options: &WaitOptions, mut probe: F, what: &str) -> WaitResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SmokeResult<bool>>,
{
    let start = Instant::now();
    if pacing == Pacing::Fixed {
        tokio::time::sleep(options.timeout()).await;
        return WaitResult::success(start.elapsed(), what);
    }
    loop {
        match probe().await {
            Ok(true) => return WaitResult::success(start.elapsed(), what),
            Ok(false) => {}
            Err(e) => tracing::debug!(what, error = %e, "settle probe failed"),
        }
        if start.elapsed() >= options.timeout() {
            tracing::debug!(what, "settle window elapsed");
            return WaitResult::timeout(start.elapsed(), what);
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}
