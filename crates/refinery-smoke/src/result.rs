//! Result and error types for the smoke run.

use thiserror::Error;

/// Result type for smoke-run operations
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum SmokeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Browser shutdown error
    #[error("Failed to close browser: {message}")]
    BrowserCloseError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page script evaluation error
    #[error("Script evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// A bounded wait elapsed before the awaited state was observed
    #[error("Timeout {ms}ms exceeded waiting for {waited_for}")]
    Timeout {
        /// What was awaited
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// A strict locator resolved to more than one element
    #[error("Strict mode violation: {selector} resolved to {count} elements")]
    StrictModeViolation {
        /// Selector description
        selector: String,
        /// Number of matching elements
        count: usize,
    },

    /// The in-page database write was rejected
    #[error("Record injection rejected: {reason}")]
    InjectionRejected {
        /// Rejection reason reported by the page
        reason: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmokeError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create an evaluation error
    #[must_use]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::EvaluationError {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(waited_for: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            waited_for: waited_for.into(),
            ms,
        }
    }

    /// Whether this error came from a bounded wait running out
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_names_target() {
        let err = SmokeError::timeout("text=Design Mockup Preview", 10_000);
        let msg = err.to_string();
        assert!(msg.contains("10000ms"));
        assert!(msg.contains("Design Mockup Preview"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_injection_rejected_keeps_reason() {
        let err = SmokeError::InjectionRejected {
            reason: "Store conversations not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Record injection rejected: Store conversations not found"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_strict_violation_display() {
        let err = SmokeError::StrictModeViolation {
            selector: "text=\"History\"".to_string(),
            count: 2,
        };
        assert!(err.to_string().contains("2 elements"));
    }

    #[test]
    fn test_close_error_is_not_a_launch_error() {
        let err = SmokeError::BrowserCloseError {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to close browser: connection reset");
        assert!(!matches!(err, SmokeError::BrowserLaunchError { .. }));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SmokeError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
