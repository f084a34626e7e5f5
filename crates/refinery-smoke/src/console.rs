//! Console message collection and the optimization-log scan.

use std::sync::{Arc, Mutex, PoisonError};

/// Append-only log of console messages shared with the driver's listener.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    inner: Arc<Mutex<Vec<String>>>,
}

impl ConsoleLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn push(&self, message: impl Into<String>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    /// Messages collected so far, in arrival order
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of messages collected
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render console call arguments as one line of text.
///
/// Each argument is `(value, description)` as reported by the page: string
/// values are used verbatim, other values in their JSON form, and arguments
/// without a value fall back to their description.
pub fn join_console_args<'a, I>(args: I) -> String
where
    I: IntoIterator<Item = (Option<&'a serde_json::Value>, Option<&'a str>)>,
{
    args.into_iter()
        .map(|(value, description)| match value {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => description.unwrap_or_default().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result of scanning the console log for the optimization marker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationScan {
    /// Every message carrying the tag, in order
    pub tagged: Vec<String>,
    /// Whether some tagged message also contains the needle
    pub found: bool,
}

/// Scan `messages` for `tag`; the marker is found when one message has both `tag` and `needle`.
#[must_use]
pub fn scan_for_optimization(messages: &[String], tag: &str, needle: &str) -> OptimizationScan {
    let mut scan = OptimizationScan::default();
    for msg in messages.iter().filter(|m| m.contains(tag)) {
        if msg.contains(needle) {
            scan.found = true;
        }
        scan.tagged.push(msg.clone());
    }
    scan
}
