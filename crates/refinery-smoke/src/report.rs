//! Progress lines and the in-process outcome of a run.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::result::SmokeError;

/// Receiver of the human-readable progress lines printed during a run
pub trait ProgressSink: Send + Sync {
    /// Progress or informational line
    fn info(&self, message: &str);
    /// A check passed
    fn success(&self, message: &str);
    /// A check failed, or the run aborted
    fn failure(&self, message: &str);
    /// Something looks wrong but the run continues
    fn warning(&self, message: &str);
}

/// Severity of a recorded line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// See [`ProgressSink::info`]
    Info,
    /// See [`ProgressSink::success`]
    Success,
    /// See [`ProgressSink::failure`]
    Failure,
    /// See [`ProgressSink::warning`]
    Warning,
}

/// Sink that keeps every line in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(LineKind, String)>>,
}

impl RecordingSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines recorded so far
    #[must_use]
    pub fn lines(&self) -> Vec<(LineKind, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of the given kind
    #[must_use]
    pub fn messages(&self, kind: LineKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m)
            .collect()
    }

    /// Whether any line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, m)| m.contains(needle))
    }

    fn push(&self, kind: LineKind, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, message.to_string()));
    }
}

impl ProgressSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(LineKind::Info, message);
    }

    fn success(&self, message: &str) {
        self.push(LineKind::Success, message);
    }

    fn failure(&self, message: &str) {
        self.push(LineKind::Failure, message);
    }

    fn warning(&self, message: &str) {
        self.push(LineKind::Warning, message);
    }
}

/// Non-fatal checks reported by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The PIN setup prompt is gone after PIN entry
    PinCleared,
    /// The optimization marker appeared in the console
    OptimizationLog,
    /// The mockup preview heading appeared
    MockupStage,
    /// At least one preview frame rendered
    PreviewFrames,
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PinCleared => "pin-cleared",
            Self::OptimizationLog => "optimization-log",
            Self::MockupStage => "mockup-stage",
            Self::PreviewFrames => "preview-frames",
        };
        f.write_str(name)
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Which check
    pub check: Check,
    /// Whether it passed
    pub passed: bool,
    /// What was observed
    pub detail: String,
}

impl CheckResult {
    /// Create a check result
    #[must_use]
    pub fn new(check: Check, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed,
            detail: detail.into(),
        }
    }
}

/// Everything a run observed
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Page title read after the first load
    pub title: Option<String>,
    /// Label of the injected record
    pub record_label: Option<String>,
    /// Console messages collected after the history reload
    pub console_messages: Vec<String>,
    /// Non-fatal checks, in the order they ran
    pub checks: Vec<CheckResult>,
    /// The error that aborted the run, if any
    pub error: Option<SmokeError>,
    /// Screenshot written at the end of the run
    pub screenshot: Option<PathBuf>,
}

impl RunOutcome {
    /// Whether every step ran without an aborting error
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the run completed and every check passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.completed() && self.checks.iter().all(|c| c.passed)
    }

    /// Result of `check`, if it ran
    #[must_use]
    pub fn check(&self, check: Check) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check == check)
    }

    /// Number of failed checks
    #[must_use]
    pub fn failed(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }
}
