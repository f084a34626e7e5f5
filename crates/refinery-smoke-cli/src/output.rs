//! Progress lines on stdout

use console::{Style, Term};
use refinery_smoke::{ProgressSink, RunOutcome};

/// Prints runner progress with a status prefix per line
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn line(&self, symbol: &str, plain: &str, paint: &Style, message: &str) {
        let prefix = if self.use_color {
            paint.apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print the closing summary of a run
    pub fn summary(&self, outcome: &RunOutcome) {
        if self.quiet && outcome.all_passed() {
            return;
        }

        let _ = self.term.write_line("");
        let total = outcome.checks.len();
        let passed = total - outcome.failed();
        let verdict = match (&outcome.error, outcome.failed()) {
            (Some(_), _) => "ABORTED",
            (None, 0) => "PASSED",
            (None, _) => "FAILED",
        };
        let verdict = if self.use_color {
            let paint = if verdict == "PASSED" {
                Style::new().green().bold()
            } else {
                Style::new().red().bold()
            };
            paint.apply_to(verdict).to_string()
        } else {
            verdict.to_string()
        };
        let _ = self
            .term
            .write_line(&format!("{verdict} {passed}/{total} checks passed"));
        for check in outcome.checks.iter().filter(|c| !c.passed) {
            let _ = self
                .term
                .write_line(&format!("  {}: {}", check.check, check.detail));
        }
        if let Some(path) = &outcome.screenshot {
            let _ = self
                .term
                .write_line(&format!("Screenshot: {}", path.display()));
        }
    }
}

impl ProgressSink for ProgressReporter {
    fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("ℹ", "INFO", &Style::new().blue().bold(), message);
    }

    fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("✓", "PASS", &Style::new().green().bold(), message);
    }

    fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line("✗", "FAIL", &Style::new().red().bold(), message);
    }

    fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.line("⚠", "WARN", &Style::new().yellow().bold(), message);
    }
}
