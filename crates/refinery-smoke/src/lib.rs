//! refinery-smoke: end-to-end storage verification for the Idea Refinery app
//!
//! Drives a headless Chromium against a locally running instance, injects an
//! oversized conversation record into the client-side database, and checks
//! that the history path strips the mockup payload while the record still
//! opens into its preview.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ SmokeConfig  │───►│ Verification │───►│ SmokeDriver  │
//! │ (YAML, CLI)  │    │ Runner       │    │ CDP / Mock   │
//! └──────────────┘    └──────┬───────┘    └──────────────┘
//!                            │
//!                            ▼
//!                     ProgressSink + RunOutcome
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod browser;
mod config;
mod console;
mod driver;
mod locator;
mod record;
mod report;
mod result;
mod runner;
pub mod scripts;
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use browser::BrowserConfig;
pub use config::{Delays, SmokeConfig, StorageEntry, Timeouts, DEFAULT_BASE_URL};
pub use console::{join_console_args, scan_for_optimization, ConsoleLog, OptimizationScan};
pub use driver::{MockApp, MockDriver, SmokeDriver};
pub use locator::{Locator, LocatorOptions, Selector, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use record::{
    ConversationRecord, InjectionOutcome, StoreTarget, DEFAULT_RECORD_PREFIX, MOCKUP_CHUNK,
    MOCKUP_REPEAT,
};
pub use report::{Check, CheckResult, LineKind, ProgressSink, RecordingSink, RunOutcome};
pub use result::{SmokeError, SmokeResult};
pub use runner::{save_screenshot, VerificationRunner};
pub use wait::Pacing;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        BrowserConfig, Locator, MockApp, MockDriver, Pacing, ProgressSink, RecordingSink,
        RunOutcome, Selector, SmokeConfig, SmokeDriver, SmokeError, SmokeResult,
        VerificationRunner,
    };
    #[cfg(feature = "browser")]
    pub use super::ChromiumDriver;
}
