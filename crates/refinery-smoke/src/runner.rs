//! The verification run: one strictly sequential pass over the application.
//!
//! Every step goes through [`SmokeDriver`], so the same sequence runs against
//! Chromium or against [`crate::MockDriver`]. The first error aborts the
//! remaining steps; the run then saves the error screenshot instead of the
//! success screenshot. The browser session is closed in every case.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::SmokeConfig;
use crate::console::scan_for_optimization;
use crate::driver::SmokeDriver;
use crate::locator::Locator;
use crate::record::ConversationRecord;
use crate::report::{Check, CheckResult, ProgressSink, RunOutcome};
use crate::result::SmokeResult;
use crate::scripts;
use crate::wait::{settle, WaitOptions};

/// Runs the verification sequence against one driver
#[derive(Debug)]
pub struct VerificationRunner<D: SmokeDriver> {
    driver: D,
    config: SmokeConfig,
}

impl<D: SmokeDriver> VerificationRunner<D> {
    /// Create a runner owning `driver`
    #[must_use]
    pub const fn new(driver: D, config: SmokeConfig) -> Self {
        Self { driver, config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &SmokeConfig {
        &self.config
    }

    /// Get the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Take the driver back, e.g. to inspect a mock after the run
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Execute every step, report progress to `sink`, and close the browser.
    ///
    /// Never fails: an aborting error is printed, recorded in
    /// [`RunOutcome::error`], and answered with the error screenshot.
    pub async fn run(&mut self, sink: &dyn ProgressSink) -> RunOutcome {
        let Self { driver, config } = self;
        let mut outcome = RunOutcome::default();

        sink.info("Starting verification...");
        tracing::info!(base_url = %config.base_url, pacing = %config.pacing, "verification started");

        match steps(driver, config, sink, &mut outcome).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "verification finished");
                outcome.screenshot = Some(path);
            }
            Err(e) => {
                sink.failure(&format!("Error: {e}"));
                tracing::error!(error = %e, "verification aborted");
                match save_screenshot(&*driver, &config.error_path()).await {
                    Ok(path) => outcome.screenshot = Some(path),
                    Err(shot) => tracing::warn!(error = %shot, "could not save error screenshot"),
                }
                outcome.error = Some(e);
            }
        }

        if let Err(e) = driver.close().await {
            tracing::warn!(error = %e, "could not close browser");
        }
        outcome
    }
}

async fn steps<D: SmokeDriver>(
    driver: &mut D,
    config: &SmokeConfig,
    sink: &dyn ProgressSink,
    outcome: &mut RunOutcome,
) -> SmokeResult<PathBuf> {
    let timeouts = &config.timeouts;
    let delays = &config.delays;
    let poll = Duration::from_millis(timeouts.poll_interval_ms);
    let bounded = |locator: Locator, ms: u64| {
        locator
            .with_timeout(Duration::from_millis(ms))
            .with_poll_interval(poll)
    };

    driver.goto(&config.base_url).await?;
    bounded(Locator::css("body"), timeouts.body_ms)
        .wait_for(&*driver)
        .await?;
    let title = driver.title().await?;
    sink.info(&format!("Page loaded: {title}"));
    outcome.title = Some(title);

    sink.info("Injecting localStorage...");
    for entry in &config.local_storage {
        driver.set_local_storage(&entry.key, &entry.value).await?;
    }
    driver.reload().await?;
    settle_after_reload(&*driver, config, delays.reload_ms).await;

    let unlock_prompts = std::slice::from_ref(&config.pin_unlock_prompt);
    let entered = enter_pin(
        driver,
        config,
        sink,
        &config.pin_setup_prompts,
        "Setting up PIN (typing)...",
    )
    .await?;
    if !entered {
        enter_pin(driver, config, sink, unlock_prompts, "Unlocking with PIN (typing)...").await?;
    }

    let stuck = first_visible(&*driver, &config.pin_setup_prompts).await?;
    if let Some(prompt) = &stuck {
        sink.warning("PIN setup screen still visible");
        tracing::warn!(%prompt, "PIN setup prompt did not clear");
    }
    outcome.checks.push(CheckResult::new(
        Check::PinCleared,
        stuck.is_none(),
        stuck.map_or_else(|| "no setup prompt".to_string(), |p| format!("{p:?} visible")),
    ));

    sink.info("Injecting heavy conversation into IndexedDB...");
    let now_ms = chrono::Utc::now().timestamp_millis();
    let record = ConversationRecord::heavy(&config.record_prefix, now_ms);
    let label = record.label().to_string();
    outcome.record_label = Some(label.clone());
    driver.put_record(&config.store, &record).await?;
    sink.info("Injection complete.");
    tracing::info!(%label, database = %config.store.database, store = %config.store.store, "record injected");
    settle_after_reload(&*driver, config, delays.post_inject_ms).await;

    let console = driver.capture_console().await?;
    sink.info("Reloading to fetch history...");
    driver.reload().await?;
    settle_after_reload(&*driver, config, delays.history_reload_ms).await;

    enter_pin(
        driver,
        config,
        sink,
        unlock_prompts,
        "Unlocking with PIN again (typing)...",
    )
    .await?;

    sink.info("Navigating to History...");
    let primary = bounded(Locator::exact_text(&config.history_label), timeouts.click_ms);
    if let Err(e) = primary.click(driver).await {
        tracing::warn!(error = %e, "exact history locator failed");
        sink.info("Exact History link not usable, clicking first text match...");
        bounded(Locator::text(&config.history_label), timeouts.click_ms)
            .first()
            .click(driver)
            .await?;
    }

    sink.info("Waiting for history list...");
    bounded(Locator::text(&label), timeouts.selector_ms)
        .wait_for(&*driver)
        .await?;

    let messages = console.snapshot();
    let scan = scan_for_optimization(&messages, &config.optimization_tag, &config.optimization_needle);
    for line in &scan.tagged {
        sink.info(&format!("FOUND LOG: {line}"));
    }
    if scan.found {
        sink.success("SUCCESS: Optimization log found.");
    } else {
        sink.failure("FAILURE: Optimization log NOT found.");
    }
    outcome.checks.push(CheckResult::new(
        Check::OptimizationLog,
        scan.found,
        format!("{} tagged of {} message(s)", scan.tagged.len(), messages.len()),
    ));
    outcome.console_messages = messages;

    sink.info("Opening project...");
    bounded(Locator::text(&label), timeouts.click_ms)
        .first()
        .click(driver)
        .await?;
    let heading = bounded(Locator::text(&config.preview_heading), timeouts.selector_ms);
    if let Err(e) = heading.wait_for(&*driver).await {
        outcome
            .checks
            .push(CheckResult::new(Check::MockupStage, false, e.to_string()));
        return Err(e);
    }
    sink.success("VERIFIED: Mockup stage loaded.");
    outcome.checks.push(CheckResult::new(
        Check::MockupStage,
        true,
        format!("{:?} visible", config.preview_heading),
    ));

    let frames = Locator::css(&config.preview_frame_selector)
        .count(&*driver)
        .await?;
    if frames > 0 {
        sink.success(&format!("VERIFIED: {frames} iframe(s) present."));
    } else {
        sink.failure("FAILED: No iframe found.");
    }
    outcome.checks.push(CheckResult::new(
        Check::PreviewFrames,
        frames > 0,
        format!("{frames} frame(s)"),
    ));

    let path = save_screenshot(&*driver, &config.success_path()).await?;
    sink.info("Screenshot saved.");
    Ok(path)
}

/// Type the PIN if one of `prompts` is visible right now.
///
/// Detection is a single probe without waiting. Returns whether the PIN was
/// typed.
async fn enter_pin<D: SmokeDriver>(
    driver: &mut D,
    config: &SmokeConfig,
    sink: &dyn ProgressSink,
    prompts: &[String],
    announce: &str,
) -> SmokeResult<bool> {
    let Some(prompt) = first_visible(&*driver, prompts).await? else {
        tracing::debug!(?prompts, "no PIN prompt visible");
        return Ok(false);
    };
    sink.info(announce);
    tracing::info!(%prompt, "entering PIN");
    driver.type_text(&config.pin).await?;
    sink.info("PIN entered.");

    let page: &D = &*driver;
    settle(
        config.pacing,
        &settle_window(config, config.delays.pin_ms),
        || prompts_hidden(page, prompts),
        "PIN prompt to clear",
    )
    .await;
    Ok(true)
}

async fn settle_after_reload<D: SmokeDriver>(driver: &D, config: &SmokeConfig, delay_ms: u64) {
    let window = settle_window(config, delay_ms);
    let waited = settle(config.pacing, &window, || document_ready(driver), "document ready").await;
    tracing::debug!(
        success = waited.success,
        elapsed_ms = waited.elapsed.as_millis() as u64,
        "settled"
    );
}

fn settle_window(config: &SmokeConfig, delay_ms: u64) -> WaitOptions {
    WaitOptions::new()
        .with_timeout(delay_ms)
        .with_poll_interval(config.timeouts.poll_interval_ms)
}

async fn document_ready<D: SmokeDriver + ?Sized>(driver: &D) -> SmokeResult<bool> {
    let state = driver.evaluate(scripts::READY_STATE).await?;
    Ok(state.as_str() == Some("complete"))
}

async fn first_visible<D: SmokeDriver + ?Sized>(
    driver: &D,
    prompts: &[String],
) -> SmokeResult<Option<String>> {
    for prompt in prompts {
        if Locator::text(prompt).is_visible(driver).await? {
            return Ok(Some(prompt.clone()));
        }
    }
    Ok(None)
}

async fn prompts_hidden<D: SmokeDriver + ?Sized>(driver: &D, prompts: &[String]) -> SmokeResult<bool> {
    Ok(first_visible(driver, prompts).await?.is_none())
}

/// Capture the viewport and write it to `path`, creating parent directories
pub async fn save_screenshot<D: SmokeDriver + ?Sized>(driver: &D, path: &Path) -> SmokeResult<PathBuf> {
    let png = driver.screenshot().await?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &png).await?;
    tracing::info!(path = %path.display(), bytes = png.len(), "screenshot saved");
    Ok(path.to_path_buf())
}
