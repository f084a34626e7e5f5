//! Full verification runs against the in-memory application.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::Path;
use std::time::{Duration, Instant};

use refinery_smoke::{
    Check, Delays, LineKind, MockApp, MockDriver, Pacing, RecordingSink, RunOutcome, SmokeConfig,
    SmokeError, Timeouts, VerificationRunner,
};

fn fast_config(output: &Path) -> SmokeConfig {
    SmokeConfig::default()
        .with_delays(Delays::none())
        .with_timeouts(Timeouts {
            body_ms: 200,
            selector_ms: 200,
            click_ms: 200,
            poll_interval_ms: 5,
        })
        .with_output_dir(output)
}

async fn run_app(app: MockApp, config: SmokeConfig) -> (RunOutcome, MockDriver, RecordingSink) {
    let sink = RecordingSink::new();
    let mut runner = VerificationRunner::new(MockDriver::new(app), config);
    let outcome = runner.run(&sink).await;
    (outcome, runner.into_driver(), sink)
}

mod happy_path {
    use super::*;

    #[tokio::test]
    async fn test_cooperative_app_completes_with_one_success_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let (outcome, driver, sink) = run_app(MockApp::default(), config.clone()).await;

        assert!(outcome.completed(), "unexpected error: {:?}", outcome.error);
        assert!(outcome.all_passed());
        assert_eq!(outcome.title.as_deref(), Some("Idea Refinery"));
        assert_eq!(outcome.screenshot.as_deref(), Some(config.success_path().as_path()));
        assert!(config.success_path().exists());
        assert!(!config.error_path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(driver.closed);
        assert!(sink.contains("Page loaded: Idea Refinery"));
        assert!(sink.contains("Screenshot saved."));
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (_, driver, _) = run_app(MockApp::default(), fast_config(dir.path())).await;
        let history = driver.history();
        let position = |prefix: &str| {
            history
                .iter()
                .position(|c| c.starts_with(prefix))
                .unwrap_or_else(|| panic!("{prefix} never called: {history:?}"))
        };

        assert_eq!(history[0], "goto:http://localhost:5173");
        assert!(position("set_local_storage:onboarding_complete") < position("reload"));
        assert!(position("set_local_storage:auth_token") < position("reload"));
        assert!(position("reload") < position("put_record:IdeaRefineryDB/conversations"));
        assert!(position("put_record") < position("capture_console"));
        assert_eq!(history.last().map(String::as_str), Some("close"));
        assert_eq!(history.iter().filter(|c| *c == "reload").count(), 2);
        assert_eq!(history.iter().filter(|c| *c == "type:1234").count(), 2);
    }

    #[tokio::test]
    async fn test_local_storage_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let (_, driver, _) = run_app(MockApp::default(), fast_config(dir.path())).await;
        assert_eq!(
            driver.local_storage.get("onboarding_complete").map(String::as_str),
            Some("true")
        );
        assert_eq!(
            driver.local_storage.get("auth_token").map(String::as_str),
            Some("dummy_token")
        );
    }

    #[tokio::test]
    async fn test_history_shows_injected_label() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, driver, sink) = run_app(MockApp::default(), fast_config(dir.path())).await;
        let label = outcome.record_label.expect("label recorded");

        assert!(label.starts_with("Heavy Project "));
        assert_eq!(driver.records.len(), 1);
        assert_eq!(driver.records[0].idea, label);
        assert!(driver.was_called(&format!("click:text={label}")));
        assert!(sink.contains("Waiting for history list..."));
    }

    #[tokio::test]
    async fn test_ambiguous_history_link_falls_back_to_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, driver, sink) = run_app(MockApp::default(), fast_config(dir.path())).await;

        assert!(outcome.completed());
        assert!(driver.was_called("click:text=History"));
        assert!(sink.contains("clicking first text match"));
    }

    #[tokio::test]
    async fn test_single_history_link_uses_exact_locator() {
        let dir = tempfile::tempdir().unwrap();
        let app = MockApp {
            history_nav_entries: 1,
            ..MockApp::default()
        };
        let (outcome, driver, sink) = run_app(app, fast_config(dir.path())).await;

        assert!(outcome.completed());
        assert!(driver.was_called("click:text=\"History\""));
        assert!(!sink.contains("clicking first text match"));
    }
}

mod injection {
    use super::*;

    #[tokio::test]
    async fn test_missing_store_aborts_with_reason_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let app = MockApp {
            store_present: false,
            ..MockApp::default()
        };
        let (outcome, driver, sink) = run_app(app, config.clone()).await;

        match &outcome.error {
            Some(SmokeError::InjectionRejected { reason }) => {
                assert_eq!(reason, "Store conversations not found");
            }
            other => panic!("expected injection rejection, got {other:?}"),
        }
        assert!(config.error_path().exists());
        assert!(!config.success_path().exists());
        assert_eq!(outcome.screenshot.as_deref(), Some(config.error_path().as_path()));
        assert!(driver.closed);
        assert!(!driver.was_called("capture_console"));
        assert!(sink
            .messages(LineKind::Failure)
            .contains(&"Error: Record injection rejected: Store conversations not found".to_string()));
    }
}

mod pin_handling {
    use super::*;

    #[tokio::test]
    async fn test_no_prompt_skips_typing() {
        let dir = tempfile::tempdir().unwrap();
        let app = MockApp {
            pin_prompt: None,
            ..MockApp::default()
        };
        let (outcome, driver, sink) = run_app(app, fast_config(dir.path())).await;

        assert!(outcome.completed());
        assert!(!driver.was_called("type"));
        assert!(!sink.contains("PIN entered."));
        assert!(outcome.check(Check::PinCleared).unwrap().passed);
    }

    #[tokio::test]
    async fn test_setup_prompt_is_handled() {
        let dir = tempfile::tempdir().unwrap();
        let app = MockApp {
            pin_prompt: Some("Set Your PIN".to_string()),
            ..MockApp::default()
        };
        let (outcome, _, sink) = run_app(app, fast_config(dir.path())).await;

        assert!(outcome.completed());
        assert!(sink.contains("Setting up PIN (typing)..."));
        assert!(sink.contains("Unlocking with PIN again (typing)..."));
        assert!(sink.messages(LineKind::Warning).is_empty());
    }

    #[tokio::test]
    async fn test_stuck_setup_prompt_warns_without_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let app = MockApp {
            pin_prompt: Some("Create a PIN".to_string()),
            accepts_pin: false,
            ..MockApp::default()
        };
        let (outcome, driver, sink) = run_app(app, config.clone()).await;

        assert_eq!(
            sink.messages(LineKind::Warning),
            vec!["PIN setup screen still visible".to_string()]
        );
        assert!(!outcome.check(Check::PinCleared).unwrap().passed);
        assert!(outcome.error.as_ref().is_some_and(SmokeError::is_timeout));
        assert!(config.error_path().exists());
        assert!(driver.closed);
    }
}

mod console_scan {
    use super::*;

    #[tokio::test]
    async fn test_optimization_log_found() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, _, sink) = run_app(MockApp::default(), fast_config(dir.path())).await;

        assert!(outcome.check(Check::OptimizationLog).unwrap().passed);
        assert!(sink.contains("FOUND LOG: [DB_OPT] stripping from summary: mockup"));
        assert!(sink
            .messages(LineKind::Success)
            .contains(&"SUCCESS: Optimization log found.".to_string()));
        assert_eq!(
            outcome.console_messages,
            vec!["[DB_OPT] stripping from summary: mockup".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_log_is_reported_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let app = MockApp {
            optimization_log: None,
            ..MockApp::default()
        };
        let (outcome, _, sink) = run_app(app, config.clone()).await;

        assert!(outcome.completed());
        assert!(!outcome.check(Check::OptimizationLog).unwrap().passed);
        assert!(sink
            .messages(LineKind::Failure)
            .contains(&"FAILURE: Optimization log NOT found.".to_string()));
        assert!(outcome.check(Check::MockupStage).unwrap().passed);
        assert!(config.success_path().exists());
    }

    #[tokio::test]
    async fn test_tag_without_needle_is_printed_but_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = MockApp {
            optimization_log: Some("[DB_OPT] kept mockup".to_string()),
            ..MockApp::default()
        };
        let (outcome, _, sink) = run_app(app, fast_config(dir.path())).await;

        assert!(sink.contains("FOUND LOG: [DB_OPT] kept mockup"));
        assert!(!outcome.check(Check::OptimizationLog).unwrap().passed);
    }
}

mod preview {
    use super::*;

    #[tokio::test]
    async fn test_missing_heading_times_out_into_error_screenshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let app = MockApp {
            renders_preview: false,
            ..MockApp::default()
        };
        let (outcome, driver, sink) = run_app(app, config.clone()).await;

        let err = outcome.error.as_ref().expect("run aborted");
        assert!(err.is_timeout());
        assert!(err.to_string().contains("Design Mockup Preview"));
        assert!(config.error_path().exists());
        assert!(!config.success_path().exists());
        assert!(!outcome.check(Check::MockupStage).unwrap().passed);
        assert!(outcome.check(Check::PreviewFrames).is_none());
        assert!(driver.closed);
        assert!(!sink.contains("Screenshot saved."));
    }

    #[tokio::test]
    async fn test_zero_frames_reported_without_abort() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path());
        let app = MockApp {
            preview_frames: 0,
            ..MockApp::default()
        };
        let (outcome, _, sink) = run_app(app, config.clone()).await;

        assert!(outcome.completed());
        assert!(!outcome.check(Check::PreviewFrames).unwrap().passed);
        assert!(sink
            .messages(LineKind::Failure)
            .contains(&"FAILED: No iframe found.".to_string()));
        assert!(config.success_path().exists());
    }

    #[tokio::test]
    async fn test_frame_count_is_printed() {
        let dir = tempfile::tempdir().unwrap();
        let app = MockApp {
            preview_frames: 2,
            ..MockApp::default()
        };
        let (_, _, sink) = run_app(app, fast_config(dir.path())).await;
        assert!(sink.contains("VERIFIED: 2 iframe(s) present."));
    }
}

mod pacing {
    use super::*;

    #[tokio::test]
    async fn test_poll_pacing_returns_before_fixed_delays() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path())
            .with_delays(Delays::default())
            .with_pacing(Pacing::Poll);
        let start = Instant::now();
        let (outcome, _, _) = run_app(MockApp::default(), config).await;

        assert!(outcome.completed(), "unexpected error: {:?}", outcome.error);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_fixed_pacing_sleeps_full_delays() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast_config(dir.path()).with_delays(Delays {
            reload_ms: 30,
            pin_ms: 20,
            post_inject_ms: 10,
            history_reload_ms: 30,
        });
        let start = Instant::now();
        let (outcome, _, _) = run_app(MockApp::default(), config).await;

        assert!(outcome.completed());
        // 30 + 20 + 10 + 30 + 20
        assert!(start.elapsed() >= Duration::from_millis(110));
    }
}
