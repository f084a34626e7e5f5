//! Browser control for headless runs.
//!
//! Real browser control goes through the Chrome `DevTools` Protocol. With the
//! `browser` feature enabled, [`ChromiumDriver`] implements [`SmokeDriver`]
//! on top of chromiumoxide.
//!
//! [`SmokeDriver`]: crate::driver::SmokeDriver

use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::console::{join_console_args, ConsoleLog};
    use crate::driver::SmokeDriver;
    use crate::locator::Selector;
    use crate::result::{SmokeError, SmokeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::{
        EnableParams as RuntimeEnableParams, EventConsoleApiCalled,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::layout::Point;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;

    #[derive(Debug, Deserialize)]
    struct ClickPoint {
        x: f64,
        y: f64,
    }

    /// Chromium session with one page, driven over CDP
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        handler: JoinHandle<()>,
        console_task: Option<JoinHandle<()>>,
        closed: bool,
    }

    impl ChromiumDriver {
        /// Launch a new browser instance and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub async fn launch(config: BrowserConfig) -> SmokeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|e| SmokeError::BrowserLaunchError { message: e })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                SmokeError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            // Spawn handler task
            let handler = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;

            tracing::info!(
                headless = config.headless,
                width = config.viewport_width,
                height = config.viewport_height,
                "chromium launched"
            );

            Ok(Self {
                browser: Mutex::new(browser),
                page,
                handler,
                console_task: None,
                closed: false,
            })
        }

        async fn dispatch_key(
            &self,
            kind: DispatchKeyEventType,
            key: &str,
            text: Option<&str>,
        ) -> SmokeResult<()> {
            let mut builder = DispatchKeyEventParams::builder().r#type(kind).key(key);
            if let Some(text) = text {
                builder = builder.text(text);
            }
            let params = builder.build().map_err(SmokeError::input)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| SmokeError::input(e.to_string()))?;
            Ok(())
        }
    }

    #[async_trait]
    impl SmokeDriver for ChromiumDriver {
        async fn goto(&mut self, url: &str) -> SmokeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| SmokeError::NavigationError {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn reload(&mut self) -> SmokeResult<()> {
            self.page
                .reload()
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;
            Ok(())
        }

        async fn title(&self) -> SmokeResult<String> {
            let title = self
                .page
                .get_title()
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;
            Ok(title.unwrap_or_default())
        }

        async fn evaluate(&self, script: &str) -> SmokeResult<serde_json::Value> {
            let result = self
                .page
                .evaluate(script)
                .await
                .map_err(|e| SmokeError::evaluation(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        async fn match_count(&self, selector: &Selector) -> SmokeResult<usize> {
            let value = self.evaluate(&selector.to_count_query()).await?;
            selector.parse_count(&value)
        }

        async fn is_visible(&self, selector: &Selector) -> SmokeResult<bool> {
            let value = self.evaluate(&selector.to_visible_query()).await?;
            selector.parse_visible(&value)
        }

        async fn click_nth(&mut self, selector: &Selector, index: usize) -> SmokeResult<()> {
            let value = self
                .evaluate(&selector.to_click_point_query(index))
                .await?;
            let point: Option<ClickPoint> = serde_json::from_value(value)?;
            let point = point
                .ok_or_else(|| SmokeError::page(format!("no element matches {selector}")))?;
            self.page
                .click(Point {
                    x: point.x,
                    y: point.y,
                })
                .await
                .map_err(|e| SmokeError::input(e.to_string()))?;
            Ok(())
        }

        async fn type_text(&mut self, text: &str) -> SmokeResult<()> {
            for ch in text.chars() {
                let key = ch.to_string();
                self.dispatch_key(DispatchKeyEventType::KeyDown, &key, Some(&key))
                    .await?;
                self.dispatch_key(DispatchKeyEventType::KeyUp, &key, None)
                    .await?;
            }
            Ok(())
        }

        async fn capture_console(&mut self) -> SmokeResult<ConsoleLog> {
            self.page
                .execute(RuntimeEnableParams::default())
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;
            let mut events = self
                .page
                .event_listener::<EventConsoleApiCalled>()
                .await
                .map_err(|e| SmokeError::page(e.to_string()))?;

            let log = ConsoleLog::new();
            let sink = log.clone();
            let task = tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    let text = join_console_args(
                        event
                            .args
                            .iter()
                            .map(|arg| (arg.value.as_ref(), arg.description.as_deref())),
                    );
                    tracing::trace!(%text, "console");
                    sink.push(text);
                }
            });
            if let Some(previous) = self.console_task.replace(task) {
                previous.abort();
            }
            Ok(log)
        }

        async fn screenshot(&self) -> SmokeResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();

            let screenshot =
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| SmokeError::ScreenshotError {
                        message: e.to_string(),
                    })?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| SmokeError::ScreenshotError {
                    message: e.to_string(),
                })
        }

        async fn close(&mut self) -> SmokeResult<()> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            if let Some(task) = self.console_task.take() {
                task.abort();
            }
            let mut browser = self.browser.lock().await;
            let closed = browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| SmokeError::BrowserCloseError {
                    message: e.to_string(),
                });
            // Reap the child even when the close command failed
            let reaped = browser
                .wait()
                .await
                .map_err(|e| SmokeError::BrowserCloseError {
                    message: e.to_string(),
                });
            self.handler.abort();
            if let Ok(status) = &reaped {
                tracing::debug!(?status, "chromium exited");
            }
            closed.and(reaped.map(|_| ()))
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;
