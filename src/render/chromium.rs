//! Chromium-backed render provider
//!
//! Wraps `chromiumoxide` behind the `RenderProvider` / `RenderContext`
//! capability traits. Each context owns one page; the provider owns the
//! browser process and the handler task driving its CDP connection.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams,
};
use futures::StreamExt;
use log::{debug, error, info, trace, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::task::{self, JoinHandle};

use super::js_scripts::READY_STATE_SCRIPT;
use super::provider::{
    LoadState, NavigationResponse, PreNavigationHook, RenderContext, RenderProvider,
    ScreenshotTarget,
};
use crate::error::EngineStartError;

/// How long to wait for the main-document response event after `goto`
/// before falling back to an assumed 200.
const RESPONSE_EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Render provider backed by a locally launched Chromium.
pub struct ChromiumProvider {
    browser: Arc<Browser>,
    handler_task: JoinHandle<()>,
    hook: Option<Arc<dyn PreNavigationHook>>,
}

impl ChromiumProvider {
    /// Launch a Chromium instance.
    ///
    /// This is the only fatal failure point of a run: without a browser
    /// there is nothing to crawl or audit.
    pub async fn launch(headless: bool) -> Result<Self, EngineStartError> {
        let mut config_builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        if headless {
            config_builder = config_builder.headless_mode(HeadlessMode::default());
        } else {
            config_builder = config_builder.with_head();
        }

        let browser_config = config_builder
            .build()
            .map_err(|e| EngineStartError(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineStartError(format!("failed to launch browser: {e}")))?;

        let handler_task = task::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    let error_msg = e.to_string();

                    // Chrome sends CDP events chromiumoxide doesn't
                    // recognize; those deserialization failures are not
                    // actionable.
                    let is_benign_serialization_error = error_msg
                        .contains("data did not match any variant of untagged enum Message")
                        || error_msg.contains("Failed to deserialize WS response");

                    if is_benign_serialization_error {
                        trace!("Suppressed benign CDP serialization error: {error_msg}");
                    } else {
                        error!("Browser handler error: {e:?}");
                    }
                }
            }
            info!("Browser handler task completed");
        });

        Ok(Self {
            browser: Arc::new(browser),
            handler_task,
            hook: None,
        })
    }

    /// Attach a pre-navigation hook run against every context before each
    /// `navigate`.
    #[must_use]
    pub fn with_pre_navigation_hook(mut self, hook: Arc<dyn PreNavigationHook>) -> Self {
        self.hook = Some(hook);
        self
    }
}

impl Drop for ChromiumProvider {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl RenderProvider for ChromiumProvider {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;
        Ok(Box::new(ChromiumContext {
            page,
            hook: self.hook.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

/// One chromium page, exclusively owned by the task that opened it.
pub struct ChromiumContext {
    page: Page,
    hook: Option<Arc<dyn PreNavigationHook>>,
    closed: AtomicBool,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<NavigationResponse> {
        if let Some(hook) = &self.hook
            && let Err(e) = hook.prepare(self).await
        {
            warn!("pre-navigation hook failed for {url}: {e}");
        }

        // Subscribe to network responses before navigating so the
        // main-document response is not missed.
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .context("failed to install response listener")?;
        self.page
            .execute(EnableParams::default())
            .await
            .context("failed to enable network events")?;

        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| anyhow::anyhow!("navigation timeout after {}s for {url}", timeout.as_secs()))?
            .map_err(|e| anyhow::anyhow!("navigation failed for {url}: {e}"))?;

        // The document response usually arrives before goto resolves;
        // drain briefly, then fall back to an assumed success.
        let deadline = Instant::now() + RESPONSE_EVENT_TIMEOUT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, responses.next()).await {
                Ok(Some(event)) if event.r#type == ResourceType::Document => {
                    let status = u16::try_from(event.response.status).unwrap_or(0);
                    let headers = headers_to_map(&event.response.headers);
                    return Ok(NavigationResponse { status, headers });
                }
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        debug!("no document response event for {url}, assuming 200");
        Ok(NavigationResponse {
            status: 200,
            headers: HashMap::new(),
        })
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("script evaluation failed")?;
        result
            .into_value::<serde_json::Value>()
            .map_err(|e| anyhow::anyhow!("failed to read evaluation result: {e}"))
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid viewport params: {e}"))?;
        self.page
            .execute(params)
            .await
            .context("failed to set viewport")?;
        Ok(())
    }

    async fn screenshot(&self, target: ScreenshotTarget) -> Result<Vec<u8>> {
        match target {
            ScreenshotTarget::FullPage => {
                let params = CaptureScreenshotParams {
                    format: Some(CaptureScreenshotFormat::Png),
                    capture_beyond_viewport: Some(true),
                    ..Default::default()
                };
                self.page
                    .screenshot(params)
                    .await
                    .map_err(|e| anyhow::anyhow!("full-page screenshot failed: {e}"))
            }
            ScreenshotTarget::Element(selector) => {
                let element = self
                    .page
                    .find_element(&selector)
                    .await
                    .map_err(|e| anyhow::anyhow!("no element matching {selector}: {e}"))?;
                element
                    .screenshot(CaptureScreenshotFormat::Png)
                    .await
                    .map_err(|e| anyhow::anyhow!("element screenshot failed for {selector}: {e}"))
            }
        }
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> Result<()> {
        match state {
            LoadState::DomContentLoaded => {
                tokio::time::timeout(timeout, self.page.wait_for_navigation())
                    .await
                    .map_err(|_| {
                        anyhow::anyhow!("load-state timeout after {}s", timeout.as_secs())
                    })?
                    .map_err(|e| anyhow::anyhow!("wait for navigation failed: {e}"))?;
                Ok(())
            }
            LoadState::NetworkIdle => self.wait_for_settle(timeout).await,
        }
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("failed to close page: {e}"))
    }
}

impl ChromiumContext {
    /// Poll the page until the document settles or the timeout elapses.
    ///
    /// `wait_for_navigation` only waits for the HTTP response; JS
    /// execution, CSS application and image loading finish later. Polling
    /// the ready-state probe catches the real settle point. Times out
    /// softly: a page that never settles proceeds anyway.
    async fn wait_for_settle(&self, max_wait: Duration) -> Result<()> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(100);

        loop {
            if start.elapsed() >= max_wait {
                warn!(
                    "timeout waiting for page settle after {:.1}s, proceeding anyway",
                    max_wait.as_secs_f64()
                );
                break;
            }

            match self.evaluate(READY_STATE_SCRIPT).await {
                Ok(value) => {
                    let ready = value.get("readyState").and_then(|v| v.as_str())
                        == Some("complete");
                    let body_exists = value
                        .get("bodyExists")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);
                    let images_loaded = value
                        .get("imagesLoaded")
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false);

                    if ready && body_exists {
                        if !images_loaded {
                            debug!("images still loading, waiting additional 500ms");
                            tokio::time::sleep(Duration::from_millis(500)).await;
                        }
                        break;
                    }
                }
                Err(e) => {
                    debug!("failed to check readyState: {e}, retrying");
                }
            }

            tokio::time::sleep(poll_interval).await;
        }

        // Final buffer for CSS transitions and lazy-loaded content
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    }
}

fn headers_to_map(
    headers: &chromiumoxide::cdp::browser_protocol::network::Headers,
) -> HashMap<String, String> {
    serde_json::to_value(headers)
        .ok()
        .and_then(|value| {
            value.as_object().map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let v = v.as_str().map_or_else(|| v.to_string(), str::to_string);
                        (k.to_lowercase(), v)
                    })
                    .collect()
            })
        })
        .unwrap_or_default()
}
