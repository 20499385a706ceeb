//! Render provider capability traits
//!
//! The engine depends on this surface only, not on a specific browser.
//! A `RenderProvider` hands out `RenderContext`s; a context is owned
//! exclusively by the task that opened it and must be closed on every
//! exit path (or handed to the end-of-run bulk closer in keep-open mode).

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of a navigation: status plus response headers.
#[derive(Debug, Clone)]
pub struct NavigationResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
}

impl NavigationResponse {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// Load milestones a caller can wait for after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// DOM parsed; subresources may still be loading
    DomContentLoaded,
    /// Document complete and images finished loading
    NetworkIdle,
}

/// What to capture in a screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenshotTarget {
    FullPage,
    /// First element matching the selector
    Element(String),
}

/// One renderable page, exclusively owned by its opening task.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL, returning the main-document response.
    async fn navigate(&self, url: &str, timeout: Duration) -> anyhow::Result<NavigationResponse>;

    /// Evaluate a script in the page and return its JSON result.
    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value>;

    /// Resize the viewport.
    async fn set_viewport(&self, width: u32, height: u32) -> anyhow::Result<()>;

    /// Capture a PNG screenshot of the page or an element.
    async fn screenshot(&self, target: ScreenshotTarget) -> anyhow::Result<Vec<u8>>;

    /// Wait for a load milestone, bounded by the timeout.
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration)
    -> anyhow::Result<()>;

    /// Release the context. Idempotent.
    async fn close(&self) -> anyhow::Result<()>;
}

/// Factory for render contexts.
#[async_trait]
pub trait RenderProvider: Send + Sync {
    async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>>;
}

/// Optional hook run against a context before each navigation.
///
/// Anti-detection preparation (user-agent patching, webdriver flag
/// masking) lives behind this seam so it stays an implementation detail
/// of the provider rather than engine logic.
#[async_trait]
pub trait PreNavigationHook: Send + Sync {
    async fn prepare(&self, ctx: &dyn RenderContext) -> anyhow::Result<()>;
}
