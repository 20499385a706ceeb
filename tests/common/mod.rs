//! Hand-rolled mock render provider for integration tests
//!
//! Serves canned fixtures per URL: link lists, structure/style
//! snapshots, screenshots, HTTP statuses and injected navigation
//! failures. Also tracks navigation counts and the high-water mark of
//! simultaneously open contexts for the concurrency-bound tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use sitewarden::render::{
    LoadState, NavigationResponse, RenderContext, RenderProvider, ScreenshotTarget,
};

/// Canned behavior for one URL.
#[derive(Default, Clone)]
pub struct PageFixture {
    pub status: u16,
    /// Raw hrefs the links script returns
    pub links: Vec<String>,
    /// Structure snapshot JSON returned by the structure script
    pub structure: Option<serde_json::Value>,
    /// Style snapshot JSON returned by the style script
    pub styles: Option<serde_json::Value>,
    /// PNG payload returned for any screenshot target
    pub screenshot: Option<Vec<u8>>,
    /// When set, navigation fails with this message
    pub fail_navigation: Option<String>,
}

impl PageFixture {
    pub fn ok(links: &[&str]) -> Self {
        Self {
            status: 200,
            links: links.iter().map(|s| (*s).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// Shared mock state: fixtures plus instrumentation counters.
pub struct MockState {
    pub pages: Mutex<HashMap<String, PageFixture>>,
    /// Navigations per URL
    pub navigations: Mutex<HashMap<String, usize>>,
    pub open_contexts: AtomicUsize,
    pub max_open_contexts: AtomicUsize,
}

pub struct MockProvider {
    pub state: Arc<MockState>,
}

impl MockProvider {
    pub fn new(pages: HashMap<String, PageFixture>) -> Self {
        Self {
            state: Arc::new(MockState {
                pages: Mutex::new(pages),
                navigations: Mutex::new(HashMap::new()),
                open_contexts: AtomicUsize::new(0),
                max_open_contexts: AtomicUsize::new(0),
            }),
        }
    }

    pub async fn navigation_count(&self, url: &str) -> usize {
        self.state
            .navigations
            .lock()
            .await
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_open_contexts(&self) -> usize {
        self.state.max_open_contexts.load(Ordering::SeqCst)
    }

    /// Swap in a new fixture for a URL mid-test (e.g. to mutate a page
    /// between observations).
    pub async fn set_page(&self, url: &str, fixture: PageFixture) {
        self.state
            .pages
            .lock()
            .await
            .insert(url.to_string(), fixture);
    }
}

#[async_trait]
impl RenderProvider for MockProvider {
    async fn new_context(&self) -> anyhow::Result<Box<dyn RenderContext>> {
        let open = self.state.open_contexts.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_open_contexts
            .fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MockContext {
            state: Arc::clone(&self.state),
            current_url: Mutex::new(None),
            closed: AtomicUsize::new(0),
        }))
    }
}

pub struct MockContext {
    state: Arc<MockState>,
    current_url: Mutex<Option<String>>,
    closed: AtomicUsize,
}

impl MockContext {
    async fn fixture(&self) -> anyhow::Result<PageFixture> {
        let current = self.current_url.lock().await;
        let url = current
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("evaluate before navigate"))?;
        let pages = self.state.pages.lock().await;
        pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no fixture for {url}"))
    }
}

#[async_trait]
impl RenderContext for MockContext {
    async fn navigate(&self, url: &str, _timeout: Duration) -> anyhow::Result<NavigationResponse> {
        *self
            .state
            .navigations
            .lock()
            .await
            .entry(url.to_string())
            .or_insert(0) += 1;

        let pages = self.state.pages.lock().await;
        let Some(fixture) = pages.get(url) else {
            return Err(anyhow::anyhow!("connection refused by {url}"));
        };
        if let Some(message) = &fixture.fail_navigation {
            return Err(anyhow::anyhow!("{message}"));
        }
        let status = fixture.status;
        drop(pages);

        *self.current_url.lock().await = Some(url.to_string());
        Ok(NavigationResponse {
            status,
            headers: HashMap::new(),
        })
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        // Ready-state probe needs no fixture
        if script.contains("readyState") {
            return Ok(serde_json::json!({
                "readyState": "complete",
                "imagesLoaded": true,
                "bodyExists": true
            }));
        }

        let fixture = self.fixture().await?;
        if script.contains("a[href]") {
            return Ok(serde_json::json!(fixture.links));
        }
        if script.contains("getComputedStyle") {
            return fixture
                .styles
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no style fixture"));
        }
        if script.contains("important_elements") {
            return fixture
                .structure
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no structure fixture"));
        }
        Err(anyhow::anyhow!("unexpected script"))
    }

    async fn set_viewport(&self, _width: u32, _height: u32) -> anyhow::Result<()> {
        Ok(())
    }

    async fn screenshot(&self, _target: ScreenshotTarget) -> anyhow::Result<Vec<u8>> {
        let fixture = self.fixture().await?;
        fixture
            .screenshot
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no element matching target"))
    }

    async fn wait_for_load_state(
        &self,
        _state: LoadState,
        _timeout: Duration,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        if self.closed.fetch_add(1, Ordering::SeqCst) == 0 {
            self.state.open_contexts.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Route crate logs through the test harness when RUST_LOG is set.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Encode a solid-color PNG for visual fixtures.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("png encode");
    buffer.into_inner()
}

/// Encode a PNG split at a column: `left` color before it, `right`
/// color from it on.
pub fn split_png(width: u32, height: u32, boundary: u32, left: [u8; 4], right: [u8; 4]) -> Vec<u8> {
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    let mut image = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let color = if x < boundary { left } else { right };
            image.put_pixel(x, y, Rgba(color));
        }
    }
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("png encode");
    buffer.into_inner()
}
