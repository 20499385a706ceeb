//! Breadth-bounded site discovery
//!
//! The crawl loop is the single writer of the frontier: every set
//! mutation happens here, so discovery needs no locking. Fetches go
//! through one render context; pacing goes through the sliding-window
//! limiter; extracted links are memoized in the TTL cache.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use url::Url;

use super::crawl_types::{CrawlResult, NavigationErrorKind};
use super::frontier::Frontier;
use super::link_filter::{resolve_href, should_include};
use super::rate_limiter::SlidingWindowLimiter;
use crate::cache::LinkCache;
use crate::config::AuditConfig;
use crate::render::js_scripts::LINKS_SCRIPT;
use crate::render::{RenderContext, RenderProvider};
use crate::utils::url_utils::{host_of, normalize_url};

/// Discovers the audit URL set by expanding links from the landing page.
pub struct CrawlerEngine {
    config: AuditConfig,
    provider: Arc<dyn RenderProvider>,
    limiter: SlidingWindowLimiter,
    link_cache: LinkCache,
}

impl CrawlerEngine {
    #[must_use]
    pub fn new(config: AuditConfig, provider: Arc<dyn RenderProvider>) -> Self {
        let limiter = SlidingWindowLimiter::new(config.rate_window(), config.rate_max_requests());
        let link_cache = LinkCache::new(config.link_cache_ttl());
        Self {
            config,
            provider,
            limiter,
            link_cache,
        }
    }

    /// Run discovery from the configured seed URL.
    ///
    /// Returns every discovered URL with its depth and source. Individual
    /// fetch failures land in the failed set and never abort discovery.
    pub async fn discover(&self) -> Result<Vec<CrawlResult>> {
        let seed = normalize_url(self.config.start_url())
            .context("seed URL is not a valid absolute URL")?;
        let base_host =
            host_of(&seed).ok_or_else(|| anyhow::anyhow!("seed URL has no host: {seed}"))?;

        let mut frontier = Frontier::new(self.config.max_urls(), self.config.max_depth());
        frontier.seed(seed.clone());

        info!("starting discovery from {seed}");

        let ctx = self.provider.new_context().await?;
        let outcome = self.expand(&mut frontier, ctx.as_ref(), &base_host).await;

        if let Err(e) = ctx.close().await {
            warn!("failed to close discovery context: {e}");
        }
        outcome?;

        info!(
            "discovery finished: {} URLs, {} failed fetches",
            frontier.discovered_count(),
            frontier.failed_count()
        );
        Ok(frontier.into_results())
    }

    async fn expand(
        &self,
        frontier: &mut Frontier,
        ctx: &dyn RenderContext,
        base_host: &str,
    ) -> Result<()> {
        while let Some(task) = frontier.pop() {
            if frontier.discovered_count() >= self.config.max_urls() {
                break;
            }

            self.limiter.acquire().await;

            if frontier.is_visited(&task.url) {
                continue;
            }
            if task.depth > frontier.max_depth() {
                continue;
            }

            // Visited is marked before the fetch completes: a transient
            // failure is terminal for this URL within the run.
            frontier.mark_visited(task.url.clone());

            let links = match self.fetch_links(ctx, &task.url).await {
                Ok(links) => links,
                Err(e) => {
                    let kind = NavigationErrorKind::classify(&e);
                    warn!(
                        target: "sitewarden::crawl",
                        "fetch failed for {} ({}): {e:#}",
                        task.url,
                        kind.as_str()
                    );
                    frontier.mark_failed(task.url.clone());
                    continue;
                }
            };

            let base = match Url::parse(&task.url) {
                Ok(base) => base,
                Err(e) => {
                    warn!("dequeued URL failed to re-parse: {}: {e}", task.url);
                    continue;
                }
            };

            let mut admitted = 0usize;
            for href in &links {
                let Some(resolved) = resolve_href(&base, href) else {
                    continue;
                };
                let Ok(normalized) = normalize_url(&resolved) else {
                    continue;
                };
                if !should_include(&normalized, base_host, &self.config) {
                    continue;
                }
                if frontier.admit(normalized, task.depth.saturating_add(1)) {
                    admitted += 1;
                }
            }
            debug!(
                target: "sitewarden::crawl",
                "{}: {} links, {} newly admitted (depth {})",
                task.url,
                links.len(),
                admitted,
                task.depth
            );
        }
        Ok(())
    }

    /// Fetch a page and extract its raw anchor hrefs, memoized by URL.
    async fn fetch_links(&self, ctx: &dyn RenderContext, url: &str) -> Result<Vec<String>> {
        if let Some(cached) = self.link_cache.get(url).await {
            debug!(target: "sitewarden::crawl", "link cache hit for {url}");
            return Ok(cached);
        }

        let response = ctx.navigate(url, self.config.navigation_timeout()).await?;
        if !response.is_success() {
            return Err(anyhow::anyhow!(
                "HTTP status {} fetching {url}",
                response.status
            ));
        }

        let value = ctx.evaluate(LINKS_SCRIPT).await?;
        let links: Vec<String> =
            serde_json::from_value(value).context("failed to parse extracted links")?;

        self.link_cache.put(url.to_string(), links.clone()).await;
        Ok(links)
    }
}
