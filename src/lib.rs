pub mod aggregate;
pub mod audit_engine;
pub mod baseline;
pub mod cache;
pub mod config;
pub mod crawl_engine;
pub mod detectors;
pub mod error;
pub mod render;
pub mod utils;

pub use aggregate::Summary;
pub use audit_engine::{
    AuditDispatcher, AuditJob, AuditOutcome, AuditProgress, AuditResult, Auditor, AuditorRegistry,
    Issue, ProgressCallback, Severity, Warning,
};
pub use baseline::{Baseline, BaselineKind, BaselineStore, FsBaselineStore};
pub use cache::LinkCache;
pub use config::{AuditConfig, Viewport};
pub use crawl_engine::{
    CrawlResult, CrawlTask, CrawlerEngine, DiscoverySource, NavigationErrorKind,
    SlidingWindowLimiter,
};
pub use detectors::{StructuralAuditor, VisualAuditor};
pub use error::{AuditorError, BaselineError, EngineStartError, RateLimitExhausted};
pub use render::{
    ChromiumProvider, LoadState, NavigationResponse, PreNavigationHook, RenderContext,
    RenderProvider, ScreenshotTarget,
};
pub use utils::url_utils::{normalize_url, url_hash};

use std::sync::Arc;

/// Everything a finished run produces: the discovered URL set, the
/// per-URL results, and the reduced summary.
#[derive(Debug)]
pub struct AuditRun {
    pub crawl: Vec<CrawlResult>,
    pub results: Vec<AuditResult>,
    pub summary: Summary,
}

/// Build the default registry: the two built-in detectors wired to a
/// baseline store. External rule auditors register on top of this.
#[must_use]
pub fn default_registry(config: &AuditConfig, store: Arc<dyn BaselineStore>) -> AuditorRegistry {
    AuditorRegistry::new()
        .register(Arc::new(StructuralAuditor::new(
            Arc::clone(&store),
            config.important_selectors().to_vec(),
            config.style_analysis(),
        )))
        .register(Arc::new(VisualAuditor::new(
            store,
            config.viewports().to_vec(),
            config.visual_elements().to_vec(),
            config.pixel_threshold(),
            config.visual_threshold_pct(),
            Some(config.baseline_dir().join("diffs")),
        )))
}

/// Discover and audit a site with a custom provider and registry.
///
/// Discovery failures on individual URLs and per-URL audit failures are
/// absorbed into the results; the returned error covers only seed-level
/// and provider-level failures.
pub async fn audit_site_with(
    config: AuditConfig,
    provider: Arc<dyn RenderProvider>,
    registry: AuditorRegistry,
    on_progress: Option<ProgressCallback>,
) -> anyhow::Result<AuditRun> {
    let crawler = CrawlerEngine::new(config.clone(), Arc::clone(&provider));
    let crawl = crawler.discover().await?;

    let jobs: Vec<AuditJob> = crawl.iter().cloned().map(AuditJob::from).collect();
    let dispatcher = AuditDispatcher::new(config, provider, registry);
    let results = dispatcher.audit_all(jobs, on_progress).await;
    let summary = Summary::from_results(&results);

    Ok(AuditRun {
        crawl,
        results,
        summary,
    })
}

/// Discover and audit a site with the bundled chromium provider and the
/// default detector registry.
pub async fn audit_site(config: AuditConfig) -> anyhow::Result<AuditRun> {
    let provider = Arc::new(ChromiumProvider::launch(config.headless()).await?);
    let store: Arc<dyn BaselineStore> = Arc::new(FsBaselineStore::new(config.baseline_dir()));
    let registry = default_registry(&config, store);
    audit_site_with(config, provider, registry, None).await
}
