//! Integration tests for the audit dispatch engine: concurrency bounds,
//! the 429 state machine, navigation retry classification, per-auditor
//! timeout isolation and progress reporting.

mod common;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{MockProvider, PageFixture};
use sitewarden::audit_engine::{
    AuditDispatcher, AuditJob, AuditOutcome, Auditor, AuditorRegistry,
};
use sitewarden::config::AuditConfig;
use sitewarden::crawl_engine::DiscoverySource;
use sitewarden::render::RenderContext;

struct FastAuditor;

#[async_trait]
impl Auditor for FastAuditor {
    fn name(&self) -> &'static str {
        "fast"
    }

    async fn audit(&self, _ctx: &dyn RenderContext, _url: &str) -> anyhow::Result<AuditOutcome> {
        Ok(AuditOutcome::clean())
    }
}

struct SlowAuditor {
    delay: Duration,
}

#[async_trait]
impl Auditor for SlowAuditor {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn audit(&self, _ctx: &dyn RenderContext, _url: &str) -> anyhow::Result<AuditOutcome> {
        tokio::time::sleep(self.delay).await;
        Ok(AuditOutcome::clean())
    }
}

struct CountingAuditor {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Auditor for CountingAuditor {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn audit(&self, _ctx: &dyn RenderContext, _url: &str) -> anyhow::Result<AuditOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuditOutcome::clean())
    }
}

fn job(url: &str) -> AuditJob {
    AuditJob {
        url: url.to_string(),
        crawl_depth: 0,
        source: DiscoverySource::Discovered,
    }
}

fn fast_config(concurrent: usize) -> AuditConfig {
    AuditConfig::builder()
        .concurrent_limit(concurrent)
        .settle_delay_ms(0)
        .nav_retry(3, 5)
        .rate_limit_backoff(5, 20)
        .auditor_timeout_secs(1)
        .baseline_dir("./unused-baselines")
        .start_url("https://site.test")
        .build()
        .expect("valid config")
}

#[tokio::test]
async fn in_flight_audits_never_exceed_concurrent_limit() {
    let mut pages = HashMap::new();
    let mut jobs = Vec::new();
    for i in 0..8 {
        let url = format!("https://site.test/p{i}");
        pages.insert(url.clone(), PageFixture::ok(&[]));
        jobs.push(job(&url));
    }

    let provider = Arc::new(MockProvider::new(pages));
    let registry = AuditorRegistry::new().register(Arc::new(FastAuditor));
    let dispatcher = AuditDispatcher::new(fast_config(2), provider.clone(), registry);

    let results = dispatcher.audit_all(jobs, None).await;
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.success));
    assert!(
        provider.max_open_contexts() <= 2,
        "peak open contexts {} exceeded the limit",
        provider.max_open_contexts()
    );
}

#[tokio::test]
async fn persistent_429_retries_three_times_then_terminal() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://site.test/limited".to_string(),
        PageFixture::ok(&[]).with_status(429),
    );

    let provider = Arc::new(MockProvider::new(pages));
    let registry = AuditorRegistry::new().register(Arc::new(FastAuditor));
    let dispatcher = AuditDispatcher::new(fast_config(1), provider.clone(), registry);

    let results = dispatcher
        .audit_all(vec![job("https://site.test/limited")], None)
        .await;

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].issues[0].code, "rate_limit_exhausted");
    // Initial navigation plus exactly 3 backoff retries, then nothing
    assert_eq!(
        provider.navigation_count("https://site.test/limited").await,
        4
    );
    // No auditor ran against the failed page
    assert!(results[0].reports.is_empty());
}

#[tokio::test]
async fn retryable_navigation_failures_respect_the_attempt_bound() {
    let mut pages = HashMap::new();
    let mut refused = PageFixture::ok(&[]);
    refused.fail_navigation = Some("connection refused".to_string());
    pages.insert("https://site.test/down".to_string(), refused);

    let provider = Arc::new(MockProvider::new(pages));
    let registry = AuditorRegistry::new().register(Arc::new(FastAuditor));
    let dispatcher = AuditDispatcher::new(fast_config(1), provider.clone(), registry);

    let results = dispatcher
        .audit_all(vec![job("https://site.test/down")], None)
        .await;

    assert!(!results[0].success);
    assert_eq!(results[0].issues[0].code, "navigation_failure");
    // nav_retry(3, _) allows 3 attempts total for retryable failures
    assert_eq!(provider.navigation_count("https://site.test/down").await, 3);
}

#[tokio::test]
async fn dns_failures_are_terminal_immediately() {
    let mut pages = HashMap::new();
    let mut dead = PageFixture::ok(&[]);
    dead.fail_navigation = Some("net::ERR_NAME_NOT_RESOLVED".to_string());
    pages.insert("https://site.test/dead".to_string(), dead);

    let provider = Arc::new(MockProvider::new(pages));
    let registry = AuditorRegistry::new().register(Arc::new(FastAuditor));
    let dispatcher = AuditDispatcher::new(fast_config(1), provider.clone(), registry);

    let results = dispatcher
        .audit_all(vec![job("https://site.test/dead")], None)
        .await;

    assert!(!results[0].success);
    assert_eq!(provider.navigation_count("https://site.test/dead").await, 1);
}

#[tokio::test]
async fn slow_auditor_times_out_without_blocking_siblings() {
    let mut pages = HashMap::new();
    pages.insert("https://site.test/".to_string(), PageFixture::ok(&[]));

    let provider = Arc::new(MockProvider::new(pages));
    let calls = Arc::new(AtomicUsize::new(0));
    // The slow auditor sleeps double its timeout
    let registry = AuditorRegistry::new()
        .register(Arc::new(SlowAuditor {
            delay: Duration::from_secs(2),
        }))
        .register(Arc::new(FastAuditor))
        .register(Arc::new(CountingAuditor {
            calls: Arc::clone(&calls),
        }));
    let dispatcher = AuditDispatcher::new(fast_config(1), provider, registry);

    let results = dispatcher
        .audit_all(vec![job("https://site.test/")], None)
        .await;

    let result = &results[0];
    assert!(result.success);

    // Reports stay in registration order
    let names: Vec<&str> = result.reports.iter().map(|r| r.auditor.as_str()).collect();
    assert_eq!(names, vec!["slow", "fast", "counting"]);

    // The slow auditor failed in isolation
    let slow = result.report("slow").expect("slow report");
    assert!(slow.outcome.is_none());
    assert!(slow.error.as_deref().unwrap_or("").contains("timed out"));

    // Siblings completed and their results were compiled
    assert!(result.report("fast").expect("fast report").outcome.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Exactly one synthetic audit_failure issue
    let failures = result
        .issues
        .iter()
        .filter(|i| i.code == "audit_failure")
        .count();
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn progress_callback_fires_once_per_url_with_running_counts() {
    let mut pages = HashMap::new();
    let mut jobs = Vec::new();
    for i in 0..3 {
        let url = format!("https://site.test/p{i}");
        pages.insert(url.clone(), PageFixture::ok(&[]));
        jobs.push(job(&url));
    }
    let mut failing = PageFixture::ok(&[]);
    failing.fail_navigation = Some("tls certificate invalid".to_string());
    pages.insert("https://site.test/broken".to_string(), failing);
    jobs.push(job("https://site.test/broken"));

    let provider = Arc::new(MockProvider::new(pages));
    let registry = AuditorRegistry::new().register(Arc::new(FastAuditor));
    let dispatcher = AuditDispatcher::new(fast_config(2), provider, registry);

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_in_callback = Arc::clone(&seen);
    let results = dispatcher
        .audit_all(
            jobs,
            Some(Box::new(move |progress| {
                seen_in_callback.lock().expect("lock").push((
                    progress.current,
                    progress.total,
                    progress.success_count,
                    progress.failure_count,
                ));
            })),
        )
        .await;

    assert_eq!(results.len(), 4);
    let seen = seen.lock().expect("lock");
    assert_eq!(seen.len(), 4);
    // `current` is monotonically increasing regardless of completion order
    for (i, (current, total, ..)) in seen.iter().enumerate() {
        assert_eq!(*current, i + 1);
        assert_eq!(*total, 4);
    }
    // Final counters add up
    let (_, _, successes, failures) = seen[3];
    assert_eq!(successes + failures, 4);
    assert_eq!(failures, 1);
}
