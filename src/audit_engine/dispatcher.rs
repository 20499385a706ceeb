//! Bounded-concurrency audit dispatch
//!
//! Runs every registered auditor against every submitted URL. Worker
//! slots come from a semaphore (never a sleep-then-poll loop); completed
//! tasks are drained by the single coordinating loop, which owns the
//! result list and the progress counters.
//!
//! Within one URL, navigation strictly precedes plugins; the plugins then
//! run concurrently, each inside an independent timeout. A slow or
//! failing plugin becomes a failed-auditor entry without touching its
//! siblings or the page.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};

use super::auditor::{AuditOutcome, Auditor};
use super::pacing::Pacer;
use super::progress::{AuditProgress, ProgressCallback};
use super::rate_limit_state::{RateLimitAction, RateLimitState};
use super::registry::AuditorRegistry;
use super::result::{AuditJob, AuditResult};
use crate::config::AuditConfig;
use crate::error::{AuditorError, RateLimitExhausted};
use crate::crawl_engine::NavigationErrorKind;
use crate::render::{LoadState, NavigationResponse, RenderContext, RenderProvider};

/// Contexts kept open for inspection, closed in one end-of-run pass.
type RetainedContexts = Arc<Mutex<Vec<Box<dyn RenderContext>>>>;

pub struct AuditDispatcher {
    config: AuditConfig,
    provider: Arc<dyn RenderProvider>,
    registry: AuditorRegistry,
}

impl AuditDispatcher {
    #[must_use]
    pub fn new(
        config: AuditConfig,
        provider: Arc<dyn RenderProvider>,
        registry: AuditorRegistry,
    ) -> Self {
        Self {
            config,
            provider,
            registry,
        }
    }

    /// Audit every submitted URL.
    ///
    /// Always returns one result per job, success or failure; per-URL
    /// failures never abort the run. The progress callback fires after
    /// each completed URL in completion order.
    pub async fn audit_all(
        &self,
        jobs: Vec<AuditJob>,
        mut on_progress: Option<ProgressCallback>,
    ) -> Vec<AuditResult> {
        let total = jobs.len();
        let auditors: Arc<Vec<Arc<dyn Auditor>>> = Arc::new(self.registry.initialize_all().await);
        let pacer = Arc::new(Pacer::new());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_limit()));
        let retained: RetainedContexts = Arc::new(Mutex::new(Vec::new()));

        info!(
            "dispatching {total} audit jobs across {} workers, {} auditors",
            self.config.concurrent_limit(),
            auditors.len()
        );

        let mut pending = jobs.into_iter();
        let mut active_tasks = FuturesUnordered::new();
        let mut results = Vec::with_capacity(total);
        let mut success_count = 0usize;
        let mut failure_count = 0usize;

        loop {
            // Fill up to the concurrency limit
            while active_tasks.len() < self.config.concurrent_limit() {
                let Some(job) = pending.next() else { break };

                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        error!("worker semaphore closed unexpectedly");
                        break;
                    }
                };

                let config = self.config.clone();
                let provider = Arc::clone(&self.provider);
                let auditors = Arc::clone(&auditors);
                let pacer = Arc::clone(&pacer);
                let retained = Arc::clone(&retained);
                let url_for_panic = job.url.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permit; // released when the task finishes
                    audit_one(&config, provider.as_ref(), &auditors, &pacer, &retained, job)
                        .await
                });

                active_tasks.push(async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(e) => AuditResult::failed(
                            url_for_panic,
                            "audit_panic",
                            format!("audit task panicked: {e}"),
                        ),
                    }
                });
            }

            // Drain one completion; the coordinating loop is the only
            // writer of counters and the result list.
            match active_tasks.next().await {
                Some(result) => {
                    if result.success {
                        success_count += 1;
                    } else {
                        failure_count += 1;
                    }
                    if let Some(callback) = on_progress.as_mut() {
                        callback(AuditProgress {
                            current: results.len() + 1,
                            total,
                            url: &result.url,
                            result: &result,
                            success_count,
                            failure_count,
                        });
                    }
                    results.push(result);
                }
                None => break, // no active tasks and no pending jobs
            }
        }

        self.registry.cleanup_all().await;
        close_retained(&retained).await;

        info!("audit run complete: {success_count} succeeded, {failure_count} failed");
        results
    }
}

/// Close every context retained by keep-open mode.
async fn close_retained(retained: &RetainedContexts) {
    let mut contexts = retained.lock().await;
    if contexts.is_empty() {
        return;
    }
    info!("closing {} retained render contexts", contexts.len());
    for ctx in contexts.drain(..) {
        if let Err(e) = ctx.close().await {
            warn!("failed to close retained context: {e}");
        }
    }
}

/// Release a task's context: close it, or hand it to the bulk closer in
/// keep-open mode.
async fn release_context(
    config: &AuditConfig,
    retained: &RetainedContexts,
    ctx: Box<dyn RenderContext>,
) {
    if config.keep_contexts_open() {
        retained.lock().await.push(ctx);
    } else if let Err(e) = ctx.close().await {
        warn!("failed to close render context: {e}");
    }
}

/// Run the full audit pipeline for one URL.
async fn audit_one(
    config: &AuditConfig,
    provider: &dyn RenderProvider,
    auditors: &[Arc<dyn Auditor>],
    pacer: &Pacer,
    retained: &RetainedContexts,
    job: AuditJob,
) -> AuditResult {
    pacer.pace().await;

    let ctx = match provider.new_context().await {
        Ok(ctx) => ctx,
        Err(e) => {
            return AuditResult::failed(
                job.url,
                "render_context_failure",
                format!("failed to open render context: {e:#}"),
            );
        }
    };

    let started = Instant::now();
    let response = match navigate_with_retry(config, ctx.as_ref(), &job.url).await {
        Ok(response) => response,
        Err((code, message)) => {
            release_context(config, retained, ctx).await;
            return AuditResult::failed(job.url, code, message);
        }
    };

    // Settle before any plugin sees the page
    tokio::time::sleep(config.settle_delay()).await;
    if let Err(e) = ctx
        .wait_for_load_state(LoadState::NetworkIdle, config.navigation_timeout())
        .await
    {
        warn!("load-state wait failed for {}: {e:#}", job.url);
    }
    let load_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let outcomes = run_auditors(config, ctx.as_ref(), auditors, &job.url).await;
    let result = AuditResult::compile(job.url, response.status, load_time_ms, outcomes);

    release_context(config, retained, ctx).await;
    result
}

/// Navigate with bounded retry for transient failures and the 429
/// backoff state machine for rate limiting.
///
/// Returns `(issue_code, message)` on terminal failure.
async fn navigate_with_retry(
    config: &AuditConfig,
    ctx: &dyn RenderContext,
    url: &str,
) -> Result<NavigationResponse, (&'static str, String)> {
    let mut nav_attempt: u8 = 0;
    let mut rl_state = RateLimitState::new();

    loop {
        match ctx.navigate(url, config.navigation_timeout()).await {
            Ok(response) if response.is_rate_limited() => {
                match rl_state.on_rate_limited(
                    config.rate_limit_base_delay(),
                    config.rate_limit_max_delay(),
                ) {
                    RateLimitAction::Retry { delay } => {
                        info!(
                            target: "sitewarden::dispatch",
                            "429 from {url}, retry {} in {delay:?}",
                            rl_state.attempts()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RateLimitAction::PermanentlyFailed => {
                        let err = RateLimitExhausted {
                            url: url.to_string(),
                            attempts: rl_state.attempts(),
                        };
                        return Err(("rate_limit_exhausted", err.to_string()));
                    }
                }
            }
            // Any other status is an auditable page; the status code is
            // recorded in the result.
            Ok(response) => return Ok(response),
            Err(e) => {
                let kind = NavigationErrorKind::classify(&e);
                nav_attempt += 1;
                if kind.is_retryable() && nav_attempt < config.nav_retry_attempts() {
                    let base = config.nav_retry_base_delay();
                    let jitter_ms = rand::rng().random_range(0..=250);
                    let delay = base.saturating_mul(u32::from(nav_attempt))
                        + Duration::from_millis(jitter_ms);
                    debug!(
                        target: "sitewarden::dispatch",
                        "navigation attempt {nav_attempt} failed for {url} ({}), retrying in {delay:?}",
                        kind.as_str()
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    return Err((
                        "navigation_failure",
                        format!("{} error after {nav_attempt} attempts: {e:#}", kind.as_str()),
                    ));
                }
            }
        }
    }
}

/// Run every auditor concurrently, each inside its own timeout.
///
/// One auditor's timeout or failure never cancels its siblings; the
/// returned list is in the auditors' registration order.
async fn run_auditors(
    config: &AuditConfig,
    ctx: &dyn RenderContext,
    auditors: &[Arc<dyn Auditor>],
    url: &str,
) -> Vec<(String, Result<AuditOutcome, AuditorError>)> {
    let timeout = config.auditor_timeout();

    futures::future::join_all(auditors.iter().map(|auditor| {
        let auditor = Arc::clone(auditor);
        async move {
            let name = auditor.name().to_string();

            if !auditor.health_check().await {
                return (
                    name.clone(),
                    Err(AuditorError::Failed {
                        name,
                        message: "health check failed".to_string(),
                    }),
                );
            }

            match tokio::time::timeout(timeout, auditor.audit(ctx, url)).await {
                Ok(Ok(outcome)) => (name, Ok(outcome)),
                Ok(Err(e)) => {
                    let message = format!("{e:#}");
                    (
                        name.clone(),
                        Err(AuditorError::Failed { name, message }),
                    )
                }
                Err(_) => {
                    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                    (
                        name.clone(),
                        Err(AuditorError::Timeout { name, timeout_ms }),
                    )
                }
            }
        }
    }))
    .await
}
