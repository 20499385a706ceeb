//! Type-safe builder for `AuditConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time
//! validation ensuring that required fields are set before building an
//! `AuditConfig`.

use anyhow::{Result, anyhow};
use regex::Regex;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{AuditConfig, Viewport};

/// Compile a glob pattern into a regex
///
/// Converts glob patterns (where * matches any sequence) into proper regex
/// patterns. This is done once at config creation time to avoid repeated
/// compilation in hot paths.
///
/// # Errors
///
/// Returns an error if the resulting regex pattern is invalid.
fn compile_glob_pattern(pattern: &str) -> Result<Regex> {
    let regex_pattern = pattern.replace('*', ".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| anyhow!("Invalid glob pattern '{pattern}': {e}"))
}

// Type states for the builder
pub struct WithBaselineDir;
pub struct WithStartUrl;

pub struct AuditConfigBuilder<State = ()> {
    pub(crate) inner: AuditConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for AuditConfigBuilder<()> {
    fn default() -> Self {
        Self {
            inner: AuditConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl AuditConfig {
    /// Create a builder for configuring an `AuditConfig` with a fluent
    /// interface
    #[must_use]
    pub fn builder() -> AuditConfigBuilder<()> {
        AuditConfigBuilder::default()
    }
}

impl AuditConfigBuilder<()> {
    pub fn baseline_dir(self, dir: impl Into<PathBuf>) -> AuditConfigBuilder<WithBaselineDir> {
        AuditConfigBuilder {
            inner: AuditConfig {
                baseline_dir: dir.into(),
                ..self.inner
            },
            _phantom: PhantomData,
        }
    }
}

impl AuditConfigBuilder<WithBaselineDir> {
    pub fn start_url(self, url: impl Into<String>) -> AuditConfigBuilder<WithStartUrl> {
        let url_string = url.into();

        // Normalize URL: add https:// if no scheme is present
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        AuditConfigBuilder {
            inner: AuditConfig {
                start_url: normalized_url,
                ..self.inner
            },
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl AuditConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<AuditConfig> {
        let mut config = self.inner;

        if config.max_urls == 0 {
            return Err(anyhow!("max_urls must be at least 1"));
        }
        if config.concurrent_limit == 0 {
            return Err(anyhow!("concurrent_limit must be at least 1"));
        }
        if config.rate_max_requests == 0 {
            return Err(anyhow!("rate_max_requests must be at least 1"));
        }
        if !(0.0..=1.0).contains(&config.pixel_threshold) {
            return Err(anyhow!(
                "pixel_threshold must be within 0.0..=1.0, got {}",
                config.pixel_threshold
            ));
        }

        // Compile include/exclude patterns once at config creation
        config.include_patterns_compiled = compile_all(config.include_patterns.as_ref())?;
        config.exclude_patterns_compiled = compile_all(config.exclude_patterns.as_ref())?;

        Ok(config)
    }
}

fn compile_all(patterns: Option<&Vec<String>>) -> Result<Vec<Regex>> {
    match patterns {
        Some(patterns) => patterns.iter().map(|p| compile_glob_pattern(p)).collect(),
        None => Ok(Vec::new()),
    }
}

// Setters available at any builder state
impl<State> AuditConfigBuilder<State> {
    #[must_use]
    pub fn max_depth(mut self, depth: u8) -> Self {
        self.inner.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_urls(mut self, max: usize) -> Self {
        self.inner.max_urls = max;
        self
    }

    #[must_use]
    pub fn follow_external_links(mut self, follow: bool) -> Self {
        self.inner.follow_external_links = follow;
        self
    }

    /// Glob patterns a URL must match to be discovered (when non-empty)
    #[must_use]
    pub fn include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.inner.include_patterns = Some(patterns);
        self
    }

    /// Glob patterns that exclude a URL from discovery
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.inner.exclude_patterns = Some(patterns);
        self
    }

    #[must_use]
    pub fn binary_extensions(mut self, extensions: Vec<String>) -> Self {
        self.inner.binary_extensions = extensions;
        self
    }

    #[must_use]
    pub fn link_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.inner.link_cache_ttl_secs = secs;
        self
    }

    /// Sliding-window admission control parameters
    #[must_use]
    pub fn rate_window(mut self, window_ms: u64, max_requests: usize) -> Self {
        self.inner.rate_window_ms = window_ms;
        self.inner.rate_max_requests = max_requests;
        self
    }

    #[must_use]
    pub fn concurrent_limit(mut self, limit: usize) -> Self {
        self.inner.concurrent_limit = limit;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.inner.settle_delay_ms = ms;
        self
    }

    /// Navigation retry bound and linear base delay for transient failures
    #[must_use]
    pub fn nav_retry(mut self, attempts: u8, base_delay_ms: u64) -> Self {
        self.inner.nav_retry_attempts = attempts;
        self.inner.nav_retry_base_delay_ms = base_delay_ms;
        self
    }

    /// HTTP 429 backoff base and cap (the attempt bound is fixed at 3)
    #[must_use]
    pub fn rate_limit_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.inner.rate_limit_base_delay_ms = base_delay_ms;
        self.inner.rate_limit_max_delay_ms = max_delay_ms;
        self
    }

    #[must_use]
    pub fn auditor_timeout_secs(mut self, secs: u64) -> Self {
        self.inner.auditor_timeout_secs = secs;
        self
    }

    /// Keep render contexts open for inspection; they are closed in one
    /// end-of-run pass instead of per task.
    #[must_use]
    pub fn keep_contexts_open(mut self, keep: bool) -> Self {
        self.inner.keep_contexts_open = keep;
        self
    }

    #[must_use]
    pub fn style_analysis(mut self, enabled: bool) -> Self {
        self.inner.style_analysis = enabled;
        self
    }

    #[must_use]
    pub fn viewports(mut self, viewports: Vec<Viewport>) -> Self {
        self.inner.viewports = viewports;
        self
    }

    /// Element selectors the visual detector captures in addition to the
    /// full page
    #[must_use]
    pub fn visual_elements(mut self, selectors: Vec<String>) -> Self {
        self.inner.visual_elements = selectors;
        self
    }

    #[must_use]
    pub fn pixel_threshold(mut self, threshold: f64) -> Self {
        self.inner.pixel_threshold = threshold;
        self
    }

    #[must_use]
    pub fn visual_threshold_pct(mut self, pct: f64) -> Self {
        self.inner.visual_threshold_pct = pct;
        self
    }

    #[must_use]
    pub fn important_selectors(mut self, selectors: Vec<String>) -> Self {
        self.inner.important_selectors = selectors;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.inner.headless = headless;
        self
    }
}
