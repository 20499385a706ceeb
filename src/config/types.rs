//! Core configuration types for audit runs
//!
//! This module contains the main `AuditConfig` struct and its associated
//! types that define the parameters for discovery and audit dispatch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::constants::*;

/// A named viewport the visual detector captures screenshots at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }

    /// Label used in baseline qualifiers and findings, e.g. `desktop-1920x1080`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}x{}", self.name, self.width, self.height)
    }
}

/// Default viewport set: one desktop, one mobile.
#[must_use]
pub fn default_viewports() -> Vec<Viewport> {
    vec![
        Viewport::new("desktop", 1920, 1080),
        Viewport::new("mobile", 375, 812),
    ]
}

/// Main configuration for a discovery + audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Root directory for persisted baselines and diff images.
    ///
    /// **INVARIANT:** set through the builder, which also creates it
    /// lazily on first baseline write.
    pub(crate) baseline_dir: PathBuf,
    pub(crate) start_url: String,

    pub(crate) max_depth: u8,
    pub(crate) max_urls: usize,
    pub(crate) follow_external_links: bool,
    pub(crate) include_patterns: Option<Vec<String>>,
    pub(crate) exclude_patterns: Option<Vec<String>>,

    /// Compiled regexes from `include_patterns` / `exclude_patterns`.
    /// Pre-compiled at config creation to avoid hot-path regex compilation.
    #[serde(skip)]
    pub(crate) include_patterns_compiled: Vec<regex::Regex>,
    #[serde(skip)]
    pub(crate) exclude_patterns_compiled: Vec<regex::Regex>,

    pub(crate) binary_extensions: Vec<String>,
    pub(crate) link_cache_ttl_secs: u64,

    /// Sliding-window admission control: at most `rate_max_requests`
    /// fetches per `rate_window_ms` window.
    pub(crate) rate_window_ms: u64,
    pub(crate) rate_max_requests: usize,

    /// Audit worker-pool size; also bounds simultaneously open render
    /// contexts.
    pub(crate) concurrent_limit: usize,

    pub(crate) navigation_timeout_secs: u64,
    pub(crate) settle_delay_ms: u64,
    pub(crate) nav_retry_attempts: u8,
    pub(crate) nav_retry_base_delay_ms: u64,
    pub(crate) rate_limit_base_delay_ms: u64,
    pub(crate) rate_limit_max_delay_ms: u64,
    pub(crate) auditor_timeout_secs: u64,

    /// Debug mode: leave render contexts open for inspection and close
    /// them in one end-of-run pass instead of per task.
    pub(crate) keep_contexts_open: bool,

    /// Capture and diff computed styles alongside document structure.
    pub(crate) style_analysis: bool,

    pub(crate) viewports: Vec<Viewport>,
    /// Element selectors captured in addition to the full page.
    pub(crate) visual_elements: Vec<String>,
    pub(crate) pixel_threshold: f64,
    pub(crate) visual_threshold_pct: f64,

    pub(crate) important_selectors: Vec<String>,
    pub(crate) headless: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("./baselines"),
            start_url: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_urls: DEFAULT_MAX_URLS,
            follow_external_links: false,
            include_patterns: None,
            exclude_patterns: None,
            include_patterns_compiled: Vec::new(),
            exclude_patterns_compiled: Vec::new(),
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            link_cache_ttl_secs: DEFAULT_LINK_CACHE_TTL_SECS,
            rate_window_ms: DEFAULT_RATE_WINDOW_MS,
            rate_max_requests: DEFAULT_RATE_MAX_REQUESTS,
            concurrent_limit: DEFAULT_CONCURRENT_LIMIT,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            nav_retry_attempts: DEFAULT_NAV_RETRY_ATTEMPTS,
            nav_retry_base_delay_ms: DEFAULT_NAV_RETRY_BASE_DELAY_MS,
            rate_limit_base_delay_ms: RATE_LIMIT_BASE_DELAY_MS,
            rate_limit_max_delay_ms: RATE_LIMIT_MAX_DELAY_MS,
            auditor_timeout_secs: DEFAULT_AUDITOR_TIMEOUT_SECS,
            keep_contexts_open: false,
            style_analysis: true,
            viewports: default_viewports(),
            visual_elements: Vec::new(),
            pixel_threshold: PIXEL_COLOR_DISTANCE_THRESHOLD,
            visual_threshold_pct: VISUAL_GLOBAL_THRESHOLD_PCT,
            important_selectors: DEFAULT_IMPORTANT_SELECTORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            headless: true,
        }
    }
}
