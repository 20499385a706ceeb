//! Getter methods for `AuditConfig`
//!
//! This module provides all the accessor methods for retrieving
//! configuration values from an `AuditConfig` instance.

use std::path::PathBuf;
use std::time::Duration;

use super::types::{AuditConfig, Viewport};

impl AuditConfig {
    #[must_use]
    pub fn baseline_dir(&self) -> &PathBuf {
        &self.baseline_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    #[must_use]
    pub fn max_urls(&self) -> usize {
        self.max_urls
    }

    #[must_use]
    pub fn follow_external_links(&self) -> bool {
        self.follow_external_links
    }

    #[must_use]
    pub fn include_patterns(&self) -> Option<&Vec<String>> {
        self.include_patterns.as_ref()
    }

    #[must_use]
    pub fn exclude_patterns(&self) -> Option<&Vec<String>> {
        self.exclude_patterns.as_ref()
    }

    /// Pre-compiled include patterns (empty when none configured)
    #[must_use]
    pub fn include_patterns_compiled(&self) -> &[regex::Regex] {
        &self.include_patterns_compiled
    }

    /// Pre-compiled exclude patterns (empty when none configured)
    #[must_use]
    pub fn exclude_patterns_compiled(&self) -> &[regex::Regex] {
        &self.exclude_patterns_compiled
    }

    #[must_use]
    pub fn binary_extensions(&self) -> &[String] {
        &self.binary_extensions
    }

    #[must_use]
    pub fn link_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.link_cache_ttl_secs)
    }

    #[must_use]
    pub fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }

    #[must_use]
    pub fn rate_max_requests(&self) -> usize {
        self.rate_max_requests
    }

    #[must_use]
    pub fn concurrent_limit(&self) -> usize {
        self.concurrent_limit
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn nav_retry_attempts(&self) -> u8 {
        self.nav_retry_attempts
    }

    #[must_use]
    pub fn nav_retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.nav_retry_base_delay_ms)
    }

    #[must_use]
    pub fn rate_limit_base_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_base_delay_ms)
    }

    #[must_use]
    pub fn rate_limit_max_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_max_delay_ms)
    }

    #[must_use]
    pub fn auditor_timeout(&self) -> Duration {
        Duration::from_secs(self.auditor_timeout_secs)
    }

    #[must_use]
    pub fn keep_contexts_open(&self) -> bool {
        self.keep_contexts_open
    }

    #[must_use]
    pub fn style_analysis(&self) -> bool {
        self.style_analysis
    }

    #[must_use]
    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports
    }

    #[must_use]
    pub fn visual_elements(&self) -> &[String] {
        &self.visual_elements
    }

    #[must_use]
    pub fn pixel_threshold(&self) -> f64 {
        self.pixel_threshold
    }

    #[must_use]
    pub fn visual_threshold_pct(&self) -> f64 {
        self.visual_threshold_pct
    }

    #[must_use]
    pub fn important_selectors(&self) -> &[String] {
        &self.important_selectors
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }
}
