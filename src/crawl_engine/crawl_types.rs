//! Core types for discovery and navigation-failure classification
//!
//! This module contains the frontier task types and the error
//! classification used by both the crawler and the audit dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a URL entered the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoverySource {
    /// The configured seed URL
    LandingPage,
    /// Found by following links during discovery
    Discovered,
}

impl DiscoverySource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LandingPage => "landing-page",
            Self::Discovered => "discovered",
        }
    }
}

/// A frontier entry: one URL awaiting fetch at a known depth.
///
/// Created when a link passes inclusion filtering, consumed exactly once
/// by the crawl loop, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u8,
    pub discovered_at: DateTime<Utc>,
}

impl CrawlTask {
    #[must_use]
    pub fn new(url: String, depth: u8) -> Self {
        Self {
            url,
            depth,
            discovered_at: Utc::now(),
        }
    }
}

/// One discovered URL in the final crawl output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub depth: u8,
    pub source: DiscoverySource,
}

/// Categorizes navigation failures for retry decisions
///
/// Different failure kinds have different retry characteristics:
/// - Timeouts and connection resets are usually transient
/// - DNS and certificate failures rarely heal within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationErrorKind {
    /// Name resolution failed
    Dns,
    /// TCP connection refused or reset
    ConnectionRefused,
    /// TLS handshake or certificate failure
    Ssl,
    /// Navigation or load-state deadline exceeded
    Timeout,
    /// Everything else (including HTTP error statuses)
    Generic,
}

impl NavigationErrorKind {
    /// Classify an error into a failure kind based on message patterns
    #[must_use]
    pub fn classify(error: &anyhow::Error) -> Self {
        let msg = error.to_string().to_lowercase();

        if msg.contains("dns") || msg.contains("name not resolved") || msg.contains("name_not_resolved")
        {
            return Self::Dns;
        }
        if msg.contains("connection refused")
            || msg.contains("connection reset")
            || msg.contains("connection_refused")
            || msg.contains("unreachable")
        {
            return Self::ConnectionRefused;
        }
        if msg.contains("ssl") || msg.contains("tls") || msg.contains("cert") {
            return Self::Ssl;
        }
        if msg.contains("timeout") || msg.contains("timed out") {
            return Self::Timeout;
        }
        Self::Generic
    }

    /// Whether another attempt within the same run can plausibly succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionRefused | Self::Generic => true,
            Self::Dns | Self::Ssl => false,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dns => "dns",
            Self::ConnectionRefused => "connection-refused",
            Self::Ssl => "ssl",
            Self::Timeout => "timeout",
            Self::Generic => "generic",
        }
    }
}
