//! Auditor plugin contract
//!
//! Every per-page check, the simple rule validators supplied by callers
//! as well as the two built-in detectors, implements this trait and is
//! dispatched by the audit engine. Implementations must not share mutable
//! state between concurrent invocations for different URLs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::render::RenderContext;

/// Finding severity, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// A problem an auditor found on a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Stable machine-readable code, e.g. `seo_manipulation_detected`
    pub code: String,
    pub severity: Severity,
    pub message: String,
    /// Element the issue anchors to, when known
    pub selector: Option<String>,
}

impl Issue {
    #[must_use]
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            selector: None,
        }
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// A non-blocking observation worth surfacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    pub selector: Option<String>,
}

impl Warning {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            selector: None,
        }
    }

    #[must_use]
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }
}

/// What one auditor reports for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditOutcome {
    pub issues: Vec<Issue>,
    pub warnings: Vec<Warning>,
    pub recommendations: Vec<String>,
    /// 0-100, higher is better
    pub score: f64,
    /// Auditor-specific structured findings (diff details etc.)
    pub details: serde_json::Value,
}

impl AuditOutcome {
    /// A clean outcome with full score and no findings.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            issues: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
            score: 100.0,
            details: serde_json::Value::Null,
        }
    }
}

/// The plugin contract the dispatcher consumes.
///
/// `audit` receives the page-level render context after navigation and
/// settle have completed; it must not navigate away from the page.
#[async_trait]
pub trait Auditor: Send + Sync {
    /// Stable name used as the report key and in log lines.
    fn name(&self) -> &'static str;

    /// One-time setup before the first audit. Default: nothing.
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Audit one page.
    async fn audit(&self, ctx: &dyn RenderContext, url: &str) -> anyhow::Result<AuditOutcome>;

    /// One-time teardown after the run. Default: nothing.
    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Liveness probe; unhealthy auditors are skipped. Default: healthy.
    async fn health_check(&self) -> bool {
        true
    }
}
