//! Audit jobs and compiled per-URL results
//!
//! One `AuditJob` per discovered URL goes in; one `AuditResult` per URL
//! comes out, success or failure; the aggregator always receives a
//! result for every submitted job.

use serde::{Deserialize, Serialize};

use super::auditor::{AuditOutcome, Issue, Severity, Warning};
use crate::crawl_engine::{CrawlResult, DiscoverySource};
use crate::error::AuditorError;

/// One unit of audit work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditJob {
    pub url: String,
    pub crawl_depth: u8,
    pub source: DiscoverySource,
}

impl From<CrawlResult> for AuditJob {
    fn from(result: CrawlResult) -> Self {
        Self {
            url: result.url,
            crawl_depth: result.depth,
            source: result.source,
        }
    }
}

/// One auditor's slot in a compiled result, in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditorReport {
    pub auditor: String,
    /// Present when the auditor completed
    pub outcome: Option<AuditOutcome>,
    /// Present when the auditor failed or timed out
    pub error: Option<String>,
}

/// The compiled audit of one URL. Immutable after compilation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    pub url: String,
    pub success: bool,
    pub load_time_ms: u64,
    pub status_code: Option<u16>,
    /// Per-auditor findings in stable registration order
    pub reports: Vec<AuditorReport>,
    /// Page-level merge of every auditor's findings
    pub issues: Vec<Issue>,
    pub warnings: Vec<Warning>,
    pub recommendations: Vec<String>,
    /// Mean of the successful auditors' scores (100 when none ran)
    pub score: f64,
}

impl AuditResult {
    /// Compile auditor outcomes into the final per-URL result.
    ///
    /// `outcomes` must be in registration order; failed auditors
    /// contribute a single synthetic `audit_failure` issue and an error
    /// slot instead of findings.
    #[must_use]
    pub fn compile(
        url: String,
        status_code: u16,
        load_time_ms: u64,
        outcomes: Vec<(String, Result<AuditOutcome, AuditorError>)>,
    ) -> Self {
        let mut reports = Vec::with_capacity(outcomes.len());
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();
        let mut score_sum = 0.0;
        let mut score_count = 0usize;

        for (auditor, outcome) in outcomes {
            match outcome {
                Ok(outcome) => {
                    issues.extend(outcome.issues.iter().cloned());
                    warnings.extend(outcome.warnings.iter().cloned());
                    recommendations.extend(outcome.recommendations.iter().cloned());
                    score_sum += outcome.score;
                    score_count += 1;
                    reports.push(AuditorReport {
                        auditor,
                        outcome: Some(outcome),
                        error: None,
                    });
                }
                Err(e) => {
                    issues.push(
                        Issue::new(
                            "audit_failure",
                            Severity::Medium,
                            format!("auditor {auditor} did not complete: {e}"),
                        ),
                    );
                    reports.push(AuditorReport {
                        auditor,
                        outcome: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let score = if score_count > 0 {
            score_sum / score_count as f64
        } else {
            100.0
        };

        Self {
            url,
            success: true,
            load_time_ms,
            status_code: Some(status_code),
            reports,
            issues,
            warnings,
            recommendations,
            score,
        }
    }

    /// A terminal page-level failure (navigation error or rate-limit
    /// exhaustion). No auditors ran.
    #[must_use]
    pub fn failed(url: String, code: &str, message: String) -> Self {
        Self {
            url,
            success: false,
            load_time_ms: 0,
            status_code: None,
            reports: Vec::new(),
            issues: vec![Issue::new(code, Severity::High, message)],
            warnings: Vec::new(),
            recommendations: Vec::new(),
            score: 0.0,
        }
    }

    /// Look up one auditor's report by name.
    #[must_use]
    pub fn report(&self, auditor: &str) -> Option<&AuditorReport> {
        self.reports.iter().find(|r| r.auditor == auditor)
    }
}
