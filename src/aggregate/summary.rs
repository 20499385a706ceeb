//! Run-level summary
//!
//! The aggregator owns the compiled results and reduces them to the
//! summary reporting collaborators consume. A summary is always
//! produced, with an explicit failure flag when nothing succeeded, so
//! reporting can proceed against partial results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit_engine::AuditResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_urls: usize,
    pub successful_audits: usize,
    pub failed_audits: usize,
    /// Mean score across successful audits (0 when none succeeded)
    pub average_score: f64,
    pub total_issues: usize,
    pub total_warnings: usize,
    /// URLs flagged with a correlated SEO manipulation
    pub manipulation_flags: usize,
    /// URLs flagged with a visual regression or dimension change
    pub visual_flags: usize,
    /// True when the successful-audit count is zero
    pub all_failed: bool,
    pub generated_at: DateTime<Utc>,
}

impl Summary {
    /// Reduce per-URL results into the run summary.
    #[must_use]
    pub fn from_results(results: &[AuditResult]) -> Self {
        let successful: Vec<&AuditResult> = results.iter().filter(|r| r.success).collect();
        let failed_audits = results.len() - successful.len();

        let average_score = if successful.is_empty() {
            0.0
        } else {
            successful.iter().map(|r| r.score).sum::<f64>() / successful.len() as f64
        };

        let manipulation_flags = results
            .iter()
            .filter(|r| {
                r.issues
                    .iter()
                    .any(|i| i.code == "seo_manipulation_detected")
            })
            .count();
        let visual_flags = results
            .iter()
            .filter(|r| {
                r.issues
                    .iter()
                    .any(|i| i.code == "visual_regression" || i.code == "dimension_change")
            })
            .count();

        Self {
            total_urls: results.len(),
            successful_audits: successful.len(),
            failed_audits,
            average_score,
            total_issues: results.iter().map(|r| r.issues.len()).sum(),
            total_warnings: results.iter().map(|r| r.warnings.len()).sum(),
            manipulation_flags,
            visual_flags,
            all_failed: successful.is_empty(),
            generated_at: Utc::now(),
        }
    }
}
