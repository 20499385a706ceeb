//! Visual regression detector
//!
//! Captures screenshots per viewport for the full page and each
//! configured element, and diffs them against stored baselines. As with
//! the structural detector, the first observation becomes the baseline,
//! so regressions are detectable from the second observation onward.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use super::pixel_diff::{PixelDiffOutcome, compare_images};
use crate::audit_engine::{AuditOutcome, Auditor, Issue, Severity, Warning};
use crate::baseline::{BaselineKind, BaselineStore};
use crate::config::Viewport;
use crate::render::{RenderContext, ScreenshotTarget};
use crate::utils::url_utils::{normalize_url, url_hash};

/// Weight of the mean changed diff-percentage in the score.
const SCORE_DIFF_WEIGHT: f64 = 0.5;
/// Weight of the changed/total comparison ratio in the score.
const SCORE_RATIO_WEIGHT: f64 = 30.0;

/// Severity of one visual change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualSeverity {
    Major,
    Moderate,
    Minor,
}

impl VisualSeverity {
    #[must_use]
    pub fn from_percentage(pct: f64) -> Self {
        if pct > 50.0 {
            Self::Major
        } else if pct > 20.0 {
            Self::Moderate
        } else {
            Self::Minor
        }
    }
}

/// How one comparison concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStatus {
    /// First observation; baseline stored, nothing to diff
    BaselineCreated,
    /// Pixel comparison ran
    Compared,
    /// Image dimensions differ; forced full diff
    DimensionChange,
    /// Baseline or capture undecodable; forced full diff
    DecodeFailure,
    /// The element selector matched nothing on the page
    TargetMissing,
}

/// One (element, viewport) comparison record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualComparison {
    pub element: String,
    pub viewport: String,
    pub status: ComparisonStatus,
    pub diff_pixels: u64,
    pub diff_percentage: f64,
    pub has_changes: bool,
    pub severity: Option<VisualSeverity>,
    /// Path of the persisted diff image, when one was written
    pub diff_image_ref: Option<String>,
}

pub struct VisualAuditor {
    store: Arc<dyn BaselineStore>,
    viewports: Vec<Viewport>,
    elements: Vec<String>,
    pixel_threshold: f64,
    global_threshold_pct: f64,
    /// Where diff images land; `None` disables persistence
    diff_dir: Option<PathBuf>,
}

impl VisualAuditor {
    #[must_use]
    pub fn new(
        store: Arc<dyn BaselineStore>,
        viewports: Vec<Viewport>,
        elements: Vec<String>,
        pixel_threshold: f64,
        global_threshold_pct: f64,
        diff_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            viewports,
            elements,
            pixel_threshold,
            global_threshold_pct,
            diff_dir,
        }
    }

    /// Compare one capture against its baseline, creating the baseline
    /// when absent.
    async fn compare_target(
        &self,
        hash: &str,
        element_label: &str,
        viewport_label: &str,
        capture: &[u8],
    ) -> anyhow::Result<VisualComparison> {
        let qualifier = format!("{element_label}@{viewport_label}");

        let baseline = match self
            .store
            .read(hash, BaselineKind::Screenshot, &qualifier)
            .await
        {
            Ok(baseline) => baseline,
            Err(e) if e.is_absent() => {
                self.store
                    .write(hash, BaselineKind::Screenshot, &qualifier, capture)
                    .await?;
                debug!("screenshot baseline created for {hash}/{qualifier}");
                return Ok(VisualComparison {
                    element: element_label.to_string(),
                    viewport: viewport_label.to_string(),
                    status: ComparisonStatus::BaselineCreated,
                    diff_pixels: 0,
                    diff_percentage: 0.0,
                    has_changes: false,
                    severity: None,
                    diff_image_ref: None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        match compare_images(&baseline.payload, capture, self.pixel_threshold) {
            Ok(PixelDiffOutcome::DimensionChange {
                baseline: from,
                current: to,
            }) => {
                warn!(
                    "dimensions changed for {hash}/{qualifier}: {}x{} -> {}x{}",
                    from.0, from.1, to.0, to.1
                );
                Ok(VisualComparison {
                    element: element_label.to_string(),
                    viewport: viewport_label.to_string(),
                    status: ComparisonStatus::DimensionChange,
                    diff_pixels: 0,
                    diff_percentage: 100.0,
                    has_changes: true,
                    severity: Some(VisualSeverity::Major),
                    diff_image_ref: None,
                })
            }
            Ok(PixelDiffOutcome::Compared {
                diff_pixels,
                total_pixels,
                diff_image_png,
            }) => {
                let diff_percentage = if total_pixels == 0 {
                    0.0
                } else {
                    diff_pixels as f64 / total_pixels as f64 * 100.0
                };
                let has_changes = diff_percentage > self.global_threshold_pct;

                let diff_image_ref = if has_changes {
                    match diff_image_png {
                        Some(png) => self.persist_diff(hash, &qualifier, &png).await,
                        None => None,
                    }
                } else {
                    None
                };

                Ok(VisualComparison {
                    element: element_label.to_string(),
                    viewport: viewport_label.to_string(),
                    status: ComparisonStatus::Compared,
                    diff_pixels,
                    diff_percentage,
                    has_changes,
                    severity: has_changes.then(|| VisualSeverity::from_percentage(diff_percentage)),
                    diff_image_ref,
                })
            }
            // Corrupt baseline or capture: forced maximal diff, never a
            // propagated failure.
            Err(e) => {
                warn!("diff computation failed for {hash}/{qualifier}: {e:#}");
                Ok(VisualComparison {
                    element: element_label.to_string(),
                    viewport: viewport_label.to_string(),
                    status: ComparisonStatus::DecodeFailure,
                    diff_pixels: 0,
                    diff_percentage: 100.0,
                    has_changes: true,
                    severity: Some(VisualSeverity::Major),
                    diff_image_ref: None,
                })
            }
        }
    }

    /// Write a diff image next to the baselines, returning its path.
    async fn persist_diff(&self, hash: &str, qualifier: &str, png: &[u8]) -> Option<String> {
        let dir = self.diff_dir.as_ref()?;
        let sanitized: String = qualifier
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let path = dir.join(hash).join(format!("diff-{sanitized}.png"));

        if let Some(parent) = path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            warn!("failed to create diff dir {}: {e}", parent.display());
            return None;
        }
        match tokio::fs::write(&path, png).await {
            Ok(()) => Some(path.display().to_string()),
            Err(e) => {
                warn!("failed to write diff image {}: {e}", path.display());
                None
            }
        }
    }
}

#[async_trait]
impl Auditor for VisualAuditor {
    fn name(&self) -> &'static str {
        "visual_regression"
    }

    async fn audit(&self, ctx: &dyn RenderContext, url: &str) -> anyhow::Result<AuditOutcome> {
        let normalized = normalize_url(url).unwrap_or_else(|_| url.to_string());
        let hash = url_hash(&normalized);

        let mut comparisons = Vec::new();

        for viewport in &self.viewports {
            ctx.set_viewport(viewport.width, viewport.height).await?;
            let viewport_label = viewport.label();

            let mut targets = vec![("full".to_string(), ScreenshotTarget::FullPage)];
            for selector in &self.elements {
                targets.push((
                    selector.clone(),
                    ScreenshotTarget::Element(selector.clone()),
                ));
            }

            for (element_label, target) in targets {
                let capture = match ctx.screenshot(target).await {
                    Ok(capture) => capture,
                    Err(e) => {
                        debug!(
                            "screenshot target {element_label} missing on {url} ({viewport_label}): {e:#}"
                        );
                        comparisons.push(VisualComparison {
                            element: element_label,
                            viewport: viewport_label.clone(),
                            status: ComparisonStatus::TargetMissing,
                            diff_pixels: 0,
                            diff_percentage: 0.0,
                            has_changes: false,
                            severity: None,
                            diff_image_ref: None,
                        });
                        continue;
                    }
                };

                let comparison = self
                    .compare_target(&hash, &element_label, &viewport_label, &capture)
                    .await?;
                comparisons.push(comparison);
            }
        }

        Ok(build_outcome(url, &comparisons))
    }
}

/// Turn the comparison records into issues, warnings and the score.
fn build_outcome(url: &str, comparisons: &[VisualComparison]) -> AuditOutcome {
    let changed: Vec<&VisualComparison> =
        comparisons.iter().filter(|c| c.has_changes).collect();
    let baseline_created = comparisons
        .iter()
        .filter(|c| c.status == ComparisonStatus::BaselineCreated)
        .count();

    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    for comparison in &changed {
        let location = format!("{} at {}", comparison.element, comparison.viewport);
        match comparison.status {
            ComparisonStatus::DimensionChange => {
                issues.push(Issue::new(
                    "dimension_change",
                    Severity::High,
                    format!("{location}: capture dimensions changed since baseline"),
                ));
            }
            ComparisonStatus::DecodeFailure => {
                issues.push(Issue::new(
                    "visual_diff_unreadable",
                    Severity::High,
                    format!("{location}: baseline or capture undecodable, treated as full change"),
                ));
            }
            _ => match comparison.severity {
                Some(VisualSeverity::Major) => {
                    issues.push(Issue::new(
                        "visual_regression",
                        Severity::High,
                        format!(
                            "{location}: {:.1}% of pixels changed",
                            comparison.diff_percentage
                        ),
                    ));
                }
                Some(VisualSeverity::Moderate) => {
                    warnings.push(Warning::new(
                        "visual_change",
                        format!(
                            "{location}: {:.1}% of pixels changed",
                            comparison.diff_percentage
                        ),
                    ));
                }
                // Minor changes stay in the comparison details
                _ => {}
            },
        }
    }

    let score = if changed.is_empty() {
        100.0
    } else {
        let mean_diff: f64 = changed.iter().map(|c| c.diff_percentage).sum::<f64>()
            / changed.len() as f64;
        let changed_ratio = changed.len() as f64 / comparisons.len().max(1) as f64;
        (100.0 - mean_diff * SCORE_DIFF_WEIGHT - changed_ratio * SCORE_RATIO_WEIGHT).max(0.0)
    };

    if baseline_created > 0 {
        info!("{baseline_created} visual baselines created for {url}");
    }

    AuditOutcome {
        issues,
        warnings,
        recommendations: Vec::new(),
        score,
        details: json!({
            "comparisons": comparisons,
            "changed_count": changed.len(),
            "baselines_created": baseline_created,
        }),
    }
}
