//! Structural manipulation detector
//!
//! Correlates heading-hierarchy changes with computed-style changes on
//! the same element: a heading demoted in the markup but restyled to
//! keep its original visual prominence is the signature of SEO
//! manipulation meant to be invisible to readers.
//!
//! The first observation of a URL becomes its baseline, so a page that
//! is already manipulated when first seen is its own "clean" reference;
//! detection is effective from the second observation onward.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::diff::{HeadingChange, HeadingImpact, MetaTagChange, StructuralDiff, diff_structure};
use super::snapshot::{StructureSnapshot, StyleSnapshot, extract_structure, extract_styles};
use super::style::{StyleDiff, SuspiciousStyleChange, diff_styles};
use crate::audit_engine::{AuditOutcome, Auditor, Issue, Severity, Warning};
use crate::baseline::{BaselineKind, BaselineStore};
use crate::render::RenderContext;
use crate::utils::url_utils::{normalize_url, url_hash};

/// Score penalties, subtracted from 100 and floored at 0.
const PENALTY_CRITICAL_HEADING: f64 = 30.0;
const PENALTY_WARNING_HEADING: f64 = 15.0;
const PENALTY_REMOVED_HEADING: f64 = 10.0;
const PENALTY_REMOVED_META: f64 = 20.0;
const PENALTY_MODIFIED_META: f64 = 5.0;
const PENALTY_CORRELATED_MANIPULATION: f64 = 25.0;

/// A correlated structural + style manipulation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ManipulationFinding {
    pub selector: String,
    pub from_level: u8,
    pub to_level: u8,
    pub style_property: String,
    pub style_from: String,
    pub style_to: String,
}

pub struct StructuralAuditor {
    store: Arc<dyn BaselineStore>,
    important_selectors: Vec<String>,
    style_analysis: bool,
}

impl StructuralAuditor {
    #[must_use]
    pub fn new(
        store: Arc<dyn BaselineStore>,
        important_selectors: Vec<String>,
        style_analysis: bool,
    ) -> Self {
        Self {
            store,
            important_selectors,
            style_analysis,
        }
    }

    /// Read a JSON baseline, treating missing or corrupt payloads as
    /// absent.
    async fn read_json_baseline<T: serde::de::DeserializeOwned>(
        &self,
        hash: &str,
        kind: BaselineKind,
    ) -> anyhow::Result<Option<T>> {
        match self.store.read(hash, kind, "").await {
            Ok(baseline) => match serde_json::from_slice(&baseline.payload) {
                Ok(parsed) => Ok(Some(parsed)),
                Err(e) => {
                    warn!(
                        "corrupt {} baseline for {hash}, recreating: {e}",
                        kind.as_str()
                    );
                    Ok(None)
                }
            },
            Err(e) if e.is_absent() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Auditor for StructuralAuditor {
    fn name(&self) -> &'static str {
        "structural_manipulation"
    }

    async fn audit(&self, ctx: &dyn RenderContext, url: &str) -> anyhow::Result<AuditOutcome> {
        let normalized = normalize_url(url).unwrap_or_else(|_| url.to_string());
        let hash = url_hash(&normalized);

        let current_structure = extract_structure(ctx, &self.important_selectors).await?;
        let current_styles = if self.style_analysis {
            Some(extract_styles(ctx).await?)
        } else {
            None
        };

        let baseline_structure: Option<StructureSnapshot> = self
            .read_json_baseline(&hash, BaselineKind::Structure)
            .await?;

        let Some(baseline_structure) = baseline_structure else {
            // First observation: persist and report clean.
            self.store
                .write(
                    &hash,
                    BaselineKind::Structure,
                    "",
                    &serde_json::to_vec(&current_structure)?,
                )
                .await?;
            if let Some(styles) = &current_styles {
                self.store
                    .write(&hash, BaselineKind::Style, "", &serde_json::to_vec(styles)?)
                    .await?;
            }
            info!("structure baseline created for {url}");
            return Ok(AuditOutcome {
                details: json!({ "baseline_created": true }),
                ..AuditOutcome::clean()
            });
        };

        let structure_diff = diff_structure(&baseline_structure, &current_structure);

        let style_diff = match &current_styles {
            Some(current_styles) => {
                let baseline_styles: Option<StyleSnapshot> =
                    self.read_json_baseline(&hash, BaselineKind::Style).await?;
                match baseline_styles {
                    Some(baseline_styles) => Some(diff_styles(&baseline_styles, current_styles)),
                    None => {
                        // Style analysis enabled after the structure
                        // baseline existed: backfill and skip this round.
                        self.store
                            .write(
                                &hash,
                                BaselineKind::Style,
                                "",
                                &serde_json::to_vec(current_styles)?,
                            )
                            .await?;
                        debug!("style baseline backfilled for {url}");
                        None
                    }
                }
            }
            None => None,
        };

        let manipulations = match &style_diff {
            Some(style_diff) => correlate(&structure_diff, style_diff),
            None => Vec::new(),
        };

        Ok(build_outcome(
            &structure_diff,
            style_diff.as_ref(),
            &manipulations,
        ))
    }
}

/// The signature step: match suspicious style changes against hierarchy
/// changes on the same element.
#[must_use]
pub fn correlate(
    structure_diff: &StructuralDiff,
    style_diff: &StyleDiff,
) -> Vec<ManipulationFinding> {
    style_diff
        .suspicious_changes
        .iter()
        .filter_map(|suspicious| {
            structure_diff
                .heading_changes
                .iter()
                .find_map(|change| match change {
                    HeadingChange::HierarchyChange {
                        current_selector,
                        from_level,
                        to_level,
                        ..
                    } if *current_selector == suspicious.selector => Some(ManipulationFinding {
                        selector: suspicious.selector.clone(),
                        from_level: *from_level,
                        to_level: *to_level,
                        style_property: suspicious.property.clone(),
                        style_from: suspicious.from.clone(),
                        style_to: suspicious.to.clone(),
                    }),
                    _ => None,
                })
        })
        .collect()
}

/// Turn the diffs into issues, warnings and the score.
fn build_outcome(
    structure_diff: &StructuralDiff,
    style_diff: Option<&StyleDiff>,
    manipulations: &[ManipulationFinding],
) -> AuditOutcome {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();
    let mut score = 100.0;

    for change in &structure_diff.heading_changes {
        match change {
            HeadingChange::HierarchyChange {
                current_selector,
                from_level,
                to_level,
                impact,
                ..
            } => match impact {
                HeadingImpact::Critical => {
                    score -= PENALTY_CRITICAL_HEADING;
                    issues.push(
                        Issue::new(
                            "heading_hierarchy_change",
                            Severity::High,
                            format!("H{from_level} became H{to_level}"),
                        )
                        .with_selector(current_selector.clone()),
                    );
                }
                HeadingImpact::Warning => {
                    score -= PENALTY_WARNING_HEADING;
                    warnings.push(
                        Warning::new(
                            "heading_demoted",
                            format!("H{from_level} demoted to H{to_level}"),
                        )
                        .with_selector(current_selector.clone()),
                    );
                }
                HeadingImpact::Improvement | HeadingImpact::Neutral => {}
            },
            HeadingChange::Removed { selector, level } => {
                score -= PENALTY_REMOVED_HEADING;
                warnings.push(
                    Warning::new("heading_removed", format!("H{level} removed"))
                        .with_selector(selector.clone()),
                );
            }
            HeadingChange::Modified { .. } | HeadingChange::Added { .. } => {}
        }
    }

    for change in &structure_diff.meta_tag_changes {
        match change {
            MetaTagChange::Removed { key } if key == "description" => {
                score -= PENALTY_REMOVED_META;
                issues.push(Issue::new(
                    "meta_description_removed",
                    Severity::High,
                    "meta description was removed",
                ));
            }
            MetaTagChange::Modified { key, .. } if key == "description" => {
                score -= PENALTY_MODIFIED_META;
                warnings.push(Warning::new(
                    "meta_description_modified",
                    "meta description changed since baseline",
                ));
            }
            // Other meta changes are informational; they stay in the
            // diff details.
            _ => {}
        }
    }

    for finding in manipulations {
        score -= PENALTY_CORRELATED_MANIPULATION;
        issues.push(
            Issue::new(
                "seo_manipulation_detected",
                Severity::Critical,
                format!(
                    "H{} demoted to H{} but {} restyled ({} -> {}) to keep its original prominence",
                    finding.from_level,
                    finding.to_level,
                    finding.style_property,
                    finding.style_from,
                    finding.style_to
                ),
            )
            .with_selector(finding.selector.clone()),
        );
    }

    // Suspicious styling with no matching structural change is a
    // lower-severity signal on its own.
    if let Some(style_diff) = style_diff {
        for suspicious in uncorrelated(style_diff, manipulations) {
            warnings.push(
                Warning::new(
                    "suspicious_styling",
                    format!("{}: {}", suspicious.property, suspicious.reason),
                )
                .with_selector(suspicious.selector.clone()),
            );
        }
    }

    if !manipulations.is_empty() {
        recommendations.push(
            "Review recent template changes: heading levels and styles diverge in a way \
             consistent with deliberate search-ranking manipulation"
                .to_string(),
        );
    }

    AuditOutcome {
        issues,
        warnings,
        recommendations,
        score: score.max(0.0),
        details: json!({
            "structure_comparison": structure_diff,
            "styling_comparison": style_diff,
            "manipulations": manipulations,
            "baseline_created": false,
        }),
    }
}

fn uncorrelated<'a>(
    style_diff: &'a StyleDiff,
    manipulations: &[ManipulationFinding],
) -> Vec<&'a SuspiciousStyleChange> {
    style_diff
        .suspicious_changes
        .iter()
        .filter(|s| {
            !manipulations
                .iter()
                .any(|m| m.selector == s.selector && m.style_property == s.property)
        })
        .collect()
}
