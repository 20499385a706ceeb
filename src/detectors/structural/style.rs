//! Computed-style diffing and suspicious-change detection
//!
//! A style change on a subordinate heading is suspicious when it pushes
//! the rendering toward a higher level's look: font-size growth beyond
//! the threshold, or any font-weight increase.

use serde::{Deserialize, Serialize};

use super::snapshot::{StyleSnapshot, font_weight_ordinal, parse_px};
use crate::utils::constants::SUSPICIOUS_FONT_SIZE_GROWTH;

/// One changed property on one tracked selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleChange {
    pub selector: String,
    pub property: String,
    pub from: String,
    pub to: String,
}

/// A style change flagged as possible visual impersonation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspiciousStyleChange {
    pub selector: String,
    pub property: String,
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// Derived style comparison; recomputed each audit, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleDiff {
    pub changes: Vec<StyleChange>,
    pub suspicious_changes: Vec<SuspiciousStyleChange>,
    pub has_changes: bool,
}

/// Whether the selector targets a subordinate heading (h2-h6).
fn is_subordinate_heading(selector: &str) -> bool {
    matches!(
        selector.get(..2),
        Some("h2" | "h3" | "h4" | "h5" | "h6")
    )
}

/// Compare two style snapshots per previously-tracked selector.
///
/// Selectors present only in the current snapshot have no baseline to
/// compare against and are skipped; the structural diff already reports
/// added elements.
#[must_use]
pub fn diff_styles(baseline: &StyleSnapshot, current: &StyleSnapshot) -> StyleDiff {
    let mut diff = StyleDiff::default();

    for (selector, baseline_props) in baseline {
        let Some(current_props) = current.get(selector) else {
            continue;
        };

        for ((property, from), (_, to)) in baseline_props
            .as_pairs()
            .into_iter()
            .zip(current_props.as_pairs())
        {
            if from == to {
                continue;
            }

            diff.changes.push(StyleChange {
                selector: selector.clone(),
                property: property.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });

            if is_subordinate_heading(selector)
                && let Some(reason) = suspicion_reason(property, from, to)
            {
                diff.suspicious_changes.push(SuspiciousStyleChange {
                    selector: selector.clone(),
                    property: property.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                    reason,
                });
            }
        }
    }

    diff.has_changes = !diff.changes.is_empty();
    diff
}

/// Why a property change on a subordinate heading is suspicious, if it
/// is.
fn suspicion_reason(property: &str, from: &str, to: &str) -> Option<String> {
    match property {
        "font-size" => {
            let from_px = parse_px(from)?;
            let to_px = parse_px(to)?;
            if from_px > 0.0 && (to_px - from_px) / from_px > SUSPICIOUS_FONT_SIZE_GROWTH {
                Some(format!(
                    "font-size grew {:.0}% ({from} -> {to})",
                    (to_px - from_px) / from_px * 100.0
                ))
            } else {
                None
            }
        }
        "font-weight" => {
            let from_ord = font_weight_ordinal(from)?;
            let to_ord = font_weight_ordinal(to)?;
            if to_ord > from_ord {
                Some(format!("font-weight increased ({from} -> {to})"))
            } else {
                None
            }
        }
        _ => None,
    }
}
