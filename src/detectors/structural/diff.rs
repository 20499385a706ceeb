//! Positional structure diffing
//!
//! Headings are compared index-by-index rather than content-matched: the
//! manipulation this detector hunts for keeps the visible text in place
//! while changing the tag around it, which positional comparison exposes
//! directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::snapshot::StructureSnapshot;

/// Reader-facing impact of a heading hierarchy change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingImpact {
    /// The page's H1 became something else
    Critical,
    /// A heading was demoted (level number grew)
    Warning,
    /// A heading was promoted (level number shrank)
    Improvement,
    Neutral,
}

/// One entry in the heading diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeadingChange {
    /// Same position, different level
    HierarchyChange {
        baseline_selector: String,
        current_selector: String,
        from_level: u8,
        to_level: u8,
        impact: HeadingImpact,
    },
    /// Same position and level, different text
    Modified {
        selector: String,
        from_text: String,
        to_text: String,
    },
    /// Present in current beyond the baseline length
    Added { selector: String, level: u8 },
    /// Present in baseline but missing in current
    Removed { selector: String, level: u8 },
}

/// One entry in the meta-tag diff, keyed by `name|property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetaTagChange {
    Added { key: String },
    Removed { key: String },
    Modified {
        key: String,
        from: String,
        to: String,
    },
}

/// One entry in the important-element diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementChange {
    Added { selector: String, count: usize },
    Removed { selector: String },
    CountChanged {
        selector: String,
        from: usize,
        to: usize,
    },
}

/// Derived structure comparison; recomputed each audit, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralDiff {
    pub heading_changes: Vec<HeadingChange>,
    pub meta_tag_changes: Vec<MetaTagChange>,
    pub element_changes: Vec<ElementChange>,
    pub has_changes: bool,
}

/// Classify the impact of a level change at one heading position.
#[must_use]
pub fn classify_impact(from_level: u8, to_level: u8) -> HeadingImpact {
    if from_level == 1 && to_level != 1 {
        HeadingImpact::Critical
    } else if to_level > from_level {
        HeadingImpact::Warning
    } else if to_level < from_level {
        HeadingImpact::Improvement
    } else {
        HeadingImpact::Neutral
    }
}

/// Compare two structure snapshots.
#[must_use]
pub fn diff_structure(baseline: &StructureSnapshot, current: &StructureSnapshot) -> StructuralDiff {
    let mut diff = StructuralDiff::default();

    // Positional heading comparison
    let shared = baseline.headings.len().min(current.headings.len());
    for i in 0..shared {
        let b = &baseline.headings[i];
        let c = &current.headings[i];
        if b.level != c.level {
            diff.heading_changes.push(HeadingChange::HierarchyChange {
                baseline_selector: b.selector.clone(),
                current_selector: c.selector.clone(),
                from_level: b.level,
                to_level: c.level,
                impact: classify_impact(b.level, c.level),
            });
        } else if b.text != c.text {
            diff.heading_changes.push(HeadingChange::Modified {
                selector: c.selector.clone(),
                from_text: b.text.clone(),
                to_text: c.text.clone(),
            });
        }
    }
    for heading in &current.headings[shared..] {
        diff.heading_changes.push(HeadingChange::Added {
            selector: heading.selector.clone(),
            level: heading.level,
        });
    }
    for heading in &baseline.headings[shared..] {
        diff.heading_changes.push(HeadingChange::Removed {
            selector: heading.selector.clone(),
            level: heading.level,
        });
    }

    // Meta tags by key
    let baseline_meta: BTreeMap<&str, &str> = baseline
        .meta_tags
        .iter()
        .map(|m| (m.key.as_str(), m.content.as_str()))
        .collect();
    let current_meta: BTreeMap<&str, &str> = current
        .meta_tags
        .iter()
        .map(|m| (m.key.as_str(), m.content.as_str()))
        .collect();

    for (key, baseline_content) in &baseline_meta {
        match current_meta.get(key) {
            None => diff.meta_tag_changes.push(MetaTagChange::Removed {
                key: (*key).to_string(),
            }),
            Some(current_content) if current_content != baseline_content => {
                diff.meta_tag_changes.push(MetaTagChange::Modified {
                    key: (*key).to_string(),
                    from: (*baseline_content).to_string(),
                    to: (*current_content).to_string(),
                });
            }
            Some(_) => {}
        }
    }
    for key in current_meta.keys() {
        if !baseline_meta.contains_key(key) {
            diff.meta_tag_changes.push(MetaTagChange::Added {
                key: (*key).to_string(),
            });
        }
    }

    // Important elements by configured selector
    let baseline_elements: BTreeMap<&str, usize> = baseline
        .important_elements
        .iter()
        .map(|e| (e.selector.as_str(), e.count))
        .collect();
    for element in &current.important_elements {
        match baseline_elements.get(element.selector.as_str()) {
            Some(&baseline_count) if baseline_count == element.count => {}
            Some(&baseline_count) => {
                if baseline_count == 0 {
                    diff.element_changes.push(ElementChange::Added {
                        selector: element.selector.clone(),
                        count: element.count,
                    });
                } else if element.count == 0 {
                    diff.element_changes.push(ElementChange::Removed {
                        selector: element.selector.clone(),
                    });
                } else {
                    diff.element_changes.push(ElementChange::CountChanged {
                        selector: element.selector.clone(),
                        from: baseline_count,
                        to: element.count,
                    });
                }
            }
            // Selector newly added to the tracked set: no baseline to
            // compare against
            None => {}
        }
    }

    diff.has_changes = !diff.heading_changes.is_empty()
        || !diff.meta_tag_changes.is_empty()
        || !diff.element_changes.is_empty();
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::structural::snapshot::{
        ElementSnapshot, HeadingSnapshot, MetaTagSnapshot,
    };

    fn heading(level: u8, text: &str, selector: &str) -> HeadingSnapshot {
        HeadingSnapshot {
            level,
            text: text.to_string(),
            selector: selector.to_string(),
        }
    }

    fn snapshot(headings: Vec<HeadingSnapshot>) -> StructureSnapshot {
        StructureSnapshot {
            title: "T".to_string(),
            headings,
            meta_tags: Vec::new(),
            important_elements: Vec::new(),
        }
    }

    #[test]
    fn h1_demotion_is_critical() {
        let baseline = snapshot(vec![
            heading(1, "Main", "h1:nth-of-type(1)"),
            heading(2, "Sub", "h2:nth-of-type(1)"),
        ]);
        let current = snapshot(vec![
            heading(3, "Main", "h3:nth-of-type(1)"),
            heading(2, "Sub", "h2:nth-of-type(1)"),
        ]);

        let diff = diff_structure(&baseline, &current);
        assert_eq!(diff.heading_changes.len(), 1);
        match &diff.heading_changes[0] {
            HeadingChange::HierarchyChange {
                from_level,
                to_level,
                impact,
                ..
            } => {
                assert_eq!(*from_level, 1);
                assert_eq!(*to_level, 3);
                assert_eq!(*impact, HeadingImpact::Critical);
            }
            other => panic!("expected hierarchy change, got {other:?}"),
        }
    }

    #[test]
    fn demotion_elsewhere_is_warning_promotion_improvement() {
        assert_eq!(classify_impact(2, 4), HeadingImpact::Warning);
        assert_eq!(classify_impact(4, 2), HeadingImpact::Improvement);
        assert_eq!(classify_impact(1, 3), HeadingImpact::Critical);
    }

    #[test]
    fn length_mismatch_yields_added_and_removed() {
        let baseline = snapshot(vec![
            heading(1, "A", "h1:nth-of-type(1)"),
            heading(2, "B", "h2:nth-of-type(1)"),
        ]);
        let current = snapshot(vec![heading(1, "A", "h1:nth-of-type(1)")]);

        let diff = diff_structure(&baseline, &current);
        assert!(matches!(
            diff.heading_changes[0],
            HeadingChange::Removed { level: 2, .. }
        ));

        let diff = diff_structure(&current, &baseline);
        assert!(matches!(
            diff.heading_changes[0],
            HeadingChange::Added { level: 2, .. }
        ));
    }

    #[test]
    fn text_change_at_same_level_is_modified() {
        let baseline = snapshot(vec![heading(1, "Old", "h1:nth-of-type(1)")]);
        let current = snapshot(vec![heading(1, "New", "h1:nth-of-type(1)")]);

        let diff = diff_structure(&baseline, &current);
        assert!(matches!(
            diff.heading_changes[0],
            HeadingChange::Modified { .. }
        ));
    }

    #[test]
    fn meta_description_removal_detected() {
        let mut baseline = snapshot(vec![]);
        baseline.meta_tags.push(MetaTagSnapshot {
            key: "description".to_string(),
            content: "hello".to_string(),
        });
        let current = snapshot(vec![]);

        let diff = diff_structure(&baseline, &current);
        assert!(matches!(
            &diff.meta_tag_changes[0],
            MetaTagChange::Removed { key } if key == "description"
        ));
        assert!(diff.has_changes);
    }

    #[test]
    fn element_count_changes_classified() {
        let mut baseline = snapshot(vec![]);
        baseline.important_elements = vec![
            ElementSnapshot {
                selector: "nav".to_string(),
                count: 1,
            },
            ElementSnapshot {
                selector: "footer".to_string(),
                count: 1,
            },
        ];
        let mut current = snapshot(vec![]);
        current.important_elements = vec![
            ElementSnapshot {
                selector: "nav".to_string(),
                count: 2,
            },
            ElementSnapshot {
                selector: "footer".to_string(),
                count: 0,
            },
        ];

        let diff = diff_structure(&baseline, &current);
        assert!(diff.element_changes.iter().any(|c| matches!(
            c,
            ElementChange::CountChanged { selector, from: 1, to: 2 } if selector == "nav"
        )));
        assert!(diff.element_changes.iter().any(|c| matches!(
            c,
            ElementChange::Removed { selector } if selector == "footer"
        )));
    }

    #[test]
    fn identical_snapshots_have_no_changes() {
        let snapshot = snapshot(vec![heading(1, "A", "h1:nth-of-type(1)")]);
        let diff = diff_structure(&snapshot, &snapshot);
        assert!(!diff.has_changes);
    }
}
