//! Structure and computed-style snapshots
//!
//! Snapshots are extracted in-page by JS evaluation, serialized to JSON
//! for baseline storage, and diffed positionally on later observations.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::render::RenderContext;
use crate::render::js_scripts::{STYLE_SCRIPT, structure_script};

/// One heading with its positional selector.
///
/// The selector is `tag:nth-of-type(n)`, stable across observations as
/// long as the page keeps the same number of same-tag headings before
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingSnapshot {
    pub level: u8,
    pub text: String,
    pub selector: String,
}

/// One meta tag keyed by `name` or `property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTagSnapshot {
    pub key: String,
    pub content: String,
}

/// Cardinality of one tracked important element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub selector: String,
    pub count: usize,
}

/// Full document-structure snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSnapshot {
    pub title: String,
    pub headings: Vec<HeadingSnapshot>,
    pub meta_tags: Vec<MetaTagSnapshot>,
    pub important_elements: Vec<ElementSnapshot>,
}

/// Computed styles captured for one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProperties {
    #[serde(rename = "font-size")]
    pub font_size: String,
    #[serde(rename = "font-weight")]
    pub font_weight: String,
    #[serde(rename = "font-family")]
    pub font_family: String,
    pub color: String,
    pub margin: String,
    pub padding: String,
    pub display: String,
}

impl StyleProperties {
    /// Property list in a stable order, for per-property comparison.
    #[must_use]
    pub fn as_pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("font-size", self.font_size.as_str()),
            ("font-weight", self.font_weight.as_str()),
            ("font-family", self.font_family.as_str()),
            ("color", self.color.as_str()),
            ("margin", self.margin.as_str()),
            ("padding", self.padding.as_str()),
            ("display", self.display.as_str()),
        ]
    }
}

/// Style snapshot: computed properties keyed by positional selector.
pub type StyleSnapshot = BTreeMap<String, StyleProperties>;

/// Extract the structure snapshot from the rendered page.
pub async fn extract_structure(
    ctx: &dyn RenderContext,
    important_selectors: &[String],
) -> Result<StructureSnapshot> {
    let value = ctx
        .evaluate(&structure_script(important_selectors))
        .await
        .context("failed to execute structure extraction script")?;
    serde_json::from_value(value).context("failed to parse structure snapshot from JS result")
}

/// Extract the computed-style snapshot from the rendered page.
pub async fn extract_styles(ctx: &dyn RenderContext) -> Result<StyleSnapshot> {
    let value = ctx
        .evaluate(STYLE_SCRIPT)
        .await
        .context("failed to execute style extraction script")?;
    serde_json::from_value(value).context("failed to parse style snapshot from JS result")
}

/// Parse a CSS pixel length like `24px` into its numeric value.
#[must_use]
pub fn parse_px(value: &str) -> Option<f64> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

/// Map a font-weight keyword or number onto the ordinal scale.
///
/// `normal` is 400 and `bold` is 700; anything else parses numerically.
#[must_use]
pub fn font_weight_ordinal(value: &str) -> Option<f64> {
    match value.trim() {
        "normal" => Some(400.0),
        "bold" => Some(700.0),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_parsing() {
        assert_eq!(parse_px("24px"), Some(24.0));
        assert_eq!(parse_px(" 18.5px "), Some(18.5));
        assert_eq!(parse_px("1.2em"), None);
    }

    #[test]
    fn font_weight_mapping() {
        assert_eq!(font_weight_ordinal("normal"), Some(400.0));
        assert_eq!(font_weight_ordinal("bold"), Some(700.0));
        assert_eq!(font_weight_ordinal("600"), Some(600.0));
        assert_eq!(font_weight_ordinal("bolder"), None);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = StructureSnapshot {
            title: "Home".to_string(),
            headings: vec![HeadingSnapshot {
                level: 1,
                text: "Welcome".to_string(),
                selector: "h1:nth-of-type(1)".to_string(),
            }],
            meta_tags: vec![MetaTagSnapshot {
                key: "description".to_string(),
                content: "A site".to_string(),
            }],
            important_elements: vec![ElementSnapshot {
                selector: "nav".to_string(),
                count: 1,
            }],
        };
        let bytes = serde_json::to_vec(&snapshot).expect("serialize");
        let parsed: StructureSnapshot = serde_json::from_slice(&bytes).expect("deserialize");
        assert_eq!(parsed, snapshot);
    }
}
