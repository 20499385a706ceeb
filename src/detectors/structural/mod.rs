//! Structural manipulation detection
//!
//! Baseline-diff engine correlating heading-hierarchy changes with
//! computed-style changes on the same element.

pub mod detector;
pub mod diff;
pub mod snapshot;
pub mod style;

pub use detector::{ManipulationFinding, StructuralAuditor, correlate};
pub use diff::{
    ElementChange, HeadingChange, HeadingImpact, MetaTagChange, StructuralDiff, diff_structure,
};
pub use snapshot::{
    ElementSnapshot, HeadingSnapshot, MetaTagSnapshot, StructureSnapshot, StyleProperties,
    StyleSnapshot, extract_structure, extract_styles,
};
pub use style::{StyleChange, StyleDiff, SuspiciousStyleChange, diff_styles};
