//! Visual regression detection
//!
//! Baseline-diff engine over per-viewport screenshots with an
//! anti-aliasing-tolerant pixel comparison.

pub mod detector;
pub mod pixel_diff;

pub use detector::{ComparisonStatus, VisualAuditor, VisualComparison, VisualSeverity};
pub use pixel_diff::{PixelDiffOutcome, compare_images};
