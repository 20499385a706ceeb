//! Built-in baseline-diff detectors
//!
//! Both detectors implement the `Auditor` contract and are dispatched
//! like any external rule auditor.

pub mod structural;
pub mod visual;

pub use structural::StructuralAuditor;
pub use visual::VisualAuditor;
