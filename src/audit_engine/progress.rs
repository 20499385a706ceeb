//! Progress reporting for audit dispatch
//!
//! The dispatcher invokes the callback once per completed URL, in
//! completion order (which is not submission order). Counters are running
//! totals at the time of the call.

use super::result::AuditResult;

/// Snapshot passed to the progress callback after each completed URL.
#[derive(Debug)]
pub struct AuditProgress<'a> {
    /// Completed so far, including this one
    pub current: usize,
    /// Total submitted jobs
    pub total: usize,
    pub url: &'a str,
    pub result: &'a AuditResult,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Callback invoked by the dispatcher after each completed URL.
pub type ProgressCallback = Box<dyn FnMut(AuditProgress<'_>) + Send>;
