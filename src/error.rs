//! Typed error taxonomy for the audit engine
//!
//! Per-URL and per-plugin failures are isolated and never abort the run;
//! the enums here carry enough context for the aggregator to report them.
//! Only render-provider startup failure is fatal.

use thiserror::Error;

/// Errors from the baseline store.
///
/// `Missing` and `Unreadable` are both treated by the detectors as "no
/// baseline": the current observation becomes the new baseline instead of
/// the error propagating.
#[derive(Error, Debug)]
pub enum BaselineError {
    /// No baseline has been written for this key
    #[error("no baseline stored for {key}")]
    Missing { key: String },

    /// A baseline exists but its payload cannot be read or parsed
    #[error("baseline payload unreadable for {key}: {reason}")]
    Unreadable { key: String, reason: String },

    /// Underlying store I/O failure
    #[error("baseline store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BaselineError {
    /// Whether the caller should treat this error as an absent baseline
    /// and (re)create one from the current observation.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::Unreadable { .. })
    }
}

/// A single auditor failure, isolated from sibling auditors.
#[derive(Error, Debug, Clone)]
pub enum AuditorError {
    /// The auditor did not finish within its timeout
    #[error("auditor {name} timed out after {timeout_ms} ms")]
    Timeout { name: String, timeout_ms: u64 },

    /// The auditor returned an error
    #[error("auditor {name} failed: {message}")]
    Failed { name: String, message: String },
}

impl AuditorError {
    /// Auditor name this failure belongs to
    #[must_use]
    pub fn auditor_name(&self) -> &str {
        match self {
            Self::Timeout { name, .. } | Self::Failed { name, .. } => name,
        }
    }
}

/// Terminal outcome of the HTTP 429 backoff state machine.
#[derive(Error, Debug, Clone)]
#[error("rate limited on {url}: gave up after {attempts} retries")]
pub struct RateLimitExhausted {
    pub url: String,
    pub attempts: u8,
}

/// Fatal engine-startup failure.
///
/// The only error class that aborts a whole run: without a render
/// provider there is nothing to crawl or audit.
#[derive(Error, Debug)]
#[error("render provider failed to start: {0}")]
pub struct EngineStartError(pub String);
