//! Baseline store contract
//!
//! Baselines are persisted snapshots captured on first observation of a
//! URL and used as the reference for subsequent diffing. A baseline is
//! created at most once automatically per key; afterwards it is read-only
//! until an operator deletes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BaselineError;

/// What a baseline payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineKind {
    /// Document structure snapshot (JSON)
    Structure,
    /// Computed-style snapshot (JSON)
    Style,
    /// PNG screenshot
    Screenshot,
}

impl BaselineKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Style => "style",
            Self::Screenshot => "screenshot",
        }
    }

    /// File extension the filesystem store uses for this kind.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Structure | Self::Style => "json",
            Self::Screenshot => "png",
        }
    }
}

/// A stored baseline with its payload.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub url_hash: String,
    pub kind: BaselineKind,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Pluggable baseline persistence.
///
/// Keys are `(url_hash, kind, qualifier)`; the qualifier distinguishes
/// multiple baselines of one kind for the same URL (the visual detector
/// stores one screenshot per element × viewport) and is empty for
/// structural kinds.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Whether a baseline exists for this key.
    async fn exists(&self, url_hash: &str, kind: BaselineKind, qualifier: &str) -> bool;

    /// Read a baseline.
    ///
    /// Returns `BaselineError::Missing` for absent keys and
    /// `BaselineError::Unreadable` for corrupt payloads; callers treat
    /// both as "no baseline" and recreate from the current observation.
    async fn read(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
    ) -> Result<Baseline, BaselineError>;

    /// Persist a baseline payload.
    async fn write(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
        payload: &[u8],
    ) -> Result<(), BaselineError>;

    /// Operator action: remove one baseline.
    async fn delete_one(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
    ) -> Result<(), BaselineError>;

    /// Operator action: remove every stored baseline.
    async fn clear_all(&self) -> Result<(), BaselineError>;
}
