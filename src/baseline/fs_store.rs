//! Filesystem baseline store
//!
//! Layout: `<root>/<url_hash>/<kind>[-<qualifier>].<ext>`. Directories
//! are created lazily on first write. Unreadable payload files surface as
//! `BaselineError::Unreadable` so callers fall back to re-baselining.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::path::{Path, PathBuf};

use super::store::{Baseline, BaselineKind, BaselineStore};
use crate::error::BaselineError;

pub struct FsBaselineStore {
    root: PathBuf,
}

impl FsBaselineStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, url_hash: &str, kind: BaselineKind, qualifier: &str) -> PathBuf {
        let file_name = if qualifier.is_empty() {
            format!("{}.{}", kind.as_str(), kind.extension())
        } else {
            format!(
                "{}-{}.{}",
                kind.as_str(),
                sanitize_qualifier(qualifier),
                kind.extension()
            )
        };
        self.root.join(url_hash).join(file_name)
    }

    fn key_label(url_hash: &str, kind: BaselineKind, qualifier: &str) -> String {
        if qualifier.is_empty() {
            format!("{url_hash}/{}", kind.as_str())
        } else {
            format!("{url_hash}/{}-{qualifier}", kind.as_str())
        }
    }
}

/// Replace path-hostile characters so selectors like `nav > ul` make
/// valid file names.
fn sanitize_qualifier(qualifier: &str) -> String {
    qualifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl BaselineStore for FsBaselineStore {
    async fn exists(&self, url_hash: &str, kind: BaselineKind, qualifier: &str) -> bool {
        tokio::fs::try_exists(self.path_for(url_hash, kind, qualifier))
            .await
            .unwrap_or(false)
    }

    async fn read(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
    ) -> Result<Baseline, BaselineError> {
        let path = self.path_for(url_hash, kind, qualifier);
        let key = Self::key_label(url_hash, kind, qualifier);

        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BaselineError::Missing { key });
            }
            Err(e) => {
                return Err(BaselineError::Unreadable {
                    key,
                    reason: e.to_string(),
                });
            }
        };

        if payload.is_empty() {
            return Err(BaselineError::Unreadable {
                key,
                reason: "empty payload".to_string(),
            });
        }

        let created_at = tokio::fs::metadata(&path)
            .await
            .ok()
            .and_then(|meta| meta.modified().ok())
            .map_or_else(Utc::now, DateTime::<Utc>::from);

        Ok(Baseline {
            url_hash: url_hash.to_string(),
            kind,
            payload,
            created_at,
        })
    }

    async fn write(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
        payload: &[u8],
    ) -> Result<(), BaselineError> {
        let path = self.path_for(url_hash, kind, qualifier);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, payload).await?;
        debug!(
            "baseline written: {} ({} bytes)",
            Self::key_label(url_hash, kind, qualifier),
            payload.len()
        );
        Ok(())
    }

    async fn delete_one(
        &self,
        url_hash: &str,
        kind: BaselineKind,
        qualifier: &str,
    ) -> Result<(), BaselineError> {
        let path = self.path_for(url_hash, kind, qualifier);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BaselineError::Io(e)),
        }
    }

    async fn clear_all(&self) -> Result<(), BaselineError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BaselineError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBaselineStore::new(dir.path());

        store
            .write("abc123", BaselineKind::Structure, "", b"{\"title\":\"x\"}")
            .await
            .expect("write");

        assert!(store.exists("abc123", BaselineKind::Structure, "").await);
        let baseline = store
            .read("abc123", BaselineKind::Structure, "")
            .await
            .expect("read");
        assert_eq!(baseline.payload, b"{\"title\":\"x\"}");
        assert_eq!(baseline.kind, BaselineKind::Structure);
    }

    #[tokio::test]
    async fn missing_baseline_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBaselineStore::new(dir.path());

        let err = store
            .read("nope", BaselineKind::Screenshot, "full@desktop")
            .await
            .expect_err("should be missing");
        assert!(err.is_absent());
    }

    #[tokio::test]
    async fn empty_payload_is_unreadable_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBaselineStore::new(dir.path());

        store
            .write("abc123", BaselineKind::Style, "", b"x")
            .await
            .expect("write");
        // Corrupt the file to zero bytes behind the store's back
        let path = dir.path().join("abc123").join("style.json");
        tokio::fs::write(&path, b"").await.expect("truncate");

        let err = store
            .read("abc123", BaselineKind::Style, "")
            .await
            .expect_err("should be unreadable");
        assert!(err.is_absent());
    }

    #[tokio::test]
    async fn qualifier_distinguishes_baselines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBaselineStore::new(dir.path());

        store
            .write("h", BaselineKind::Screenshot, "full@desktop-1920x1080", b"a")
            .await
            .expect("write");
        store
            .write("h", BaselineKind::Screenshot, "full@mobile-375x812", b"b")
            .await
            .expect("write");

        let desktop = store
            .read("h", BaselineKind::Screenshot, "full@desktop-1920x1080")
            .await
            .expect("read");
        let mobile = store
            .read("h", BaselineKind::Screenshot, "full@mobile-375x812")
            .await
            .expect("read");
        assert_eq!(desktop.payload, b"a");
        assert_eq!(mobile.payload, b"b");
    }

    #[tokio::test]
    async fn delete_and_clear() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBaselineStore::new(dir.path());

        store
            .write("h", BaselineKind::Structure, "", b"{}")
            .await
            .expect("write");
        store
            .delete_one("h", BaselineKind::Structure, "")
            .await
            .expect("delete");
        assert!(!store.exists("h", BaselineKind::Structure, "").await);

        store
            .write("h2", BaselineKind::Style, "", b"{}")
            .await
            .expect("write");
        store.clear_all().await.expect("clear");
        assert!(!store.exists("h2", BaselineKind::Style, "").await);
    }
}
