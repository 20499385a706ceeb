//! Baseline persistence
//!
//! The store contract plus the filesystem implementation used by
//! default. Baselines are created automatically on first observation and
//! read-only afterwards until an operator deletes them.

pub mod fs_store;
pub mod store;

pub use fs_store::FsBaselineStore;
pub use store::{Baseline, BaselineKind, BaselineStore};
