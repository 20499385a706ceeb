//! Configuration module for audit runs
//!
//! This module provides the `AuditConfig` struct and its type-safe builder
//! for configuring discovery and audit dispatch with validation and
//! sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{AuditConfigBuilder, WithBaselineDir, WithStartUrl};
pub use types::{AuditConfig, Viewport, default_viewports};
