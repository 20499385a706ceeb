//! Render provider module
//!
//! The capability surface the engine renders pages through, plus the
//! chromium-backed implementation and the JS evaluation scripts.

pub mod chromium;
pub mod js_scripts;
pub mod provider;

pub use chromium::{ChromiumContext, ChromiumProvider};
pub use provider::{
    LoadState, NavigationResponse, PreNavigationHook, RenderContext, RenderProvider,
    ScreenshotTarget,
};
