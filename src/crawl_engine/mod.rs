//! Crawl Engine Module
//!
//! Breadth-bounded discovery: the frontier (queue + dedup sets), the
//! sliding-window rate limiter, link resolution/filtering, and the crawl
//! loop driving them.

// Sub-modules
pub mod crawl_types;
pub mod crawler;
pub mod frontier;
pub mod link_filter;
pub mod rate_limiter;

// Re-exports for public API
pub use crawl_types::{CrawlResult, CrawlTask, DiscoverySource, NavigationErrorKind};
pub use crawler::CrawlerEngine;
pub use frontier::Frontier;
pub use link_filter::{resolve_href, should_include};
pub use rate_limiter::{RateLimitDecision, SlidingWindowLimiter};
