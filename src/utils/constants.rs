//! Shared configuration constants for sitewarden
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default maximum crawl depth: 3 levels
///
/// Limits how deep the crawler will follow links from the landing page.
/// Helps prevent unbounded crawling while capturing most relevant pages.
pub const DEFAULT_MAX_DEPTH: u8 = 3;

/// Default cap on discovered URLs: 100
///
/// Discovery stops once this many distinct URLs have been seen, bounding
/// both crawl time and the size of the subsequent audit run.
pub const DEFAULT_MAX_URLS: usize = 100;

/// Default audit worker-pool size: 5 concurrent page audits
///
/// Each in-flight audit owns a render context, so this also bounds the
/// number of simultaneously open pages. Raising it trades memory for
/// throughput and increases the chance of tripping server-side rate
/// limiting.
pub const DEFAULT_CONCURRENT_LIMIT: usize = 5;

/// Default per-auditor timeout: 30 seconds
///
/// An auditor exceeding this is recorded as failed for that page without
/// affecting its siblings.
pub const DEFAULT_AUDITOR_TIMEOUT_SECS: u64 = 30;

/// Default navigation timeout: 30 seconds
///
/// Prevents hangs on slow DNS, unresponsive servers, or streaming
/// content.
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Sliding-window admission defaults: 10 requests per 1000 ms window
///
/// Conservative pacing that most servers tolerate without issue. Both
/// values are adjustable via `AuditConfig`.
pub const DEFAULT_RATE_WINDOW_MS: u64 = 1_000;
pub const DEFAULT_RATE_MAX_REQUESTS: usize = 10;

/// Extracted-link memoization TTL: 5 minutes
///
/// A URL revisited through multiple discovery paths within this window
/// reuses the cached link list instead of re-fetching.
pub const DEFAULT_LINK_CACHE_TTL_SECS: u64 = 300;

/// Bounded capacity of the link memo cache
pub const LINK_CACHE_CAPACITY: usize = 2_048;

/// Rate-limit (HTTP 429) backoff: base delay, cap, and attempt bound
///
/// Retry delay is `min(base * 2^n, max) + jitter` with `n` capped at
/// `RATE_LIMIT_MAX_RETRIES`, after which the URL is permanently failed.
pub const RATE_LIMIT_BASE_DELAY_MS: u64 = 1_000;
pub const RATE_LIMIT_MAX_DELAY_MS: u64 = 30_000;
pub const RATE_LIMIT_MAX_RETRIES: u8 = 3;

/// Inter-request pacing band and periodic cooldown
///
/// Every audit task sleeps a random duration inside the band before
/// navigating; every `PACING_COOLDOWN_EVERY`th request additionally
/// sleeps the longer cooldown to avoid burst-triggered blocking.
pub const PACING_MIN_DELAY_MS: u64 = 400;
pub const PACING_MAX_DELAY_MS: u64 = 1_400;
pub const PACING_COOLDOWN_EVERY: usize = 10;
pub const PACING_COOLDOWN_MS: u64 = 5_000;

/// Default post-navigation settle delay: 1000 ms
///
/// Applied after load-state signals before auditors run, giving JS-heavy
/// pages time to finish late layout work.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_000;

/// Navigation retry defaults: attempts and linear base delay
///
/// Retry delay is `base * attempt + jitter` for retryable navigation
/// failures (timeouts, connection resets). Non-retryable failures are
/// terminal immediately.
pub const DEFAULT_NAV_RETRY_ATTEMPTS: u8 = 3;
pub const DEFAULT_NAV_RETRY_BASE_DELAY_MS: u64 = 500;

/// Visual comparison thresholds
///
/// `PIXEL_COLOR_DISTANCE_THRESHOLD` is the per-pixel color distance (on a
/// 0-1 scale) below which two pixels count as equal.
/// `VISUAL_GLOBAL_THRESHOLD_PCT` is the diff percentage above which a
/// comparison is considered changed.
pub const PIXEL_COLOR_DISTANCE_THRESHOLD: f64 = 0.1;
pub const VISUAL_GLOBAL_THRESHOLD_PCT: f64 = 0.1;

/// Suspicious style-change threshold: font-size growth above 20 %
///
/// A demoted heading restyled to appear more than 20 % larger than its
/// baseline rendering is treated as visually impersonating its original
/// level.
pub const SUSPICIOUS_FONT_SIZE_GROWTH: f64 = 0.20;

/// File extensions excluded from discovery by default
pub const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "gz", "tar", "rar", "7z", "exe", "dmg", "iso", "mp3", "mp4", "avi", "mov",
    "webm", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot",
];

/// Selectors tracked by the structural detector by default
pub const DEFAULT_IMPORTANT_SELECTORS: &[&str] = &[
    "header",
    "nav",
    "main",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "meta[name=\"description\"]",
    "meta[name=\"keywords\"]",
];
