//! Sliding-window admission control for crawl pacing
//!
//! Gates request pacing during discovery: at most `max_requests` fetches
//! may start inside any `window`-long interval. Denied callers are told
//! how long to wait; `acquire` turns that into a cooperative sleep so the
//! crawl loop never busy-spins.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Rate limit decision for a fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed to proceed
    Allow,
    /// Request should wait; contains the duration until a slot frees up
    Deny { retry_after: Duration },
}

/// Sliding-window rate limiter.
///
/// Admission timestamps are kept in a queue; entries older than the
/// window are pruned on every check, so memory is bounded by
/// `max_requests`.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    admissions: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    #[must_use]
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            admissions: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Try to claim a slot without waiting.
    pub async fn try_acquire(&self) -> RateLimitDecision {
        let now = Instant::now();
        let mut admissions = self.admissions.lock().await;

        while let Some(oldest) = admissions.front() {
            if now.duration_since(*oldest) >= self.window {
                admissions.pop_front();
            } else {
                break;
            }
        }

        if admissions.len() < self.max_requests {
            admissions.push_back(now);
            RateLimitDecision::Allow
        } else {
            // Safe: the queue is non-empty when it is full
            let oldest = *admissions
                .front()
                .unwrap_or(&now);
            let retry_after = (oldest + self.window).saturating_duration_since(now);
            RateLimitDecision::Deny { retry_after }
        }
    }

    /// Claim a slot, sleeping until one is available.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire().await {
                RateLimitDecision::Allow => return,
                RateLimitDecision::Deny { retry_after } => {
                    // Minimum sleep guards against a zero-duration wake loop
                    // when the oldest admission expires this instant.
                    let wait = retry_after.max(Duration::from_millis(1));
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
