//! Inter-request pacing
//!
//! Every audit task sleeps a randomized delay before navigating, and
//! every Nth request across the pool additionally sleeps a longer
//! cooldown. Evenly machine-timed bursts are what trip server-side bot
//! blocking; the jitter and the periodic pause break that signature.

use log::debug;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::utils::constants::{
    PACING_COOLDOWN_EVERY, PACING_COOLDOWN_MS, PACING_MAX_DELAY_MS, PACING_MIN_DELAY_MS,
};

/// Shared pacing state for one dispatch run.
pub struct Pacer {
    requests_issued: AtomicUsize,
    min_delay: Duration,
    max_delay: Duration,
    cooldown_every: usize,
    cooldown: Duration,
}

impl Pacer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_issued: AtomicUsize::new(0),
            min_delay: Duration::from_millis(PACING_MIN_DELAY_MS),
            max_delay: Duration::from_millis(PACING_MAX_DELAY_MS),
            cooldown_every: PACING_COOLDOWN_EVERY,
            cooldown: Duration::from_millis(PACING_COOLDOWN_MS),
        }
    }

    /// Sleep the pacing delay for the next request.
    pub async fn pace(&self) {
        let issued = self.requests_issued.fetch_add(1, Ordering::Relaxed) + 1;

        let delay_ms = rand::rng()
            .random_range(self.min_delay.as_millis() as u64..=self.max_delay.as_millis() as u64);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        if issued % self.cooldown_every == 0 {
            debug!(
                target: "sitewarden::pacing",
                "cooldown after {issued} requests ({:?})",
                self.cooldown
            );
            tokio::time::sleep(self.cooldown).await;
        }
    }

    #[must_use]
    pub fn requests_issued(&self) -> usize {
        self.requests_issued.load(Ordering::Relaxed)
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}
