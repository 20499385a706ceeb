//! HTTP 429 backoff state machine
//!
//! `Normal -> RateLimited(n) -> {Retry, PermanentlyFailed}` with
//! exponential backoff and a hard attempt bound. The machine is an
//! explicit bounded loop driven by the dispatcher, never recursion, so a
//! pathological 429 stream cannot grow the call stack.

use rand::Rng;
use std::time::Duration;

use crate::utils::constants::RATE_LIMIT_MAX_RETRIES;

/// Where a URL stands in the 429 backoff sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitState {
    /// No 429 seen yet
    Normal,
    /// `n` 429 responses absorbed so far
    RateLimited(u8),
}

/// Next action after a 429 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitAction {
    /// Back off for the given delay, then navigate again
    Retry { delay: Duration },
    /// Attempt bound crossed; the URL is terminal-failed
    PermanentlyFailed,
}

impl RateLimitState {
    #[must_use]
    pub const fn new() -> Self {
        Self::Normal
    }

    /// Retries consumed so far.
    #[must_use]
    pub const fn attempts(&self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::RateLimited(n) => *n,
        }
    }

    /// Absorb one 429 response and decide what happens next.
    ///
    /// Delay is `min(base * 2^n, max)` plus up to 10 % jitter, where `n`
    /// counts previously absorbed 429s.
    #[must_use]
    pub fn on_rate_limited(&mut self, base_delay: Duration, max_delay: Duration) -> RateLimitAction {
        let n = self.attempts();
        if n >= RATE_LIMIT_MAX_RETRIES {
            return RateLimitAction::PermanentlyFailed;
        }

        let exp = base_delay.saturating_mul(1 << u32::from(n)).min(max_delay);
        let jitter_ms = rand::rng().random_range(0..=exp.as_millis().max(1) as u64 / 10);
        let delay = exp + Duration::from_millis(jitter_ms);

        *self = Self::RateLimited(n + 1);
        RateLimitAction::Retry { delay }
    }
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_retries_then_terminal() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(10);
        let mut state = RateLimitState::new();

        for expected_attempts in 1..=3u8 {
            match state.on_rate_limited(base, max) {
                RateLimitAction::Retry { .. } => {
                    assert_eq!(state.attempts(), expected_attempts);
                }
                RateLimitAction::PermanentlyFailed => {
                    panic!("failed too early at attempt {expected_attempts}")
                }
            }
        }

        assert_eq!(
            state.on_rate_limited(base, max),
            RateLimitAction::PermanentlyFailed
        );
        // Terminal is sticky
        assert_eq!(
            state.on_rate_limited(base, max),
            RateLimitAction::PermanentlyFailed
        );
    }

    #[test]
    fn delay_doubles_up_to_cap() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(250);
        let mut state = RateLimitState::new();

        let first = match state.on_rate_limited(base, max) {
            RateLimitAction::Retry { delay } => delay,
            RateLimitAction::PermanentlyFailed => panic!("unexpected terminal"),
        };
        let second = match state.on_rate_limited(base, max) {
            RateLimitAction::Retry { delay } => delay,
            RateLimitAction::PermanentlyFailed => panic!("unexpected terminal"),
        };
        let third = match state.on_rate_limited(base, max) {
            RateLimitAction::Retry { delay } => delay,
            RateLimitAction::PermanentlyFailed => panic!("unexpected terminal"),
        };

        // 100ms, 200ms, capped 250ms, each with at most 10% jitter on top
        assert!(first >= Duration::from_millis(100) && first <= Duration::from_millis(110));
        assert!(second >= Duration::from_millis(200) && second <= Duration::from_millis(220));
        assert!(third >= Duration::from_millis(250) && third <= Duration::from_millis(275));
    }
}
