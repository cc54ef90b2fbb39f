use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use thiserror::Error;

use crate::config::BetRateLimitConfig;

#[derive(Debug, Clone, Copy, Error)]
#[error("rate limit exceeded, retry after {retry_after:?}")]
pub struct RateLimited {
    pub retry_after: Duration,
}

/// GCRA limiter keyed by user id, consulted before every bet.
#[derive(Clone)]
pub struct BetRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl BetRateLimiter {
    pub fn new(config: BetRateLimitConfig) -> Self {
        let per_minute = NonZeroU32::new(config.per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    /// Take one cell for `key`, or report how long until one is available.
    pub fn consume(&self, key: &str) -> Result<(), RateLimited> {
        self.limiter
            .check_key(&key.to_string())
            .map_err(|not_until| RateLimited {
                retry_after: not_until.wait_time_from(self.limiter.clock().now()),
            })
    }

    /// Forget keys whose bucket has fully refilled.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for BetRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BetRateLimiter")
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}
