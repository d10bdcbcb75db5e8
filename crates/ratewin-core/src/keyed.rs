//! Per-key rate limiting
//!
//! One sliding window per key (endpoint, user, token...) with a shared
//! configuration and clock.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::error::Result;
use crate::rate_limiter::{RateLimitStatus, RateLimiter};
use dashmap::DashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Map of key -> independent sliding window limiter
#[derive(Debug)]
pub struct KeyedRateLimiter<C = SystemClock> {
    config: RateLimitConfig,
    clock: C,
    limiters: DashMap<String, RateLimiter<C>>,
}

impl KeyedRateLimiter<SystemClock> {
    /// Create a keyed limiter on the system clock
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock + Clone> KeyedRateLimiter<C> {
    /// Create a keyed limiter whose per-key limiters all read `clock`
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clock,
            limiters: DashMap::new(),
        })
    }

    /// Configuration shared by every key
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether `key` may run one more operation now
    #[must_use]
    pub fn can_proceed(&self, key: &str) -> bool {
        self.limiters
            .get(key)
            .map_or(true, |limiter| limiter.can_proceed())
    }

    /// Record one operation for `key` without checking the limit
    pub fn record(&self, key: &str) {
        self.with_limiter(key, RateLimiter::record);
    }

    /// Check and record for `key` in one step
    pub fn try_acquire(&self, key: &str) -> bool {
        self.with_limiter(key, RateLimiter::try_acquire)
    }

    /// Run `operation` if `key` is admitted
    ///
    /// The map shard and the key's lock are both released before `operation`
    /// runs.
    pub fn execute<T, F>(&self, key: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        self.with_limiter(key, RateLimiter::admit)
            .inspect_err(|_| debug!(key, "Keyed rate limit exceeded"))?;
        Ok(operation())
    }

    /// Forget everything recorded for `key`
    pub fn reset(&self, key: &str) {
        if self.limiters.remove(key).is_some() {
            info!(key, "Keyed rate limiter reset");
        }
    }

    /// Usage snapshot for `key`
    #[must_use]
    pub fn status(&self, key: &str) -> RateLimitStatus {
        match self.limiters.get(key) {
            Some(limiter) => limiter.status(),
            None => RateLimitStatus {
                allowed: true,
                current: 0,
                limit: self.config.max_requests,
                remaining: self.config.max_requests,
                retry_after: Duration::ZERO,
            },
        }
    }

    /// Drop keys with nothing active in their window, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let initial_count = self.limiters.len();
        self.limiters.retain(|_, limiter| !limiter.is_idle());
        let removed = initial_count.saturating_sub(self.limiters.len());
        if removed > 0 {
            info!(removed, remaining = self.limiters.len(), "Keyed rate limiter cleanup");
        }
        removed
    }

    /// Number of tracked keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether no keys are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }

    fn with_limiter<R>(&self, key: &str, f: impl FnOnce(&RateLimiter<C>) -> R) -> R {
        if let Some(limiter) = self.limiters.get(key) {
            return f(&*limiter);
        }
        let limiter = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| RateLimiter::from_validated(self.config, self.clock.clone()));
        f(&*limiter)
    }
}
