//! Sliding window rate limiter
//!
//! A timestamp recorded at `t` counts against the limit for exactly the
//! window width after `t`. The window is evaluated relative to "now" on every
//! call rather than aligned to fixed buckets.

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimitConfig;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Snapshot of a limiter's usage at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// Whether one more operation would be admitted now
    pub allowed: bool,
    /// Operations still active in the window
    pub current: u32,
    /// Configured maximum per window
    pub limit: u32,
    /// Admissions left before the limit is reached
    pub remaining: u32,
    /// Time until the next slot frees up (zero when allowed)
    pub retry_after: Duration,
}

/// In-memory rate limiter using sliding window algorithm
///
/// All state sits behind one mutex, so the count-then-append sequence of
/// [`execute`](Self::execute) and [`try_acquire`](Self::try_acquire) cannot
/// interleave with another thread's admission.
#[derive(Debug)]
pub struct RateLimiter<C = SystemClock> {
    config: RateLimitConfig,
    clock: C,
    /// Admission instants in non-decreasing order
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter<SystemClock> {
    /// Create a limiter admitting `max_requests` per `window_ms` milliseconds
    pub fn new(max_requests: u32, window_ms: u64) -> Result<Self> {
        Self::from_config(RateLimitConfig::from_millis(max_requests, window_ms))
    }

    /// Create a limiter on the system clock from a config
    pub fn from_config(config: RateLimitConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter reading time from `clock`
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(config, clock))
    }

    pub(crate) fn from_validated(config: RateLimitConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Maximum admissions per window
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.config.max_requests
    }

    /// Window width
    #[must_use]
    pub fn window(&self) -> Duration {
        self.config.window
    }

    /// Configuration this limiter was built with
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check whether one more operation may run now, without recording it
    #[must_use]
    pub fn can_proceed(&self) -> bool {
        let mut timestamps = self.lock();
        let now = self.clock.now();
        self.prune(&mut timestamps, now);
        self.has_capacity(&timestamps)
    }

    /// Record one operation at the current instant
    ///
    /// This does not check the limit. Use [`try_acquire`](Self::try_acquire)
    /// or [`execute`](Self::execute) for a combined check and record.
    pub fn record(&self) {
        let mut timestamps = self.lock();
        let now = self.clock.now();
        self.prune(&mut timestamps, now);
        timestamps.push_back(now);
        trace!(active = timestamps.len(), "Rate limiter recorded operation");
    }

    /// Check and record in one step, returning whether the operation was admitted
    pub fn try_acquire(&self) -> bool {
        self.admit().is_ok()
    }

    /// Run `operation` if admitted
    ///
    /// The slot is recorded before `operation` runs and stays consumed even if
    /// the operation itself fails. The operation runs outside the lock.
    pub fn execute<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        self.admit()?;
        Ok(operation())
    }

    /// Async variant of [`execute`](Self::execute)
    ///
    /// Admission is decided immediately; only the produced future is awaited.
    pub async fn execute_async<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.admit()?;
        Ok(operation().await)
    }

    /// Forget every recorded operation
    pub fn reset(&self) {
        let mut timestamps = self.lock();
        let cleared = timestamps.len();
        timestamps.clear();
        info!(cleared, "Rate limiter reset");
    }

    /// Current usage snapshot
    #[must_use]
    pub fn status(&self) -> RateLimitStatus {
        let mut timestamps = self.lock();
        let now = self.clock.now();
        self.prune(&mut timestamps, now);

        let current = count(&timestamps);
        let limit = self.config.max_requests;
        RateLimitStatus {
            allowed: current < limit,
            current,
            limit,
            remaining: limit.saturating_sub(current),
            retry_after: self.retry_after(&timestamps, now),
        }
    }

    /// Get current usage as `(active, max_requests)`
    #[must_use]
    pub fn usage(&self) -> (u32, u32) {
        let status = self.status();
        (status.current, status.limit)
    }

    /// Time until an admission would succeed; zero if it would succeed now
    #[must_use]
    pub fn time_until_available(&self) -> Duration {
        self.status().retry_after
    }

    /// Whether nothing is active in the window
    pub(crate) fn is_idle(&self) -> bool {
        let mut timestamps = self.lock();
        let now = self.clock.now();
        self.prune(&mut timestamps, now);
        timestamps.is_empty()
    }

    pub(crate) fn admit(&self) -> Result<()> {
        let mut timestamps = self.lock();
        let now = self.clock.now();
        self.prune(&mut timestamps, now);

        if !self.has_capacity(&timestamps) {
            let retry_after = self.retry_after(&timestamps, now);
            debug!(
                max_requests = self.config.max_requests,
                active = timestamps.len(),
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            return Err(Error::RateLimitExceeded { retry_after });
        }

        timestamps.push_back(now);
        trace!(
            max_requests = self.config.max_requests,
            active = timestamps.len(),
            "Rate limiter admitted operation"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // A panicking holder cannot leave the deque half-updated.
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop entries whose age has reached the window width
    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) < self.config.window {
                break;
            }
            timestamps.pop_front();
        }
    }

    fn has_capacity(&self, timestamps: &VecDeque<Instant>) -> bool {
        count(timestamps) < self.config.max_requests
    }

    /// Time until enough entries expire to free one slot
    fn retry_after(&self, timestamps: &VecDeque<Instant>, now: Instant) -> Duration {
        let limit = self.config.max_requests as usize;
        if timestamps.len() < limit {
            return Duration::ZERO;
        }
        // `record` may push past the limit, so more than one entry can have
        // to expire before a slot frees up.
        match timestamps.get(timestamps.len() - limit) {
            Some(&blocking) => self
                .config
                .window
                .saturating_sub(now.saturating_duration_since(blocking)),
            None => Duration::ZERO,
        }
    }
}

fn count(timestamps: &VecDeque<Instant>) -> u32 {
    u32::try_from(timestamps.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests;
