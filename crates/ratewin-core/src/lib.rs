//! Ratewin Core - Sliding-Window Rate Limiting
//!
//! This crate bounds how many operations may run inside a trailing time
//! window:
//! - RateLimiter: admission checks, recording and guarded execution
//! - KeyedRateLimiter: independent limiters per key sharing one config
//! - Clock: the monotonic time source, injectable for simulated time
//! - Error: configuration and admission failures
//!
//! ```
//! use ratewin_core::{Error, RateLimiter};
//!
//! let limiter = RateLimiter::new(1, 1_000).unwrap();
//! assert_eq!(limiter.execute(|| 42).unwrap(), 42);
//! assert!(matches!(
//!     limiter.execute(|| 43),
//!     Err(Error::RateLimitExceeded { .. })
//! ));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod keyed;
pub mod rate_limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RateLimitConfig;
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use keyed::KeyedRateLimiter;
pub use rate_limiter::{RateLimitStatus, RateLimiter};
