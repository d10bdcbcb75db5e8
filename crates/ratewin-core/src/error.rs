//! Error types for ratewin-core
//!
//! This module provides error types and user-friendly error formatting.

use std::time::Duration;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A limiter was configured with a non-positive value
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfiguration {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Admission was refused; the guarded operation did not run
    #[error("rate limit exceeded, retry after {}ms", .retry_after.as_millis())]
    RateLimitExceeded {
        /// Time until the oldest active entry leaves the window
        retry_after: Duration,
    },
}

impl Error {
    pub(crate) fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::InvalidConfiguration { field, message } => {
                format!("Configuration error in '{}': {}", field, message)
            }
            Error::RateLimitExceeded { retry_after } => {
                let secs = retry_after.as_secs_f64();
                format!("Rate limit exceeded. Next slot opens in {:.3} seconds.", secs)
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::InvalidConfiguration { field, .. } => Some(format!(
                "Set '{}' to a value greater than zero in config/default.toml or the environment.",
                field
            )),
            Error::RateLimitExceeded { .. } => {
                Some("Wait for the retry interval or back off before calling again.".to_string())
            }
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();

    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }

    output.push('\n');
    output
}
