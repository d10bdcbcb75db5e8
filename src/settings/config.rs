//! Configuration types

use ratewin_core::RateLimitConfig;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Limiter guarding the simulated calls
    #[serde(default)]
    pub limiter: RateLimitConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Simulated call stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of guarded calls to issue
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Simulated spacing between calls in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_attempts() -> u32 {
    10
}

fn default_interval_ms() -> u64 {
    100
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}
