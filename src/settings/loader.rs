//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use ratewin_core::format_error_for_cli;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    build_config(environment())
}

fn environment() -> Environment {
    // prefix_separator("_") makes RATEWIN_LIMITER__MAX_REQUESTS map to limiter.max_requests
    Environment::with_prefix("RATEWIN")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build_config(env: Environment) -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        .add_source(env)
        .build()
        .context("Failed to build configuration")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    app.limiter
        .validate()
        .map_err(|e| anyhow::anyhow!(format_error_for_cli(&e)))
        .context("Invalid [limiter] configuration")?;

    Ok(app)
}
