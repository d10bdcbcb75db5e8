//! CLI command: `ratewin config`

use crate::settings::AppConfig;
use anyhow::Context;

/// Print the effective configuration.
pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    print!("{}", rendered);
    Ok(())
}
