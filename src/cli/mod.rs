//! CLI module for Ratewin
//!
//! Provides commands:
//! - `simulate`: Drive a stream of guarded calls through a limiter
//! - `config`: Print the effective configuration

use clap::{Args, Parser, Subcommand};

pub mod show_config;
pub mod simulate;

/// Ratewin sliding-window rate limiter CLI
#[derive(Parser, Debug)]
#[command(name = "ratewin")]
#[command(about = "Sliding-window rate limiting for outbound calls")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate guarded calls against a limiter (no real waiting)
    Simulate(SimulateArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Flags override the loaded configuration
#[derive(Args, Debug, Default)]
pub struct SimulateArgs {
    /// Maximum admissions per window
    #[arg(long)]
    pub max_requests: Option<u32>,
    /// Window width in milliseconds
    #[arg(long)]
    pub window_ms: Option<u64>,
    /// Number of calls to attempt
    #[arg(long)]
    pub attempts: Option<u32>,
    /// Simulated milliseconds between calls
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Print a JSON summary instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Simulate(args)) => {
            let config = crate::settings::load_config()?;
            simulate::run(args, &config).await
        }
        Some(Commands::Config) => {
            let config = crate::settings::load_config()?;
            show_config::run(&config)
        }
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
