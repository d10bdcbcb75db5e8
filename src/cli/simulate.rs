//! CLI command: `ratewin simulate`
//!
//! Issues a stream of guarded calls spaced `interval_ms` apart on a simulated
//! clock and reports which ones the limiter admitted.

use super::SimulateArgs;
use crate::settings::AppConfig;
use anyhow::Context;
use ratewin_core::{format_error_for_cli, Error, ManualClock, RateLimitConfig, RateLimiter};
use serde::Serialize;
use tracing::info;

/// Outcome of one simulated call
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CallOutcome {
    pub attempt: u32,
    pub offset_ms: u64,
    pub admitted: bool,
    pub retry_after_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Run the simulate subcommand.
pub async fn run(args: SimulateArgs, config: &AppConfig) -> anyhow::Result<()> {
    let limiter_config = RateLimitConfig {
        max_requests: args.max_requests.unwrap_or(config.limiter.max_requests),
        window: args
            .window_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(config.limiter.window),
    };
    let attempts = args.attempts.unwrap_or(config.simulation.attempts);
    let interval_ms = args.interval_ms.unwrap_or(config.simulation.interval_ms);

    let outcomes = simulate_calls(limiter_config, attempts, interval_ms).await?;
    let admitted = outcomes.iter().filter(|o| o.admitted).count();

    info!(
        max_requests = limiter_config.max_requests,
        window_ms = limiter_config.window.as_millis() as u64,
        attempts,
        admitted,
        "Simulation finished"
    );

    if args.json {
        print_json(&limiter_config, &outcomes)
    } else {
        print_table(&limiter_config, &outcomes);
        Ok(())
    }
}

/// Drive `attempts` calls through a limiter on a manual clock.
pub async fn simulate_calls(
    limiter_config: RateLimitConfig,
    attempts: u32,
    interval_ms: u64,
) -> anyhow::Result<Vec<CallOutcome>> {
    let clock = ManualClock::new();
    let limiter = RateLimiter::with_clock(limiter_config, clock.clone())
        .map_err(|e| anyhow::anyhow!(format_error_for_cli(&e)))
        .context("Cannot build limiter for simulation")?;

    let mut outcomes = Vec::with_capacity(attempts as usize);
    for attempt in 0..attempts {
        if attempt > 0 {
            clock.advance_millis(interval_ms);
        }
        let offset_ms = u64::from(attempt) * interval_ms;

        let outcome = match limiter.execute_async(|| outbound_call(attempt)).await {
            Ok(response) => CallOutcome {
                attempt,
                offset_ms,
                admitted: true,
                retry_after_ms: 0,
                response: Some(response),
            },
            Err(Error::RateLimitExceeded { retry_after }) => CallOutcome {
                attempt,
                offset_ms,
                admitted: false,
                retry_after_ms: retry_after.as_millis() as u64,
                response: None,
            },
            Err(e) => return Err(e.into()),
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

/// Stand-in for a rate-sensitive API request
async fn outbound_call(attempt: u32) -> String {
    tokio::task::yield_now().await;
    format!("response #{}", attempt)
}

fn print_table(limiter_config: &RateLimitConfig, outcomes: &[CallOutcome]) {
    println!();
    println!(
        "  Limiter: {} per {}ms (sliding window)",
        limiter_config.max_requests,
        limiter_config.window.as_millis()
    );
    println!("  {}", "-".repeat(56));
    println!("  {:<8} {:<12} {:<10} Detail", "Call", "At (ms)", "Result");
    println!("  {}", "-".repeat(56));

    for outcome in outcomes {
        let (result, detail) = if outcome.admitted {
            ("admitted", outcome.response.clone().unwrap_or_default())
        } else {
            ("denied", format!("retry in {}ms", outcome.retry_after_ms))
        };
        println!(
            "  {:<8} {:<12} {:<10} {}",
            outcome.attempt, outcome.offset_ms, result, detail
        );
    }

    let admitted = outcomes.iter().filter(|o| o.admitted).count();
    println!("  {}", "-".repeat(56));
    println!(
        "  Admitted: {}  |  Denied: {}",
        admitted,
        outcomes.len() - admitted
    );
    println!();
}

fn print_json(limiter_config: &RateLimitConfig, outcomes: &[CallOutcome]) -> anyhow::Result<()> {
    let admitted = outcomes.iter().filter(|o| o.admitted).count();
    let output = serde_json::json!({
        "limiter": limiter_config,
        "admitted": admitted,
        "denied": outcomes.len() - admitted,
        "calls": outcomes,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
