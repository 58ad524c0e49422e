//! Tally demo entry point.

use std::sync::Arc;

use tally_account::context::AccountContext;
use tally_core::clock::SystemClock;
use tally_demo::config::DemoConfig;
use tally_demo::error::AppError;
use tally_demo::{render_events, render_read_models, seed, telemetry};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Read configuration from environment.
    let config = DemoConfig::from_env()?;
    telemetry::init_tracing(config.log_format);

    tracing::info!(?config, "starting tally demo");

    let ctx = AccountContext::in_memory(Arc::new(SystemClock));
    let seeded = seed::seed_accounts(&ctx.commands).await?;
    tracing::info!(alice = %seeded.alice, bob = %seeded.bob, "scenario complete");

    if config.print_events {
        for line in render_events(&ctx).await? {
            println!("{line}");
        }
    }
    for line in render_read_models(&ctx) {
        println!("{line}");
    }

    Ok(())
}
