//! # Webhook Sender Function
//!
//! Binary entry point for the request-handler host.
//!
//! This executable:
//! - Loads configuration (`WEBHOOK_SENDER_CONFIG` names an optional explicit file)
//! - Initializes logging
//! - Serves `POST /invoke` and `GET /health` until SIGINT or SIGTERM

use anyhow::Context;
use std::path::PathBuf;
use tracing::{error, info};
use webhook_sender_core::{telemetry, SenderConfig};
use webhook_sender_function::start_server;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = format!("{:#}", e), "Webhook sender function failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let explicit_path = std::env::var_os("WEBHOOK_SENDER_CONFIG")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let config = SenderConfig::load(explicit_path.as_deref()).context("loading configuration")?;
    telemetry::init(&config.logging).context("initializing logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting webhook sender function"
    );

    start_server(&config).await.context("serving invocations")?;
    Ok(())
}
