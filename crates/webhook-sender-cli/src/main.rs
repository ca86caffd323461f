use tracing::error;
use webhook_sender_cli::{run_cli, CliError};

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        error!(exit_code = e.exit_code(), "CLI error: {}", e);

        // Delivery outcomes are already on stdout; logging may not be up yet
        // for anything that failed earlier.
        if !matches!(e, CliError::Dispatch(_)) {
            eprintln!("Error: {}", e);
        }

        std::process::exit(e.exit_code());
    }
}
