//! # Webhook Sender CLI
//!
//! Command-line entry point for sending signed test webhooks.
//!
//! This module provides CLI commands for:
//! - Sending one signed webhook to the configured endpoint
//! - Previewing the exact body and signature without sending
//! - Signing arbitrary bytes with the shared secret
//! - Validating and showing the resolved configuration

use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use webhook_sender_core::{
    outcome_message, sign, telemetry, CancellationToken, Clock, ConfigError, DispatchError,
    FixedHashGenerator, HashGenerator, SenderConfig, SystemClock, TelemetryError,
    UlidHashGenerator, WebhookDispatcher, WebhookPayload, WebhookSecret, SIGNATURE_HEADER,
};

// ============================================================================
// CLI Structure
// ============================================================================

/// Webhook Sender CLI - signed webhook delivery for receiver testing
#[derive(Parser)]
#[command(name = "webhook-sender")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sign a webhook payload with HMAC-SHA256 and send it")]
#[command(
    long_about = "Builds an order-created webhook, signs its exact JSON bytes with HMAC-SHA256 \
                  and POSTs it with a base64url Signature header"
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "WEBHOOK_SENDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides RUST_LOG and logging.level from configuration)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create, sign and send one webhook
    Send {
        #[command(flatten)]
        overrides: SendOverrides,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Sign a file (or stdin) and print the signature token
    Sign {
        /// File to sign; reads stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Shared secret (defaults to the configured secret)
        #[arg(long, env = "WEBHOOK_SENDER_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Print the canonical payload that would be sent
    Payload {
        /// Use this hash instead of generating one
        #[arg(long)]
        hash: Option<String>,
    },

    /// Validate configuration
    Config {
        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,

        /// Output format for configuration
        #[arg(short = 'f', long, default_value = "yaml")]
        format: ConfigFormat,
    },
}

/// Per-invocation overrides for the `send` command
#[derive(Args, Debug, Clone, Default)]
pub struct SendOverrides {
    /// Receiving endpoint URL
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Shared secret
    #[arg(long, env = "WEBHOOK_SENDER_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Use this hash instead of generating one (replays a delivery)
    #[arg(long)]
    pub hash: Option<String>,
}

impl SendOverrides {
    /// Apply the overrides on top of loaded configuration.
    pub fn apply(&self, config: &mut SenderConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(secret) = &self.secret {
            config.secret = Some(WebhookSecret::new(secret.clone()));
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
    }
}

/// Configuration format options
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

// ============================================================================
// Error Types
// ============================================================================

/// CLI operation errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Failed to render configuration as {format}: {message}")]
    Render { format: String, message: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Telemetry(_) | Self::Render { .. } => 1,
            Self::Dispatch(e) => match e {
                DispatchError::Configuration(_) => 1,
                DispatchError::Serialization(_) | DispatchError::Signature(_) => 2,
                DispatchError::RequestConstruction { .. } => 3,
                DispatchError::Transport(_) => 4,
                DispatchError::UnexpectedStatus { .. } => 5,
                DispatchError::Cancelled => 7,
            },
            Self::Io(_) => 6,
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Parse arguments, set up logging and run the selected command.
///
/// Ctrl+C cancels an in-flight send.
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let mut config = load_configuration(&cli)?;
    telemetry::init(&config.logging)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    execute(cli.command, &mut config, &cancel, &mut stdout).await
}

/// Load configuration and apply the global logging flags.
pub fn load_configuration(cli: &Cli) -> Result<SenderConfig, ConfigError> {
    let mut config = SenderConfig::load(cli.config.as_deref())?;

    if let Some(level) = &cli.log_level {
        config.logging.level_override = Some(level.clone());
    }
    if cli.json_logs {
        config.logging.json_format = true;
    }

    Ok(config)
}

/// Run one command, writing user-facing output to `out`.
pub async fn execute<W: Write>(
    command: Commands,
    config: &mut SenderConfig,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<(), CliError> {
    match command {
        Commands::Send { overrides, dry_run } => {
            execute_send_command(&overrides, dry_run, config, cancel, out).await
        }
        Commands::Sign { file, secret } => execute_sign_command(file, secret, config, out),
        Commands::Payload { hash } => execute_payload_command(hash, config, out),
        Commands::Config { show, format } => execute_config_command(show, format, config, out),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute send command
async fn execute_send_command<W: Write>(
    overrides: &SendOverrides,
    dry_run: bool,
    config: &mut SenderConfig,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<(), CliError> {
    overrides.apply(config);
    config.validate()?;

    let mut dispatcher = WebhookDispatcher::from_config(config)?;
    if let Some(hash) = &overrides.hash {
        dispatcher = dispatcher.with_hash_generator(Arc::new(FixedHashGenerator::new(hash.clone())));
    }

    if dry_run {
        let signed = dispatcher.prepare(dispatcher.build_payload(&config.payload))?;
        info!(endpoint = %dispatcher.endpoint(), hash = %signed.payload.hash, "Dry run, not sending");

        writeln!(out, "POST {}", dispatcher.endpoint())?;
        writeln!(out, "Content-Type: application/json")?;
        writeln!(out, "{}: {}", SIGNATURE_HEADER, signed.signature)?;
        writeln!(out)?;
        writeln!(out, "{}", signed.body)?;
        return Ok(());
    }

    let result = dispatcher
        .create_and_send_with_cancellation(&config.payload, cancel)
        .await;

    writeln!(out, "{}", outcome_message(&result))?;
    result.map(|_| ()).map_err(CliError::from)
}

/// Execute sign command
fn execute_sign_command<W: Write>(
    file: Option<PathBuf>,
    secret: Option<String>,
    config: &SenderConfig,
    out: &mut W,
) -> Result<(), CliError> {
    let secret = match secret {
        Some(value) => WebhookSecret::new(value),
        None => config.require_secret()?.clone(),
    };

    let bytes = match &file {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };

    debug!(file = ?file, len = bytes.len(), "Signing input");

    let token = sign(&bytes, secret.expose_secret()).map_err(DispatchError::from)?;
    writeln!(out, "{}", token)?;
    Ok(())
}

/// Execute payload command
fn execute_payload_command<W: Write>(
    hash: Option<String>,
    config: &SenderConfig,
    out: &mut W,
) -> Result<(), CliError> {
    let hash = hash.unwrap_or_else(|| UlidHashGenerator.generate());

    let payload = WebhookPayload::from_template(&config.payload, hash, SystemClock.now_unix());
    let canonical = payload.to_canonical().map_err(DispatchError::from)?;

    writeln!(out, "{}", canonical)?;
    Ok(())
}

/// Execute config command
fn execute_config_command<W: Write>(
    show: bool,
    format: ConfigFormat,
    config: &SenderConfig,
    out: &mut W,
) -> Result<(), CliError> {
    if show {
        let rendered = render_config(config, &format)?;
        write!(out, "{}", rendered)?;
        if !rendered.ends_with('\n') {
            writeln!(out)?;
        }
    }

    config.validate()?;
    writeln!(out, "Configuration is valid")?;
    Ok(())
}

/// Render configuration with the secret redacted.
fn render_config(config: &SenderConfig, format: &ConfigFormat) -> Result<String, CliError> {
    let render_error = |format: &str, message: String| CliError::Render {
        format: format.to_string(),
        message,
    };

    match format {
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).map_err(|e| render_error("yaml", e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| render_error("json", e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| render_error("toml", e.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
