//! Logging setup.
//!
//! Nothing in this crate installs a global subscriber. [`build_dispatch`]
//! returns a [`Dispatch`] value: binaries pass it to [`init`] to make it the
//! process-wide default, tests scope it to a single thread with
//! [`tracing::dispatcher::set_default`] and a capturing writer.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `webhook_sender_core=debug,warn`
    pub level: String,

    /// Emit one JSON object per event instead of human-readable lines
    pub json_format: bool,

    /// Filter directive that wins over `RUST_LOG`; set from the command line
    #[serde(skip)]
    pub level_override: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            level_override: None,
        }
    }
}

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("A global logger is already installed: {0}")]
    AlreadyInitialized(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Pick the filter directive to apply.
///
/// Precedence is `level_override`, then a non-empty `RUST_LOG`, then `level`.
pub fn resolve_filter(config: &LoggingConfig) -> String {
    if let Some(directive) = &config.level_override {
        return directive.clone();
    }
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directive) if !directive.trim().is_empty() => directive,
        _ => config.level.clone(),
    }
}

/// Build a subscriber writing to `writer`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the directive chosen by
/// [`resolve_filter`] does not parse, including a malformed `RUST_LOG`.
pub fn build_dispatch<W>(config: &LoggingConfig, writer: W) -> Result<Dispatch, TelemetryError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let directive = resolve_filter(config);
    let filter = EnvFilter::try_new(&directive).map_err(|e| TelemetryError::InvalidFilter {
        directive: directive.clone(),
        message: e.to_string(),
    })?;

    let registry = tracing_subscriber::registry().with(filter);

    let dispatch = if config.json_format {
        Dispatch::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer),
            ),
        )
    } else {
        Dispatch::new(registry.with(tracing_subscriber::fmt::layer().with_writer(writer)))
    };

    Ok(dispatch)
}

/// Install a stderr subscriber as the process-wide default.
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let dispatch = build_dispatch(config, std::io::stderr)?;
    tracing::dispatcher::set_global_default(dispatch)?;
    Ok(())
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
