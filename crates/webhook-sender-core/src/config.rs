//! Layered configuration for both entry points.
//!
//! Sources are applied in order, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (every field carries a serde default)
//! 2. `config/webhook-sender.{yaml,toml,json}` in the working directory, if present
//! 3. An explicit file given by the caller, which must exist
//! 4. Environment variables prefixed `WEBHOOK_SENDER__` with `__` as the
//!    nesting separator, e.g. `WEBHOOK_SENDER__PAYLOAD__SCOPE=store/cart/created`
//!
//! A missing `endpoint` or `secret` only fails at [`SenderConfig::validate`],
//! so partial configuration can still be inspected.
//!
//! `payload.created_at` defaults to a fixed sample timestamp. Set it to null in
//! a file (`created_at: ~` in YAML) to stamp each payload with the current
//! time instead. Environment variables can only replace the value, not unset
//! it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::payload::PayloadTemplate;
use crate::secret::WebhookSecret;
use crate::telemetry::LoggingConfig;
use crate::transport::DEFAULT_USER_AGENT;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "WEBHOOK_SENDER";

/// Base name of the optional working-directory configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config/webhook-sender";

/// Settings for creating, signing and delivering webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Receiving endpoint URL (http or https)
    pub endpoint: Option<String>,

    /// Shared HMAC secret
    pub secret: Option<WebhookSecret>,

    /// Timeout for one delivery attempt, in seconds
    pub timeout_seconds: u64,

    /// `User-Agent` header sent with each delivery
    pub user_agent: String,

    /// Constant parts of each payload
    pub payload: PayloadTemplate,

    pub logging: LoggingConfig,

    /// HTTP host settings, used only by the request-handler service
    pub server: ServerConfig,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            secret: None,
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            payload: PayloadTemplate::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// HTTP listener settings for the request-handler service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl SenderConfig {
    /// Load configuration from the standard sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if `explicit_path` does not exist, a file
    /// is malformed, or a value cannot be coerced to its field type.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Some(path) = explicit_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check that the configuration can drive a delivery.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        self.require_secret()?;

        if self.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_seconds".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "user_agent".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Parse and check the endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let raw = self
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ConfigError::Required {
                key: "endpoint".to_string(),
            })?;

        let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
            key: "endpoint".to_string(),
            message: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid {
                key: "endpoint".to_string(),
                message: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    /// Get the secret, failing if it is absent or empty.
    pub fn require_secret(&self) -> Result<&WebhookSecret, ConfigError> {
        self.secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Required {
                key: "secret".to_string(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
