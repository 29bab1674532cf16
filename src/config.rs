//! Configuration for the ColliCasa bot
//!
//! CLI arguments and environment variable handling using clap. A `.env` file
//! is loaded by `main` before parsing, so every setting can live there.

use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::gateway::GatewayConfig;
use crate::session::DEFAULT_SESSION_TTL;

/// ColliCasa access-control bot
#[derive(Parser, Debug, Clone)]
#[command(name = "collicasa-bot")]
#[command(about = "Telegram front end for the ColliCasa access-control backend")]
pub struct Args {
    /// Telegram bot token issued by @BotFather
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Base URL of the access-control backend (e.g. "https://api.collicasa.example")
    #[arg(long, env = "BACKEND_API_BASE_URL")]
    pub backend_api_base_url: Option<String>,

    /// Service credential used for identity verification and health checks
    #[arg(long, env = "SERVICE_TOKEN", hide_env_values = true)]
    pub service_token: Option<String>,

    /// Tenant identifier sent as X-Tenant-ID on every backend call
    #[arg(long, env = "TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Timeout for each backend call in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// How long a verified user stays authenticated, in seconds (default 7 days)
    #[arg(long, env = "SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL.as_secs())]
    pub session_ttl_secs: u64,

    /// Telegram Bot API root
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Long-poll timeout for getUpdates in seconds
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value = "30")]
    pub poll_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// A required setting is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required (set it in the environment or .env file)")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Args {
    /// Validate configuration
    ///
    /// Reports the first missing or invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        required("TELEGRAM_BOT_TOKEN", &self.telegram_bot_token)?;
        let base_url = required("BACKEND_API_BASE_URL", &self.backend_api_base_url)?;
        required("SERVICE_TOKEN", &self.service_token)?;
        required("TENANT_ID", &self.tenant_id)?;

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "BACKEND_API_BASE_URL",
                reason: format!("'{}' is not an http(s) URL", base_url),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.poll_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "POLL_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Telegram bot token (validated)
    pub fn bot_token(&self) -> Result<&str, ConfigError> {
        required("TELEGRAM_BOT_TOKEN", &self.telegram_bot_token)
    }

    /// Backend gateway settings (validated)
    pub fn gateway_config(&self) -> Result<GatewayConfig, ConfigError> {
        Ok(GatewayConfig::new(
            required("BACKEND_API_BASE_URL", &self.backend_api_base_url)?,
            required("SERVICE_TOKEN", &self.service_token)?,
            required("TENANT_ID", &self.tenant_id)?,
        )
        .with_timeout(Duration::from_secs(self.request_timeout_secs)))
    }

    /// Session lifetime granted after a successful verification
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

fn required<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}
