//! Crate-wide error and result types.

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::telegram::TelegramError;

/// Top-level error for the bot
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
