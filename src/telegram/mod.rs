//! Telegram adapter
//!
//! Long-polls the Bot API, turns text commands into [`crate::bot::Action`]s and
//! delivers the dispatcher's replies back to the originating chat.

pub mod api;
pub mod poller;
pub mod types;

pub use api::TelegramClient;
pub use poller::{Poller, TelegramSink};
pub use types::{Chat, Message, Update, User};

/// Errors talking to the Telegram Bot API
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error(
        "Telegram API error ({}): {description}",
        .code.map_or_else(|| "-".to_string(), |c| c.to_string())
    )]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the bot token
        TelegramError::Http(e.without_url().to_string())
    }
}
