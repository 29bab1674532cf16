//! Long-polling update loop
//!
//! Fetches updates with `getUpdates`, acknowledges them by advancing the
//! offset, and handles each message on its own task so one slow backend call
//! never holds up other users.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::api::TelegramClient;
use super::types::{Message, Update, User};
use crate::bot::{messages, Action, Dispatcher, Reply, ReplySink, UserInfo};
use crate::types::Result;

/// Pause after a failed getUpdates before polling again
const RETRY_DELAY: Duration = Duration::from_secs(1);

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
        }
    }
}

/// Delivers replies to one Telegram chat.
pub struct TelegramSink {
    client: Arc<TelegramClient>,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(client: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send(&self, reply: Reply) -> Result<()> {
        match reply {
            Reply::Text(text) => {
                self.client.send_message(self.chat_id, &text).await?;
            }
            Reply::Photo { image, caption } => {
                self.client.send_photo(self.chat_id, image, &caption).await?;
            }
        }
        Ok(())
    }
}

/// Telegram long-polling front end for a [`Dispatcher`].
pub struct Poller {
    client: Arc<TelegramClient>,
    dispatcher: Arc<Dispatcher>,
    poll_timeout: Duration,
}

impl Poller {
    pub fn new(
        client: Arc<TelegramClient>,
        dispatcher: Arc<Dispatcher>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            client,
            dispatcher,
            poll_timeout,
        }
    }

    /// Poll until `shutdown` resolves.
    ///
    /// Updates queued while the bot was offline are dropped on startup.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        match self.client.delete_webhook(true).await {
            Ok(_) => info!("Dropped pending updates, starting long polling"),
            Err(e) => warn!(error = %e, "Failed to reset webhook, polling anyway"),
        }

        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;

        loop {
            let result = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poller");
                    break;
                }
                result = self.client.get_updates(offset, self.poll_timeout) => result,
            };

            match result {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        self.spawn_update(update);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to fetch updates");
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Shutdown requested, stopping poller");
                            break;
                        }
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    /// Handle one update in the background.
    pub fn spawn_update(&self, update: Update) -> JoinHandle<()> {
        let client = Arc::clone(&self.client);
        let dispatcher = Arc::clone(&self.dispatcher);

        tokio::spawn(async move {
            let Some(message) = update.message else {
                debug!(update_id = update.update_id, "Ignoring non-message update");
                return;
            };

            let chat_id = message.chat.id;
            guarded(
                Arc::clone(&client),
                chat_id,
                handle_message(dispatcher, client, message),
            )
            .await;
        })
    }
}

/// Run `handler` on its own task; if it panics, apologise to the chat.
async fn guarded<F>(client: Arc<TelegramClient>, chat_id: i64, handler: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    let Err(e) = tokio::spawn(handler).await else {
        return;
    };

    if !e.is_panic() {
        return;
    }

    error!(chat_id, error = %e, "Update handler panicked");
    if let Err(e) = client.send_message(chat_id, &messages::global_apology()).await {
        error!(chat_id, error = %e, "Failed to send error message");
    }
}

async fn handle_message(
    dispatcher: Arc<Dispatcher>,
    client: Arc<TelegramClient>,
    message: Message,
) {
    let Some(from) = message.from.as_ref() else {
        return;
    };
    if from.is_bot {
        return;
    }
    let Some(text) = message.text.as_deref() else {
        return;
    };

    let user = UserInfo::from(from);
    let sink = TelegramSink::new(client, message.chat.id);

    match Action::parse(text) {
        Some(action) => dispatcher.handle(action, &user, &sink).await,
        None if text.starts_with('/') => {
            debug!(user_id = user.id, "Unknown command");
            if let Err(e) = sink.send(Reply::text(messages::unknown_command())).await {
                error!(user_id = user.id, error = %e, "Failed to send error message");
            }
        }
        None => debug!(user_id = user.id, "Ignoring plain text message"),
    }
}
