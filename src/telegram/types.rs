//! Subset of the Telegram Bot API object model used by the bot.

use serde::{Deserialize, Serialize};

use super::TelegramError;

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, TelegramError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TelegramError::Api {
                code: self.error_code,
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageParams<'a> {
    pub chat_id: i64,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteWebhookParams {
    pub drop_pending_updates: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_update_batch() {
        let response: ApiResponse<Vec<Update>> = serde_json::from_value(json!({
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 1,
                        "date": 1700000000,
                        "from": {
                            "id": 42,
                            "is_bot": false,
                            "first_name": "Ada",
                            "username": "ada"
                        },
                        "chat": { "id": 42, "type": "private" },
                        "text": "/start"
                    }
                },
                { "update_id": 11, "edited_message": { "message_id": 1 } }
            ]
        }))
        .unwrap();

        let updates = response.into_result().unwrap();
        assert_eq!(updates.len(), 2);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.from.as_ref().unwrap().id, 42);
        assert_eq!(message.text.as_deref(), Some("/start"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_error_envelope() {
        let response: ApiResponse<bool> = serde_json::from_value(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        }))
        .unwrap();

        match response.into_result() {
            Err(crate::telegram::TelegramError::Api { code, description }) => {
                assert_eq!(code, Some(401));
                assert_eq!(description, "Unauthorized");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
