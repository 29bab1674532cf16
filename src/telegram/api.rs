//! Minimal Telegram Bot API client over reqwest.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::types::{
    ApiResponse, DeleteWebhookParams, GetUpdatesParams, Message, SendMessageParams, Update, User,
};
use super::TelegramError;

/// Extra time on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Telegram Bot API client bound to one bot token.
pub struct TelegramClient {
    http_client: Client,
    /// `{api_url}/bot{token}`, never logged
    method_base: String,
}

impl TelegramClient {
    pub fn new(
        api_url: &str,
        bot_token: &str,
        poll_timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let http_client = Client::builder()
            .timeout(poll_timeout + POLL_GRACE)
            .user_agent(concat!("collicasa-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            method_base: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.method_base, method)
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!(method, "Telegram API call");
        let response = self
            .http_client
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;

        decode(response).await
    }

    /// Bot identity, used to check the token at startup.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Remove any webhook; optionally discard updates queued while the bot was down.
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, TelegramError> {
        self.call(
            "deleteWebhook",
            &DeleteWebhookParams {
                drop_pending_updates,
            },
        )
        .await
    }

    /// Long-poll for message updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesParams {
                offset,
                timeout: timeout.as_secs(),
                allowed_updates: &["message"],
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        self.call("sendMessage", &SendMessageParams { chat_id, text }).await
    }

    /// Upload a JPEG as a photo message.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        image: Bytes,
        caption: &str,
    ) -> Result<Message, TelegramError> {
        let photo = Part::bytes(image.to_vec())
            .file_name("snapshot.jpg")
            .mime_str("image/jpeg")?;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", photo);

        debug!(chat_id, "Telegram API call: sendPhoto");
        let response = self
            .http_client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;

        decode(response).await
    }
}

/// Decode the response envelope. Telegram reports errors in the body even on non-2xx.
async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, TelegramError> {
    let status = response.status();
    let body = response.bytes().await?;

    let envelope: ApiResponse<R> = serde_json::from_slice(&body).map_err(|e| {
        TelegramError::Decode(format!("HTTP {}: {}", status.as_u16(), e))
    })?;

    envelope.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TelegramClient {
        TelegramClient::new(&server.uri(), "123:TOKEN", Duration::from_secs(1)).unwrap()
    }

    #[tokio::test]
    async fn test_send_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:TOKEN/sendMessage"))
            .and(body_partial_json(json!({ "chat_id": 42, "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 7, "chat": { "id": 42 }, "text": "hello" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = client(&server).send_message(42, "hello").await.unwrap();
        assert_eq!(message.message_id, 7);
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:TOKEN/getUpdates"))
            .and(body_partial_json(json!({ "offset": 11, "timeout": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client(&server)
            .get_updates(Some(11), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).send_message(1, "x").await.unwrap_err();
        assert!(matches!(err, TelegramError::Api { code: Some(400), .. }));
    }

    #[tokio::test]
    async fn test_non_json_response_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server).get_me().await.unwrap_err();
        assert!(matches!(err, TelegramError::Decode(_)));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_send_photo_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:TOKEN/sendPhoto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": { "message_id": 8, "chat": { "id": 42 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let message = client(&server)
            .send_photo(42, Bytes::from_static(b"\xFF\xD8jpeg"), "📸 Pedestrian camera snapshot")
            .await
            .unwrap();
        assert_eq!(message.message_id, 8);

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"chat_id\""));
        assert!(body.contains("filename=\"snapshot.jpg\""));
    }
}
