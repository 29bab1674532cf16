//! Action handling
//!
//! Turns an [`Action`] from a user into replies. Transport-specific code only
//! has to parse actions and deliver replies through a [`ReplySink`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::action::Action;
use super::messages;
use crate::gateway::{mentions_permission, BackendGateway, CameraKind, GateKind, GatewayError};
use crate::types::{BotError, Result};

/// Who sent the action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
}

/// Something to send back to the user
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Photo { image: Bytes, caption: String },
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// Delivers replies to the user, in order.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, reply: Reply) -> Result<()>;
}

/// Collects replies in memory.
#[async_trait]
impl ReplySink for Mutex<Vec<Reply>> {
    async fn send(&self, reply: Reply) -> Result<()> {
        self.lock().await.push(reply);
        Ok(())
    }
}

/// Handles user actions against the backend gateway.
///
/// Owns the session discipline: a successful /start stores the verified
/// token, every other action only reads it.
pub struct Dispatcher {
    gateway: Arc<BackendGateway>,
    session_ttl: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<BackendGateway>, session_ttl: Duration) -> Self {
        Self {
            gateway,
            session_ttl,
        }
    }

    pub fn gateway(&self) -> &Arc<BackendGateway> {
        &self.gateway
    }

    /// Handle one action. Never fails: internal errors are logged and turned
    /// into an apology.
    pub async fn handle(&self, action: Action, user: &UserInfo, sink: &dyn ReplySink) {
        if let Err(e) = self.try_handle(action, user, sink).await {
            error!(user_id = user.id, action = %action, error = %e, "Error handling action");
            if let Err(e) = sink.send(Reply::text(messages::handler_apology())).await {
                error!(user_id = user.id, error = %e, "Failed to send error message");
            }
        }
    }

    /// Handle one action and return the replies instead of sending them.
    pub async fn replies(&self, action: Action, user: &UserInfo) -> Vec<Reply> {
        let sink = Mutex::new(Vec::new());
        self.handle(action, user, &sink).await;
        sink.into_inner()
    }

    async fn try_handle(
        &self,
        action: Action,
        user: &UserInfo,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        match action {
            Action::Start => self.start(user, sink).await,
            Action::Help => {
                let authenticated = self.gateway.sessions().contains(user.id);
                sink.send(Reply::text(messages::help(authenticated))).await
            }
            _ => match (action.gate(), action.camera()) {
                (Some(gate), _) => self.open_gate(gate, user, sink).await,
                (None, Some(camera)) => self.snapshot(camera, user, sink).await,
                (None, None) => Err(BotError::Internal(format!("no handler for {}", action))),
            },
        }
    }

    async fn start(&self, user: &UserInfo, sink: &dyn ReplySink) -> Result<()> {
        info!(
            user_id = user.id,
            username = user.username.as_deref().unwrap_or("-"),
            "User started the bot"
        );

        let payload = self.gateway.verify_identity(user.id).await;
        let token = payload.as_ref().and_then(|p| p.access_token());

        let text = match (token, &payload) {
            (Some(token), Some(payload)) => {
                self.gateway.sessions().put(
                    user.id,
                    token,
                    self.session_ttl,
                    payload.resident_id(),
                    payload.permissions.clone(),
                );
                messages::welcome_authenticated(&user.first_name, &self.gateway.config().tenant_id)
            }
            _ => {
                info!(user_id = user.id, "User is not registered with the backend");
                messages::welcome_unregistered(&user.first_name, user.id)
            }
        };

        sink.send(Reply::Text(text)).await
    }

    async fn open_gate(
        &self,
        gate: GateKind,
        user: &UserInfo,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        info!(user_id = user.id, gate = %gate, "User requested to open gate");

        // The gateway does the counted lookup
        if !self.gateway.sessions().contains(user.id) {
            return sink.send(Reply::text(messages::not_authenticated())).await;
        }

        sink.send(Reply::text(messages::opening_gate(gate))).await?;

        let reply = match self.gateway.open_gate(gate, user.id).await {
            Ok(payload) => match gate_error(&payload) {
                None => messages::gate_opened(gate),
                Some(error) if mentions_permission(&error) => {
                    messages::gate_permission_denied(gate)
                }
                Some(error) => {
                    warn!(
                        user_id = user.id,
                        gate = %gate,
                        error = %error,
                        "Backend reported gate failure"
                    );
                    messages::gate_failed(gate, &error)
                }
            },
            Err(GatewayError::NotAuthenticated) => messages::not_authenticated(),
            Err(e) if e.is_credential_rejected() => self.expire_session(user),
            Err(e) if e.is_permission_denied() => messages::gate_permission_denied(gate),
            Err(e) => messages::gate_failed(gate, &e.to_string()),
        };

        sink.send(Reply::Text(reply)).await
    }

    async fn snapshot(
        &self,
        camera: CameraKind,
        user: &UserInfo,
        sink: &dyn ReplySink,
    ) -> Result<()> {
        info!(user_id = user.id, camera = %camera, "User requested camera snapshot");

        if !self.gateway.sessions().contains(user.id) {
            return sink.send(Reply::text(messages::not_authenticated())).await;
        }

        sink.send(Reply::text(messages::capturing_snapshot(camera))).await?;

        let reply = match self.gateway.get_snapshot(camera, user.id).await {
            Ok(image) if image.is_empty() => {
                warn!(user_id = user.id, camera = %camera, "Backend returned an empty snapshot");
                Reply::Text(messages::snapshot_failed("empty image received"))
            }
            Ok(image) => Reply::Photo {
                image,
                caption: messages::snapshot_caption(camera),
            },
            Err(GatewayError::NotAuthenticated) => Reply::Text(messages::not_authenticated()),
            Err(e) if e.is_credential_rejected() => Reply::Text(self.expire_session(user)),
            Err(e) if e.is_permission_denied() => {
                Reply::Text(messages::camera_permission_denied(camera))
            }
            Err(e) => Reply::Text(messages::snapshot_failed(&e.to_string())),
        };

        sink.send(reply).await
    }

    /// Forget a token the backend no longer accepts, so the user is sent back to /start.
    fn expire_session(&self, user: &UserInfo) -> String {
        info!(user_id = user.id, "Backend rejected stored token, dropping session");
        self.gateway.sessions().remove(user.id);
        messages::session_expired()
    }
}

/// Error reported inside a 200 gate payload, `None` when it signals success.
fn gate_error(payload: &Value) -> Option<String> {
    if payload.get("success").is_some_and(is_truthy) {
        return None;
    }

    Some(
        payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string(),
    )
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// =============================================================================
// Tests
// =============================================================================
