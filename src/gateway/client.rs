//! HTTP client for the ColliCasa access-control backend.
//!
//! Every operation issues exactly one request and never retries. Failures are
//! normalized into [`GatewayError`] and logged with the user and operation so
//! they can be matched against backend logs.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::GatewayError;
use super::types::{CameraKind, GateKind, IdentityPayload, VerifyTelegramRequest};
use crate::session::SessionStore;

/// Default timeout for each backend call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the tenant identifier
pub const TENANT_HEADER: &str = "X-Tenant-ID";

const VERIFY_TELEGRAM_PATH: &str = "/api/v1/auth/verify/telegram";
const HEALTH_PATH: &str = "/health";

/// Longest response body kept in logs
const LOG_BODY_LIMIT: usize = 512;

/// Connection settings for the backend
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Bearer token used when not acting for a user
    pub service_token: String,
    /// Value of the X-Tenant-ID header
    pub tenant_id: String,
    /// Timeout for each call
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(
        base_url: impl Into<String>,
        service_token: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            service_token: service_token.into(),
            tenant_id: tenant_id.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Backend gateway
///
/// Reads user tokens from the shared [`SessionStore`] but never writes to it:
/// storing a verified token is up to the caller.
pub struct BackendGateway {
    config: GatewayConfig,
    sessions: Arc<SessionStore>,
    http_client: Client,
}

impl BackendGateway {
    pub fn new(config: GatewayConfig, sessions: Arc<SessionStore>) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("collicasa-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            base_url = %config.base_url,
            tenant_id = %config.tenant_id,
            timeout_ms = config.timeout.as_millis() as u64,
            "Backend gateway created"
        );

        Ok(Self {
            config,
            sessions,
            http_client,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Shared session store
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Headers for a backend call. Uses the user's token when given, the
    /// service credential otherwise.
    pub fn headers(&self, user_token: Option<&str>) -> Result<HeaderMap, GatewayError> {
        let token = user_token.unwrap_or(&self.config.service_token);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(TENANT_HEADER, HeaderValue::from_str(&self.config.tenant_id)?);

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Verify a Telegram user against the backend.
    ///
    /// Returns the parsed payload on HTTP 200, `None` on any failure. The
    /// payload is returned even when it carries no `access_token`.
    pub async fn verify_identity(&self, user_id: i64) -> Option<IdentityPayload> {
        match self.try_verify_identity(user_id).await {
            Ok(payload) => {
                info!(user_id, "User verified successfully");
                Some(payload)
            }
            Err(e) => {
                log_failure("verify_identity", Some(user_id), &e);
                None
            }
        }
    }

    async fn try_verify_identity(&self, user_id: i64) -> Result<IdentityPayload, GatewayError> {
        let response = self
            .http_client
            .post(self.url(VERIFY_TELEGRAM_PATH))
            .headers(self.headers(None)?)
            .json(&VerifyTelegramRequest {
                telegram_id: user_id.to_string(),
            })
            .send()
            .await?;

        let body = expect_ok(response, true).await?;
        serde_json::from_slice(&body).map_err(|e| {
            GatewayError::Unexpected(format!("malformed verification response: {}", e))
        })
    }

    /// Open a gate on behalf of an authenticated user.
    ///
    /// Returns the backend's JSON payload verbatim on HTTP 200.
    pub async fn open_gate(&self, kind: GateKind, user_id: i64) -> Result<Value, GatewayError> {
        let Some(token) = self.sessions.get(user_id) else {
            info!(user_id, gate = %kind, "Open gate refused: user not authenticated");
            return Err(GatewayError::NotAuthenticated);
        };

        let result = self.try_open_gate(kind, &token).await;
        match &result {
            Ok(_) => info!(user_id, gate = %kind, "Gate opened"),
            Err(e) => log_failure(&format!("open_gate:{}", kind), Some(user_id), e),
        }
        result
    }

    async fn try_open_gate(&self, kind: GateKind, token: &str) -> Result<Value, GatewayError> {
        let path = format!("/api/v1/gate/sip/open/{}", kind.path_segment());
        let response = self
            .http_client
            .post(self.url(&path))
            .headers(self.headers(Some(token))?)
            .send()
            .await?;

        let body = expect_ok(response, true).await?;
        serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Unexpected(format!("malformed gate response: {}", e)))
    }

    /// Fetch a camera snapshot on behalf of an authenticated user.
    ///
    /// Returns the raw image bytes on HTTP 200.
    pub async fn get_snapshot(
        &self,
        camera: CameraKind,
        user_id: i64,
    ) -> Result<Bytes, GatewayError> {
        let Some(token) = self.sessions.get(user_id) else {
            info!(user_id, camera = %camera, "Snapshot refused: user not authenticated");
            return Err(GatewayError::NotAuthenticated);
        };

        let result = self.try_get_snapshot(camera, &token).await;
        match &result {
            Ok(bytes) => info!(user_id, camera = %camera, bytes = bytes.len(), "Snapshot fetched"),
            Err(e) => log_failure(&format!("get_snapshot:{}", camera), Some(user_id), e),
        }
        result
    }

    async fn try_get_snapshot(
        &self,
        camera: CameraKind,
        token: &str,
    ) -> Result<Bytes, GatewayError> {
        let path = format!("/api/v1/camera/snapshot/{}", camera.path_segment());
        let response = self
            .http_client
            .get(self.url(&path))
            .headers(self.headers(Some(token))?)
            .send()
            .await?;

        // Failure bodies are logged but not carried: the endpoint speaks binary.
        expect_ok(response, false).await
    }

    /// Probe the backend health endpoint. True only on HTTP 200.
    pub async fn health_check(&self) -> bool {
        match self.try_health_check().await {
            Ok(_) => {
                debug!("Backend health check passed");
                true
            }
            Err(e) => {
                log_failure("health_check", None, &e);
                false
            }
        }
    }

    async fn try_health_check(&self) -> Result<Bytes, GatewayError> {
        let response = self
            .http_client
            .get(self.url(HEALTH_PATH))
            .headers(self.headers(None)?)
            .send()
            .await?;
        expect_ok(response, true).await
    }
}

/// Read the body of a 200 response, or turn anything else into `BadStatus`.
async fn expect_ok(response: Response, keep_failure_body: bool) -> Result<Bytes, GatewayError> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response.bytes().await?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(
        status = status.as_u16(),
        body = %truncate(&body, LOG_BODY_LIMIT),
        "Backend returned non-200 status"
    );

    Err(GatewayError::BadStatus {
        status: status.as_u16(),
        body: keep_failure_body.then_some(body),
    })
}

fn log_failure(operation: &str, user_id: Option<i64>, e: &GatewayError) {
    match e {
        GatewayError::NotAuthenticated => {
            info!(operation, ?user_id, "Backend call skipped: not authenticated")
        }
        GatewayError::BadStatus { status, body } => warn!(
            operation,
            ?user_id,
            status,
            body = %body.as_deref().map(|b| truncate(b, LOG_BODY_LIMIT)).unwrap_or_default(),
            "Backend rejected request"
        ),
        GatewayError::Timeout | GatewayError::Network(_) | GatewayError::Unexpected(_) => error!(
            operation,
            ?user_id,
            kind = e.kind(),
            error = %e,
            "Backend request failed"
        ),
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// =============================================================================
// Tests
// =============================================================================
