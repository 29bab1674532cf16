//! Failure taxonomy shared by every backend call.

/// Why a backend call did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No valid session for the user; no request was sent
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Request timed out")]
    Timeout,

    /// DNS, connect or transport failure
    #[error("Request failed: {0}")]
    Network(String),

    /// Backend answered with something other than 200
    #[error("API returned status {status}")]
    BadStatus { status: u16, body: Option<String> },

    /// Anything else, e.g. an undecodable 200 response
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl GatewayError {
    /// Stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotAuthenticated => "not_authenticated",
            GatewayError::Timeout => "timeout",
            GatewayError::Network(_) => "network_error",
            GatewayError::BadStatus { .. } => "bad_status",
            GatewayError::Unexpected(_) => "unexpected_error",
        }
    }

    /// Raw response body, when the backend sent a textual one.
    pub fn details(&self) -> Option<&str> {
        match self {
            GatewayError::BadStatus { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// HTTP status, for bad-status failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend refused the action on permission grounds.
    ///
    /// True for 403, or when the error text or body mentions "permission" or
    /// "forbidden". A 401 is a rejected credential, not a permission problem.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            GatewayError::BadStatus { status: 403, .. } => true,
            GatewayError::BadStatus { status: 401, .. } => false,
            GatewayError::BadStatus { body, .. } => {
                body.as_deref().is_some_and(mentions_permission)
            }
            GatewayError::NotAuthenticated => false,
            other => mentions_permission(&other.to_string()),
        }
    }

    /// Whether the backend no longer accepts the user's token (HTTP 401).
    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, GatewayError::BadStatus { status: 401, .. })
    }

    /// Whether the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, GatewayError::Timeout | GatewayError::Network(_))
    }
}

/// Case-insensitive check for permission wording in backend messages.
pub fn mentions_permission(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("permission") || lower.contains("forbidden")
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_connect() || e.is_request() || e.is_body() {
            GatewayError::Network(e.to_string())
        } else {
            GatewayError::Unexpected(e.to_string())
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for GatewayError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        GatewayError::Unexpected(format!("invalid header value: {}", e))
    }
}
