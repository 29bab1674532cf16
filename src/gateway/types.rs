//! Request targets and payloads of the access-control backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Gates that can be opened through the SIP intercom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Pedestrian,
    /// Visitor gate (backend calls it "visits")
    Visitor,
}

impl GateKind {
    /// Backend path segment
    pub fn path_segment(self) -> &'static str {
        match self {
            GateKind::Pedestrian => "pedestrian",
            GateKind::Visitor => "visits",
        }
    }

    /// Name shown to users
    pub fn display_name(self) -> &'static str {
        match self {
            GateKind::Pedestrian => "pedestrian",
            GateKind::Visitor => "visits",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Cameras that can produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraKind {
    Pedestrian,
    Visitor,
    /// Front door camera, admin only (enforced by the backend)
    FrontDoor,
}

impl CameraKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            CameraKind::Pedestrian => "pedestrian",
            CameraKind::Visitor => "visits",
            CameraKind::FrontDoor => "front_door",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CameraKind::Pedestrian => "pedestrian",
            CameraKind::Visitor => "visits",
            CameraKind::FrontDoor => "front door",
        }
    }
}

impl fmt::Display for CameraKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Body of the Telegram identity verification request.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyTelegramRequest {
    pub telegram_id: String,
}

/// Verification response. Parsed leniently: a missing token is the caller's concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdentityPayload {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub resident_id: Option<Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<String>,

    /// Any other fields the backend sent
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityPayload {
    /// Non-empty access token, if the backend issued one.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Resident id as text; the backend may send a string or a number.
    pub fn resident_id(&self) -> Option<String> {
        match self.resident_id.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_full() {
        let payload: IdentityPayload = serde_json::from_value(json!({
            "access_token": "jwt",
            "resident_id": 17,
            "permissions": ["gate:pedestrian", "camera:visits"],
            "token_type": "bearer"
        }))
        .unwrap();

        assert_eq!(payload.access_token(), Some("jwt"));
        assert_eq!(payload.resident_id(), Some("17".to_string()));
        assert_eq!(payload.permissions.len(), 2);
        assert_eq!(payload.extra.get("token_type"), Some(&json!("bearer")));
    }

    #[test]
    fn test_payload_without_token() {
        let payload: IdentityPayload =
            serde_json::from_value(json!({ "detail": "pending approval", "permissions": null }))
                .unwrap();

        assert_eq!(payload.access_token(), None);
        assert_eq!(payload.resident_id(), None);
        assert!(payload.permissions.is_empty());
    }

    #[test]
    fn test_empty_token_is_treated_as_missing() {
        let payload: IdentityPayload =
            serde_json::from_value(json!({ "access_token": "", "resident_id": "r-1" })).unwrap();
        assert_eq!(payload.access_token(), None);
        assert_eq!(payload.resident_id(), Some("r-1".to_string()));
    }

    #[test]
    fn test_path_segments() {
        assert_eq!(GateKind::Visitor.path_segment(), "visits");
        assert_eq!(CameraKind::FrontDoor.path_segment(), "front_door");
        assert_eq!(CameraKind::FrontDoor.display_name(), "front door");
    }
}
