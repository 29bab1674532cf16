//! User-facing texts.

use crate::gateway::{CameraKind, GateKind};

use super::action::Action;

const BOT_TITLE: &str = "ColliCasa Access Control Bot";

fn command_list() -> String {
    let mut list = String::from("📋 Available Commands:\n");
    for action in Action::ALL {
        list.push_str(&format!("{} - {}\n", action, action.description()));
    }
    list
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn welcome_authenticated(first_name: &str, tenant_id: &str) -> String {
    format!(
        "👋 Welcome to {BOT_TITLE}!\n\n\
         Hi {first_name}! You've been successfully authenticated.\n\n\
         {commands}\n\
         🔧 Status: ✅ Authenticated\n\
         Tenant ID: {tenant_id}",
        commands = command_list(),
    )
}

pub fn welcome_unregistered(first_name: &str, user_id: i64) -> String {
    format!(
        "👋 Welcome to {BOT_TITLE}!\n\n\
         Hi {first_name}!\n\n\
         ⚠️ You are not registered in the system.\n\
         Please contact your administrator to register your Telegram account.\n\n\
         Your Telegram ID: {user_id}"
    )
}

pub fn help(authenticated: bool) -> String {
    let status = if authenticated {
        "✅ Authenticated"
    } else {
        "❌ Not authenticated (use /start)"
    };
    format!("{}\n🔧 Status: {}", command_list(), status)
}

pub fn unknown_command() -> String {
    "🤔 Unknown command. Use /help to see what I can do.".to_string()
}

pub fn not_authenticated() -> String {
    "❌ You are not authenticated. Please use /start to authenticate first.".to_string()
}

pub fn session_expired() -> String {
    "⚠️ Your session has expired. Please use /start to authenticate again.".to_string()
}

pub fn opening_gate(gate: GateKind) -> String {
    format!("🔄 Opening {} gate...", gate.display_name())
}

pub fn gate_opened(gate: GateKind) -> String {
    format!("✅ {} gate opened successfully!", capitalize(gate.display_name()))
}

pub fn gate_permission_denied(gate: GateKind) -> String {
    format!(
        "❌ You don't have permission to open the {} gate.\n\
         Please contact your administrator.",
        gate.display_name()
    )
}

pub fn gate_failed(gate: GateKind, error: &str) -> String {
    format!("❌ Failed to open {} gate: {}", gate.display_name(), error)
}

pub fn capturing_snapshot(camera: CameraKind) -> String {
    format!("📷 Capturing {} camera snapshot...", camera.display_name())
}

pub fn snapshot_caption(camera: CameraKind) -> String {
    format!("📸 {} camera snapshot", capitalize(camera.display_name()))
}

pub fn camera_permission_denied(camera: CameraKind) -> String {
    let advice = match camera {
        CameraKind::FrontDoor => "This camera is restricted to administrators only.",
        CameraKind::Pedestrian | CameraKind::Visitor => "Please contact your administrator.",
    };
    format!(
        "❌ You don't have permission to view the {} camera.\n{}",
        camera.display_name(),
        advice
    )
}

pub fn snapshot_failed(error: &str) -> String {
    format!("❌ Failed to get camera snapshot: {}", error)
}

/// Reply when a handler fails internally.
pub fn handler_apology() -> String {
    "❌ Sorry, an error occurred while processing your request.".to_string()
}

/// Reply when an update could not be handled at all.
pub fn global_apology() -> String {
    "⚠️ An error occurred while processing your request. \
     Please try again later or contact support."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_lists_every_command() {
        let text = welcome_authenticated("Ada", "tenant-9");
        for action in Action::ALL {
            assert!(text.contains(&action.to_string()), "missing {}", action);
        }
        assert!(text.contains("Hi Ada!"));
        assert!(text.contains("Tenant ID: tenant-9"));
    }

    #[test]
    fn test_unregistered_shows_user_id() {
        let text = welcome_unregistered("Bob", 123456);
        assert!(text.contains("not registered"));
        assert!(text.ends_with("Your Telegram ID: 123456"));
    }

    #[test]
    fn test_gate_and_camera_texts() {
        assert_eq!(
            gate_opened(GateKind::Pedestrian),
            "✅ Pedestrian gate opened successfully!"
        );
        assert_eq!(
            snapshot_caption(CameraKind::FrontDoor),
            "📸 Front door camera snapshot"
        );
        assert!(gate_permission_denied(GateKind::Visitor).contains("visits gate"));
        assert!(camera_permission_denied(CameraKind::Pedestrian).contains("administrator"));
    }

    #[test]
    fn test_front_door_denial_mentions_admin_only() {
        assert_eq!(
            camera_permission_denied(CameraKind::FrontDoor),
            "❌ You don't have permission to view the front door camera.\n\
             This camera is restricted to administrators only."
        );
        assert!(!camera_permission_denied(CameraKind::Visitor).contains("restricted"));
    }
}
