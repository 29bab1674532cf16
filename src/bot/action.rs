//! User actions, independent of the messaging transport.

use std::fmt;

use crate::gateway::{CameraKind, GateKind};

/// Something a user asked the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Authenticate against the backend and show the command list
    Start,
    Help,
    OpenPedestrian,
    OpenVisits,
    SnapshotPedestrian,
    SnapshotVisits,
    /// Admin only; the backend decides
    SnapshotFrontDoor,
}

impl Action {
    /// Every action, in the order shown to users.
    pub const ALL: [Action; 7] = [
        Action::Start,
        Action::Help,
        Action::OpenPedestrian,
        Action::OpenVisits,
        Action::SnapshotPedestrian,
        Action::SnapshotVisits,
        Action::SnapshotFrontDoor,
    ];

    /// Command name without the leading slash
    pub fn command(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Help => "help",
            Action::OpenPedestrian => "open_pedestrian",
            Action::OpenVisits => "open_visits",
            Action::SnapshotPedestrian => "snapshot_pedestrian",
            Action::SnapshotVisits => "snapshot_visits",
            Action::SnapshotFrontDoor => "snapshot_front_door",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Action::Start => "Authenticate and show this help message",
            Action::Help => "Show available commands",
            Action::OpenPedestrian => "Open the pedestrian gate",
            Action::OpenVisits => "Open the visits gate",
            Action::SnapshotPedestrian => "Get pedestrian camera snapshot",
            Action::SnapshotVisits => "Get visits camera snapshot",
            Action::SnapshotFrontDoor => "Get front door camera snapshot (admin only)",
        }
    }

    /// Parse a chat message such as `/open_pedestrian` or `/start@collicasa_bot now`.
    ///
    /// Returns `None` for anything that is not a known command.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let command = word.strip_prefix('/')?;
        let command = command.split('@').next().unwrap_or(command);

        Action::ALL
            .into_iter()
            .find(|action| action.command().eq_ignore_ascii_case(command))
    }

    /// Gate targeted by this action, if it opens one.
    pub fn gate(self) -> Option<GateKind> {
        match self {
            Action::OpenPedestrian => Some(GateKind::Pedestrian),
            Action::OpenVisits => Some(GateKind::Visitor),
            _ => None,
        }
    }

    /// Camera targeted by this action, if it takes a snapshot.
    pub fn camera(self) -> Option<CameraKind> {
        match self {
            Action::SnapshotPedestrian => Some(CameraKind::Pedestrian),
            Action::SnapshotVisits => Some(CameraKind::Visitor),
            Action::SnapshotFrontDoor => Some(CameraKind::FrontDoor),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Action::parse("/start"), Some(Action::Start));
        assert_eq!(Action::parse("/open_visits"), Some(Action::OpenVisits));
        assert_eq!(
            Action::parse("/snapshot_front_door"),
            Some(Action::SnapshotFrontDoor)
        );
    }

    #[test]
    fn test_parse_bot_suffix_and_arguments() {
        assert_eq!(
            Action::parse("/open_pedestrian@collicasa_bot"),
            Some(Action::OpenPedestrian)
        );
        assert_eq!(Action::parse("  /start extra words"), Some(Action::Start));
        assert_eq!(Action::parse("/HELP"), Some(Action::Help));
    }

    #[test]
    fn test_parse_rejects_other_text() {
        assert_eq!(Action::parse("start"), None);
        assert_eq!(Action::parse("/open_garage"), None);
        assert_eq!(Action::parse(""), None);
        assert_eq!(Action::parse("/"), None);
    }

    #[test]
    fn test_targets() {
        assert_eq!(Action::OpenVisits.gate(), Some(GateKind::Visitor));
        assert_eq!(Action::OpenVisits.camera(), None);
        assert_eq!(Action::SnapshotFrontDoor.camera(), Some(CameraKind::FrontDoor));
        assert_eq!(Action::Start.gate(), None);
        assert_eq!(Action::Start.to_string(), "/start");
    }
}
