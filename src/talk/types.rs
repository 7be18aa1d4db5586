use serde::{Deserialize, Serialize};

/// Whether the server can host event-bound conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SupportState {
    /// The server confirmed the feature.
    Supported,
    /// Confirmed absent, too old, or no credentials to ask with.
    Unsupported,
    /// No signal either way (network failure, parse failure, silent server).
    Unknown,
}

impl SupportState {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Supported,
            Some(false) => Self::Unsupported,
            None => Self::Unknown,
        }
    }

    pub fn is_definite(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Result of [`crate::TalkClient::get_event_conversation_support`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySupport {
    pub state: SupportState,
    /// Diagnostic trail of the probes that led to `state`.
    pub reason: String,
}

impl CapabilitySupport {
    pub fn new(state: SupportState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: reason.into(),
        }
    }
}

/// Input of [`crate::TalkClient::create_talk_public_room`].
#[derive(Debug, Clone, Default)]
pub struct CreateRoomParams {
    pub title: String,
    pub password: Option<String>,
    pub enable_lobby: bool,
    pub enable_listable: bool,
    pub description: Option<String>,
    /// Event start; seconds or milliseconds (see [`crate::common::normalize_unix_seconds`]).
    pub start_timestamp: Option<i64>,
    /// Server object type for event binding, `"event"` when unset.
    pub object_type: Option<String>,
    /// Server object id for event binding; derived from the start timestamp when unset.
    pub object_id: Option<String>,
    /// The caller would like the room bound to the calendar event.
    pub event_conversation: bool,
}

/// Outcome of a room creation. `token` and `url` are always usable as a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreationResult {
    pub url: String,
    pub token: String,
    /// The preferred path (event binding, or a server room at all) was not completed.
    pub fallback: bool,
    pub reason: Option<String>,
    pub description: String,
    /// The room is bound to the calendar event on the server.
    pub event_conversation: bool,
}

/// Input of [`crate::TalkClient::update_talk_lobby`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyUpdate {
    pub token: String,
    pub enable_lobby: bool,
    pub start_timestamp: Option<i64>,
}

/// Locally persisted facts about a room, keyed by room token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomMeta {
    pub lobby_enabled: bool,
    pub event_conversation: bool,
    pub start_timestamp: Option<i64>,
    pub delegated: bool,
    pub delegate_id: Option<String>,
    pub delegate_name: Option<String>,
    /// Unix milliseconds of the last change.
    pub updated_at: u64,
}

/// Room participant as listed by `GET room/{token}/participants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Participant {
    pub attendee_id: i64,
    pub actor_type: String,
    pub actor_id: String,
    pub display_name: String,
    pub participant_type: i64,
    pub status: Option<String>,
}

/// Subset of `GET room/{token}` the integration cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomInfo {
    pub token: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub room_type: i64,
    pub lobby_state: i64,
    pub lobby_timer: i64,
    pub listable: i64,
    pub participant_type: i64,
    pub object_type: String,
    pub object_id: String,
}

/// Result of [`crate::TalkClient::delegate_room_moderator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationOutcome {
    /// The acting user left the room after handing it over.
    pub left_self: bool,
    pub delegate: String,
    pub delegate_name: String,
    pub attendee_id: i64,
}

/// User suggestion from the files_sharing sharees API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sharee {
    pub id: String,
    pub label: String,
    pub share_type: i64,
    pub email: Option<String>,
}
