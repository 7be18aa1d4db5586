use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by [`crate::TalkClient`].
///
/// Messages are meant to be shown to the user as-is.
#[derive(Debug, Error)]
pub enum TalkError {
    /// Base URL, user or app password is not configured.
    #[error("Nextcloud credentials missing: configure URL, user and app password")]
    CredentialsMissing,

    #[error("invalid Nextcloud URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A call central to the requested action failed on the server side.
    #[error("{operation} failed: {detail}")]
    Http {
        operation: &'static str,
        status: u16,
        detail: String,
    },

    /// The current user may not change the lobby of this room.
    #[error("no permission to change the lobby of room {token}")]
    LobbyForbidden { token: String },

    #[error("participant {target:?} not found in the room, check the spelling of the user name")]
    ParticipantNotFound { target: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("server did not return a room token")]
    MissingToken,

    #[error("login was not completed within {waited:?}")]
    LoginTimeout { waited: Duration },

    #[error("unexpected server response: {0}")]
    Parse(String),

    #[error("settings storage failed: {0}")]
    Storage(String),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl TalkError {
    /// HTTP status attached to the error, if it came from a server response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::LobbyForbidden { .. } => Some(403),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TalkError>;
