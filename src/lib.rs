//! Nextcloud Talk bridge for calendar clients.
//!
//! This library gives a calendar integration everything it needs to attach
//! Talk rooms to events, built on hyper 1.x, rustls and tokio:
//!
//! - Public room creation with event binding when the server supports it and
//!   a plain room when it does not
//! - Lobby and start-time synchronization with calendar edits
//! - Moderator delegation (add, locate, promote, leave)
//! - The system address book (CardDAV vCard export) with case-insensitive search
//! - Login Flow v2 to obtain an app password
//!
//! Capability answers and the address book are cached per account with a
//! fixed TTL. Room metadata is mirrored from a [`SettingsStore`] so edits that
//! change nothing do not hit the server.
//!
//! # Examples
//!
//! ## Creating a room for an event
//!
//! ```no_run
//! use std::sync::Arc;
//! use talk_link::{CreateRoomParams, JsonFileStore, TalkClient};
//!
//! #[tokio::main]
//! async fn main() -> talk_link::Result<()> {
//!     let store = Arc::new(JsonFileStore::new("talk-link.json"));
//!     let talk = TalkClient::new(store)?;
//!
//!     let support = talk.get_event_conversation_support().await;
//!     println!("event conversations: {:?} ({})", support.state, support.reason);
//!
//!     let room = talk
//!         .create_talk_public_room(CreateRoomParams {
//!             title: "Planning".into(),
//!             password: Some("s3cret".into()),
//!             enable_lobby: true,
//!             start_timestamp: Some(1_700_000_000_000), // milliseconds are fine
//!             event_conversation: true,
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     if room.fallback {
//!         println!("degraded: {}", room.reason.unwrap_or_default());
//!     }
//!     println!("{}", room.description);
//!     Ok(())
//! }
//! ```
//!
//! ## Following calendar edits
//!
//! ```no_run
//! use talk_link::{LobbyUpdate, TalkClient};
//!
//! # async fn demo(talk: &TalkClient, token: &str) -> talk_link::Result<()> {
//! // The start moved: only sends a request when the stored state differs.
//! let sent = talk
//!     .sync_event_lobby(LobbyUpdate {
//!         token: token.to_string(),
//!         enable_lobby: true,
//!         start_timestamp: Some(1_700_003_600),
//!     })
//!     .await?;
//! println!("lobby request sent: {sent}");
//!
//! // Hand the room to a colleague; we leave unless it's ourselves.
//! let outcome = talk.delegate_room_moderator(token, "bob").await?;
//! println!("left room: {}", outcome.left_self);
//!
//! // Event deleted.
//! talk.delete_talk_room(token).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Address book search
//!
//! ```no_run
//! use talk_link::{AddressbookSearch, TalkClient};
//!
//! # async fn demo(talk: &TalkClient) -> talk_link::Result<()> {
//! let hits = talk
//!     .search_system_addressbook(&AddressbookSearch {
//!         search_term: "ali".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! for contact in hits {
//!     println!("{} <{}>", contact.label, contact.email);
//! }
//! # Ok(())
//! # }
//! ```

pub mod carddav;
pub mod common;
pub mod config;
pub mod error;
pub mod login;
pub mod ocs;
pub mod talk;

pub use carddav::{AddressbookSearch, Contact, filter_contacts, parse_contacts};
pub use common::{Clock, ManualClock, SystemClock, TtlCache, normalize_unix_seconds};
pub use config::{
    Credentials, HttpOptions, JsonFileStore, MemoryStore, Settings, SettingsStore, TalkConfig,
    normalize_base_url,
};
pub use error::{Result, TalkError};
pub use login::{LoginCredentials, LoginFlow};
pub use ocs::{OcsClient, OcsRequest, OcsResponse};
pub use talk::{
    CapabilitySupport, CreateRoomParams, DelegationOutcome, LobbyUpdate, Participant,
    RoomCreationResult, RoomInfo, RoomMeta, RoomMetaStore, Sharee, SupportState, TalkClient,
};
