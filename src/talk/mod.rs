pub mod capabilities;
pub mod classify;
pub mod client;
pub mod delegation;
pub mod meta;
pub mod rooms;
pub mod sharees;
pub mod types;

pub use capabilities::{
    is_event_feature, parse_event_conversation_flag, parse_server_major_version, resolve_support,
};
pub use classify::is_event_binding_rejection;
pub use client::TalkClient;
pub use delegation::{DelegationStep, locate_participant, same_user};
pub use meta::RoomMetaStore;
pub use rooms::{build_lobby_payload, build_room_description, room_url};
pub use sharees::parse_sharees;
pub use types::{
    CapabilitySupport, CreateRoomParams, DelegationOutcome, LobbyUpdate, Participant,
    RoomCreationResult, RoomInfo, RoomMeta, Sharee, SupportState,
};
