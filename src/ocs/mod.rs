pub mod client;
pub mod types;

pub use client::{OcsClient, OcsRequest, endpoint, spreed_room_url};
pub use types::{OcsBody, OcsResponse};
