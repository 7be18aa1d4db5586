pub mod settings;
pub mod store;
pub mod tuning;

pub use settings::{Credentials, Settings, normalize_base_url};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use tuning::{
    DescriptionLabels, EVENT_CONVERSATION_MIN_MAJOR, HttpOptions, LoginPollOptions, TalkConfig,
};
