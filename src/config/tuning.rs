use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lowest Nextcloud major version that can host event-bound conversations.
pub const EVENT_CONVERSATION_MIN_MAJOR: u64 = 32;

/// Behavioural knobs of [`crate::TalkClient`].
///
/// The version threshold and feature tokens track server releases; override
/// them here instead of patching the resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TalkConfig {
    #[serde(with = "duration_secs")]
    pub capability_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub addressbook_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    pub event_conversation_min_major: u64,
    pub event_feature_tokens: Vec<String>,
    pub labels: DescriptionLabels,
    pub login: LoginPollOptions,
    pub http: HttpOptions,
}

impl Default for TalkConfig {
    fn default() -> Self {
        Self {
            capability_ttl: Duration::from_secs(5 * 60),
            addressbook_ttl: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(20),
            event_conversation_min_major: EVENT_CONVERSATION_MIN_MAJOR,
            event_feature_tokens: vec![
                "event-conversation".to_string(),
                "dashboard-event-rooms".to_string(),
            ],
            labels: DescriptionLabels::default(),
            login: LoginPollOptions::default(),
            http: HttpOptions::default(),
        }
    }
}

/// Strings for the "join the call" block appended to room descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptionLabels {
    pub join_heading: String,
    pub password: String,
}

impl Default for DescriptionLabels {
    fn default() -> Self {
        Self {
            join_heading: "Join the call".to_string(),
            password: "Password".to_string(),
        }
    }
}

/// Login Flow v2 polling parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginPollOptions {
    #[serde(with = "duration_millis")]
    pub interval: Duration,
    #[serde(with = "duration_millis")]
    pub deadline: Duration,
    pub device_name: String,
}

impl Default for LoginPollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2_000),
            deadline: Duration::from_millis(120_000),
            device_name: "nc-talk-link".to_string(),
        }
    }
}

/// Connection pool and TLS settings of the shared HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HttpOptions {
    pub pool_max_idle_per_host: usize,
    #[serde(with = "duration_secs")]
    pub pool_idle_timeout: Duration,
    pub http2: bool,
    /// Trust the platform store; the bundled WebPKI roots are used otherwise.
    pub native_roots: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
            http2: true,
            native_roots: true,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
