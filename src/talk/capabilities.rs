//! Event-conversation capability detection.
//!
//! Two probes are consulted: the Talk capability endpoint first, then the
//! generic cloud capabilities (which also carry the server version). Definite
//! answers are cached per account for the configured TTL; `Unknown` never is.

use hyper::Method;
use serde_json::Value;

use crate::config::settings::Credentials;
use crate::ocs::client::endpoint;
use crate::talk::client::TalkClient;
use crate::talk::types::{CapabilitySupport, SupportState};

/// Boolean keys some server versions use to state support explicitly.
pub const EXPLICIT_FLAG_KEYS: &[&str] = &[
    "event-conversation",
    "event-conversations",
    "eventConversation",
    "eventConversations",
    "event_conversation",
];

/// Config key whose presence implies event conversations exist on the server.
pub const EVENT_RETENTION_KEY: &str = "retention-event";

const FEATURE_LISTS: &[&str] = &[
    "features",
    "optionalFeatures",
    "optional-features",
    "localFeatures",
    "local-features",
];

/// A feature string announces event conversations.
///
/// Matches one of `tokens` exactly, or any string mentioning both "event" and
/// "conversation".
pub fn is_event_feature(feature: &str, tokens: &[String]) -> bool {
    let lower = feature.trim().to_ascii_lowercase();
    tokens.iter().any(|t| t.eq_ignore_ascii_case(&lower))
        || (lower.contains("event") && lower.contains("conversation"))
}

fn spreed_nodes(doc: &Value) -> Vec<&Value> {
    [
        "/ocs/data/capabilities/spreed",
        "/ocs/data/spreed",
        "/capabilities/spreed",
        "/spreed",
        "/ocs/data",
    ]
    .iter()
    .filter_map(|ptr| doc.pointer(ptr))
    .filter(|node| node.is_object())
    .collect()
}

fn explicit_flag(node: &Value) -> Option<bool> {
    let direct = EXPLICIT_FLAG_KEYS
        .iter()
        .find_map(|key| node.get(*key).and_then(Value::as_bool));
    if direct.is_some() {
        return direct;
    }
    let config = node.get("config")?.as_object()?;
    config.values().find_map(|section| {
        EXPLICIT_FLAG_KEYS
            .iter()
            .find_map(|key| section.get(*key).and_then(Value::as_bool))
    })
}

fn advertises_feature(node: &Value, tokens: &[String]) -> bool {
    FEATURE_LISTS.iter().any(|list| {
        node.get(*list)
            .and_then(Value::as_array)
            .is_some_and(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|f| is_event_feature(f, tokens))
            })
    })
}

fn has_event_retention(node: &Value) -> bool {
    node.get("config")
        .and_then(Value::as_object)
        .is_some_and(|config| {
            config
                .values()
                .any(|section| section.get(EVENT_RETENTION_KEY).is_some())
        })
}

/// Look for an event-conversation signal in a capabilities document.
///
/// `Some(true)` for an explicit flag, a matching feature token or the retention
/// key; `Some(false)` only for an explicit `false` flag; `None` otherwise.
pub fn parse_event_conversation_flag(doc: &Value, tokens: &[String]) -> Option<bool> {
    let nodes = spreed_nodes(doc);
    if let Some(flag) = nodes.iter().find_map(|n| explicit_flag(n)) {
        return Some(flag);
    }
    if nodes
        .iter()
        .any(|n| advertises_feature(n, tokens) || has_event_retention(n))
    {
        return Some(true);
    }
    None
}

/// Server major version from `cloud/capabilities` (`ocs.data.version.major`).
pub fn parse_server_major_version(doc: &Value) -> Option<u64> {
    let version = doc
        .pointer("/ocs/data/version")
        .or_else(|| doc.get("version"))?;
    match version.get("major") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => version
            .get("string")
            .and_then(Value::as_str)
            .and_then(|s| s.split('.').next())
            .and_then(|major| major.trim().parse().ok()),
    }
}

/// Combine the Talk probe with the cloud probe into the final answer.
///
/// The Talk probe wins when it is definite; otherwise the cloud flag, then the
/// version threshold, decide. Reasons of every probe consulted are kept.
pub fn resolve_support(
    talk: (Option<bool>, String),
    cloud: Option<(Option<bool>, String)>,
) -> CapabilitySupport {
    let mut reasons = vec![talk.1];
    let mut flag = talk.0;
    if flag.is_none()
        && let Some((cloud_flag, cloud_reason)) = cloud
    {
        reasons.push(cloud_reason);
        flag = cloud_flag;
    }
    CapabilitySupport::new(SupportState::from_flag(flag), reasons.join(" | "))
}

impl TalkClient {
    /// Can this server host event-bound conversations?
    ///
    /// Never fails: transport and parse problems come back as
    /// [`SupportState::Unknown`] with the error in `reason`.
    pub async fn get_event_conversation_support(&self) -> CapabilitySupport {
        let settings = match self.settings() {
            Ok(s) => s,
            Err(e) => return CapabilitySupport::new(SupportState::Unknown, e.to_string()),
        };
        let creds = match Credentials::from_settings(&settings) {
            Ok(Some(creds)) => creds,
            Ok(None) => {
                return CapabilitySupport::new(SupportState::Unsupported, "credentials missing");
            }
            Err(e) => return CapabilitySupport::new(SupportState::Unsupported, e.to_string()),
        };

        let key = creds.cache_key();
        if let Some(hit) = self.capabilities.get(&key)
            && hit.state.is_definite()
        {
            return hit;
        }

        let verbose = settings.debug_enabled;
        let talk = self.probe_talk_capabilities(&creds, verbose).await;
        let cloud = if talk.0.is_none() {
            Some(self.probe_cloud_capabilities(&creds, verbose).await)
        } else {
            None
        };

        let support = resolve_support(talk, cloud);
        tracing::debug!(
            state = ?support.state,
            reason = %support.reason,
            "event conversation support"
        );
        if support.state.is_definite() {
            self.capabilities.insert(key, support.clone());
        }
        support
    }

    /// Record that the server refused an event-bound room, ahead of the TTL.
    pub fn mark_event_conversation_unsupported(&self, reason: &str) {
        let Ok((creds, _)) = self.require_credentials() else {
            return;
        };
        tracing::info!("event conversations marked unsupported: {reason}");
        self.capabilities.insert(
            creds.cache_key(),
            CapabilitySupport::new(
                SupportState::Unsupported,
                format!("event conversation rejected: {reason}"),
            ),
        );
    }

    async fn probe_talk_capabilities(
        &self,
        creds: &Credentials,
        verbose: bool,
    ) -> (Option<bool>, String) {
        let url = match endpoint(
            &creds.base_url,
            &["ocs", "v2.php", "apps", "spreed", "api", "v4", "capabilities"],
        ) {
            Ok(url) => url,
            Err(e) => return (None, format!("talk capabilities: {e}")),
        };
        let resp = match self.call(creds, verbose, Method::GET, url, None).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("talk capability probe failed: {e}");
                return (None, format!("talk capabilities request failed: {e}"));
            }
        };
        if resp.status.as_u16() == 404 {
            return (None, "talk capabilities endpoint not found (404)".to_string());
        }
        if !resp.is_success() {
            return (None, format!("talk capabilities: {}", resp.error_detail()));
        }
        let Some(doc) = resp.json.as_ref() else {
            return (None, "talk capabilities: response is not JSON".to_string());
        };
        match parse_event_conversation_flag(doc, &self.config.event_feature_tokens) {
            Some(true) => (
                Some(true),
                "talk capabilities advertise event conversations".into(),
            ),
            Some(false) => (
                Some(false),
                "talk capabilities disable event conversations".into(),
            ),
            None => (None, "talk capabilities: no event conversation signal".into()),
        }
    }

    async fn probe_cloud_capabilities(
        &self,
        creds: &Credentials,
        verbose: bool,
    ) -> (Option<bool>, String) {
        let url = match endpoint(&creds.base_url, &["ocs", "v2.php", "cloud", "capabilities"]) {
            Ok(url) => url,
            Err(e) => return (None, format!("cloud capabilities: {e}")),
        };
        let resp = match self.call(creds, verbose, Method::GET, url, None).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("cloud capability probe failed: {e}");
                return (None, format!("cloud capabilities request failed: {e}"));
            }
        };
        if !resp.is_success() {
            return (None, format!("cloud capabilities: {}", resp.error_detail()));
        }
        let Some(doc) = resp.json.as_ref() else {
            return (None, "cloud capabilities: response is not JSON".to_string());
        };

        match parse_event_conversation_flag(doc, &self.config.event_feature_tokens) {
            Some(true) => {
                return (
                    Some(true),
                    "cloud capabilities advertise event conversations".into(),
                );
            }
            Some(false) => {
                return (
                    Some(false),
                    "cloud capabilities disable event conversations".into(),
                );
            }
            None => {}
        }

        let threshold = self.config.event_conversation_min_major;
        match parse_server_major_version(doc) {
            Some(major) if major < threshold => (
                Some(false),
                format!("server version {major} is below {threshold}"),
            ),
            Some(major) => (
                None,
                format!("server version {major} may support event conversations, no explicit flag"),
            ),
            None => (None, "cloud capabilities: no version information".into()),
        }
    }
}
