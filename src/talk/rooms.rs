use hyper::Method;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Value, json};

use crate::common::time::normalize_unix_seconds;
use crate::config::settings::Credentials;
use crate::config::tuning::DescriptionLabels;
use crate::error::{Result, TalkError};
use crate::ocs::client::spreed_room_url;
use crate::talk::classify::is_event_binding_rejection;
use crate::talk::client::{TalkClient, http_error, require_token};
use crate::talk::types::{
    CreateRoomParams, LobbyUpdate, Participant, RoomCreationResult, RoomInfo, SupportState,
};

/// Talk room type for public (link-joinable) conversations.
pub const ROOM_TYPE_PUBLIC: u8 = 3;

/// Default server object type for event-bound rooms.
pub const EVENT_OBJECT_TYPE: &str = "event";

const PSEUDO_TOKEN_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
struct EventBinding {
    object_type: String,
    object_id: String,
}

/// Join link of a room.
pub fn room_url(base_url: &str, token: &str) -> String {
    format!("{}/call/{}", base_url.trim_end_matches('/'), token)
}

/// Lobby PUT payload; the timer is only sent when enabling with a usable start.
pub fn build_lobby_payload(enable: bool, start_timestamp: Option<i64>) -> Value {
    let mut body = json!({ "state": u8::from(enable) });
    if enable && let Some(timer) = start_timestamp.and_then(normalize_unix_seconds) {
        body["timer"] = json!(timer);
    }
    body
}

/// Append the "join the call" block (and password line) to a caller description.
///
/// A description that already carries the link is returned unchanged, so
/// re-saving an event does not stack blocks.
pub fn build_room_description(
    description: Option<&str>,
    url: &str,
    password: Option<&str>,
    labels: &DescriptionLabels,
) -> String {
    let base = description.map(str::trim).unwrap_or_default();
    if !base.is_empty() && base.contains(url) {
        return base.to_string();
    }

    let mut out = String::new();
    if !base.is_empty() {
        out.push_str(base);
        out.push_str("\n\n");
    }
    out.push_str(&labels.join_heading);
    out.push_str(":\n");
    out.push_str(url);
    if let Some(pw) = password.map(str::trim).filter(|p| !p.is_empty()) {
        out.push('\n');
        out.push_str(&labels.password);
        out.push_str(": ");
        out.push_str(pw);
    }
    out
}

fn build_create_body(params: &CreateRoomParams, binding: Option<&EventBinding>) -> Value {
    let title = match params.title.trim() {
        "" => "Talk",
        title => title,
    };
    let mut body = json!({
        "roomType": ROOM_TYPE_PUBLIC,
        "roomName": title,
        "listable": u8::from(params.enable_listable),
    });
    if let Some(pw) = params.password.as_deref().filter(|p| !p.is_empty()) {
        body["password"] = json!(pw);
    }
    if let Some(desc) = params.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        body["description"] = json!(desc);
    }
    if let Some(binding) = binding {
        body["objectType"] = json!(binding.object_type);
        body["objectId"] = json!(binding.object_id);
    }
    body
}

fn event_binding(params: &CreateRoomParams, start: Option<i64>) -> Option<EventBinding> {
    let object_type = params
        .object_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(EVENT_OBJECT_TYPE)
        .to_string();
    let object_id = params
        .object_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| start.map(|s| s.to_string()))?;
    Some(EventBinding {
        object_type,
        object_id,
    })
}

fn pseudo_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PSEUDO_TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

fn token_from(resp: &crate::ocs::types::OcsResponse) -> Option<String> {
    resp.data()?
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl TalkClient {
    /// Create a public Talk room for a calendar event.
    ///
    /// When the caller asks for an event-bound room and the server is not known
    /// to lack support, a bound attempt is made first and a plain attempt after
    /// it. Attempts run strictly one after another:
    ///
    /// - a refusal of the event binding marks the capability unsupported and moves on;
    /// - an unreachable server moves on as well;
    /// - any other HTTP failure aborts with [`TalkError::Http`].
    ///
    /// If no attempt produced a room, a local pseudo-token link is returned with
    /// `fallback = true` so the event always carries a link. Lobby failures
    /// degrade the result; listable and description failures are only logged.
    pub async fn create_talk_public_room(
        &self,
        params: CreateRoomParams,
    ) -> Result<RoomCreationResult> {
        let (creds, verbose) = self.require_credentials()?;
        let start = params.start_timestamp.and_then(normalize_unix_seconds);
        let mut notes: Vec<String> = Vec::new();

        let mut attempts: Vec<Option<EventBinding>> = Vec::new();
        if params.event_conversation {
            let support = self.get_event_conversation_support().await;
            if support.state == SupportState::Unsupported {
                notes.push(format!("event conversations unsupported: {}", support.reason));
            } else {
                match event_binding(&params, start) {
                    Some(binding) => attempts.push(Some(binding)),
                    None => notes.push("no event object id to bind the room to".to_string()),
                }
            }
        }
        attempts.push(None);

        let mut created: Option<(String, bool)> = None;
        for binding in &attempts {
            let url = spreed_room_url(&creds.base_url, &[])?;
            let body = build_create_body(&params, binding.as_ref());
            let resp = match self.call(&creds, verbose, Method::POST, url, Some(body)).await {
                Ok(resp) => resp,
                Err(TalkError::Transport(e)) => {
                    tracing::warn!("room creation request failed: {e:#}");
                    notes.push(format!("server unreachable: {e}"));
                    continue;
                }
                Err(e) => return Err(e),
            };

            if resp.is_success() {
                let token = token_from(&resp).ok_or(TalkError::MissingToken)?;
                created = Some((token, binding.is_some()));
                break;
            }

            if binding.is_some() && is_event_binding_rejection(&resp) {
                let detail = resp.error_detail();
                self.mark_event_conversation_unsupported(&detail);
                tracing::info!("event binding rejected, trying a plain room: {detail}");
                notes.push(format!("event conversation rejected: {detail}"));
                continue;
            }

            return Err(http_error("create room", &resp));
        }

        let Some((token, event_bound)) = created else {
            let token = pseudo_token();
            let url = room_url(&creds.base_url, &token);
            tracing::warn!(%token, "no room could be created, returning a local link");
            let reason = if notes.is_empty() {
                "room could not be created".to_string()
            } else {
                notes.join(" | ")
            };
            return Ok(RoomCreationResult {
                description: build_room_description(
                    params.description.as_deref(),
                    &url,
                    params.password.as_deref(),
                    &self.config.labels,
                ),
                url,
                token,
                fallback: true,
                reason: Some(reason),
                event_conversation: false,
            });
        };

        let url = room_url(&creds.base_url, &token);
        let mut fallback = params.event_conversation && !event_bound;
        tracing::info!(%token, event_bound, "talk room created");

        let mut lobby_enabled = false;
        if params.enable_lobby {
            match self.put_lobby(&creds, verbose, &token, true, start).await {
                Ok(()) => lobby_enabled = true,
                Err(e) => {
                    tracing::warn!(%token, "lobby could not be enabled: {e}");
                    fallback = true;
                    notes.push(format!("lobby could not be enabled: {e}"));
                }
            }
        }

        if params.enable_listable
            && let Err(e) = self.put_listable(&creds, verbose, &token, true).await
        {
            tracing::warn!(%token, "listable scope not set: {e}");
        }

        let description = build_room_description(
            params.description.as_deref(),
            &url,
            params.password.as_deref(),
            &self.config.labels,
        );
        if !event_bound
            && let Err(e) = self.put_description(&creds, verbose, &token, &description).await
        {
            tracing::warn!(%token, "room description not set: {e}");
        }

        self.room_meta.update(&token, |meta| {
            meta.lobby_enabled = lobby_enabled;
            meta.event_conversation = event_bound;
            meta.start_timestamp = start;
        });

        let reason = fallback.then(|| {
            if notes.is_empty() {
                "event conversation not available".to_string()
            } else {
                notes.join(" | ")
            }
        });

        Ok(RoomCreationResult {
            url,
            token,
            fallback,
            reason,
            description,
            event_conversation: event_bound,
        })
    }

    /// Enable or disable the lobby; the timer travels only when enabling.
    ///
    /// HTTP 403 becomes [`TalkError::LobbyForbidden`].
    pub async fn update_talk_lobby(&self, update: LobbyUpdate) -> Result<()> {
        let (creds, verbose) = self.require_credentials()?;
        let token = require_token(&update.token)?;
        let start = update.start_timestamp.and_then(normalize_unix_seconds);
        self.put_lobby(&creds, verbose, token, update.enable_lobby, start)
            .await?;
        self.room_meta.update(token, |meta| {
            meta.lobby_enabled = update.enable_lobby;
            meta.start_timestamp = start;
        });
        Ok(())
    }

    /// Apply a calendar edit to the lobby unless the stored state already matches.
    ///
    /// Returns whether a request was sent.
    pub async fn sync_event_lobby(&self, update: LobbyUpdate) -> Result<bool> {
        let start = update.start_timestamp.and_then(normalize_unix_seconds);
        if self
            .room_meta
            .lobby_in_sync(update.token.trim(), update.enable_lobby, start)
        {
            tracing::debug!(token = %update.token, "lobby unchanged, skipping");
            return Ok(false);
        }
        self.update_talk_lobby(update).await?;
        Ok(true)
    }

    pub async fn set_listable(&self, token: &str, listable: bool) -> Result<()> {
        let (creds, verbose) = self.require_credentials()?;
        self.put_listable(&creds, verbose, require_token(token)?, listable)
            .await
    }

    pub async fn set_description(&self, token: &str, description: &str) -> Result<()> {
        let (creds, verbose) = self.require_credentials()?;
        self.put_description(&creds, verbose, require_token(token)?, description)
            .await
    }

    /// Delete a room. An already missing room (404) counts as deleted.
    pub async fn delete_talk_room(&self, token: &str) -> Result<()> {
        let (creds, verbose) = self.require_credentials()?;
        let token = require_token(token)?;
        let url = spreed_room_url(&creds.base_url, &[token])?;
        let resp = self.call(&creds, verbose, Method::DELETE, url, None).await?;
        if !resp.is_success() && resp.status.as_u16() != 404 {
            return Err(http_error("delete room", &resp));
        }
        self.room_meta.remove(token);
        tracing::info!(%token, "talk room deleted");
        Ok(())
    }

    /// Drop local metadata of a room whose calendar event went away.
    pub fn forget_room(&self, token: &str) {
        self.room_meta.remove(token.trim());
    }

    pub async fn get_room(&self, token: &str) -> Result<RoomInfo> {
        let (creds, verbose) = self.require_credentials()?;
        let url = spreed_room_url(&creds.base_url, &[require_token(token)?])?;
        let resp = self.call(&creds, verbose, Method::GET, url, None).await?;
        if !resp.is_success() {
            return Err(http_error("get room", &resp));
        }
        let data = resp
            .data()
            .cloned()
            .ok_or_else(|| TalkError::Parse("room response is not JSON".into()))?;
        serde_json::from_value(data).map_err(|e| TalkError::Parse(e.to_string()))
    }

    /// Participants of a room; a missing room yields an empty list.
    pub async fn get_participants(&self, token: &str) -> Result<Vec<Participant>> {
        let (creds, verbose) = self.require_credentials()?;
        self.fetch_participants(&creds, verbose, require_token(token)?)
            .await
    }

    pub(crate) async fn fetch_participants(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
    ) -> Result<Vec<Participant>> {
        let mut url = spreed_room_url(&creds.base_url, &[token, "participants"])?;
        url.set_query(Some("includeStatus=true"));
        let resp = self.call(creds, verbose, Method::GET, url, None).await?;
        if resp.status.as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !resp.is_success() {
            return Err(http_error("list participants", &resp));
        }
        match resp.data() {
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(TalkError::Parse(format!(
                "participants payload is not a list: {other}"
            ))),
        }
    }

    async fn put_lobby(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
        enable: bool,
        start: Option<i64>,
    ) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "webinar", "lobby"])?;
        let body = build_lobby_payload(enable, start);
        let resp = self.call(creds, verbose, Method::PUT, url, Some(body)).await?;
        if resp.status.as_u16() == 403 {
            return Err(TalkError::LobbyForbidden {
                token: token.to_string(),
            });
        }
        if !resp.is_success() {
            return Err(http_error("update lobby", &resp));
        }
        Ok(())
    }

    async fn put_listable(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
        listable: bool,
    ) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "listable"])?;
        let body = json!({ "scope": u8::from(listable) });
        let resp = self.call(creds, verbose, Method::PUT, url, Some(body)).await?;
        if !resp.is_success() {
            return Err(http_error("set listable scope", &resp));
        }
        Ok(())
    }

    async fn put_description(
        &self,
        creds: &Credentials,
        verbose: bool,
        token: &str,
        description: &str,
    ) -> Result<()> {
        let url = spreed_room_url(&creds.base_url, &[token, "description"])?;
        let body = json!({ "description": description });
        let resp = self.call(creds, verbose, Method::PUT, url, Some(body)).await?;
        if !resp.is_success() {
            return Err(http_error("set description", &resp));
        }
        Ok(())
    }
}
