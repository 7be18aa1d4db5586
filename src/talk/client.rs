use std::sync::Arc;

use hyper::Method;
use serde_json::Value;
use url::Url;

use crate::carddav::types::Contact;
use crate::common::cache::TtlCache;
use crate::common::clock::{Clock, SystemClock};
use crate::config::settings::{Credentials, Settings};
use crate::config::store::SettingsStore;
use crate::config::tuning::TalkConfig;
use crate::error::{Result, TalkError};
use crate::ocs::client::{OcsClient, OcsRequest};
use crate::ocs::types::{OcsBody, OcsResponse};
use crate::talk::meta::RoomMetaStore;
use crate::talk::types::CapabilitySupport;

pub(crate) type AccountKey = (String, String);

/// Entry point for every Talk, address book and login operation.
///
/// Owns the pooled HTTP client, the settings store, the capability and address
/// book caches, and the room metadata mirror. Credentials are re-read from the
/// store on every call, so a settings change takes effect immediately.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use talk_link::{CreateRoomParams, MemoryStore, Settings, TalkClient};
///
/// # async fn demo() -> talk_link::Result<()> {
/// let store = Arc::new(MemoryStore::new(Settings {
///     base_url: "cloud.example.com".into(),
///     user: "alice".into(),
///     app_pass: "app-password".into(),
///     debug_enabled: false,
/// }));
/// let talk = TalkClient::new(store)?;
/// let room = talk
///     .create_talk_public_room(CreateRoomParams {
///         title: "Weekly sync".into(),
///         enable_lobby: true,
///         start_timestamp: Some(1_700_000_000),
///         event_conversation: true,
///         ..Default::default()
///     })
///     .await?;
/// println!("join at {}", room.url);
/// # Ok(())
/// # }
/// ```
pub struct TalkClient {
    pub(crate) ocs: OcsClient,
    pub(crate) store: Arc<dyn SettingsStore>,
    pub(crate) config: TalkConfig,
    pub(crate) capabilities: TtlCache<AccountKey, CapabilitySupport>,
    pub(crate) addressbook: TtlCache<AccountKey, Arc<Vec<Contact>>>,
    pub(crate) room_meta: RoomMetaStore,
}

impl TalkClient {
    /// Client with default tuning and the system clock.
    pub fn new(store: Arc<dyn SettingsStore>) -> Result<Self> {
        Self::with_config(store, TalkConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_config(
        store: Arc<dyn SettingsStore>,
        config: TalkConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ocs = OcsClient::new(config.request_timeout, &config.http)?;
        let room_meta = RoomMetaStore::load(store.clone(), clock.clone());
        Ok(Self {
            ocs,
            capabilities: TtlCache::new(config.capability_ttl, clock.clone()),
            addressbook: TtlCache::new(config.addressbook_ttl, clock),
            room_meta,
            store,
            config,
        })
    }

    pub fn config(&self) -> &TalkConfig {
        &self.config
    }

    pub fn room_meta(&self) -> &RoomMetaStore {
        &self.room_meta
    }

    /// React to an external change of the persisted state.
    ///
    /// The room metadata mirror is re-read; caches are keyed per account and
    /// need no flush when credentials change.
    pub fn on_storage_changed(&self) {
        self.room_meta.reload();
    }

    pub(crate) fn settings(&self) -> Result<Settings> {
        self.store
            .load_settings()
            .map_err(|e| TalkError::Storage(format!("{e:#}")))
    }

    /// Credentials plus the verbose-logging flag, or [`TalkError::CredentialsMissing`].
    pub(crate) fn require_credentials(&self) -> Result<(Credentials, bool)> {
        let settings = self.settings()?;
        match Credentials::from_settings(&settings)? {
            Some(creds) => Ok((creds, settings.debug_enabled)),
            None => Err(TalkError::CredentialsMissing),
        }
    }

    pub(crate) async fn call(
        &self,
        creds: &Credentials,
        verbose: bool,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<OcsResponse> {
        let mut request = OcsRequest::new(method, url).auth(creds).verbose(verbose);
        if let Some(body) = body {
            request.body = OcsBody::Json(body);
        }
        Ok(self.ocs.send(request).await?)
    }
}

/// Map a non-success response to [`TalkError::Http`].
pub(crate) fn http_error(operation: &'static str, resp: &OcsResponse) -> TalkError {
    TalkError::Http {
        operation,
        status: resp.status.as_u16(),
        detail: resp.error_detail(),
    }
}

pub(crate) fn require_token(token: &str) -> Result<&str> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TalkError::MissingToken);
    }
    Ok(token)
}
