use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, TalkError};

/// Settings persisted by the host (options page / login flow).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub base_url: String,
    pub user: String,
    pub app_pass: String,
    pub debug_enabled: bool,
}

/// Credentials for one request. Built fresh from [`Settings`] on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub user: String,
    pub app_pass: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("app_pass", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Returns `None` when any of URL, user or app password is blank.
    ///
    /// An unparsable URL is reported as an error rather than as missing.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let user = settings.user.trim();
        let app_pass = settings.app_pass.trim();
        if settings.base_url.trim().is_empty() || user.is_empty() || app_pass.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            base_url: normalize_base_url(&settings.base_url)?,
            user: user.to_string(),
            app_pass: app_pass.to_string(),
        }))
    }

    /// Key used to scope caches to one account on one server.
    pub fn cache_key(&self) -> (String, String) {
        (self.base_url.clone(), self.user.clone())
    }
}

/// Normalize a user-entered server address.
///
/// Adds `https://` when the scheme is missing and strips trailing slashes, so
/// `cloud.example.com/` becomes `https://cloud.example.com`.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TalkError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "empty".into(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).map_err(|e| TalkError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(TalkError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "expected an http(s) URL with a host".into(),
        });
    }

    let mut normalized = parsed.as_str().to_string();
    if let Some(pos) = normalized.find(['?', '#']) {
        normalized.truncate(pos);
    }
    Ok(normalized.trim_end_matches('/').to_string())
}
