//! Nextcloud Login Flow v2.
//!
//! The user opens `login_url` in a browser and grants access; meanwhile the
//! client polls until the server hands out an app password.

use hyper::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{Instant, sleep};

use crate::config::settings::{Settings, normalize_base_url};
use crate::config::tuning::LoginPollOptions;
use crate::error::{Result, TalkError};
use crate::ocs::client::{OcsRequest, endpoint};
use crate::ocs::types::OcsResponse;
use crate::talk::client::{TalkClient, http_error};

/// A started login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFlow {
    /// Page the user has to open to grant access.
    pub login_url: String,
    pub poll_endpoint: String,
    pub poll_token: String,
}

/// What the server returns once access was granted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCredentials {
    pub server: String,
    pub login_name: String,
    pub app_password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("server", &self.server)
            .field("login_name", &self.login_name)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    pub fn into_settings(self, debug_enabled: bool) -> Result<Settings> {
        Ok(Settings {
            base_url: normalize_base_url(&self.server)?,
            user: self.login_name,
            app_pass: self.app_password,
            debug_enabled,
        })
    }
}

fn str_at<'a>(doc: &'a Value, pointer: &str) -> Option<&'a str> {
    doc.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Read the start response (`{poll: {token, endpoint}, login}`).
pub fn parse_login_flow(resp: &OcsResponse) -> Result<LoginFlow> {
    let doc = resp
        .json
        .as_ref()
        .ok_or_else(|| TalkError::Parse("login flow response is not JSON".into()))?;
    let field = |pointer: &str| {
        str_at(doc, pointer)
            .map(str::to_string)
            .ok_or_else(|| TalkError::Parse(format!("login flow response lacks {pointer}")))
    };
    Ok(LoginFlow {
        login_url: field("/login")?,
        poll_endpoint: field("/poll/endpoint")?,
        poll_token: field("/poll/token")?,
    })
}

/// Read the final poll response (`{server, loginName, appPassword}`).
pub fn parse_login_credentials(resp: &OcsResponse) -> Result<LoginCredentials> {
    let doc = resp
        .json
        .as_ref()
        .ok_or_else(|| TalkError::Parse("login poll response is not JSON".into()))?;
    serde_json::from_value(doc.clone()).map_err(|e| TalkError::Parse(e.to_string()))
}

impl TalkClient {
    /// Start a login flow against `base_url`. No credentials are needed.
    pub async fn start_login_flow(&self, base_url: &str) -> Result<LoginFlow> {
        let base = normalize_base_url(base_url)?;
        let url = endpoint(&base, &["index.php", "login", "v2"])?;
        let resp = self.ocs.send(OcsRequest::new(Method::POST, url)).await?;
        if !resp.is_success() {
            return Err(http_error("start login flow", &resp));
        }
        let flow = parse_login_flow(&resp)?;
        tracing::info!(login_url = %flow.login_url, "login flow started");
        Ok(flow)
    }

    /// Poll with the configured interval and deadline.
    pub async fn poll_login_flow(&self, flow: &LoginFlow) -> Result<LoginCredentials> {
        self.poll_login_flow_with(flow, &self.config.login).await
    }

    /// Poll until credentials arrive or `options.deadline` passes.
    ///
    /// HTTP 404 means "not granted yet"; any other failure ends the flow.
    pub async fn poll_login_flow_with(
        &self,
        flow: &LoginFlow,
        options: &LoginPollOptions,
    ) -> Result<LoginCredentials> {
        let url = url::Url::parse(&flow.poll_endpoint)
            .map_err(|e| TalkError::Parse(format!("poll endpoint: {e}")))?;
        let started = Instant::now();
        loop {
            let request = OcsRequest::new(Method::POST, url.clone()).form(vec![
                ("token".to_string(), flow.poll_token.clone()),
                ("deviceName".to_string(), options.device_name.clone()),
            ]);
            let resp = self.ocs.send(request).await?;
            if resp.is_success() {
                let creds = parse_login_credentials(&resp)?;
                tracing::info!(user = %creds.login_name, "login flow completed");
                return Ok(creds);
            }
            if resp.status.as_u16() != 404 {
                return Err(http_error("poll login flow", &resp));
            }

            let waited = started.elapsed();
            if waited + options.interval > options.deadline {
                return Err(TalkError::LoginTimeout { waited });
            }
            sleep(options.interval).await;
        }
    }

    /// Poll to completion and persist the resulting settings.
    pub async fn complete_login_flow(&self, flow: &LoginFlow) -> Result<Settings> {
        let debug_enabled = self.settings().map(|s| s.debug_enabled).unwrap_or(false);
        let settings = self
            .poll_login_flow(flow)
            .await?
            .into_settings(debug_enabled)?;
        self.store
            .save_settings(&settings)
            .map_err(|e| TalkError::Storage(format!("{e:#}")))?;
        Ok(settings)
    }
}
