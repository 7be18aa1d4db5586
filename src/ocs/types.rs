use hyper::StatusCode;
use serde_json::Value;

/// Request body variants understood by [`crate::ocs::OcsClient`].
#[derive(Debug, Clone, Default)]
pub enum OcsBody {
    #[default]
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// A response normalized to "JSON if it parses, raw text otherwise".
#[derive(Debug, Clone)]
pub struct OcsResponse {
    pub status: StatusCode,
    pub json: Option<Value>,
    pub raw: String,
}

impl OcsResponse {
    pub fn from_bytes(status: StatusCode, body: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(body).into_owned();
        let json = if raw.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&raw).ok()
        };
        Self { status, json, raw }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The `ocs.data` payload, or the whole document for non-OCS JSON.
    pub fn data(&self) -> Option<&Value> {
        let json = self.json.as_ref()?;
        match json.pointer("/ocs/data") {
            Some(data) => Some(data),
            None => Some(json),
        }
    }

    pub fn meta_message(&self) -> Option<&str> {
        self.json
            .as_ref()?
            .pointer("/ocs/meta/message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// `error` field of the payload, as Talk reports validation failures.
    pub fn payload_error(&self) -> Option<&str> {
        self.data()?
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    fn payload_message(&self) -> Option<&str> {
        self.data()?
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }

    /// Human-readable failure description: OCS meta message, payload error, HTTP status.
    pub fn error_detail(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for part in [
            self.meta_message(),
            self.payload_error(),
            self.payload_message(),
        ]
        .into_iter()
        .flatten()
        {
            if !parts.iter().any(|p| p == part) {
                parts.push(part.to_string());
            }
        }

        let status = match self.status.canonical_reason() {
            Some(reason) => format!("HTTP {} {}", self.status.as_u16(), reason),
            None => format!("HTTP {}", self.status.as_u16()),
        };

        if parts.is_empty() {
            status
        } else {
            format!("{} ({status})", parts.join("; "))
        }
    }
}
