use hyper::Method;
use serde_json::Value;

use crate::error::{Result, TalkError};
use crate::ocs::client::endpoint;
use crate::talk::client::{TalkClient, http_error};
use crate::talk::types::Sharee;

/// Share type of plain users in the sharees API.
pub const SHARE_TYPE_USER: i64 = 0;

fn sharee_from(entry: &Value) -> Option<Sharee> {
    let value = entry.get("value")?;
    let id = value.get("shareWith").and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })?;
    let label = entry
        .get("label")
        .and_then(Value::as_str)
        .filter(|l| !l.trim().is_empty())
        .map_or_else(|| id.clone(), str::to_string);
    Some(Sharee {
        share_type: value
            .get("shareType")
            .and_then(Value::as_i64)
            .unwrap_or(SHARE_TYPE_USER),
        email: entry
            .get("shareWithDisplayNameUnique")
            .and_then(Value::as_str)
            .filter(|s| s.contains('@'))
            .map(str::to_string),
        id,
        label,
    })
}

/// Collect user suggestions from a sharees payload, exact matches first, without duplicates.
pub fn parse_sharees(data: &Value) -> Vec<Sharee> {
    let mut out: Vec<Sharee> = Vec::new();
    for pointer in ["/exact/users", "/users"] {
        let Some(entries) = data.pointer(pointer).and_then(Value::as_array) else {
            continue;
        };
        for sharee in entries.iter().filter_map(sharee_from) {
            if !out.iter().any(|s| s.id == sharee.id) {
                out.push(sharee);
            }
        }
    }
    out
}

impl TalkClient {
    /// Suggest server users matching `term` (for picking a delegate).
    pub async fn search_sharees(&self, term: &str, limit: usize) -> Result<Vec<Sharee>> {
        let (creds, verbose) = self.require_credentials()?;
        let mut url = endpoint(
            &creds.base_url,
            &["ocs", "v2.php", "apps", "files_sharing", "api", "v1", "sharees"],
        )?;
        url.query_pairs_mut()
            .append_pair("search", term.trim())
            .append_pair("itemType", "principals")
            .append_pair("lookup", "false")
            .append_pair("perPage", &limit.max(1).to_string())
            .append_pair("shareType[]", &SHARE_TYPE_USER.to_string())
            .append_pair("format", "json");

        let resp = self.call(&creds, verbose, Method::GET, url, None).await?;
        if !resp.is_success() {
            return Err(http_error("search sharees", &resp));
        }
        let data = resp
            .data()
            .ok_or_else(|| TalkError::Parse("sharees response is not JSON".into()))?;
        let mut sharees = parse_sharees(data);
        if limit > 0 {
            sharees.truncate(limit);
        }
        Ok(sharees)
    }
}
