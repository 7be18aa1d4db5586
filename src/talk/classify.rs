//! Recognizing "the server refused the event binding" among room-creation failures.
//!
//! Talk reports this only through free text and short error codes, so the match
//! is a word-level heuristic. Servers that phrase the refusal differently end up
//! as fatal creation errors instead of falling back to a plain room.

use crate::ocs::types::OcsResponse;

/// Payload `error` codes that name the rejected object binding.
pub const EVENT_REJECTION_CODES: &[&str] = &["object", "object-type", "object-id", "event"];

/// Lower-cased words searched in the meta message, payload error and message.
///
/// `event-` or `event_` prefixed words (`event-conversation`) also count, and so
/// does `object` directly followed by `type` or `id`.
pub const EVENT_REJECTION_MARKERS: &[&str] = &[
    "objecttype",
    "object_type",
    "object-type",
    "objectid",
    "object_id",
    "object-id",
    "event",
    "events",
];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_marker(text: &str) -> bool {
    let words = words(text);
    let single = words.iter().any(|w| {
        EVENT_REJECTION_MARKERS.contains(&w.as_str())
            || w.starts_with("event-")
            || w.starts_with("event_")
    });
    single
        || words
            .windows(2)
            .any(|pair| pair[0] == "object" && matches!(pair[1].as_str(), "type" | "id"))
}

/// Whether a failed create-room response rejected the event object binding.
///
/// Only 4xx responses qualify, and auth or rate-limit failures (401, 403, 429) never do.
/// The raw body is searched only when it is not JSON.
pub fn is_event_binding_rejection(resp: &OcsResponse) -> bool {
    let status = resp.status.as_u16();
    if !(400..500).contains(&status) || matches!(status, 401 | 403 | 429) {
        return false;
    }

    if resp
        .payload_error()
        .is_some_and(|code| EVENT_REJECTION_CODES.iter().any(|c| code.eq_ignore_ascii_case(c)))
    {
        return true;
    }

    let mut haystack = String::new();
    for part in [
        resp.meta_message(),
        resp.payload_error(),
        resp.data()
            .and_then(|d| d.get("message"))
            .and_then(serde_json::Value::as_str),
    ]
    .into_iter()
    .flatten()
    {
        haystack.push_str(part);
        haystack.push(' ');
    }
    if resp.json.is_none() {
        haystack.push_str(&resp.raw);
    }

    has_marker(&haystack)
}
