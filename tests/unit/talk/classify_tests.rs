use hyper::StatusCode;
use serde_json::json;
use talk_link::OcsResponse;
use talk_link::talk::is_event_binding_rejection;

fn response(status: u16, body: &str) -> OcsResponse {
    OcsResponse::from_bytes(StatusCode::from_u16(status).unwrap(), body.as_bytes())
}

fn ocs(status: u16, message: &str, data: serde_json::Value) -> OcsResponse {
    let body = json!({"ocs": {"meta": {"status": "failure", "message": message}, "data": data}});
    response(status, &body.to_string())
}

#[test]
fn payload_error_codes_are_rejections() {
    for code in ["object", "object-type", "object-id", "event", "OBJECT"] {
        assert!(
            is_event_binding_rejection(&ocs(400, "", json!({"error": code}))),
            "code {code}"
        );
    }
}

#[test]
fn markers_in_messages_are_rejections() {
    assert!(is_event_binding_rejection(&ocs(
        400,
        "Invalid objectType",
        json!([])
    )));
    assert!(is_event_binding_rejection(&ocs(
        422,
        "",
        json!({"message": "The object ID is not valid"})
    )));
    assert!(is_event_binding_rejection(&response(
        400,
        "object_type not allowed"
    )));
}

#[test]
fn unrelated_client_errors_are_not_rejections() {
    assert!(!is_event_binding_rejection(&ocs(
        400,
        "Room name too long",
        json!({"error": "name"})
    )));
}

#[test]
fn auth_rate_limit_and_server_errors_are_never_rejections() {
    for status in [401, 403, 429, 500, 503] {
        assert!(
            !is_event_binding_rejection(&ocs(status, "event binding refused", json!({"error": "event"}))),
            "status {status}"
        );
    }
}

#[test]
fn raw_body_is_ignored_when_json_parses() {
    // the word only appears in a key, not in a message
    let resp = ocs(400, "", json!({"eventually": 1}));
    assert!(!is_event_binding_rejection(&resp));
}

#[test]
fn words_merely_containing_event_are_not_rejections() {
    for message in [
        "Room creation prevented by administrator policy",
        "Please retry eventually",
        "Inventory of rooms exhausted",
    ] {
        assert!(
            !is_event_binding_rejection(&ocs(400, message, json!({"error": "policy"}))),
            "message {message}"
        );
    }
    assert!(!is_event_binding_rejection(&response(400, "request prevented")));
}

#[test]
fn event_words_and_split_object_markers_are_rejections() {
    assert!(is_event_binding_rejection(&ocs(
        400,
        "Event conversations are disabled",
        json!([])
    )));
    assert!(is_event_binding_rejection(&ocs(
        400,
        "",
        json!({"message": "event-conversation not allowed"})
    )));
    assert!(is_event_binding_rejection(&ocs(
        400,
        "Unknown object type: event",
        json!([])
    )));
    assert!(!is_event_binding_rejection(&ocs(
        400,
        "Object too large",
        json!([])
    )));
}
