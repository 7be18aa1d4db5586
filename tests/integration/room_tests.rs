use serde_json::json;
use talk_link::{CreateRoomParams, Settings, TalkError};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{
    ROOMS, TALK_CAPABILITIES, UNREACHABLE, bodies_of, harness, harness_with, mount_created,
    mount_ok, mount_supported, mount_unsupported, ocs, ocs_failure, room_path, settings_for,
    test_config,
};

fn event_params() -> CreateRoomParams {
    CreateRoomParams {
        title: "Planning".into(),
        start_timestamp: Some(1_700_000_000_000),
        event_conversation: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn unsupported_server_gets_a_single_plain_attempt() {
    let server = MockServer::start().await;
    mount_unsupported(&server).await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(ResponseTemplate::new(201).set_body_json(ocs(json!({"token": "abc123"}))))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "PUT", &room_path("abc123", "description")).await;

    let h = harness(&server);
    let room = h.talk.create_talk_public_room(event_params()).await.unwrap();

    assert_eq!(room.token, "abc123");
    assert_eq!(room.url, format!("{}/call/abc123", server.uri()));
    assert!(room.fallback);
    assert!(!room.event_conversation);
    assert!(room.reason.unwrap().contains("unsupported"));

    let creates = bodies_of(&server, "POST", ROOMS).await;
    assert_eq!(creates.len(), 1);
    assert!(creates[0].get("objectType").is_none());
    assert_eq!(creates[0]["roomType"], 3);
    assert_eq!(creates[0]["roomName"], "Planning");
}

#[tokio::test]
async fn rejected_event_binding_retries_plain_and_marks_unsupported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TALK_CAPABILITIES))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ocs(json!({"features": ["event-conversation"]}))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .and(body_partial_json(json!({"objectType": "event"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(ocs_failure("", json!({"error": "object"}))))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(ResponseTemplate::new(201).set_body_json(ocs(json!({"token": "plain1"}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(room_path("plain1", "description")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocs(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let room = h.talk.create_talk_public_room(event_params()).await.unwrap();

    assert_eq!(room.token, "plain1");
    assert!(room.fallback);
    assert!(!room.event_conversation);
    assert!(room.reason.as_deref().unwrap_or_default().contains("rejected"));

    let support = h.talk.get_event_conversation_support().await;
    assert_eq!(support.state, talk_link::SupportState::Unsupported);

    let creates = bodies_of(&server, "POST", ROOMS).await;
    assert_eq!(creates[0]["objectId"], "1700000000");
    assert!(creates[1].get("objectType").is_none());
}

#[tokio::test]
async fn event_bound_room_sets_lobby_and_skips_description() {
    let server = MockServer::start().await;
    mount_supported(&server).await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .and(body_partial_json(json!({"objectType": "event", "objectId": "1700000000"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(ocs(json!({"token": "evt42"}))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(room_path("evt42", "webinar/lobby")))
        .and(body_json(json!({"state": 1, "timer": 1_700_000_000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocs(json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(room_path("evt42", "description")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            enable_lobby: true,
            ..event_params()
        })
        .await
        .unwrap();

    assert!(!room.fallback);
    assert!(room.event_conversation);
    assert_eq!(room.reason, None);

    let meta = h.talk.room_meta().get("evt42").expect("meta stored");
    assert!(meta.lobby_enabled);
    assert!(meta.event_conversation);
    assert_eq!(meta.start_timestamp, Some(1_700_000_000));
}

#[tokio::test]
async fn explicit_object_binding_is_sent_as_given() {
    let server = MockServer::start().await;
    mount_supported(&server).await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .and(body_partial_json(json!({"objectType": "calendar-event", "objectId": "uid-1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(ocs(json!({"token": "evt43"}))))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            object_type: Some("calendar-event".into()),
            object_id: Some("uid-1".into()),
            ..event_params()
        })
        .await
        .unwrap();
    assert!(room.event_conversation);
}

#[tokio::test]
async fn description_carries_join_link_and_password() {
    let server = MockServer::start().await;
    mount_created(&server, "abc123").await;
    let url = format!("{}/call/abc123", server.uri());
    let expected = format!("Agenda\n\nJoin the call:\n{url}\nPassword: pw");
    Mock::given(method("PUT"))
        .and(path(room_path("abc123", "description")))
        .and(body_json(json!({"description": expected})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ocs(json!([]))))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "  ".into(),
            password: Some("pw".into()),
            description: Some("Agenda".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(room.description, expected);
    assert!(!room.fallback);
    assert_eq!(room.reason, None);

    let creates = bodies_of(&server, "POST", ROOMS).await;
    assert_eq!(creates[0]["roomName"], "Talk");
    assert_eq!(creates[0]["password"], "pw");
    assert_eq!(creates[0]["listable"], 0);
}

#[tokio::test]
async fn non_rejection_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(ocs_failure("Room name too long", json!({"error": "name"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "x".repeat(300),
            ..Default::default()
        })
        .await
        .unwrap_err();

    match err {
        TalkError::Http {
            operation,
            status,
            detail,
        } => {
            assert_eq!(operation, "create room");
            assert_eq!(status, 400);
            assert!(detail.contains("Room name too long"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn plain_attempt_failure_mentioning_prevented_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(ResponseTemplate::new(400).set_body_json(ocs_failure(
            "Room creation prevented by administrator policy",
            json!({"error": "policy"}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "Plain".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TalkError::Http { status: 400, .. }), "{err:?}");
}

#[tokio::test]
async fn plain_attempt_is_never_treated_as_a_binding_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(ocs_failure("Invalid objectType", json!({"error": "object"}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "Plain".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn plain_retry_failure_after_rejection_is_fatal() {
    let server = MockServer::start().await;
    mount_supported(&server).await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .and(body_partial_json(json!({"objectType": "event"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(ocs_failure("", json!({"error": "object"}))))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(ResponseTemplate::new(400).set_body_json(ocs_failure("", json!({"error": "object"}))))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = h.talk.create_talk_public_room(event_params()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    let support = h.talk.get_event_conversation_support().await;
    assert_eq!(support.state, talk_link::SupportState::Unsupported);
}

#[tokio::test]
async fn server_error_on_event_attempt_stops_the_sequence() {
    let server = MockServer::start().await;
    mount_supported(&server).await;
    Mock::given(method("POST"))
        .and(path(ROOMS))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = h.talk.create_talk_public_room(event_params()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn lobby_failure_degrades_the_result() {
    let server = MockServer::start().await;
    mount_created(&server, "abc123").await;
    Mock::given(method("PUT"))
        .and(path(room_path("abc123", "webinar/lobby")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "PUT", &room_path("abc123", "description")).await;

    let h = harness(&server);
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "Planning".into(),
            enable_lobby: true,
            start_timestamp: Some(1_700_000_000),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(room.token, "abc123");
    assert!(room.fallback);
    assert!(room.reason.unwrap().contains("lobby"));
    assert!(!h.talk.room_meta().get("abc123").unwrap().lobby_enabled);
}

#[tokio::test]
async fn listable_and_description_failures_are_only_logged() {
    let server = MockServer::start().await;
    mount_created(&server, "abc123").await;
    Mock::given(method("PUT"))
        .and(path(room_path("abc123", "listable")))
        .and(body_json(json!({"scope": 1})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(room_path("abc123", "description")))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            title: "Planning".into(),
            enable_listable: true,
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!room.fallback);
    assert_eq!(room.reason, None);
}

#[tokio::test]
async fn unreachable_server_still_yields_a_link() {
    let h = harness_with(settings_for(UNREACHABLE), test_config());
    let room = h
        .talk
        .create_talk_public_room(CreateRoomParams {
            password: Some("pw".into()),
            ..event_params()
        })
        .await
        .unwrap();

    assert!(room.fallback);
    assert!(!room.event_conversation);
    assert_eq!(room.token.len(), 10);
    assert!(room.token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(room.url, format!("{UNREACHABLE}/call/{}", room.token));
    assert!(room.description.contains(&room.url));
    assert!(room.reason.unwrap().contains("unreachable"));
    assert!(h.talk.room_meta().get(&room.token).is_none());
}

#[tokio::test]
async fn missing_token_in_success_response_is_an_error() {
    let server = MockServer::start().await;
    mount_ok(&server, "POST", ROOMS).await;

    let h = harness(&server);
    let err = h
        .talk
        .create_talk_public_room(CreateRoomParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::MissingToken));
}

#[tokio::test]
async fn creation_without_credentials_fails() {
    let h = harness_with(Settings::default(), test_config());
    let err = h
        .talk
        .create_talk_public_room(event_params())
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::CredentialsMissing));
}
