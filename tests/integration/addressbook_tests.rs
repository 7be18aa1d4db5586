use std::time::Duration;

use talk_link::{AddressbookSearch, Settings, TalkError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{BASIC_AUTH, SYSTEM_ADDRESSBOOK, harness, harness_with, test_config};

const EXPORT: &str = "BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
UID:carla\r\n\
FN:Carla\r\n\
EMAIL:carla@example.com\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
UID:bob\r\n\
FN:Bob\r\n\
EMAIL:bob@host.org\r\n\
END:VCARD\r\n\
BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
UID:alice\r\n\
FN:Alice\r\n\
EMAIL:alice@example.com\r\n\
END:VCARD\r\n";

fn vcards() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(EXPORT, "text/vcard; charset=utf-8")
}

async fn mount_export(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path(SYSTEM_ADDRESSBOOK))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(vcards())
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn export_is_fetched_once_and_sorted() {
    let server = MockServer::start().await;
    mount_export(&server, 1).await;

    let h = harness(&server);
    let first = h.talk.get_system_addressbook_contacts(false).await.unwrap();
    let second = h.talk.get_system_addressbook_contacts(false).await.unwrap();

    let ids: Vec<&str> = first.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob", "carla"]);
    assert_eq!(first, second);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("export"));
}

#[tokio::test]
async fn force_refresh_and_expiry_refetch() {
    let server = MockServer::start().await;
    mount_export(&server, 3).await;

    let h = harness(&server);
    h.talk.get_system_addressbook_contacts(false).await.unwrap();
    h.talk.get_system_addressbook_contacts(true).await.unwrap();
    h.clock.advance(Duration::from_secs(301));
    h.talk.get_system_addressbook_contacts(false).await.unwrap();
}

#[tokio::test]
async fn search_filters_cached_contacts() {
    let server = MockServer::start().await;
    mount_export(&server, 1).await;

    let h = harness(&server);
    let hits = h
        .talk
        .search_system_addressbook(&AddressbookSearch {
            search_term: "A".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "carla"]);

    let limited = h
        .talk
        .search_system_addressbook(&AddressbookSearch {
            search_term: "example.com".into(),
            limit: 1,
            force_refresh: false,
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, "alice");
}

#[tokio::test]
async fn failed_fetch_without_cache_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SYSTEM_ADDRESSBOOK))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let h = harness(&server);
    assert!(
        h.talk
            .get_system_addressbook_contacts(false)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn failed_refresh_serves_the_previous_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SYSTEM_ADDRESSBOOK))
        .respond_with(vcards())
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SYSTEM_ADDRESSBOOK))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server);
    assert_eq!(h.talk.get_system_addressbook_contacts(false).await.unwrap().len(), 3);
    h.clock.advance(Duration::from_secs(600));
    assert_eq!(h.talk.get_system_addressbook_contacts(false).await.unwrap().len(), 3);
}

#[tokio::test]
async fn address_book_needs_credentials() {
    let h = harness_with(Settings::default(), test_config());
    let err = h
        .talk
        .get_system_addressbook_contacts(false)
        .await
        .unwrap_err();
    assert!(matches!(err, TalkError::CredentialsMissing));
}
