use talk_link::{Credentials, HttpOptions, Settings, TalkConfig, TalkError, normalize_base_url};

fn settings(base_url: &str, user: &str, app_pass: &str) -> Settings {
    Settings {
        base_url: base_url.to_string(),
        user: user.to_string(),
        app_pass: app_pass.to_string(),
        debug_enabled: false,
    }
}

#[test]
fn normalize_base_url_adds_scheme_and_strips_slashes() {
    assert_eq!(
        normalize_base_url("cloud.example.com/").unwrap(),
        "https://cloud.example.com"
    );
    assert_eq!(
        normalize_base_url("  http://127.0.0.1:8080//  ").unwrap(),
        "http://127.0.0.1:8080"
    );
    assert_eq!(
        normalize_base_url("https://example.com/nextcloud/?x=1#frag").unwrap(),
        "https://example.com/nextcloud"
    );
}

#[test]
fn normalize_base_url_rejects_garbage() {
    assert!(matches!(
        normalize_base_url("   "),
        Err(TalkError::InvalidBaseUrl { .. })
    ));
    assert!(matches!(
        normalize_base_url("ftp://example.com"),
        Err(TalkError::InvalidBaseUrl { .. })
    ));
}

#[test]
fn credentials_require_every_field() {
    assert!(
        Credentials::from_settings(&settings("", "alice", "pw"))
            .unwrap()
            .is_none()
    );
    assert!(
        Credentials::from_settings(&settings("cloud.example.com", " ", "pw"))
            .unwrap()
            .is_none()
    );
    assert!(
        Credentials::from_settings(&settings("cloud.example.com", "alice", ""))
            .unwrap()
            .is_none()
    );

    let creds = Credentials::from_settings(&settings("cloud.example.com/", " alice ", "pw"))
        .unwrap()
        .expect("complete settings yield credentials");
    assert_eq!(creds.base_url, "https://cloud.example.com");
    assert_eq!(creds.user, "alice");
    assert_eq!(
        creds.cache_key(),
        ("https://cloud.example.com".to_string(), "alice".to_string())
    );
}

#[test]
fn credentials_debug_hides_the_app_password() {
    let creds = Credentials::from_settings(&settings("cloud.example.com", "alice", "hunter2"))
        .unwrap()
        .unwrap();
    let printed = format!("{creds:?}");
    assert!(printed.contains("alice"));
    assert!(!printed.contains("hunter2"));
}

#[test]
fn settings_use_camel_case_and_tolerate_missing_fields() {
    let parsed: Settings =
        serde_json::from_str(r#"{"baseUrl":"cloud.example.com","appPass":"x"}"#).unwrap();
    assert_eq!(parsed.base_url, "cloud.example.com");
    assert_eq!(parsed.app_pass, "x");
    assert!(parsed.user.is_empty());
    assert!(!parsed.debug_enabled);
}

#[test]
fn talk_config_defaults_and_overrides() {
    let config = TalkConfig::default();
    assert_eq!(config.capability_ttl.as_secs(), 300);
    assert_eq!(config.addressbook_ttl.as_secs(), 300);
    assert_eq!(config.event_conversation_min_major, 32);
    assert_eq!(config.login.interval.as_millis(), 2_000);
    assert_eq!(config.login.deadline.as_millis(), 120_000);

    let tuned: TalkConfig = serde_json::from_str(
        r#"{"capabilityTtl": 60, "eventConversationMinMajor": 33, "login": {"interval": 500}}"#,
    )
    .unwrap();
    assert_eq!(tuned.capability_ttl.as_secs(), 60);
    assert_eq!(tuned.event_conversation_min_major, 33);
    assert_eq!(tuned.login.interval.as_millis(), 500);
    assert_eq!(tuned.login.deadline.as_millis(), 120_000);
    assert_eq!(tuned.labels.join_heading, "Join the call");
    assert_eq!(tuned.http, HttpOptions::default());
}

#[test]
fn http_pool_options_are_tunable() {
    let defaults = HttpOptions::default();
    assert_eq!(defaults.pool_max_idle_per_host, 8);
    assert_eq!(defaults.pool_idle_timeout.as_secs(), 90);
    assert!(defaults.http2);

    let tuned: TalkConfig = serde_json::from_str(
        r#"{"http": {"poolMaxIdlePerHost": 2, "poolIdleTimeout": 15, "http2": false}}"#,
    )
    .unwrap();
    assert_eq!(tuned.http.pool_max_idle_per_host, 2);
    assert_eq!(tuned.http.pool_idle_timeout.as_secs(), 15);
    assert!(!tuned.http.http2);
    assert!(tuned.http.native_roots);
}
