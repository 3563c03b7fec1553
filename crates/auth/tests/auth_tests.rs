use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::Client;
use serde_json::json;
use vetdesk_auth::{
    AuthError, AuthState, Credentials, KeyValueStore, ManualClock, MemoryStore, SessionManager,
    SessionOptions, CREDENTIALS_KEY,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 8, 30, 0).unwrap()
}

fn session_with(
    uri: &str,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
) -> SessionManager {
    SessionManager::new(uri, Client::new(), SessionOptions::default(), store, clock)
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "status": "ok",
        "accessToken": access,
        "refreshToken": refresh,
        "data": {
            "id": 42,
            "name": "Rina",
            "surname": "Andria",
            "email": "rina@clinic.test",
            "phoneNumber": "0320000000",
            "createdAt": "2024-11-02T10:00:00Z",
            "type": "staff",
            "role": "receptionist",
            "staffId": 9
        }
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_expires_after_ttl() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock.clone());

    let user = session.login("rina@clinic.test", "secret").await.unwrap();
    assert_eq!(user.staff_id, Some(9));
    assert!(!session.is_expired());

    clock.advance(Duration::minutes(15));
    assert!(!session.is_expired());

    clock.advance(Duration::seconds(1));
    assert!(session.is_expired());
    assert_eq!(session.state(), AuthState::Expired);
}

#[tokio::test]
async fn test_login_rejected_leaves_state_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"status": "error", "message": "wrong password"})),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), store.clone(), clock);

    let err = session.login("rina@clinic.test", "nope").await.unwrap_err();
    match err {
        AuthError::InvalidCredentials(message) => assert_eq!(message, "wrong password"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.credentials().is_empty());
    assert_eq!(store.get(CREDENTIALS_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_error_in_ok_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": {"message": "account locked"}})),
        )
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);

    let err = session.login("rina@clinic.test", "secret").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(m) if m == "account locked"));
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_signup_establishes_session_and_persists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("access-s", "refresh-s")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), store.clone(), clock);

    let user = session
        .signup("Rina", "rina@clinic.test", "secret")
        .await
        .unwrap();
    assert_eq!(user.name, "Rina");
    assert_eq!(session.state(), AuthState::Fresh);

    let persisted: Credentials =
        serde_json::from_str(&store.get(CREDENTIALS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted, session.credentials());
}

#[tokio::test]
async fn test_refresh_unauthorized_clears_everything() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "refresh expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), store.clone(), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let err = session.refresh().await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshFailed(m) if m == "refresh expired"));

    let credentials = session.credentials();
    assert!(credentials.access_token.is_none());
    assert!(credentials.refresh_token.is_none());
    assert!(credentials.user.is_none());
    assert!(credentials.expires_at.is_none());
    assert_eq!(store.get(CREDENTIALS_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_refresh_without_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);

    assert!(matches!(
        session.refresh().await,
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_concurrent_auth_headers_share_one_refresh() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "access-2", "refreshToken": "refresh-2"}))
                .set_delay(StdDuration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock.clone());
    session.login("rina@clinic.test", "secret").await.unwrap();
    clock.advance(Duration::minutes(16));

    let (a, b, c, d, e) = tokio::join!(
        session.auth_header(),
        session.auth_header(),
        session.auth_header(),
        session.auth_header(),
        session.auth_header(),
    );

    for header in [a, b, c, d, e] {
        assert_eq!(header.unwrap().value(), "Bearer access-2");
    }
    assert_eq!(
        session.credentials().refresh_token.as_deref(),
        Some("refresh-2")
    );
}

#[tokio::test]
async fn test_concurrent_waiters_share_a_failed_refresh() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_delay(StdDuration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock.clone());
    session.login("rina@clinic.test", "secret").await.unwrap();
    clock.advance(Duration::minutes(30));

    let (a, b, c) = tokio::join!(
        session.auth_header(),
        session.auth_header(),
        session.auth_header(),
    );
    for result in [a, b, c] {
        assert!(result.unwrap_err().requires_login());
    }
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_logout_clears_even_when_network_fails() {
    let store = Arc::new(MemoryStore::new());
    let persisted = json!({
        "accessToken": "access-1",
        "refreshToken": "refresh-1",
        "expiresAt": (start() + Duration::minutes(10)).timestamp_millis()
    });
    store.set(CREDENTIALS_KEY, &persisted.to_string()).unwrap();

    let clock = Arc::new(ManualClock::new(start()));
    // Nothing listens on port 1.
    let session = session_with("http://127.0.0.1:1", store.clone(), clock);
    assert_eq!(session.state(), AuthState::Fresh);

    let err = session.logout().await.unwrap_err();
    assert!(matches!(err, AuthError::NetworkError(_)));
    assert!(session.credentials().is_empty());
    assert_eq!(store.get(CREDENTIALS_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_logout_all() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/protected/logout-all"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    session.logout_all().await.unwrap();
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_logout_during_refresh_discards_result() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "access-late"}))
                .set_delay(StdDuration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/protected/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let (refreshed, logged_out) = tokio::join!(session.refresh(), async {
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        session.logout().await
    });

    logged_out.unwrap();
    assert!(matches!(refreshed, Err(AuthError::NotAuthenticated)));
    assert!(session.credentials().is_empty());
}

#[tokio::test]
async fn test_fetch_with_auth_retries_once_after_refresh() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "access-2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pet"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pet"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let request = session
        .http_client()
        .get(format!("{}/pet", server.uri()))
        .build()
        .unwrap();
    let response = session.fetch_with_auth(request).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(session.state(), AuthState::Fresh);
}

#[tokio::test]
async fn test_fetch_with_auth_second_unauthorized_ends_session() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "access-2"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reservation"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let request = session
        .http_client()
        .get(format!("{}/reservation", server.uri()))
        .build()
        .unwrap();
    let err = session.fetch_with_auth(request).await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
    assert!(session.credentials().is_empty());
}

#[tokio::test]
async fn test_fetch_with_auth_without_session() {
    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with("http://127.0.0.1:1", Arc::new(MemoryStore::new()), clock);
    let request = session
        .http_client()
        .get("http://127.0.0.1:1/pet")
        .build()
        .unwrap();
    assert!(matches!(
        session.fetch_with_auth(request).await,
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_fetch_current_user_updates_profile() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 42, "name": "Rina", "surname": "Rasoa", "email": "rina@clinic.test", "type": "staff", "role": "admin", "staffId": 9}
        })))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let user = session.fetch_current_user().await.unwrap();
    assert_eq!(user.surname, "Rasoa");
    assert_eq!(session.current_user().unwrap().surname, "Rasoa");
}

#[test]
fn test_restores_and_discards_persisted_records() {
    let clock = Arc::new(ManualClock::new(start()));

    let store = Arc::new(MemoryStore::new());
    let persisted = json!({
        "accessToken": "access-1",
        "refreshToken": "refresh-1",
        "user": {"id": 5, "name": "Tiana", "email": "tiana@clinic.test", "type": "client"},
        "expiresAt": (start() + Duration::minutes(5)).timestamp_millis()
    });
    store.set(CREDENTIALS_KEY, &persisted.to_string()).unwrap();

    let session = session_with("http://127.0.0.1:1", store, clock.clone());
    assert_eq!(session.state(), AuthState::Fresh);
    assert_eq!(session.current_user().unwrap().id, 5);
    clock.advance(Duration::minutes(6));
    assert_eq!(session.state(), AuthState::Expired);

    let corrupted = Arc::new(MemoryStore::new());
    corrupted.set(CREDENTIALS_KEY, "{not json").unwrap();
    let session = session_with("http://127.0.0.1:1", corrupted.clone(), clock);
    assert_eq!(session.state(), AuthState::Anonymous);
    assert_eq!(corrupted.get(CREDENTIALS_KEY).unwrap(), None);
}

#[test]
fn test_session_without_persistence_ignores_store() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(CREDENTIALS_KEY, r#"{"accessToken":"stale"}"#)
        .unwrap();

    let session = SessionManager::new(
        "http://127.0.0.1:1",
        Client::new(),
        SessionOptions::default().with_persist_session(false),
        store,
        Arc::new(ManualClock::new(start())),
    );
    assert_eq!(session.state(), AuthState::Anonymous);
}

#[tokio::test]
async fn test_late_refresh_failure_keeps_newer_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "old@clinic.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("old-access", "old-refresh")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "new@clinic.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-access", "new-refresh")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "old-access-2"}))
                .set_delay(StdDuration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pet"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("old@clinic.test", "secret").await.unwrap();

    let request = session
        .http_client()
        .get(format!("{}/pet", server.uri()))
        .build()
        .unwrap();
    let (fetched, relogged) = tokio::join!(session.fetch_with_auth(request), async {
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        session.login("new@clinic.test", "secret").await
    });

    relogged.unwrap();
    assert!(matches!(fetched, Err(AuthError::NotAuthenticated)));
    assert_eq!(session.credentials().access_token.as_deref(), Some("new-access"));
    assert_eq!(session.state(), AuthState::Fresh);
}

#[tokio::test]
async fn test_late_refresh_rejection_keeps_newer_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "old@clinic.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("old-access", "old-refresh")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_partial_json(json!({"email": "new@clinic.test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new-access", "new-refresh")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_delay(StdDuration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pet"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let store = Arc::new(MemoryStore::new());
    let session = session_with(&server.uri(), store.clone(), clock);
    session.login("old@clinic.test", "secret").await.unwrap();

    let request = session
        .http_client()
        .get(format!("{}/pet", server.uri()))
        .build()
        .unwrap();
    let (fetched, relogged) = tokio::join!(session.fetch_with_auth(request), async {
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        session.login("new@clinic.test", "secret").await
    });

    relogged.unwrap();
    assert!(matches!(fetched, Err(AuthError::NotAuthenticated)));
    assert_eq!(session.credentials().access_token.as_deref(), Some("new-access"));
    assert!(store.get(CREDENTIALS_KEY).unwrap().is_some());
}

#[tokio::test]
async fn test_unauthorized_after_rotation_retries_without_second_refresh() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-2",
            "refreshToken": "refresh-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pet"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reservation"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401).set_delay(StdDuration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    for route in ["/pet", "/reservation"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer access-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);
    session.login("rina@clinic.test", "secret").await.unwrap();

    let pets = session
        .http_client()
        .get(format!("{}/pet", server.uri()))
        .build()
        .unwrap();
    let reservations = session
        .http_client()
        .get(format!("{}/reservation", server.uri()))
        .build()
        .unwrap();
    let (pets, reservations) = tokio::join!(
        session.fetch_with_auth(pets),
        session.fetch_with_auth(reservations)
    );

    assert_eq!(pets.unwrap().status(), 200);
    assert_eq!(reservations.unwrap().status(), 200);
    assert_eq!(session.credentials().refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_login_throttled_is_not_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"status": "error", "message": "too many attempts"})),
        )
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::new(start()));
    let session = session_with(&server.uri(), Arc::new(MemoryStore::new()), clock);

    let err = session.login("rina@clinic.test", "secret").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::ApiError { status: 429, ref message } if message == "too many attempts"
    ));
    assert_eq!(session.state(), AuthState::Anonymous);
}

struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Result<Option<String>, AuthError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), AuthError> {
        Err(AuthError::StorageError("read-only filesystem".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_login_fails_when_session_cannot_be_stored() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let session = SessionManager::new(
        &server.uri(),
        Client::new(),
        SessionOptions::default(),
        Arc::new(ReadOnlyStore),
        Arc::new(ManualClock::new(start())),
    );

    let err = session.login("rina@clinic.test", "secret").await.unwrap_err();
    assert!(matches!(err, AuthError::StorageError(_)));
    assert!(!session.is_authenticated());
    assert_eq!(session.state(), AuthState::Anonymous);
}
