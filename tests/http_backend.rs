//! Integration tests driving the HTTP backend against an in-process stub
//! speaking the console's `{status, ...}` envelopes.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tempfile::tempdir;

use adconsole_session::backend::{LoginCheck, LoginOutcome};
use adconsole_session::{
    spawn_revalidation_task, AuthState, HttpBackend, LoginBackend, Role, SessionConfig,
    SessionError, SessionManager,
};

const SESSION_COOKIE: &str = "console_sid=stub-session";

#[derive(Default)]
struct StubState {
    status_calls: AtomicUsize,
}

fn has_session_cookie(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookies| cookies.contains(SESSION_COOKIE))
}

async fn is_logged_in(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state.status_calls.fetch_add(1, Ordering::SeqCst);
    if has_session_cookie(&headers) {
        Json(json!({"status": 1, "data": {"userId": 7, "userName": "a@x.com", "type": 0}}))
    } else {
        Json(json!({"status": 0}))
    }
}

async fn login(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let user_name = body.get("userName").and_then(|v| v.as_str());
    let password = body.get("password").and_then(|v| v.as_str());

    if user_name == Some("a@x.com") && password == Some("encrypted-p") {
        (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Json(json!({"status": 1, "user": {"userName": "a@x.com", "type": 0}})),
        )
            .into_response()
    } else {
        Json(json!({"status": 0, "message": "invalid credentials"})).into_response()
    }
}

async fn logout() -> Json<serde_json::Value> {
    Json(json!({"status": 1}))
}

async fn garbled() -> Json<serde_json::Value> {
    Json(json!([1, 2, 3]))
}

async fn start_stub() -> (SocketAddr, Arc<StubState>) {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/isLoggedIn", post(is_logged_in))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/garbled", post(garbled))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    (addr, state)
}

fn stub_config(addr: SocketAddr, dir: &tempfile::TempDir) -> SessionConfig {
    SessionConfig {
        base_url: format!("http://{addr}"),
        store_path: dir.path().join("session.redb"),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_status_check_without_cookie_is_logged_out() {
    let (addr, _state) = start_stub().await;
    let dir = tempdir().unwrap();
    let backend = HttpBackend::new(&stub_config(addr, &dir)).unwrap();

    let check = backend.check_login().await.unwrap();
    assert_eq!(check, LoginCheck::NotLoggedIn);
}

#[tokio::test]
async fn test_login_cookie_feeds_subsequent_status_checks() {
    let (addr, _state) = start_stub().await;
    let dir = tempdir().unwrap();
    let backend = HttpBackend::new(&stub_config(addr, &dir)).unwrap();

    let outcome = backend.login("a@x.com", "encrypted-p").await.unwrap();
    let LoginOutcome::Accepted(identity) = outcome else {
        panic!("expected accepted login, got {outcome:?}");
    };
    assert_eq!(identity.user_name, "a@x.com");
    assert_eq!(identity.role, Role::Admin);

    // The cookie issued at login rides along on the credentialed client.
    let LoginCheck::Active(status) = backend.check_login().await.unwrap() else {
        panic!("expected active session");
    };
    assert_eq!(status.user_id, 7);
    assert_eq!(status.user_name.as_deref(), Some("a@x.com"));
}

#[tokio::test]
async fn test_non_credentialed_operation_omits_cookie() {
    let (addr, _state) = start_stub().await;
    let dir = tempdir().unwrap();
    let config = SessionConfig {
        // Only login may carry credentials; status checks go out bare.
        credentialed_operations: vec!["login".to_string()],
        ..stub_config(addr, &dir)
    };
    let backend = HttpBackend::new(&config).unwrap();

    let outcome = backend.login("a@x.com", "encrypted-p").await.unwrap();
    assert!(matches!(outcome, LoginOutcome::Accepted(_)));

    // The status check uses the plain client and presents no cookie.
    let check = backend.check_login().await.unwrap();
    assert_eq!(check, LoginCheck::NotLoggedIn);
}

#[tokio::test]
async fn test_rejected_login_carries_backend_message() {
    let (addr, _state) = start_stub().await;
    let dir = tempdir().unwrap();
    let backend = HttpBackend::new(&stub_config(addr, &dir)).unwrap();

    let outcome = backend.login("a@x.com", "wrong").await.unwrap();
    assert_eq!(
        outcome,
        LoginOutcome::Rejected {
            message: "invalid credentials".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    // Bind and immediately drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempdir().unwrap();
    let backend = HttpBackend::new(&stub_config(addr, &dir)).unwrap();

    let err = backend.check_login().await.unwrap_err();
    assert!(matches!(err, SessionError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn test_malformed_body_is_backend_rejected() {
    let (addr, _state) = start_stub().await;
    let dir = tempdir().unwrap();
    let config = SessionConfig {
        login_status_path: "garbled".to_string(),
        ..stub_config(addr, &dir)
    };
    let backend = HttpBackend::new(&config).unwrap();

    let err = backend.check_login().await.unwrap_err();
    assert!(matches!(err, SessionError::BackendRejected(_)), "{err:?}");
}

#[tokio::test]
async fn test_manager_end_to_end() {
    let (addr, state) = start_stub().await;
    let dir = tempdir().unwrap();
    let manager = Arc::new(SessionManager::new(&stub_config(addr, &dir)).unwrap());

    // Cold start: no cookie, one status round-trip, anonymous.
    let status = manager.check().await;
    spawn_revalidation_task(&manager);
    assert!(!status.is_logged_in);
    assert_eq!(manager.state(), AuthState::Anonymous);
    assert_eq!(state.status_calls.load(Ordering::SeqCst), 1);

    // Login authenticates and writes through to the cache.
    let result = manager.login("a@x.com", "encrypted-p").await;
    assert!(result.success);
    assert!(manager.is_authenticated());
    assert_eq!(manager.identity().unwrap().user_name, "a@x.com");

    // An immediate re-check is served locally: no extra status call.
    let status = manager.check().await;
    assert!(status.is_logged_in);
    assert_eq!(state.status_calls.load(Ordering::SeqCst), 1);

    manager.logout().await;
    assert_eq!(manager.state(), AuthState::Anonymous);

    manager.shutdown();
}
