//! End-to-end tests for the notes API.
//!
//! Drives the full router (gate, handlers, store) in-process with
//! `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use notes_service::auth::TokenCodec;
use notes_service::config::{Config, PasswordConfig};
use notes_service::model::IdentityId;
use notes_service::storage::JsonStore;
use notes_service::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const SIGNING_KEY: [u8; 32] = [42; 32];

fn test_config() -> Config {
    Config {
        password: PasswordConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        ..Config::default()
    }
}

fn app() -> Router {
    let state = AppState::new(
        &test_config(),
        &SIGNING_KEY,
        Arc::new(JsonStore::in_memory()),
    )
    .unwrap();
    router(Arc::new(state))
}

/// Send a request and return (status, parsed JSON body or Null).
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

/// Register and log in, returning (token, identity id).
async fn signed_in(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, _) = register(app, email, password).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = login(app, email, password).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn create_note(app: &Router, token: &str, title: &str, content: &str) -> Value {
    let (status, note) = send(
        app,
        Method::POST,
        "/notes",
        Some(token),
        Some(json!({ "title": title, "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    note
}

#[tokio::test]
async fn test_register_login_create_and_cross_identity_update() {
    let app = app();

    let (t1, a_id) = signed_in(&app, "a@x.com", "pw1").await;
    let n1 = create_note(&app, &t1, "Hi", "body").await;
    assert_eq!(n1["ownerId"], a_id);
    assert_eq!(n1["title"], "Hi");
    assert_eq!(n1["tags"], json!([]));

    let (t2, _) = signed_in(&app, "b@x.com", "pw2").await;
    let uri = format!("/notes/{}", n1["id"].as_str().unwrap());
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&t2),
        Some(json!({ "title": "x", "content": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    // Untouched for the owner
    let (status, note) = send(&app, Method::GET, &uri, Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(note["title"], "Hi");
}

#[tokio::test]
async fn test_register_response_and_duplicate() {
    let app = app();

    let (status, body) = register(&app, "a@x.com", "pw1").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("password_hash").is_none());
    assert!(!body.to_string().contains("argon2"));

    let (status, _) = register(&app, "A@x.com", "other").await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_invalid_input() {
    let app = app();

    let (status, _) = register(&app, "not-an-email", "pw1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = register(&app, "a@x.com", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/register", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_identical() {
    let app = app();
    register(&app, "a@x.com", "pw1").await;

    let wrong_password = login(&app, "a@x.com", "nope").await;
    let unknown_email = login(&app, "ghost@x.com", "pw1").await;

    assert_eq!(wrong_password.0, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_password, unknown_email);
    assert_eq!(wrong_password.1["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_response_shape() {
    let app = app();
    register(&app, "a@x.com", "pw1").await;

    let (status, body) = login(&app, "a@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["expiresAt"].is_string());
    assert!(body["token"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;

    create_note(&app, &t1, "first", "1").await;
    create_note(&app, &t1, "second", "2").await;

    let (status, notes) = send(&app, Method::GET, "/notes", Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = notes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn test_identities_never_see_each_others_notes() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;
    let (t2, _) = signed_in(&app, "b@x.com", "pw2").await;
    let n1 = create_note(&app, &t1, "secret", "a's").await;
    let uri = format!("/notes/{}", n1["id"].as_str().unwrap());

    let (_, listed) = send(&app, Method::GET, "/notes", Some(&t2), None).await;
    assert_eq!(listed, json!([]));

    let foreign = send(&app, Method::DELETE, &uri, Some(&t2), None).await;
    let missing = send(
        &app,
        Method::DELETE,
        "/notes/00000000-0000-0000-0000-000000000000",
        Some(&t2),
        None,
    )
    .await;
    let garbage = send(&app, Method::DELETE, "/notes/garbage", Some(&t2), None).await;
    assert_eq!(foreign.0, StatusCode::NOT_FOUND);
    assert_eq!(foreign, missing);
    assert_eq!(foreign, garbage);

    let (status, _) = send(&app, Method::GET, &uri, Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_id_in_body_is_ignored() {
    let app = app();
    let (t1, a_id) = signed_in(&app, "a@x.com", "pw1").await;
    let (_, b_id) = signed_in(&app, "b@x.com", "pw2").await;

    let (status, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&t1),
        Some(json!({ "title": "Hi", "content": "body", "ownerId": b_id, "userId": b_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["ownerId"], a_id);
}

#[tokio::test]
async fn test_update_and_delete_flow() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;
    let n1 = create_note(&app, &t1, "Hi", "body").await;
    let uri = format!("/notes/{}", n1["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&t1),
        Some(json!({ "title": "New", "content": "text" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "New");
    assert_eq!(updated["createdAt"], n1["createdAt"]);

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&t1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Note deleted");

    // Deleting again never succeeds
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&t1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_requires_fields_and_keeps_tags() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&t1),
        Some(json!({ "title": "Hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::POST, "/notes", Some(&t1), Some(json!("nope"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, note) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&t1),
        Some(json!({ "title": "Hi", "content": "body", "tags": ["work", "ideas"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(note["tags"], json!(["work", "ideas"]));
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;

    let (status, body) = send(&app, Method::GET, "/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthenticated");

    let (status, _) = send(&app, Method::GET, "/notes", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut tampered = t1.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    let (status, _) = send(&app, Method::GET, "/notes", Some(&tampered), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/notes",
        None,
        Some(json!({ "title": "Hi", "content": "body" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bare_token_header_is_accepted() {
    let app = app();
    let (t1, _) = signed_in(&app, "a@x.com", "pw1").await;

    let request = Request::builder()
        .uri("/notes")
        .header(header::AUTHORIZATION, t1)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_and_foreign_key_tokens_rejected() {
    let app = app();
    let (_, a_id) = signed_in(&app, "a@x.com", "pw1").await;
    let id: IdentityId = serde_json::from_value(json!(a_id)).unwrap();

    let codec = TokenCodec::new(&SIGNING_KEY, chrono::Duration::hours(1)).unwrap();
    let stale = codec
        .issue_at(id, chrono::Utc::now() - chrono::Duration::hours(2))
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/notes", Some(&stale.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let fresh = codec.issue(id).unwrap();
    let (status, _) = send(&app, Method::GET, "/notes", Some(&fresh.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let foreign = TokenCodec::new(&[1u8; 32], chrono::Duration::hours(1))
        .unwrap()
        .issue(id)
        .unwrap();
    let (status, _) = send(&app, Method::GET, "/notes", Some(&foreign.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_identity_cannot_create() {
    let app = app();
    let codec = TokenCodec::new(&SIGNING_KEY, chrono::Duration::hours(1)).unwrap();
    let ghost = codec.issue(IdentityId::generate()).unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/notes",
        Some(&ghost.token),
        Some(json!({ "title": "Hi", "content": "body" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
