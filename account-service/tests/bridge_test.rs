mod common;

use axum::http::StatusCode;
use chrono::Utc;

use account_service::utils::jwt::encode_unsigned_token;
use common::{extract_cookie, location, TestApp, PUBLIC_ORIGIN};

fn inbound_message(access_token: &str, user_id: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "FROM_EXTENSION",
        "payload": {
            "session": { "access_token": access_token, "refresh_token": "rt" },
            "email": email,
            "supabase_user_id": user_id,
        }
    })
}

async fn post_bridge(
    app: &TestApp,
    origin: Option<&str>,
    body: serde_json::Value,
) -> axum::http::Response<axum::body::Body> {
    let mut builder = axum::http::Request::builder()
        .method("POST")
        .uri("/bridge/session")
        .header("content-type", "application/json");
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    app.request(builder.body(axum::body::Body::from(body.to_string())).unwrap())
        .await
}

#[tokio::test]
async fn cross_origin_messages_are_dropped_silently() {
    let app = TestApp::spawn();
    let id = app.auth.add_account("a@x.com", "pw123456");
    app.profiles.seed(common::profile_row(id, "a@x.com"));

    let token = encode_unsigned_token(&id.to_string(), "a@x.com", Utc::now().timestamp() + 3600);
    let response = post_bridge(
        &app,
        Some("http://evil.test"),
        inbound_message(&token, &id.to_string(), "a@x.com"),
    )
    .await;

    // Same status as the accepted case: the sender learns nothing.
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The cached session was never altered, so the gate still redirects.
    if let Some(cookie) = extract_cookie(&response) {
        let response = app.get("/account", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response).as_deref(), Some("/auth/signin"));
    }
}

#[tokio::test]
async fn missing_origin_is_treated_as_foreign() {
    let app = TestApp::spawn();

    let response = post_bridge(&app, None, inbound_message("t", "u", "a@x.com")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn same_origin_messages_install_the_session() {
    let app = TestApp::spawn();
    let id = app.auth.add_account("a@x.com", "pw123456");
    app.profiles.seed(common::profile_row(id, "a@x.com"));

    let token = encode_unsigned_token(&id.to_string(), "a@x.com", Utc::now().timestamp() + 3600);
    let response = post_bridge(
        &app,
        Some(PUBLIC_ORIGIN),
        inbound_message(&token, &id.to_string(), "a@x.com"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = extract_cookie(&response).expect("accepted message caches the session");
    let response = app.get("/account", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn messages_of_unknown_type_are_dropped() {
    let app = TestApp::spawn();

    let response = post_bridge(
        &app,
        Some(PUBLIC_ORIGIN),
        serde_json::json!({ "type": "FROM_NOWHERE", "payload": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn sign_in_broadcasts_the_session_over_the_bridge() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("a@x.com", "pw123456").await;

    let message = app.bridge.last().expect("sign-in broadcasts");
    assert_eq!(message.kind, "FROM_WEBAPP");
    assert_eq!(message.payload["user"]["id"], id.to_string());
    assert_eq!(message.payload["user"]["email"], "a@x.com");
    assert!(message.payload["session"]["access_token"]
        .as_str()
        .is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn protected_views_announce_the_session() {
    let app = TestApp::spawn();
    let (_, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    let before = app.bridge.all().len();

    let response = app.get("/account", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.bridge.all().len(), before + 1);
    assert!(!app.bridge.last().unwrap().is_cleared());
}

#[tokio::test]
async fn sign_out_broadcasts_the_cleared_sentinel_exactly_once() {
    let app = TestApp::spawn();
    let (_, cookie) = app.sign_in_user("a@x.com", "pw123456").await;

    let response = app
        .post_json("/auth/signout", serde_json::json!({}), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/signin"));

    assert_eq!(app.bridge.cleared_count(), 1);

    let message = app.bridge.last().unwrap();
    assert_eq!(message.kind, "FROM_WEBAPP");
    assert_eq!(message.payload["session"], "");
    assert_eq!(message.payload["user"]["email"], "");
    assert_eq!(message.payload["user"]["id"], "");

    // The cached copy is gone: the gate redirects again.
    let response = app.get("/account", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
