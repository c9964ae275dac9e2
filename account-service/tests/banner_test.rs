mod common;

use axum::http::StatusCode;
use common::{body_json, extract_cookie, location, TestApp};

#[tokio::test]
async fn verified_arrival_strips_the_query_and_shows_the_banner_once() {
    let app = TestApp::spawn();

    // Arrival with the query: the banner is recorded and the URL cleaned.
    let response = app
        .get("/auth/signin?verified=true&type=subscription", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/signin"));
    let cookie = extract_cookie(&response).expect("flash needs a session cookie");

    // First clean render shows the subscription message with its window.
    let response = app.get("/auth/signin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["banner"]["message"],
        "Thank you for subscribing! Your account is ready."
    );
    assert_eq!(body["banner"]["dismiss_after_secs"], 5);

    // Second render: the flash was consumed, nothing re-triggers.
    let response = app.get("/auth/signin", Some(&cookie)).await;
    let body = body_json(response).await;
    assert!(body.get("banner").is_none());
}

#[tokio::test]
async fn login_kind_shows_the_login_success_message() {
    let app = TestApp::spawn();

    let response = app.get("/auth/signin?verified=true&type=login", None).await;
    let cookie = extract_cookie(&response).expect("session cookie");

    let body = body_json(app.get("/auth/signin", Some(&cookie)).await).await;
    assert_eq!(
        body["banner"]["message"],
        "Your email has been verified. You can now sign in."
    );
}

#[tokio::test]
async fn unknown_or_missing_kind_falls_back_to_the_email_verified_message() {
    let app = TestApp::spawn();

    let response = app.get("/auth/signin?verified=true", None).await;
    let cookie = extract_cookie(&response).expect("session cookie");

    let body = body_json(app.get("/auth/signin", Some(&cookie)).await).await;
    assert_eq!(body["banner"]["message"], "Email verified successfully!");
}

#[tokio::test]
async fn account_view_participates_in_the_banner_protocol() {
    let app = TestApp::spawn();
    let (_, cookie) = app.sign_in_user("a@x.com", "pw123456").await;

    let response = app.get("/account?verified=true", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/account"));

    let body = body_json(app.get("/account", Some(&cookie)).await).await;
    assert_eq!(body["banner"]["message"], "Email verified successfully!");

    let body = body_json(app.get("/account", Some(&cookie)).await).await;
    assert!(body.get("banner").is_none());
}
