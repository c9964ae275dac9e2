mod common;

use axum::http::StatusCode;
use common::{body_json, location, TestApp};

#[tokio::test]
async fn missing_token_hash_fails_without_a_provider_call() {
    let app = TestApp::spawn();

    let response = app.get("/auth/confirm", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid confirmation link"
    );
    assert_eq!(app.auth.verify_calls(), 0, "no network call may happen");
}

#[tokio::test]
async fn rejected_token_surfaces_the_provider_message_verbatim() {
    let app = TestApp::spawn();

    let response = app.get("/auth/confirm?token_hash=bogus", None).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"],
        "Email link is invalid or has expired"
    );
    assert_eq!(app.auth.verify_calls(), 1);
}

#[tokio::test]
async fn valid_token_forwards_to_sign_in_with_banner_parameters() {
    let app = TestApp::spawn();
    app.auth.add_account("a@x.com", "pw123456");
    app.auth.issue_token_hash("hash-1", "a@x.com");

    let response = app.get("/auth/confirm?token_hash=hash-1", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/auth/signin?verified=true&type=login")
    );
}

#[tokio::test]
async fn subscription_signup_forwards_to_welcome() {
    let app = TestApp::spawn();
    let id = app.auth.add_account("a@x.com", "pw123456");
    app.profiles.seed(common::profile_row(id, "a@x.com"));
    app.auth.issue_token_hash("hash-sub", "a@x.com");

    let response = app
        .get("/auth/confirm?token_hash=hash-sub&type=subscription", None)
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response).as_deref(),
        Some("/welcome?verified=true&type=subscription")
    );

    // The granted session was adopted, so the gated welcome view renders.
    let cookie = common::extract_cookie(&response).expect("session cookie");
    let response = app
        .get("/welcome?verified=true&type=subscription", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/welcome"));
}

#[tokio::test]
async fn a_token_is_consumed_exactly_once() {
    let app = TestApp::spawn();
    app.auth.add_account("a@x.com", "pw123456");
    app.auth.issue_token_hash("hash-once", "a@x.com");

    let first = app.get("/auth/confirm?token_hash=hash-once", None).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app.get("/auth/confirm?token_hash=hash-once", None).await;
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn email_change_applies_the_new_address_locally() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("old@x.com", "pw123456").await;
    app.auth.issue_token_hash("hash-change", "old@x.com");

    let response = app
        .get(
            "/account/verify-email-change?token_hash=hash-change&type=email_change&email=new@x.com",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/account?verified=true"));
    assert_eq!(app.profiles.get(id).unwrap().email, "new@x.com");
}

#[tokio::test]
async fn email_change_with_missing_parameters_fails_without_a_provider_call() {
    let app = TestApp::spawn();

    let response = app
        .get("/account/verify-email-change?token_hash=abc", None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Invalid verification link"
    );
    assert_eq!(app.auth.verify_calls(), 0);
}

#[tokio::test]
async fn failed_local_write_after_provider_success_reports_partial_failure() {
    let app = TestApp::spawn();
    app.sign_in_user("old@x.com", "pw123456").await;
    app.auth.issue_token_hash("hash-partial", "old@x.com");
    app.profiles
        .fail_update_email
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let response = app
        .get(
            "/account/verify-email-change?token_hash=hash-partial&type=email_change&email=new@x.com",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Email verified with the provider, but your account record was not updated."
    );
}
