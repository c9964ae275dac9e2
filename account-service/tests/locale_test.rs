mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};

#[tokio::test]
async fn defaults_to_en_without_any_preference() {
    let app = TestApp::spawn();

    let response = app.get("/locale", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["locale"], "en");
}

#[tokio::test]
async fn anonymous_switch_persists_in_the_fallback_store() {
    let app = TestApp::spawn();

    let response = app
        .send_json(
            "PUT",
            "/locale",
            serde_json::json!({ "language": "de" }),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = common::extract_cookie(&response).expect("fallback write sets a cookie");

    let response = app.get("/locale", Some(&cookie)).await;
    assert_eq!(body_json(response).await["locale"], "de");
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;

    let mut profile = app.profiles.get(id).unwrap();
    profile.language = Some("de".to_string());
    app.profiles.seed(profile);

    let first = body_json(app.get("/locale", Some(&cookie)).await).await;
    let second = body_json(app.get("/locale", Some(&cookie)).await).await;
    assert_eq!(first["locale"], "de");
    assert_eq!(first, second);
}

#[tokio::test]
async fn profile_language_supersedes_and_clears_the_fallback() {
    let app = TestApp::spawn();

    // Anonymous visitor picks German; the fallback holds it.
    let response = app
        .send_json(
            "PUT",
            "/locale",
            serde_json::json!({ "language": "de" }),
            None,
            None,
        )
        .await;
    let cookie = common::extract_cookie(&response).expect("session cookie");

    // The account's stored preference is English.
    let id = app.auth.add_account("a@x.com", "pw123456");
    let mut profile = common::profile_row(id, "a@x.com");
    profile.language = Some("en".to_string());
    app.profiles.seed(profile);

    // Sign-in re-resolves: profile wins.
    let response = app
        .post_json(
            "/auth/signin",
            serde_json::json!({ "email": "a@x.com", "password": "pw123456" }),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["locale"], "en");

    // Drop the profile preference. Were the fallback still present it would
    // now resurface as "de"; its absence proves it was cleared.
    let mut profile = app.profiles.get(id).unwrap();
    profile.language = None;
    app.profiles.seed(profile);

    let response = app.get("/locale", Some(&cookie)).await;
    assert_eq!(body_json(response).await["locale"], "en");
}

#[tokio::test]
async fn authenticated_switch_writes_the_profile() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;

    let response = app
        .send_json(
            "PUT",
            "/locale",
            serde_json::json!({ "language": "de" }),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = app.profiles.get(id).unwrap();
    assert_eq!(profile.language.as_deref(), Some("de"));
}
