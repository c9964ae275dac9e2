mod common;

use axum::http::StatusCode;
use std::sync::atomic::Ordering;

use account_service::services::paddle::PaddleAddress;
use common::{body_json, TestApp};

fn seeded_address(id: &str) -> PaddleAddress {
    PaddleAddress {
        id: id.to_string(),
        first_line: Some("1 Main St".to_string()),
        second_line: None,
        city: Some("Berlin".to_string()),
        region: Some("BE".to_string()),
        postal_code: Some("10115".to_string()),
        country_code: Some("DE".to_string()),
        status: Some("active".to_string()),
    }
}

fn billing_form(address_id: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "address_id": address_id,
        "name": "Jane Doe",
        "first_line": "2 New St",
        "second_line": null,
        "city": "Hamburg",
        "region": "HH",
        "postal_code": "20095",
        "country_code": "DE",
    })
}

#[tokio::test]
async fn billing_page_loads_the_first_address_into_the_form() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");
    app.billing.seed_address("ctm_1", seeded_address("add_1"));
    app.billing.seed_address("ctm_1", seeded_address("add_2"));

    let response = app.get("/billing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["customer_id"], "ctm_1");
    assert_eq!(body["address_id"], "add_1", "first entry wins");
    assert_eq!(body["form"]["first_line"], "1 Main St");
    assert_eq!(body["form"]["name"], "Jane");
}

#[tokio::test]
async fn billing_page_with_no_addresses_leaves_the_form_blank() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");

    let response = app.get("/billing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["address_id"].is_null());
    assert_eq!(body["form"]["first_line"], "");
}

#[tokio::test]
async fn missing_customer_id_is_a_terminal_error() {
    let app = TestApp::spawn();
    let (_, cookie) = app.sign_in_user("a@x.com", "pw123456").await;

    let response = app.get("/billing", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["error"],
        "No billing information found"
    );
}

#[tokio::test]
async fn a_failed_first_step_never_reaches_the_processor() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");
    app.billing.seed_address("ctm_1", seeded_address("add_1"));
    app.profiles.fail_update_name.store(true, Ordering::SeqCst);

    let response = app
        .post_json("/billing", billing_form(Some("add_1")), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Failed to update billing information. Please try again."
    );
    assert_eq!(app.billing.update_customer_calls(), 0);
    assert_eq!(app.billing.update_address_calls(), 0);
    assert_eq!(app.billing.create_address_calls(), 0);
}

#[tokio::test]
async fn a_failed_second_step_stops_before_the_address_write() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");
    app.billing.seed_address("ctm_1", seeded_address("add_1"));
    app.billing
        .fail_update_customer
        .store(true, Ordering::SeqCst);

    let response = app
        .post_json("/billing", billing_form(Some("add_1")), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.billing.update_customer_calls(), 1);
    assert_eq!(app.billing.update_address_calls(), 0);

    // Step 1 stays applied: no rollback across stores.
    assert_eq!(app.profiles.get(id).unwrap().name, "Jane Doe");
}

#[tokio::test]
async fn a_full_submit_updates_all_three_layers() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");
    app.billing.seed_address("ctm_1", seeded_address("add_1"));

    let response = app
        .post_json("/billing", billing_form(Some("add_1")), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Billing information updated successfully"
    );

    assert_eq!(app.profiles.get(id).unwrap().name, "Jane Doe");
    assert_eq!(
        app.billing.customer("ctm_1").unwrap().name.as_deref(),
        Some("Jane Doe")
    );
    let addresses = app.billing.addresses_of("ctm_1");
    assert_eq!(addresses[0].first_line.as_deref(), Some("2 New St"));
    assert_eq!(addresses[0].status.as_deref(), Some("active"));
}

#[tokio::test]
async fn submit_without_a_loaded_address_creates_one_as_active() {
    let app = TestApp::spawn();
    let (id, cookie) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_1", "Jane");

    let response = app
        .post_json("/billing", billing_form(None), Some(&cookie))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.billing.create_address_calls(), 1);
    assert_eq!(app.billing.update_address_calls(), 0);

    let addresses = app.billing.addresses_of("ctm_1");
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].status.as_deref(), Some("active"));
}

#[tokio::test]
async fn proxy_rejects_cross_customer_access_without_proxying() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_mine", "Jane");
    app.billing.seed_customer("ctm_theirs", "Somebody Else");

    let token = app.auth.access_token_for("a@x.com").unwrap();
    let response = app
        .get_with_bearer("/api/paddle/customers/ctm_theirs", &token)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.billing.get_customer_calls(), 0, "never proxied");
}

#[tokio::test]
async fn proxy_requires_a_bearer_token() {
    let app = TestApp::spawn();

    let response = app.get("/api/paddle/customers/ctm_1", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn proxy_serves_the_callers_own_customer() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_mine", "Jane");

    let token = app.auth.access_token_for("a@x.com").unwrap();
    let response = app
        .get_with_bearer("/api/paddle/customers/ctm_mine", &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], "ctm_mine");
}

#[tokio::test]
async fn portal_session_proxy_returns_the_overview_url() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_mine", "Jane");

    let token = app.auth.access_token_for("a@x.com").unwrap();
    let response = app
        .send_json(
            "POST",
            "/api/paddle/customers/ctm_mine/portal-sessions",
            serde_json::json!({}),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["url"], "https://billing.test/portal/ctm_mine");
    assert_eq!(app.billing.portal_session_calls(), 1);
}

#[tokio::test]
async fn customer_patch_requires_email_or_name() {
    let app = TestApp::spawn();
    let (id, _) = app.sign_in_user("a@x.com", "pw123456").await;
    app.attach_customer(id, "ctm_mine", "Jane");

    let token = app.auth.access_token_for("a@x.com").unwrap();
    let response = app
        .send_json(
            "PATCH",
            "/api/paddle/customers/ctm_mine",
            serde_json::json!({}),
            None,
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "At least one of email or name must be provided"
    );
}
