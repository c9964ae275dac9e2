//! Billing view and the authenticated processor proxy.

use axum::{
    extract::{Path, State},
    Json,
};

use service_core::error::AppError;

use crate::dtos::auth::MessageResponse;
use crate::dtos::billing::{
    BillingPageResponse, UpdateAddressRequest, UpdateBillingRequest, UpdateCustomerRequest,
};
use crate::dtos::ErrorResponse;
use crate::middleware::auth::{AuthenticatedUser, CurrentVisitor};
use crate::services::billing::BILLING_UPDATE_OK;
use crate::services::paddle::{AddressUpdate, CustomerUpdate};
use crate::utils::ValidatedJson;
use crate::AppState;

/// The billing view: current processor address as an editable form.
#[utoipa::path(
    get,
    path = "/billing",
    responses(
        (status = 200, description = "Billing form payload", body = BillingPageResponse),
        (status = 303, description = "Not signed in"),
        (status = 404, description = "No billing information found", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn billing_page(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
) -> Result<Json<BillingPageResponse>, AppError> {
    let page = state.billing_sync.load(visitor.user_id).await?;

    super::account::announce_session(&state, &visitor).await;

    Ok(Json(page))
}

/// Save the billing form: profile name, processor customer name, processor
/// address, in that order.
#[utoipa::path(
    post,
    path = "/billing",
    request_body = UpdateBillingRequest,
    responses(
        (status = 200, description = "All steps applied", body = MessageResponse),
        (status = 303, description = "Not signed in"),
        (status = 404, description = "No billing information found", body = ErrorResponse),
        (status = 500, description = "A step failed; earlier steps stay applied", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn update_billing(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    ValidatedJson(req): ValidatedJson<UpdateBillingRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.billing_sync.submit(visitor.user_id, req).await?;

    Ok(Json(MessageResponse {
        message: BILLING_UPDATE_OK.to_string(),
    }))
}

/// Proxy: fetch the caller's processor customer record.
#[utoipa::path(
    get,
    path = "/api/paddle/customers/{customer_id}",
    params(("customer_id" = String, Path, description = "Processor customer id")),
    responses(
        (status = 200, description = "Customer record"),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Customer belongs to someone else", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .billing_sync
        .authorize_customer(user.id, &customer_id)
        .await?;

    let customer = state.billing.get_customer(&customer_id).await?;
    Ok(Json(serde_json::json!({ "data": customer })))
}

/// Proxy: patch the caller's processor customer record.
#[utoipa::path(
    patch,
    path = "/api/paddle/customers/{customer_id}",
    params(("customer_id" = String, Path, description = "Processor customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated"),
        (status = 400, description = "Neither email nor name given", body = ErrorResponse),
        (status = 403, description = "Customer belongs to someone else", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn patch_customer(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCustomerRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.email.is_none() && req.name.is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "At least one of email or name must be provided"
        )));
    }

    state
        .billing_sync
        .authorize_customer(user.id, &customer_id)
        .await?;

    let customer = state
        .billing
        .update_customer(
            &customer_id,
            CustomerUpdate {
                name: req.name,
                email: req.email,
            },
        )
        .await?;
    Ok(Json(serde_json::json!({ "data": customer })))
}

/// Proxy: list the caller's processor addresses.
#[utoipa::path(
    get,
    path = "/api/paddle/customers/{customer_id}/addresses",
    params(("customer_id" = String, Path, description = "Processor customer id")),
    responses(
        (status = 200, description = "Address list"),
        (status = 403, description = "Customer belongs to someone else", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .billing_sync
        .authorize_customer(user.id, &customer_id)
        .await?;

    let addresses = state.billing.list_addresses(&customer_id).await?;
    Ok(Json(serde_json::json!({ "data": addresses })))
}

/// Proxy: patch one of the caller's processor addresses.
#[utoipa::path(
    patch,
    path = "/api/paddle/customers/{customer_id}/addresses/{address_id}",
    params(
        ("customer_id" = String, Path, description = "Processor customer id"),
        ("address_id" = String, Path, description = "Processor address id")
    ),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated"),
        (status = 403, description = "Customer belongs to someone else", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn patch_address(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((customer_id, address_id)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<UpdateAddressRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .billing_sync
        .authorize_customer(user.id, &customer_id)
        .await?;

    let address = state
        .billing
        .update_address(
            &customer_id,
            &address_id,
            AddressUpdate {
                first_line: req.first_line,
                second_line: req.second_line,
                city: req.city,
                postal_code: req.postal_code,
                region: req.region,
                country_code: req.country_code,
                status: req.status.unwrap_or_else(|| "active".to_string()),
            },
        )
        .await?;
    Ok(Json(serde_json::json!({ "data": address })))
}

/// Proxy: open a billing portal session for the caller.
#[utoipa::path(
    post,
    path = "/api/paddle/customers/{customer_id}/portal-sessions",
    params(("customer_id" = String, Path, description = "Processor customer id")),
    responses(
        (status = 200, description = "Portal session created"),
        (status = 403, description = "Customer belongs to someone else", body = ErrorResponse)
    ),
    tag = "Billing"
)]
pub async fn create_portal_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(customer_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .billing_sync
        .authorize_customer(user.id, &customer_id)
        .await?;

    let portal = state.billing.create_portal_session(&customer_id).await?;
    Ok(Json(serde_json::json!({
        "data": {
            "id": portal.id,
            "url": portal.overview_url(),
        }
    })))
}
