//! One-time verification token consumption.
//!
//! Each token-bearing route is a tiny state machine: pending until the
//! provider answers, then terminally confirmed or failed. A token is
//! submitted at most once; a missing token fails without any provider call.

use axum::{
    extract::{Query, State},
    response::Redirect,
};
use tower_sessions::Session;

use service_core::error::AppError;

use crate::dtos::account::VerifyEmailChangeQuery;
use crate::dtos::auth::ConfirmQuery;
use crate::dtos::ErrorResponse;
use crate::models::VerifyKind;
use crate::services::metrics;
use crate::utils::jwt::decode_access_claims;
use crate::AppState;

const INVALID_CONFIRMATION_LINK: &str = "Invalid confirmation link";
const INVALID_VERIFICATION_LINK: &str = "Invalid verification link";

/// Signup email confirmation. Success forwards the visitor into the app:
/// subscription-linked signups land on the welcome view, everyone else on
/// sign-in with the banner parameters attached.
#[utoipa::path(
    get,
    path = "/auth/confirm",
    params(ConfirmQuery),
    responses(
        (status = 303, description = "Token consumed, visitor forwarded"),
        (status = 400, description = "Malformed link", body = ErrorResponse),
        (status = 422, description = "Provider rejected the token", body = ErrorResponse)
    ),
    tag = "Verification"
)]
pub async fn confirm_email(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ConfirmQuery>,
) -> Result<Redirect, AppError> {
    let Some(token_hash) = query.token_hash.filter(|t| !t.is_empty()) else {
        metrics::record_verification("email", "invalid_link");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            INVALID_CONFIRMATION_LINK
        )));
    };

    match state.auth.verify_otp(&token_hash, VerifyKind::Email).await {
        Ok(granted) => {
            metrics::record_verification("email", "ok");
            if query.kind.as_deref() == Some("subscription") {
                // The welcome view is gated, so the granted session is
                // adopted; the plain flow sends the visitor to sign in.
                super::auth::install_session(&session, &granted).await?;
                Ok(Redirect::to("/welcome?verified=true&type=subscription"))
            } else {
                Ok(Redirect::to("/auth/signin?verified=true&type=login"))
            }
        }
        Err(e) => {
            // The provider's message is surfaced verbatim; a consumed token
            // stays consumed, so there is nothing to retry.
            metrics::record_verification("email", "error");
            Err(e.into())
        }
    }
}

/// Email-change confirmation. After the provider applies the change, the new
/// address is copied onto the local profile row; a failed copy is reported
/// as a partial success, not hidden behind a redirect.
#[utoipa::path(
    get,
    path = "/account/verify-email-change",
    params(VerifyEmailChangeQuery),
    responses(
        (status = 303, description = "Email change applied everywhere"),
        (status = 400, description = "Malformed link", body = ErrorResponse),
        (status = 422, description = "Provider rejected the token", body = ErrorResponse),
        (status = 500, description = "Verified upstream, local record not updated", body = ErrorResponse)
    ),
    tag = "Verification"
)]
pub async fn verify_email_change(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<VerifyEmailChangeQuery>,
) -> Result<Redirect, AppError> {
    let (Some(token_hash), Some(_), Some(email)) = (
        query.token_hash.filter(|t| !t.is_empty()),
        query.kind.as_deref().filter(|k| !k.is_empty()),
        query.email.filter(|e| !e.is_empty()),
    ) else {
        metrics::record_verification("email_change", "invalid_link");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            INVALID_VERIFICATION_LINK
        )));
    };

    let granted = match state
        .auth
        .verify_otp(&token_hash, VerifyKind::EmailChange)
        .await
    {
        Ok(granted) => granted,
        Err(e) => {
            metrics::record_verification("email_change", "error");
            return Err(e.into());
        }
    };

    let user_id = match &granted.user {
        Some(user) => user.id,
        None => decode_access_claims(&granted.access_token)
            .ok()
            .and_then(|c| uuid::Uuid::parse_str(&c.sub).ok())
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("no user on granted session")))?,
    };

    // The fresh session replaces the one bound to the old address.
    super::auth::install_session(&session, &granted).await?;

    if let Err(e) = state.profiles.update_email(user_id, &email).await {
        tracing::error!(error = %e, user_id = %user_id, "local email update failed after provider confirmed change");
        metrics::record_verification("email_change", "partial");
        return Err(AppError::PartialFailure(
            "Email verified with the provider, but your account record was not updated."
                .to_string(),
        ));
    }

    metrics::record_verification("email_change", "ok");
    Ok(Redirect::to("/account?verified=true"))
}
