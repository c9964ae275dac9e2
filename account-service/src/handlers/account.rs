//! Account views and profile updates.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tower_sessions::Session;

use service_core::error::AppError;

use crate::dtos::account::{
    AccountResponse, ChangeEmailRequest, UpdateAccountRequest, WelcomePageResponse,
};
use crate::dtos::auth::{MessageResponse, VerifiedQuery};
use crate::dtos::ErrorResponse;
use crate::middleware::auth::CurrentVisitor;
use crate::models::{BannerKind, ProfileResponse, SessionUser};
use crate::services::auth_provider::UserUpdate;
use crate::services::{metrics, BridgeMessage};
use crate::utils::ValidatedJson;
use crate::AppState;

/// Announce the visitor's session to the external consumer. Every gated view
/// does this once it has established that a session is present.
pub(crate) async fn announce_session(state: &AppState, visitor: &CurrentVisitor) {
    let user = SessionUser {
        id: visitor.user_id.to_string(),
        email: visitor.email.clone(),
    };
    state
        .bridge
        .broadcast(BridgeMessage::session_established(&visitor.tokens, &user))
        .await;
    metrics::record_bridge_message("outbound", "session");
}

/// Landing redirect for the root view.
pub async fn home() -> Redirect {
    Redirect::to("/account")
}

/// The account view. Arrivals with `verified=true` (email-change flow) get
/// the one-shot banner treatment.
#[utoipa::path(
    get,
    path = "/account",
    params(VerifiedQuery),
    responses(
        (status = 200, description = "Account payload", body = AccountResponse),
        (status = 303, description = "Not signed in, or query stripped"),
        (status = 404, description = "Profile missing", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    session: Session,
    Query(query): Query<VerifiedQuery>,
) -> Result<Response, AppError> {
    if query.is_verified() {
        super::stash_banner(&session, BannerKind::from_query_type(query.kind.as_deref())).await;
        return Ok(Redirect::to("/account").into_response());
    }

    let profile = state
        .profiles
        .find(visitor.user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    announce_session(&state, &visitor).await;

    Ok(Json(AccountResponse {
        user: SessionUser {
            id: visitor.user_id.to_string(),
            email: visitor.email,
        },
        profile: ProfileResponse::from(profile),
        banner: super::take_banner(&session).await,
    })
    .into_response())
}

/// Update profile fields. A language change makes the profile authoritative
/// and clears the anonymous fallback.
#[utoipa::path(
    patch,
    path = "/account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 404, description = "Profile missing", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn update_account(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    session: Session,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if let Some(name) = &req.name {
        state.profiles.update_name(visitor.user_id, name).await?;
    }

    if let Some(language) = req.language {
        state
            .locale
            .set_language(Some(visitor.user_id), &session, language)
            .await?;
    }

    if let Some(consent) = req.marketing_consent {
        state
            .profiles
            .update_marketing_consent(visitor.user_id, consent)
            .await?;
    }

    let profile = state
        .profiles
        .find(visitor.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Profile not found")))?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Start an email change. The provider sends the confirmation link; nothing
/// changes locally until the token is consumed.
#[utoipa::path(
    post,
    path = "/account/email",
    request_body = ChangeEmailRequest,
    responses(
        (status = 200, description = "Confirmation pending", body = MessageResponse),
        (status = 422, description = "Provider rejected the change", body = ErrorResponse)
    ),
    tag = "Account"
)]
pub async fn change_email(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    ValidatedJson(req): ValidatedJson<ChangeEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth
        .update_user(
            &visitor.tokens.access_token,
            UserUpdate {
                email: Some(req.new_email),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Check your new email address to confirm the change.".to_string(),
    }))
}

/// Subscription-welcome view, reached after a subscription-linked signup is
/// confirmed.
#[utoipa::path(
    get,
    path = "/welcome",
    params(VerifiedQuery),
    responses(
        (status = 200, description = "Welcome payload", body = WelcomePageResponse),
        (status = 303, description = "Not signed in, or query stripped")
    ),
    tag = "Account"
)]
pub async fn welcome(
    State(state): State<AppState>,
    visitor: CurrentVisitor,
    session: Session,
    Query(query): Query<VerifiedQuery>,
) -> Result<Response, AppError> {
    if query.is_verified() {
        super::stash_banner(&session, BannerKind::from_query_type(query.kind.as_deref())).await;
        return Ok(Redirect::to("/welcome").into_response());
    }

    announce_session(&state, &visitor).await;

    Ok(Json(WelcomePageResponse {
        page: "welcome".to_string(),
        banner: super::take_banner(&session).await,
    })
    .into_response())
}
