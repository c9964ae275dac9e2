//! Sign-up, sign-in, sign-out, and password flows.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tower_sessions::Session;

use service_core::error::AppError;

use crate::dtos::ErrorResponse;
use crate::dtos::auth::{
    EntryPageResponse, ForgotPasswordRequest, MagicLinkRequest, MessageResponse,
    ResetPasswordRequest, SignInRequest, SignInResponse, SignUpRequest, SignUpResponse,
    VerifiedQuery,
};
use crate::middleware::auth::{redirect_if_authenticated, SIGN_IN_ROUTE};
use crate::models::session::keys;
use crate::models::{BannerKind, CachedSession, NewProfile, SessionUser, VerifyKind};
use crate::services::auth_provider::UserUpdate;
use crate::services::{metrics, BridgeMessage, ProviderSession};
use crate::utils::jwt::decode_access_claims;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Install a provider-granted session into the visitor's cookie session.
pub(crate) async fn install_session(
    session: &Session,
    granted: &ProviderSession,
) -> Result<SessionUser, AppError> {
    let (user_id, email) = match &granted.user {
        Some(user) => (
            user.id.to_string(),
            user.email.clone().unwrap_or_default(),
        ),
        None => {
            let claims = decode_access_claims(&granted.access_token)
                .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
            (claims.sub, claims.email.unwrap_or_default())
        }
    };

    let inserts = [
        (keys::ACCESS_TOKEN, granted.access_token.clone()),
        (keys::REFRESH_TOKEN, granted.refresh_token.clone()),
        (keys::USER_ID, user_id.clone()),
        (keys::EMAIL, email.clone()),
    ];
    for (key, value) in inserts {
        session
            .insert(key, value)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e)))?;
    }

    Ok(SessionUser { id: user_id, email })
}

/// Entry view for sign-in. Arrivals with `verified=true` convert the query
/// into a one-shot banner and get a clean URL back.
#[utoipa::path(
    get,
    path = "/auth/signin",
    params(VerifiedQuery),
    responses(
        (status = 200, description = "Sign-in page payload", body = EntryPageResponse),
        (status = 303, description = "Already signed in, or query stripped")
    ),
    tag = "Authentication"
)]
pub async fn signin_page(
    session: Session,
    Query(query): Query<VerifiedQuery>,
) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&session).await {
        return Ok(redirect.into_response());
    }

    if query.is_verified() {
        super::stash_banner(&session, BannerKind::from_query_type(query.kind.as_deref())).await;
        return Ok(Redirect::to(SIGN_IN_ROUTE).into_response());
    }

    Ok(Json(EntryPageResponse {
        page: "signin".to_string(),
        banner: super::take_banner(&session).await,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/auth/signup",
    responses(
        (status = 200, description = "Sign-up page payload", body = EntryPageResponse),
        (status = 303, description = "Already signed in")
    ),
    tag = "Authentication"
)]
pub async fn signup_page(session: Session) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&session).await {
        return Ok(redirect.into_response());
    }

    Ok(Json(EntryPageResponse {
        page: "signup".to_string(),
        banner: None,
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/auth/forgot",
    responses(
        (status = 200, description = "Forgot-password page payload", body = EntryPageResponse),
        (status = 303, description = "Already signed in")
    ),
    tag = "Authentication"
)]
pub async fn forgot_page(session: Session) -> Result<Response, AppError> {
    if let Some(redirect) = redirect_if_authenticated(&session).await {
        return Ok(redirect.into_response());
    }

    Ok(Json(EntryPageResponse {
        page: "forgot".to_string(),
        banner: None,
    })
    .into_response())
}

/// Register with the provider, then provision the local profile row.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Registered, confirmation email pending", body = SignUpResponse),
        (status = 422, description = "Provider rejected the registration", body = ErrorResponse),
        (status = 500, description = "Registered upstream but profile setup failed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<Json<SignUpResponse>, AppError> {
    let redirect_to = format!("{}/auth/confirm", state.config.server.public_origin);

    let user = state
        .auth
        .sign_up(&req.email, &req.password, &redirect_to)
        .await?;

    let profile = NewProfile::for_signup(user.id, &req.email, req.name, req.marketing_consent);
    if let Err(e) = state.profiles.insert(profile).await {
        tracing::error!(error = %e, user_id = %user.id, "profile provisioning failed after sign-up");
        return Err(AppError::PartialFailure(
            "Account created but failed to set up user profile".to_string(),
        ));
    }

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(SignUpResponse {
        user_id: user.id.to_string(),
        message: "Check your email to verify your account.".to_string(),
    }))
}

/// Password sign-in. On success the session is cached, the locale is
/// re-resolved, and the session is announced over the bridge.
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 422, description = "Provider rejected the credentials", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let granted = match state
        .auth
        .sign_in_with_password(&req.email, &req.password)
        .await
    {
        Ok(granted) => granted,
        Err(e) => {
            metrics::record_sign_in("error");
            return Err(e.into());
        }
    };

    let user = install_session(&session, &granted).await?;

    // Sign-in event: the profile language, when set, supersedes the fallback.
    let user_id = uuid::Uuid::parse_str(&user.id).ok();
    let locale = state.locale.resolve(user_id, &session).await;

    let tokens = CachedSession {
        access_token: granted.access_token.clone(),
        refresh_token: granted.refresh_token.clone(),
    };
    state
        .bridge
        .broadcast(BridgeMessage::session_established(&tokens, &user))
        .await;

    metrics::record_sign_in("ok");
    tracing::info!(user_id = %user.id, "user signed in");

    Ok(Json(SignInResponse {
        user_id: user.id,
        email: user.email,
        locale: locale.as_str().to_string(),
    }))
}

/// Sign out: revoke upstream (best effort), drop the cached copy, and
/// broadcast the cleared sentinel exactly once.
#[utoipa::path(
    post,
    path = "/auth/signout",
    responses((status = 303, description = "Signed out, redirected to sign-in")),
    tag = "Authentication"
)]
pub async fn sign_out(State(state): State<AppState>, session: Session) -> Redirect {
    if let Ok(Some(access_token)) = session.get::<String>(keys::ACCESS_TOKEN).await {
        if let Err(e) = state.auth.sign_out(&access_token).await {
            // The local copy is dropped regardless.
            tracing::warn!(error = %e, "provider sign-out failed");
        }
    }

    session.clear().await;

    state.bridge.broadcast(BridgeMessage::session_cleared()).await;
    metrics::record_bridge_message("outbound", "cleared");

    Redirect::to(SIGN_IN_ROUTE)
}

/// Send a magic sign-in link.
#[utoipa::path(
    post,
    path = "/auth/otp",
    request_body = MagicLinkRequest,
    responses((status = 200, description = "Magic link queued", body = MessageResponse)),
    tag = "Authentication"
)]
pub async fn send_magic_link(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<MagicLinkRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth.sign_in_with_otp(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Check your email for a sign-in link.".to_string(),
    }))
}

/// Start password recovery. The response is uniform so the endpoint cannot
/// be used to probe which addresses exist.
#[utoipa::path(
    post,
    path = "/auth/forgot",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Request received", body = MessageResponse)),
    tag = "Authentication"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let redirect_to = format!("{}/auth/reset", state.config.server.public_origin);

    if let Err(e) = state
        .auth
        .reset_password_for_email(&req.email, &redirect_to)
        .await
    {
        tracing::warn!(error = %e, "password reset request failed");
    }

    Ok(Json(MessageResponse {
        message: "If your email is registered, you will receive a password reset link shortly."
            .to_string(),
    }))
}

/// Complete password recovery: consume the token, then set the new password
/// with the session it granted.
#[utoipa::path(
    post,
    path = "/auth/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 422, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let granted = match state
        .auth
        .verify_otp(&req.token_hash, VerifyKind::Recovery)
        .await
    {
        Ok(granted) => granted,
        Err(e) => {
            metrics::record_verification("recovery", "error");
            return Err(e.into());
        }
    };
    metrics::record_verification("recovery", "ok");

    state
        .auth
        .update_user(
            &granted.access_token,
            UserUpdate {
                password: Some(req.password),
                ..Default::default()
            },
        )
        .await?;

    install_session(&session, &granted).await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully!".to_string(),
    }))
}
