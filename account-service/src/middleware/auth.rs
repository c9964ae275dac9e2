//! Session gating.
//!
//! Protected views re-check the cached session on every request; a stale or
//! missing session redirects to sign-in before any protected content is
//! produced. Entry views do the inverse and push signed-in visitors to the
//! landing route. Revocation is only noticed on the next protected request.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use service_core::error::AppError;

use crate::models::session::keys;
use crate::models::CachedSession;
use crate::utils::jwt::decode_access_claims;
use crate::AppState;

pub const SIGN_IN_ROUTE: &str = "/auth/signin";
pub const LANDING_ROUTE: &str = "/account";

/// Read the cached session from the cookie session, treating an expired or
/// undecodable token as absent.
pub(crate) async fn cached_visitor(session: &Session) -> Option<CurrentVisitor> {
    let access_token = session
        .get::<String>(keys::ACCESS_TOKEN)
        .await
        .ok()
        .flatten()?;
    let claims = decode_access_claims(&access_token).ok()?;
    if claims.is_expired() {
        return None;
    }

    let user_id = Uuid::parse_str(&claims.sub).ok()?;
    let email = match session.get::<String>(keys::EMAIL).await {
        Ok(Some(email)) => email,
        _ => claims.email.unwrap_or_default(),
    };
    let refresh_token = session
        .get::<String>(keys::REFRESH_TOKEN)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    Some(CurrentVisitor {
        user_id,
        email,
        tokens: CachedSession {
            access_token,
            refresh_token,
        },
    })
}

/// Gate for protected views: no valid session, no content.
pub async fn session_gate(session: Session, request: Request, next: Next) -> Response {
    if cached_visitor(&session).await.is_none() {
        return Redirect::to(SIGN_IN_ROUTE).into_response();
    }

    next.run(request).await
}

/// Inverse gate used by the entry views: a signed-in visitor never sees the
/// forms again.
pub async fn redirect_if_authenticated(session: &Session) -> Option<Redirect> {
    if cached_visitor(session).await.is_some() {
        return Some(Redirect::to(LANDING_ROUTE));
    }
    None
}

/// Identity carried by the cached session of a gated view.
#[derive(Debug, Clone)]
pub struct CurrentVisitor {
    pub user_id: Uuid,
    pub email: String,
    pub tokens: CachedSession,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentVisitor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        cached_visitor(&session)
            .await
            .ok_or_else(|| Redirect::to(SIGN_IN_ROUTE).into_response())
    }
}

/// Bearer-token identity for the API proxy routes. The token is validated
/// against the provider on every call.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub access_token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

        let user = state
            .auth
            .get_user(token)
            .await
            .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Unauthorized")))?;

        Ok(Self {
            id: user.id,
            email: user.email,
            access_token: token.to_string(),
        })
    }
}
