//! Locale resolution and switching.

use axum::{extract::State, Json};
use tower_sessions::Session;

use service_core::error::AppError;

use crate::dtos::account::{LocaleResponse, SetLocaleRequest};
use crate::middleware::auth::cached_visitor;
use crate::utils::ValidatedJson;
use crate::AppState;

/// Resolve the active display language: profile preference for signed-in
/// visitors, session fallback otherwise, default as the last resort.
#[utoipa::path(
    get,
    path = "/locale",
    responses((status = 200, description = "Active locale", body = LocaleResponse)),
    tag = "Locale"
)]
pub async fn get_locale(State(state): State<AppState>, session: Session) -> Json<LocaleResponse> {
    let user_id = cached_visitor(&session).await.map(|v| v.user_id);
    let locale = state.locale.resolve(user_id, &session).await;

    Json(LocaleResponse {
        locale: locale.as_str().to_string(),
    })
}

/// Switch language. Signed-in visitors write their profile (and drop the
/// fallback); anonymous visitors write the fallback.
#[utoipa::path(
    put,
    path = "/locale",
    request_body = SetLocaleRequest,
    responses((status = 200, description = "Locale updated", body = LocaleResponse)),
    tag = "Locale"
)]
pub async fn set_locale(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(req): ValidatedJson<SetLocaleRequest>,
) -> Result<Json<LocaleResponse>, AppError> {
    let user_id = cached_visitor(&session).await.map(|v| v.user_id);
    state
        .locale
        .set_language(user_id, &session, req.language)
        .await?;

    Ok(Json(LocaleResponse {
        locale: req.language.as_str().to_string(),
    }))
}
