//! Inbound side of the cross-context session bridge.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use tower_sessions::Session;

use crate::models::session::keys;
use crate::services::bridge::{InboundSessionMessage, FROM_EXTENSION};
use crate::services::metrics;
use crate::AppState;

/// Accept a session pushed by the external consumer.
///
/// Messages from any other origin are discarded silently - same status, no
/// error, no state change - so a spoofed sender learns nothing. Accepted
/// messages overwrite the cached session; last message wins.
#[utoipa::path(
    post,
    path = "/bridge/session",
    responses((status = 204, description = "Message processed or dropped")),
    tag = "Bridge"
)]
pub async fn bridge_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Session,
    Json(message): Json<InboundSessionMessage>,
) -> StatusCode {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if origin != state.config.server.public_origin {
        tracing::debug!(origin, "dropping bridge message from foreign origin");
        metrics::record_bridge_message("inbound", "dropped");
        return StatusCode::NO_CONTENT;
    }

    if message.kind != FROM_EXTENSION {
        tracing::debug!(kind = %message.kind, "dropping bridge message of unknown type");
        metrics::record_bridge_message("inbound", "dropped");
        return StatusCode::NO_CONTENT;
    }

    if let Some(tokens) = message.payload.session {
        let inserts = [
            (keys::ACCESS_TOKEN, tokens.access_token),
            (keys::REFRESH_TOKEN, tokens.refresh_token),
        ];
        for (key, value) in inserts {
            if let Err(e) = session.insert(key, value).await {
                tracing::warn!(error = %e, "failed to cache bridged session");
                return StatusCode::NO_CONTENT;
            }
        }

        if let Some(user_id) = message.payload.supabase_user_id {
            let _ = session.insert(keys::USER_ID, user_id).await;
        }
        if let Some(email) = message.payload.email {
            let _ = session.insert(keys::EMAIL, email).await;
        }

        metrics::record_bridge_message("inbound", "accepted");
        tracing::info!("session updated from bridge message");
    }

    StatusCode::NO_CONTENT
}
