use axum::{http::StatusCode, response::IntoResponse};

use crate::services::metrics;

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        metrics::render(),
    )
}
