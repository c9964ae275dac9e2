pub mod account;
pub mod auth;
pub mod billing;

use serde::Serialize;
use utoipa::ToSchema;

/// Error body shape produced by the shared error type.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
