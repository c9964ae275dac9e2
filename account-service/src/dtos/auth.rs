use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::VerifiedBanner;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[schema(example = "Jane Doe")]
    pub name: Option<String>,

    #[serde(default)]
    pub marketing_consent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(example = "Check your email to verify your account.")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub user_id: String,
    pub email: String,
    /// Display language adopted after the sign-in event re-resolution.
    #[schema(example = "en")]
    pub locale: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MagicLinkRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token_hash: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Query parameters of the confirmation route.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ConfirmQuery {
    pub token_hash: Option<String>,
    /// Signup-flow discriminator; `subscription` routes to the welcome view.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Query parameters carrying a verification outcome into a view.
#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifiedQuery {
    pub verified: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl VerifiedQuery {
    pub fn is_verified(&self) -> bool {
        self.verified.as_deref() == Some("true")
    }
}

/// Payload of the entry views (sign-in, sign-up, forgot).
#[derive(Debug, Serialize, ToSchema)]
pub struct EntryPageResponse {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<VerifiedBanner>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
