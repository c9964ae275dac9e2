use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Language, ProfileResponse, SessionUser, VerifiedBanner};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,

    pub language: Option<Language>,

    pub marketing_consent: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new@example.com")]
    pub new_email: String,
}

/// Query parameters of the email-change confirmation route.
#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyEmailChangeQuery {
    pub token_hash: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// The new address, applied to the local record after the provider
    /// confirms the change.
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub user: SessionUser,
    pub profile: ProfileResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<VerifiedBanner>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WelcomePageResponse {
    pub page: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<VerifiedBanner>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetLocaleRequest {
    pub language: Language,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocaleResponse {
    #[schema(example = "en")]
    pub locale: String,
}
