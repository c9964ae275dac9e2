//! Cached copy of the provider-owned session.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Keys under which the session cache lives in the visitor cookie session.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER_ID: &str = "user_id";
    pub const EMAIL: &str = "email";
    pub const PREFERRED_LANGUAGE: &str = "preferred_language";
    pub const VERIFIED_BANNER: &str = "verified_banner";
}

/// Token pair cached from the authentication provider. The provider owns the
/// session; this copy is read-mostly and refreshed wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSession {
    pub access_token: String,
    pub refresh_token: String,
}

/// Minimal identity attached to a session, as shared over the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}
