//! Post-verification status banners.
//!
//! A view reached with `verified=true&type=<kind>` records a one-shot flash,
//! then redirects to the same path without the query so a refresh cannot
//! re-trigger it. The clean view pops the flash at most once and shows the
//! kind-specific message for a fixed window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed display window before the banner clears itself.
pub const VERIFIED_BANNER_WINDOW_SECS: i64 = 5;

pub const SUBSCRIPTION_VERIFIED_MESSAGE: &str = "Thank you for subscribing! Your account is ready.";
pub const LOGIN_VERIFIED_MESSAGE: &str = "Your email has been verified. You can now sign in.";
pub const EMAIL_VERIFIED_MESSAGE: &str = "Email verified successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Subscription,
    Login,
    EmailVerified,
}

impl BannerKind {
    /// Map the `type` query discriminator onto a banner kind. Anything
    /// unrecognized gets the plain email-verified message.
    pub fn from_query_type(kind: Option<&str>) -> Self {
        match kind {
            Some("subscription") => BannerKind::Subscription,
            Some("login") => BannerKind::Login,
            _ => BannerKind::EmailVerified,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BannerKind::Subscription => SUBSCRIPTION_VERIFIED_MESSAGE,
            BannerKind::Login => LOGIN_VERIFIED_MESSAGE,
            BannerKind::EmailVerified => EMAIL_VERIFIED_MESSAGE,
        }
    }
}

/// One-shot flash recorded when a view arrives with `verified=true`.
/// Popping it is the at-most-once guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerFlash {
    pub kind: BannerKind,
    pub created_at: DateTime<Utc>,
}

impl BannerFlash {
    pub fn new(kind: BannerKind) -> Self {
        Self {
            kind,
            created_at: Utc::now(),
        }
    }

    fn is_fresh(&self) -> bool {
        Utc::now() - self.created_at <= Duration::seconds(VERIFIED_BANNER_WINDOW_SECS)
    }

    /// A flash older than the display window is discarded unshown.
    pub fn into_banner(self) -> Option<VerifiedBanner> {
        if !self.is_fresh() {
            return None;
        }
        Some(VerifiedBanner {
            message: self.kind.message().to_string(),
            dismiss_after_secs: VERIFIED_BANNER_WINDOW_SECS as u64,
        })
    }
}

/// Banner payload handed to the view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerifiedBanner {
    pub message: String,
    pub dismiss_after_secs: u64,
}
