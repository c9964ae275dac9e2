//! One-time verification token kinds.

use serde::{Deserialize, Serialize};

/// Kinds of single-use tokens the provider issues. Each token is consumed
/// exactly once; a failed consumption is never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyKind {
    /// Signup email confirmation.
    Email,
    /// Confirmation of a pending email-address change.
    EmailChange,
    /// Password recovery.
    Recovery,
}

impl VerifyKind {
    /// Discriminator understood by the provider's verification endpoint.
    pub fn as_provider_type(&self) -> &'static str {
        match self {
            VerifyKind::Email => "email",
            VerifyKind::EmailChange => "email_change",
            VerifyKind::Recovery => "recovery",
        }
    }
}
