//! User profile - the application's own record about a user, distinct from
//! the authentication provider's account record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Display languages supported by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
}

/// Fixed default tag adopted when no preference can be resolved.
pub const DEFAULT_LANGUAGE: Language = Language::En;

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            _ => None,
        }
    }
}

/// Profile row in the `users` table, keyed by the provider's user id.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
    pub language: Option<String>,
    pub name: String,
    pub marketing_consent: bool,
    pub subscription_plan: String,
    /// Set once by signup-time provisioning; read-only here.
    pub paddle_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Stored language preference, ignoring unknown tags.
    pub fn preferred_language(&self) -> Option<Language> {
        self.language.as_deref().and_then(Language::parse)
    }
}

/// Fields inserted when a visitor completes sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub marketing_consent: bool,
    pub subscription_plan: String,
}

impl NewProfile {
    /// New signups start on the free plan; a blank name falls back to the
    /// local part of the email address.
    pub fn for_signup(
        id: Uuid,
        email: &str,
        name: Option<String>,
        marketing_consent: bool,
    ) -> Self {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Self {
            id,
            email: email.to_string(),
            name,
            marketing_consent,
            subscription_plan: "Free".to_string(),
        }
    }
}

/// Profile shape returned to the visitor.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
    pub language: Option<String>,
    pub name: String,
    pub marketing_consent: bool,
    pub subscription_plan: String,
    pub paddle_customer_id: Option<String>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            email_confirmed: p.email_confirmed,
            language: p.language,
            name: p.name,
            marketing_consent: p.marketing_consent,
            subscription_plan: p.subscription_plan,
            paddle_customer_id: p.paddle_customer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_profile_defaults_to_free_plan() {
        let profile = NewProfile::for_signup(Uuid::new_v4(), "a@x.com", None, false);
        assert_eq!(profile.subscription_plan, "Free");
    }

    #[test]
    fn blank_name_falls_back_to_email_local_part() {
        let profile = NewProfile::for_signup(Uuid::new_v4(), "jane@example.com", None, true);
        assert_eq!(profile.name, "jane");

        let profile =
            NewProfile::for_signup(Uuid::new_v4(), "jane@example.com", Some("  ".into()), true);
        assert_eq!(profile.name, "jane");

        let profile =
            NewProfile::for_signup(Uuid::new_v4(), "jane@example.com", Some("Jane".into()), true);
        assert_eq!(profile.name, "Jane");
    }

    #[test]
    fn unknown_language_tags_are_ignored() {
        assert_eq!(Language::parse("de"), Some(Language::De));
        assert_eq!(Language::parse("fr"), None);
    }
}
