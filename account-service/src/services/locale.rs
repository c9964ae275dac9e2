//! Active-locale resolution.
//!
//! A signed-in visitor's profile language is authoritative; an anonymous
//! visitor falls back to a preference stored in the cookie session. The two
//! are never authoritative at the same time: once a profile value is adopted
//! the fallback entry is deleted.

use std::sync::Arc;
use tower_sessions::Session;
use uuid::Uuid;

use super::error::ServiceError;
use super::profiles::ProfileStore;
use crate::models::session::keys;
use crate::models::{Language, DEFAULT_LANGUAGE};

pub struct LocaleResolver {
    profiles: Arc<dyn ProfileStore>,
}

impl LocaleResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Resolve the active display language for the current visitor.
    ///
    /// Resolution never blocks rendering on an error: a failed profile
    /// lookup silently yields the default tag.
    pub async fn resolve(&self, user_id: Option<Uuid>, session: &Session) -> Language {
        if let Some(id) = user_id {
            match self.profiles.find(id).await {
                Ok(Some(profile)) => {
                    if let Some(language) = profile.preferred_language() {
                        // The profile is now authoritative.
                        let _ = session.remove::<String>(keys::PREFERRED_LANGUAGE).await;
                        return language;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %id, "locale lookup failed, using default");
                    return DEFAULT_LANGUAGE;
                }
            }
        }

        match session.get::<String>(keys::PREFERRED_LANGUAGE).await {
            Ok(Some(tag)) => Language::parse(&tag).unwrap_or(DEFAULT_LANGUAGE),
            _ => DEFAULT_LANGUAGE,
        }
    }

    /// Persist a language choice: to the profile for signed-in visitors, to
    /// the session fallback otherwise.
    pub async fn set_language(
        &self,
        user_id: Option<Uuid>,
        session: &Session,
        language: Language,
    ) -> Result<(), ServiceError> {
        match user_id {
            Some(id) => {
                self.profiles.update_language(id, language).await?;
                let _ = session.remove::<String>(keys::PREFERRED_LANGUAGE).await;
            }
            None => {
                session
                    .insert(keys::PREFERRED_LANGUAGE, language.as_str().to_string())
                    .await
                    .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
            }
        }
        Ok(())
    }
}
