//! Relational store for the `users` table.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::ServiceError;
use crate::models::{Language, NewProfile, UserProfile};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, ServiceError>;

    async fn insert(&self, profile: NewProfile) -> Result<(), ServiceError>;

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), ServiceError>;

    async fn update_email(&self, id: Uuid, email: &str) -> Result<(), ServiceError>;

    async fn update_language(&self, id: Uuid, language: Language) -> Result<(), ServiceError>;

    async fn update_marketing_consent(&self, id: Uuid, consent: bool) -> Result<(), ServiceError>;
}

const PROFILE_COLUMNS: &str = "id, email, email_confirmed, language, name, marketing_consent, \
                               subscription_plan, paddle_customer_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn require_row(result: sqlx::postgres::PgQueryResult) -> Result<(), ServiceError> {
        if result.rows_affected() == 0 {
            return Err(ServiceError::ProfileNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find(&self, id: Uuid) -> Result<Option<UserProfile>, ServiceError> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn insert(&self, profile: NewProfile) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO users (id, email, name, marketing_consent, subscription_plan) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(profile.marketing_consent)
        .bind(&profile.subscription_plan)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE users SET name = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Self::require_row(result)
    }

    async fn update_email(&self, id: Uuid, email: &str) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, email_confirmed = TRUE, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;

        Self::require_row(result)
    }

    async fn update_language(&self, id: Uuid, language: Language) -> Result<(), ServiceError> {
        let result =
            sqlx::query("UPDATE users SET language = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(language.as_str())
                .execute(&self.pool)
                .await?;

        Self::require_row(result)
    }

    async fn update_marketing_consent(&self, id: Uuid, consent: bool) -> Result<(), ServiceError> {
        let result =
            sqlx::query("UPDATE users SET marketing_consent = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(consent)
                .execute(&self.pool)
                .await?;

        Self::require_row(result)
    }
}
