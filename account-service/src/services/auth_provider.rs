//! Authentication provider client.
//!
//! Speaks the GoTrue-compatible HTTP surface the portal delegates all
//! credential handling to. Token issuance, refresh, and email delivery are
//! the provider's business; this client only consumes results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::error::ServiceError;
use crate::config::AuthProviderSettings;
use crate::models::VerifyKind;

/// Account record as the provider reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl ProviderUser {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// Token bundle the provider grants on successful authentication.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<ProviderUser>,
}

/// Mutable account fields. Changing the email starts the provider's
/// confirmation flow rather than applying immediately.
#[derive(Debug, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<ProviderUser, ServiceError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ServiceError>;

    /// Send a magic sign-in link.
    async fn sign_in_with_otp(&self, email: &str) -> Result<(), ServiceError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), ServiceError>;

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ServiceError>;

    /// Consume a one-time verification token. Single-use on the provider
    /// side; callers must not retry a failed consumption.
    async fn verify_otp(
        &self,
        token_hash: &str,
        kind: VerifyKind,
    ) -> Result<ProviderSession, ServiceError>;

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<ProviderUser, ServiceError>;

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ServiceError>;
}

/// HTTP client for a GoTrue-compatible provider.
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    settings: AuthProviderSettings,
}

impl GoTrueClient {
    pub fn new(settings: AuthProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.settings.url, path)
    }

    fn anon_key(&self) -> &str {
        self.settings.anon_key.expose_secret()
    }

    /// Turn a non-success response into a `Provider` error carrying the
    /// provider's own message, so it can be surfaced verbatim.
    async fn provider_error(response: reqwest::Response) -> ServiceError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["msg", "message", "error_description", "error"]
                    .iter()
                    .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(String::from))
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "Authentication request failed".to_string()
                } else {
                    body.clone()
                }
            });

        tracing::warn!(status, message = %message, "authentication provider rejected request");
        ServiceError::Provider { status, message }
    }

    fn transport_error(e: reqwest::Error) -> ServiceError {
        tracing::error!(error = %e, "authentication provider request failed");
        ServiceError::ProviderUnreachable(e.to_string())
    }
}

#[async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<ProviderUser, ServiceError> {
        let response = self
            .client
            .post(self.url("/signup"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", self.anon_key())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        // With confirmations enabled the body is the user; with autoconfirm
        // it is a session wrapping the user.
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        let user_value = value.get("user").cloned().unwrap_or(value);
        let user: ProviderUser = serde_json::from_value(user_value)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("unexpected signup body: {}", e)))?;

        tracing::info!(user_id = %user.id, "provider sign-up accepted");
        Ok(user)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, ServiceError> {
        let response = self
            .client
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key())
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("/otp"))
            .header("apikey", self.anon_key())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("/logout"))
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<ProviderUser, ServiceError> {
        let response = self
            .client
            .get(self.url("/user"))
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))
    }

    async fn verify_otp(
        &self,
        token_hash: &str,
        kind: VerifyKind,
    ) -> Result<ProviderSession, ServiceError> {
        let response = self
            .client
            .post(self.url("/verify"))
            .header("apikey", self.anon_key())
            .json(&json!({
                "type": kind.as_provider_type(),
                "token_hash": token_hash,
            }))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))
    }

    async fn update_user(
        &self,
        access_token: &str,
        update: UserUpdate,
    ) -> Result<ProviderUser, ServiceError> {
        let response = self
            .client
            .put(self.url("/user"))
            .header("apikey", self.anon_key())
            .bearer_auth(access_token)
            .json(&update)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url("/recover"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", self.anon_key())
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }
        Ok(())
    }
}
