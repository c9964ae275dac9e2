//! Paddle billing processor client.
//!
//! Implements the customer, address, and portal-session endpoints of the
//! processor's HTTP API. Customer and address records are owned by the
//! processor; this client only reads and patches them.

use async_trait::async_trait;
use reqwest::{Client, Method};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::config::PaddleSettings;

/// Address record as returned by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddleAddress {
    pub id: String,
    #[serde(default)]
    pub first_line: Option<String>,
    #[serde(default)]
    pub second_line: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Customer record as returned by the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddleCustomer {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Address payload for create/update. Writes always mark the record active.
#[derive(Debug, Clone, Serialize)]
pub struct AddressUpdate {
    pub first_line: String,
    pub second_line: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub region: String,
    pub country_code: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub id: String,
    #[serde(default)]
    pub urls: Option<PortalUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalUrls {
    #[serde(default)]
    pub general: Option<PortalGeneralUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalGeneralUrls {
    #[serde(default)]
    pub overview: Option<String>,
}

impl PortalSession {
    pub fn overview_url(&self) -> Option<&str> {
        self.urls
            .as_ref()
            .and_then(|u| u.general.as_ref())
            .and_then(|g| g.overview.as_deref())
    }
}

/// Processor responses wrap their payload in a `data` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Processor API error body.
#[derive(Debug, Deserialize)]
struct PaddleErrorBody {
    error: PaddleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct PaddleErrorDetail {
    code: String,
    detail: String,
}

#[async_trait]
pub trait BillingProcessor: Send + Sync {
    async fn get_customer(&self, customer_id: &str) -> Result<PaddleCustomer, ServiceError>;

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<PaddleCustomer, ServiceError>;

    async fn list_addresses(&self, customer_id: &str) -> Result<Vec<PaddleAddress>, ServiceError>;

    async fn create_address(
        &self,
        customer_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError>;

    async fn update_address(
        &self,
        customer_id: &str,
        address_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
    ) -> Result<PortalSession, ServiceError>;
}

/// HTTP client for the Paddle API.
#[derive(Clone)]
pub struct PaddleClient {
    client: Client,
    settings: PaddleSettings,
}

impl PaddleClient {
    pub fn new(settings: PaddleSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Check whether processor credentials are set.
    pub fn is_configured(&self) -> bool {
        !self.settings.api_key.expose_secret().is_empty()
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ServiceError> {
        if !self.is_configured() {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Paddle credentials not configured"
            )));
        }

        let url = format!("{}{}", self.settings.api_base_url, path);
        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(self.settings.api_key.expose_secret());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "billing processor request failed");
            ServiceError::BillingUnreachable(e.to_string())
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(status = %status, url = %url, "billing processor response");

        if status.is_success() {
            let envelope: Envelope<T> = serde_json::from_str(&body)
                .map_err(|e| ServiceError::Internal(anyhow::anyhow!("unexpected body: {}", e)))?;
            Ok(envelope.data)
        } else {
            Err(Self::error_from_body(status.as_u16(), &body))
        }
    }

    fn error_from_body(status: u16, body: &str) -> ServiceError {
        let message = match serde_json::from_str::<PaddleErrorBody>(body) {
            Ok(err) => {
                tracing::error!(
                    code = %err.error.code,
                    detail = %err.error.detail,
                    "billing processor rejected request"
                );
                format!("{}: {}", err.error.code, err.error.detail)
            }
            Err(_) => {
                tracing::error!(status, body = %body, "billing processor rejected request");
                "Billing request failed".to_string()
            }
        };
        ServiceError::Billing { status, message }
    }
}

#[async_trait]
impl BillingProcessor for PaddleClient {
    async fn get_customer(&self, customer_id: &str) -> Result<PaddleCustomer, ServiceError> {
        self.send(Method::GET, &format!("/customers/{}", customer_id), None)
            .await
    }

    async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> Result<PaddleCustomer, ServiceError> {
        let body = serde_json::to_value(&update)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        self.send(
            Method::PATCH,
            &format!("/customers/{}", customer_id),
            Some(body),
        )
        .await
    }

    async fn list_addresses(&self, customer_id: &str) -> Result<Vec<PaddleAddress>, ServiceError> {
        self.send(
            Method::GET,
            &format!("/customers/{}/addresses", customer_id),
            None,
        )
        .await
    }

    async fn create_address(
        &self,
        customer_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError> {
        let body = serde_json::to_value(&address)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        self.send(
            Method::POST,
            &format!("/customers/{}/addresses", customer_id),
            Some(body),
        )
        .await
    }

    async fn update_address(
        &self,
        customer_id: &str,
        address_id: &str,
        address: AddressUpdate,
    ) -> Result<PaddleAddress, ServiceError> {
        let body = serde_json::to_value(&address)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e)))?;
        self.send(
            Method::PATCH,
            &format!("/customers/{}/addresses/{}", customer_id, address_id),
            Some(body),
        )
        .await
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
    ) -> Result<PortalSession, ServiceError> {
        self.send(
            Method::POST,
            &format!("/customers/{}/portal-sessions", customer_id),
            None,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn test_settings(api_key: &str) -> PaddleSettings {
        PaddleSettings {
            api_base_url: "https://sandbox-api.paddle.com".to_string(),
            api_key: Secret::new(api_key.to_string()),
        }
    }

    #[test]
    fn test_is_configured() {
        let client = PaddleClient::new(test_settings("pdl_test_123"));
        assert!(client.is_configured());

        let client = PaddleClient::new(test_settings(""));
        assert!(!client.is_configured());
    }

    #[test]
    fn error_body_is_parsed_into_message() {
        let body = r#"{"error":{"code":"not_found","detail":"customer does not exist"}}"#;
        let err = PaddleClient::error_from_body(404, body);
        match err {
            ServiceError::Billing { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not_found: customer does not exist");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unparseable_error_body_gets_generic_message() {
        let err = PaddleClient::error_from_body(500, "<html>oops</html>");
        match err {
            ServiceError::Billing { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Billing request failed");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn portal_session_exposes_overview_url() {
        let session: PortalSession = serde_json::from_str(
            r#"{"id":"pts_1","urls":{"general":{"overview":"https://pay.example/overview"}}}"#,
        )
        .unwrap();
        assert_eq!(
            session.overview_url(),
            Some("https://pay.example/overview")
        );
    }
}
