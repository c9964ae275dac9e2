//! Cross-context session bridge.
//!
//! A best-effort notification channel between the portal and an external
//! consumer (e.g. a companion extension): no acknowledgement, no retry, and
//! no ordering guarantee beyond last-message-wins. Outbound delivery goes
//! through an injectable sink so the transport stays swappable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{CachedSession, SessionUser};

pub const FROM_WEBAPP: &str = "FROM_WEBAPP";
pub const FROM_EXTENSION: &str = "FROM_EXTENSION";

/// Sentinel for a cleared session, distinct from "never sent".
pub const CLEARED: &str = "";

/// Message broadcast to the external consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl BridgeMessage {
    /// A session is present on a protected view.
    pub fn session_established(session: &CachedSession, user: &SessionUser) -> Self {
        Self {
            kind: FROM_WEBAPP.to_string(),
            payload: json!({
                "session": {
                    "access_token": session.access_token,
                    "refresh_token": session.refresh_token,
                },
                "user": {
                    "id": user.id,
                    "email": user.email,
                },
            }),
        }
    }

    /// The visitor signed out; the consumer must drop its copy too.
    pub fn session_cleared() -> Self {
        Self {
            kind: FROM_WEBAPP.to_string(),
            payload: json!({
                "session": CLEARED,
                "user": { "email": CLEARED, "id": CLEARED },
            }),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.payload.get("session").map(|s| s == CLEARED).unwrap_or(false)
    }
}

/// Inbound message from the external consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundSessionMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: InboundSessionPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundSessionPayload {
    #[serde(default)]
    pub session: Option<CachedSession>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub supabase_user_id: Option<String>,
}

/// Capability for notifying the external consumer. Delivery is best-effort;
/// implementations swallow their own failures.
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn broadcast(&self, message: BridgeMessage);
}

/// Sink that POSTs messages to a configured consumer endpoint. Without a
/// configured endpoint every broadcast is a no-op.
pub struct HttpSessionSink {
    client: reqwest::Client,
    consumer_url: Option<String>,
}

impl HttpSessionSink {
    pub fn new(consumer_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            consumer_url,
        }
    }
}

#[async_trait]
impl SessionSink for HttpSessionSink {
    async fn broadcast(&self, message: BridgeMessage) {
        let Some(url) = &self.consumer_url else {
            tracing::debug!("no bridge consumer configured, dropping outbound message");
            return;
        };

        if let Err(e) = self.client.post(url).json(&message).send().await {
            tracing::warn!(error = %e, "failed to deliver bridge message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_message_carries_empty_string_sentinels() {
        let message = BridgeMessage::session_cleared();
        assert_eq!(message.kind, FROM_WEBAPP);
        assert!(message.is_cleared());

        let payload = &message.payload;
        assert_eq!(payload["session"], "");
        assert_eq!(payload["user"]["email"], "");
        assert_eq!(payload["user"]["id"], "");
    }

    #[test]
    fn established_message_carries_tokens_and_identity() {
        let session = CachedSession {
            access_token: "at".into(),
            refresh_token: "rt".into(),
        };
        let user = SessionUser {
            id: "user-1".into(),
            email: "a@x.com".into(),
        };
        let message = BridgeMessage::session_established(&session, &user);

        assert_eq!(message.kind, FROM_WEBAPP);
        assert!(!message.is_cleared());
        assert_eq!(message.payload["session"]["access_token"], "at");
        assert_eq!(message.payload["user"]["email"], "a@x.com");
    }
}
