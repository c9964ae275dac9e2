//! Test helpers: the full router wired to in-memory collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use secrecy::Secret;
use tower::util::ServiceExt;
use uuid::Uuid;

use account_service::{
    build_router,
    config::{
        AuthProviderSettings, BridgeSettings, DatabaseSettings, PaddleSettings, ServerSettings,
        Settings,
    },
    models::UserProfile,
    services::mock::{
        InMemoryProfileStore, MockAuthProvider, MockBillingProcessor, RecordingSessionSink,
    },
    AppState,
};

pub const PUBLIC_ORIGIN: &str = "http://portal.test";

pub struct TestApp {
    pub router: Router,
    pub auth: Arc<MockAuthProvider>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub billing: Arc<MockBillingProcessor>,
    pub bridge: Arc<RecordingSessionSink>,
}

impl TestApp {
    pub fn spawn() -> Self {
        let auth = Arc::new(MockAuthProvider::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let billing = Arc::new(MockBillingProcessor::new());
        let bridge = Arc::new(RecordingSessionSink::new());

        let state = AppState::new(
            test_settings(),
            auth.clone(),
            profiles.clone(),
            billing.clone(),
            bridge.clone(),
        );

        Self {
            router: build_router(state),
            auth,
            profiles,
            billing,
            bridge,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        self.send_json("POST", uri, body, cookie, None).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
        bearer: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn get_with_bearer(&self, uri: &str, token: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.request(request).await
    }

    /// Register a confirmed account plus profile row, then sign in.
    /// Returns the session cookie.
    pub async fn sign_in_user(&self, email: &str, password: &str) -> (Uuid, String) {
        let id = self.auth.add_account(email, password);
        self.profiles.seed(InMemoryProfileStore::profile(id, email));

        let response = self
            .post_json(
                "/auth/signin",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "sign-in should succeed");

        let cookie = extract_cookie(&response).expect("sign-in should set a session cookie");
        (id, cookie)
    }

    /// Seed a profile with an attached processor customer.
    pub fn attach_customer(&self, user_id: Uuid, customer_id: &str, name: &str) {
        let mut profile = self
            .profiles
            .get(user_id)
            .expect("profile must be seeded first");
        profile.paddle_customer_id = Some(customer_id.to_string());
        profile.name = name.to_string();
        self.profiles.seed(profile);
        self.billing.seed_customer(customer_id, name);
    }
}

fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_origin: PUBLIC_ORIGIN.to_string(),
        },
        auth_provider: AuthProviderSettings {
            url: "http://auth.test".to_string(),
            anon_key: Secret::new("test-anon-key".to_string()),
        },
        database: DatabaseSettings {
            url: Secret::new("postgres://unused".to_string()),
            max_connections: 1,
        },
        paddle: PaddleSettings {
            api_base_url: "http://paddle.test".to_string(),
            api_key: Secret::new("test-paddle-key".to_string()),
        },
        bridge: BridgeSettings { consumer_url: None },
    }
}

/// First `Set-Cookie` value without its attributes.
pub fn extract_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|c| c.split(';').next())
        .map(|c| c.to_string())
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .map(|l| l.to_string())
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Seed helper re-exported for tests that build rows by hand.
pub fn profile_row(id: Uuid, email: &str) -> UserProfile {
    InMemoryProfileStore::profile(id, email)
}
