pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn,
    routing::{get, patch, post},
    Json, Router,
};
use std::sync::Arc;
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};

use crate::config::Settings;
use crate::services::{
    AuthProvider, BillingProcessor, BillingService, LocaleResolver, ProfileStore, SessionSink,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::signin_page,
        handlers::auth::signup_page,
        handlers::auth::forgot_page,
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_out,
        handlers::auth::send_magic_link,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::confirm::confirm_email,
        handlers::confirm::verify_email_change,
        handlers::account::get_account,
        handlers::account::update_account,
        handlers::account::change_email,
        handlers::account::welcome,
        handlers::billing::billing_page,
        handlers::billing::update_billing,
        handlers::billing::get_customer,
        handlers::billing::patch_customer,
        handlers::billing::list_addresses,
        handlers::billing::patch_address,
        handlers::billing::create_portal_session,
        handlers::locale::get_locale,
        handlers::locale::set_locale,
        handlers::bridge::bridge_session,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::auth::SignUpRequest,
            dtos::auth::SignUpResponse,
            dtos::auth::SignInRequest,
            dtos::auth::SignInResponse,
            dtos::auth::MagicLinkRequest,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::ResetPasswordRequest,
            dtos::auth::EntryPageResponse,
            dtos::auth::MessageResponse,
            dtos::account::UpdateAccountRequest,
            dtos::account::ChangeEmailRequest,
            dtos::account::AccountResponse,
            dtos::account::WelcomePageResponse,
            dtos::account::SetLocaleRequest,
            dtos::account::LocaleResponse,
            dtos::billing::BillingAddressForm,
            dtos::billing::BillingPageResponse,
            dtos::billing::UpdateBillingRequest,
            dtos::billing::UpdateCustomerRequest,
            dtos::billing::UpdateAddressRequest,
            models::Language,
            models::ProfileResponse,
            models::SessionUser,
            models::VerifiedBanner,
        )
    ),
    tags(
        (name = "Authentication", description = "Sign-in, sign-up, and password flows"),
        (name = "Verification", description = "One-time token consumption"),
        (name = "Account", description = "Profile and account settings"),
        (name = "Billing", description = "Billing address synchronization and processor proxy"),
        (name = "Locale", description = "Display-language resolution"),
        (name = "Bridge", description = "Cross-context session bridge"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub auth: Arc<dyn AuthProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub billing: Arc<dyn BillingProcessor>,
    pub bridge: Arc<dyn SessionSink>,
    pub locale: Arc<LocaleResolver>,
    pub billing_sync: Arc<BillingService>,
}

impl AppState {
    /// Wire the state from its collaborators. The resolver and synchronizer
    /// are derived, so callers only hand over the four externals.
    pub fn new(
        config: Settings,
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        billing: Arc<dyn BillingProcessor>,
        bridge: Arc<dyn SessionSink>,
    ) -> Self {
        let locale = Arc::new(LocaleResolver::new(profiles.clone()));
        let billing_sync = Arc::new(BillingService::new(profiles.clone(), billing.clone()));

        Self {
            config,
            auth,
            profiles,
            billing,
            bridge,
            locale,
            billing_sync,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // Visitor cookie sessions: cached provider session, locale fallback,
    // one-shot banners.
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // true behind HTTPS in production
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    // Every protected view re-checks the cached session on entry.
    let protected = Router::new()
        .route("/", get(handlers::account::home))
        .route(
            "/account",
            get(handlers::account::get_account).patch(handlers::account::update_account),
        )
        .route("/account/email", post(handlers::account::change_email))
        .route("/welcome", get(handlers::account::welcome))
        .route(
            "/billing",
            get(handlers::billing::billing_page).post(handlers::billing::update_billing),
        )
        .layer(from_fn(middleware::auth::session_gate));

    let cors_origin = state
        .config
        .server
        .public_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|e| {
            tracing::error!(
                "Invalid CORS origin '{}': {}. Using fallback.",
                state.config.server.public_origin,
                e
            );
            HeaderValue::from_static("*")
        });

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()))
        .route(
            "/auth/signin",
            get(handlers::auth::signin_page).post(handlers::auth::sign_in),
        )
        .route(
            "/auth/signup",
            get(handlers::auth::signup_page).post(handlers::auth::sign_up),
        )
        .route(
            "/auth/forgot",
            get(handlers::auth::forgot_page).post(handlers::auth::forgot_password),
        )
        .route("/auth/reset", post(handlers::auth::reset_password))
        .route("/auth/otp", post(handlers::auth::send_magic_link))
        .route("/auth/confirm", get(handlers::confirm::confirm_email))
        .route("/auth/signout", post(handlers::auth::sign_out))
        .route(
            "/account/verify-email-change",
            get(handlers::confirm::verify_email_change),
        )
        .route(
            "/locale",
            get(handlers::locale::get_locale).put(handlers::locale::set_locale),
        )
        .route("/bridge/session", post(handlers::bridge::bridge_session))
        .route(
            "/api/paddle/customers/:customer_id",
            get(handlers::billing::get_customer).patch(handlers::billing::patch_customer),
        )
        .route(
            "/api/paddle/customers/:customer_id/addresses",
            get(handlers::billing::list_addresses),
        )
        .route(
            "/api/paddle/customers/:customer_id/addresses/:address_id",
            patch(handlers::billing::patch_address),
        )
        .route(
            "/api/paddle/customers/:customer_id/portal-sessions",
            post(handlers::billing::create_portal_session),
        )
        .merge(protected)
        .with_state(state)
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "Observability"
)]
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "account-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
