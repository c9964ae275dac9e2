//! Application startup and lifecycle management.

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use service_core::error::AppError;

use crate::config::Settings;
use crate::services::{
    AuthProvider, BillingProcessor, GoTrueClient, HttpSessionSink, PaddleClient, PgProfileStore,
    ProfileStore, SessionSink,
};
use crate::{build_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Settings) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to Postgres: {}", e);
                AppError::DatabaseError(e.into())
            })?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            AppError::DatabaseError(e.into())
        })?;

        let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(pool));

        let auth: Arc<dyn AuthProvider> =
            Arc::new(GoTrueClient::new(config.auth_provider.clone()));

        let paddle = PaddleClient::new(config.paddle.clone());
        if paddle.is_configured() {
            tracing::info!("Paddle client initialized");
        } else {
            tracing::warn!("Paddle credentials not configured - billing features will be limited");
        }
        let billing: Arc<dyn BillingProcessor> = Arc::new(paddle);

        let bridge: Arc<dyn SessionSink> =
            Arc::new(HttpSessionSink::new(config.bridge.consumer_url.clone()));

        let state = AppState::new(config.clone(), auth, profiles, billing, bridge);

        // Port 0 binds a random port, which the tests rely on.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Account service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the application state for sharing with tests or tooling.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}
