//! HTTP Server configuration and startup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use storefront_types::StorefrontBackend;

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::StorefrontService;

/// HTTP Server for the Storefront API.
pub struct HttpServer<P: StorefrontBackend> {
    state: Arc<AppState<P>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<P: StorefrontBackend> HttpServer<P> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: StorefrontService<P>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::default()), // 100 req/min default
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(service: StorefrontService<P>, requests_per_minute: u32) -> Self {
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::new(
                requests_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    pub fn service(&self) -> &StorefrontService<P> {
        &self.state.service
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route("/api/catalog", get(handlers::catalog_view::<P>))
            .route("/api/catalog/reload", post(handlers::reload_catalog::<P>))
            .route("/api/facets", get(handlers::facets::<P>))
            .route("/api/promotions", get(handlers::promotions::<P>))
            .route("/api/status", get(handlers::status::<P>))
            .route("/api/exchange-rate", get(handlers::exchange_rate::<P>))
            .route(
                "/api/exchange-rate/refresh",
                post(handlers::refresh_exchange_rate::<P>),
            )
            .route("/api/convert", get(handlers::convert::<P>))
            .route("/api/products", post(handlers::create_product::<P>))
            .route("/api/products/{id}", delete(handlers::delete_product::<P>))
            .route("/api/contact", post(handlers::submit_contact::<P>))
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
