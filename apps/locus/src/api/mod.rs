//! # Locus HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Coordinator and store status
//! - `POST /search` - Find an object in the map
//! - `POST /localize` - Localize the configured test image
//! - `POST /search-and-localize` - Search, localize an uploaded image, guide
//!
//! ## Security Configuration
//!
//! - `server.cors_origins` / `LOCUS_CORS_ORIGINS`: comma-separated origins, or
//!   `*` for all (default: localhost only)
//! - `server.rate_limit` / `LOCUS_RATE_LIMIT`: requests per second (0 disables)
//! - `server.api_key` / `LOCUS_API_KEY`: if set, requires Bearer authentication

mod auth;
mod handlers;
mod images;
mod middleware;
mod types;

pub use auth::keys_match;
pub use handlers::{
    error_response, health_handler, localize_handler, search_and_localize_handler,
    search_handler, status_handler,
};
pub use images::{ImageUpload, TEST_IMAGE_EXTENSIONS, choose_source, first_test_image};
pub use middleware::create_rate_limiter;
pub use types::{
    ENDPOINTS, ErrorResponse, FEATURES, HealthResponse, LocalizeResponse, SearchRequest,
    SearchResponse, StatusResponse, status_for,
};

use crate::config::{LocusConfig, ServerConfig};
use crate::workflow::Workflow;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use locus_core::LocusError;
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub workflow: Workflow,
    pub store_path: PathBuf,
    pub max_image_bytes: usize,
    pub test_image_dir: Option<PathBuf>,
}

impl AppState {
    #[must_use]
    pub fn new(workflow: Workflow, store_path: impl Into<PathBuf>, server: &ServerConfig) -> Self {
        Self {
            workflow,
            store_path: store_path.into(),
            max_image_bytes: server.max_image_bytes,
            test_image_dir: server.test_image_dir.clone(),
        }
    }

    /// Build the workflow from configuration; fails when the store is missing.
    pub fn from_config(config: &LocusConfig) -> Result<Self, LocusError> {
        let workflow = Workflow::from_config(config)?;
        Ok(Self::new(workflow, config.store.path.clone(), &config.server))
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `"*"`: allows all origins
/// - `None`: localhost only
/// - otherwise: the comma-separated list, falling back to localhost when
///   nothing in it parses
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Request body ceiling: a base64-encoded image of `max_image_bytes`, plus
/// room for the other form fields.
pub const fn body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.div_ceil(3) * 4 + 1024 * 1024
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/search", post(handlers::search_handler))
        .route("/localize", post(handlers::localize_handler))
        .route(
            "/search-and-localize",
            post(handlers::search_and_localize_handler),
        );

    if let Some(key) = server.api_key.as_deref() {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn_with_state(
            auth::ApiKey::from(key),
            auth::api_key_auth_middleware,
        ));
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set LOCUS_API_KEY to enable authentication."
        );
    }

    if server.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", server.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            middleware::create_rate_limiter(server.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(server.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(body_limit(server.max_image_bytes))),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl-C.
pub async fn run_server(config: &LocusConfig) -> Result<(), LocusError> {
    let state = AppState::from_config(config)?;
    let router = create_router(state, &config.server);
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LocusError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Locus HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LocusError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
