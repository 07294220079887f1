//! API Router and Application State
//!
//! Central routing configuration and shared state.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth, avatar, avatar::AvatarStore, config::Config, users};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Server configuration
    pub config: Arc<Config>,
    /// File store for avatar uploads
    pub store: AvatarStore,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(db: PgPool, config: Config, store: AvatarStore) -> Self {
        Self {
            db,
            config: Arc::new(config),
            store,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Multipart framing adds a few hundred bytes on top of the file itself;
    // the handler enforces the exact per-file limit.
    let body_limit = state.config.max_avatar_size + 64 * 1024;

    // Protected routes that require authentication
    let api_routes = Router::new()
        .merge(users::router())
        .merge(avatar::router())
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Auth routes (public)
        .nest("/auth", auth::router())
        // Protected user and avatar routes
        .nest("/api", api_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        // State
        .with_state(state)
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Standard success envelope: `{status, message}` plus optional `data`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always "Success".
    pub status: &'static str,
    /// Human-readable outcome message.
    pub message: String,
    /// Endpoint-specific payload, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl Envelope<()> {
    /// Envelope with a message and no payload.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "Success",
            message: message.into(),
            data: None,
        }
    }
}

impl<T> Envelope<T> {
    /// Envelope carrying a payload.
    #[must_use]
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "Success",
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Error envelope: `{status, message}` with `status` always "Error".
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always "Error".
    pub status: &'static str,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorBody {
    /// Build an error body from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "Error",
            message: message.into(),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
