//! Authentication Service
//!
//! Handles registration, local authentication, and request authorization.

mod error;
mod handlers;
pub mod jwt;
mod middleware;
pub mod password;

use axum::{routing::post, Router};

use crate::api::AppState;

pub use error::{AuthError, AuthResult};
pub use middleware::{require_auth, AuthUser};

/// Create authentication router.
///
/// All routes are public (no auth required):
/// - POST /register - Register a new user
/// - POST /login - Login with email/password
/// - POST /verify-password - Compare a password against a stored hash
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/verify-password", post(handlers::verify_password_handler))
}
