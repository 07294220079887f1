//! Avatar Lifecycle
//!
//! Upload validation (extension, size, magic-byte sniffing), file storage
//! under `<store>/user/<user_id>/`, and the current-avatar flag.

mod error;
mod handlers;
pub mod sniff;
mod store;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::AppState;

pub use error::AvatarError;
pub use store::{AvatarStore, StoreError};

/// Create the avatar router. Merged under `/api` behind auth:
/// - POST /users/me/avatar - Change the authenticated user's avatar
/// - GET /users/{id}/avatars - List a user's stored avatar records
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me/avatar", post(handlers::change_avatar))
        .route("/users/{id}/avatars", get(handlers::list_avatars))
}
