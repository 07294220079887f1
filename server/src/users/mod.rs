//! User Profiles
//!
//! Profile views, listing, search, and account updates.

mod error;
mod handlers;

use axum::{routing::get, Router};

use crate::api::AppState;

pub use error::UserError;

/// Create the users router. Merged under `/api` behind auth:
/// - GET /users - Paginated listing
/// - GET /users/me - Own profile with roles and current avatar
/// - GET /users/search?q= - Firstname prefix search
/// - GET /users/{id} - Profile view with privacy settings
/// - PUT /users/{id} - Partial profile update
/// - DELETE /users/{id} - Delete the account
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/me", get(handlers::me))
        .route("/users/search", get(handlers::search))
        .route(
            "/users/{id}",
            get(handlers::get_profile)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
