//! User Endpoint Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::ErrorBody;

/// Errors for profile, listing, and search endpoints.
#[derive(Debug, Error)]
pub enum UserError {
    /// User not found.
    #[error("Could not find the specified user.")]
    NotFound,

    /// Email already taken by another account.
    #[error("Email already taken")]
    EmailTaken,

    /// Search query missing or empty.
    #[error("Missing query.")]
    MissingQuery,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Password hashing error.
    #[error("Password processing failed")]
    PasswordHash,

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::MissingQuery | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PasswordHash | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failure details stay out of the response body
        let message = match &self {
            Self::PasswordHash | Self::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Result type for user operations.
pub type UserResult<T> = Result<T, UserError>;
