//! Authentication Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::ErrorBody;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong email/password).
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("Could not find the specified user.")]
    UserNotFound,

    /// User already exists (registration).
    #[error("Email already taken")]
    UserAlreadyExists,

    /// Invalid or expired token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Missing Authorization header.
    #[error("Missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    /// Validation error.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Password hashing error.
    #[error("Password processing failed")]
    PasswordHash,

    /// File store error during registration side-effects.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// JWT error.
    #[error("Token error")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCredentials
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::MissingAuthHeader
            | Self::InvalidAuthHeader
            | Self::Jwt(_) => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::PasswordHash | Self::Storage(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Internal failure details stay out of the response body
        let message = match &self {
            Self::Storage(_) | Self::Database(_) | Self::PasswordHash => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;
