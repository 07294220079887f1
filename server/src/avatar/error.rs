//! Avatar Upload Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::store::StoreError;
use crate::api::ErrorBody;
use crate::util::format_file_size;

/// Errors that can occur while changing or listing avatars.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// No file field in the request.
    #[error("No file provided")]
    NoFile,

    /// File exceeds the configured size limit.
    #[error("File too large (max: {limit})", limit = format_file_size(*max_size))]
    TooLarge {
        /// Maximum allowed size in bytes.
        max_size: usize,
    },

    /// Filename extension not in the allow-list.
    #[error("Unsupported file extension: {ext}")]
    InvalidExtension {
        /// The rejected extension.
        ext: String,
    },

    /// Declared content type is not an image.
    #[error("Invalid file type: {mime_type}")]
    InvalidMimeType {
        /// The rejected MIME type.
        mime_type: String,
    },

    /// Magic-byte sniffing found no recognizable image signature.
    #[error("The file is not a valid image.")]
    InvalidImage,

    /// User not found.
    #[error("Could not find the specified user.")]
    UserNotFound,

    /// Malformed multipart request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem failure while storing the file.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Database error.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AvatarError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NoFile
            | Self::TooLarge { .. }
            | Self::InvalidExtension { .. }
            | Self::InvalidMimeType { .. }
            | Self::InvalidImage
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal failure details stay out of the response body
        let message = match &self {
            Self::Storage(_) | Self::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
