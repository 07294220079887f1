//! Authentication HTTP Handlers

use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::{AuthError, AuthResult};
use super::jwt::generate_access_token;
use super::password::{hash_password, verify_password};
use crate::api::{AppState, Envelope};
use crate::db::{self, User};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// First name.
    #[validate(length(min = 1, max = 64))]
    pub firstname: String,
    /// Last name.
    #[validate(length(min = 1, max = 64))]
    pub lastname: String,
    /// Gender (free-form).
    #[validate(length(min = 1, max = 32))]
    pub gender: String,
    /// Date of birth (`YYYY-MM-DD`).
    pub birthday: NaiveDate,
    /// Email address (must be unique).
    #[validate(email)]
    pub email: String,
    /// Password (8-128 characters).
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Password.
    pub password: String,
}

/// Password/hash comparison request.
#[derive(Debug, Deserialize)]
pub struct VerifyPasswordRequest {
    /// Plaintext password.
    pub password: String,
    /// Stored hash to compare against.
    pub hash: String,
}

/// Authentication response with the access token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Access token expiry in seconds.
    pub expires_in: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new user.
///
/// Creates the account row, the default privacy settings, the `user` role
/// link, and the per-user avatar directory seeded with the default avatar.
/// All database writes run in one transaction, so a storage failure rolls
/// the account back.
///
/// POST /auth/register
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AuthResult<Json<Envelope<()>>> {
    // Validate input first
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    // Check email uniqueness (outside transaction - UNIQUE constraint will catch races)
    if db::email_exists(&state.db, &body.email).await? {
        return Err(AuthError::UserAlreadyExists);
    }

    // Hash password
    let password_hash = hash_password(&body.password).map_err(|_| AuthError::PasswordHash)?;

    let mut tx = state.db.begin().await.map_err(|e| {
        tracing::error!(error = %e, email = %body.email, "Failed to start registration transaction");
        e
    })?;

    // Create user
    let user = sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (firstname, lastname, email, gender, birthday, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(&body.firstname)
    .bind(&body.lastname)
    .bind(&body.email)
    .bind(&body.gender)
    .bind(body.birthday)
    .bind(&password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(
            error = %e,
            email = %body.email,
            "Failed to create user during registration - transaction will rollback"
        );
        e
    })?;

    // Default privacy settings
    sqlx::query("INSERT INTO privacy_settings (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to create privacy settings");
            e
        })?;

    // Attach the default role
    sqlx::query("INSERT INTO role_user (user_id, role_id) SELECT $1, id FROM roles WHERE slug = 'user'")
        .bind(user.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to attach user role");
            e
        })?;

    // Create the user's store directory and seed the default avatar.
    // A failure here rolls back the whole registration; the seeded file
    // (if any) is orphaned on disk, which is harmless.
    state
        .store
        .create_user_dir(user.id)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;
    let avatar_path = state
        .store
        .seed_default(user.id)
        .await
        .map_err(|e| AuthError::Storage(e.to_string()))?;

    sqlx::query("INSERT INTO user_avatars (user_id, path, is_current) VALUES ($1, $2, TRUE)")
        .bind(user.id)
        .bind(&avatar_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to record default avatar");
            e
        })?;

    tx.commit().await.map_err(|e| {
        tracing::error!(
            error = %e,
            user_id = %user.id,
            "Failed to commit registration transaction - user account rolled back"
        );
        e
    })?;

    tracing::info!(user_id = %user.id, avatar_path = %avatar_path, "User registered");

    Ok(Json(Envelope::message("The user was successfully created.")))
}

/// Login with email and password.
///
/// POST /auth/login
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AuthResult<Json<Envelope<AuthResponse>>> {
    body.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    // Same error for unknown email and wrong password
    let user = db::find_user_by_email(&state.db, &body.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    let access_token =
        generate_access_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(Envelope::with_data(
        "You have been successfully logged in.",
        AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: state.config.jwt_expiry,
        },
    )))
}

/// Compare a plaintext password against a stored hash.
///
/// POST /auth/verify-password
pub async fn verify_password_handler(
    Json(body): Json<VerifyPasswordRequest>,
) -> AuthResult<Json<Envelope<()>>> {
    if verify_password(&body.password, &body.hash) {
        Ok(Json(Envelope::message("The passwords match.")))
    } else {
        Err(AuthError::InvalidCredentials)
    }
}
