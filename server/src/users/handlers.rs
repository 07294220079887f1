//! User Profile HTTP Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::error::{UserError, UserResult};
use crate::api::{AppState, Envelope};
use crate::auth::{password::hash_password, AuthUser};
use crate::db::{self, ProfileRow, SearchRow, UserChanges, UserSummaryRow};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Authenticated profile: own account joined with roles and current avatar.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub birthday: NaiveDate,
    /// Role slugs attached to the account.
    pub roles: Vec<String>,
    /// Current avatar path, relative to the user store.
    pub avatar_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pagination parameters for the user listing.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Page size (default 20, capped at 100).
    pub limit: Option<u32>,
}

/// One page of users plus the total count.
#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSummaryRow>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Firstname prefix to match.
    pub q: Option<String>,
}

/// Partial profile update. Absent fields keep their current values.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub firstname: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub lastname: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub gender: Option<String>,
    pub birthday: Option<NaiveDate>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// The authenticated user's own profile.
///
/// GET /api/users/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> UserResult<Json<Envelope<MeResponse>>> {
    let user = db::find_user_by_id(&state.db, auth.id)
        .await?
        .ok_or(UserError::NotFound)?;
    let roles = db::roles_for_user(&state.db, auth.id).await?;
    let avatar = db::current_avatar(&state.db, auth.id).await?;

    Ok(Json(Envelope::with_data(
        "The user was successfully found.",
        MeResponse {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            gender: user.gender,
            birthday: user.birthday,
            roles,
            avatar_path: avatar.map(|a| a.path),
            created_at: user.created_at,
        },
    )))
}

/// A user's public profile: account joined with privacy settings and the
/// current avatar path.
///
/// GET /api/users/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> UserResult<Json<Envelope<ProfileRow>>> {
    let profile = db::get_profile_view(&state.db, user_id)
        .await?
        .ok_or(UserError::NotFound)?;

    Ok(Json(Envelope::with_data(
        "The user was successfully found.",
        profile,
    )))
}

/// Paginated user listing.
///
/// GET /api/users?page=&limit=
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> UserResult<Json<Envelope<UserPage>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let total = db::count_users(&state.db).await?;
    let users = db::list_users(&state.db, page, limit).await?;

    Ok(Json(Envelope::with_data(
        "The users were successfully found.",
        UserPage {
            users,
            page,
            limit,
            total,
        },
    )))
}

/// Search users by firstname prefix.
///
/// GET /api/users/search?q=
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> UserResult<Json<Envelope<Vec<SearchRow>>>> {
    let q = query.q.unwrap_or_default();
    if q.is_empty() {
        return Err(UserError::MissingQuery);
    }

    let results = db::search_users(&state.db, &q).await?;

    Ok(Json(Envelope::with_data(
        "The users were successfully found.",
        results,
    )))
}

/// Update a user's profile. Absent fields keep their current values.
///
/// PUT /api/users/{id}
#[tracing::instrument(skip(state, _auth, body))]
pub async fn update_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> UserResult<Json<Envelope<()>>> {
    body.validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let password_hash = match &body.password {
        Some(password) => Some(hash_password(password).map_err(|_| UserError::PasswordHash)?),
        None => None,
    };

    let changes = UserChanges {
        firstname: body.firstname.as_deref(),
        lastname: body.lastname.as_deref(),
        email: body.email.as_deref(),
        gender: body.gender.as_deref(),
        birthday: body.birthday,
        password_hash: password_hash.as_deref(),
    };

    db::update_user(&state.db, user_id, &changes)
        .await
        .map_err(|e| {
            if matches!(e, sqlx::Error::RowNotFound) {
                UserError::NotFound
            } else if e
                .as_database_error()
                .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
            {
                UserError::EmailTaken
            } else {
                UserError::Database(e)
            }
        })?;

    tracing::info!(user_id = %user_id, "User profile updated");

    Ok(Json(Envelope::message("The user was successfully updated.")))
}

/// Delete a user account. Privacy settings, role links, and avatar rows
/// cascade; stored files stay on disk.
///
/// DELETE /api/users/{id}
#[tracing::instrument(skip(state, _auth))]
pub async fn delete_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> UserResult<Json<Envelope<()>>> {
    if !db::delete_user(&state.db, user_id).await? {
        return Err(UserError::NotFound);
    }

    tracing::info!(user_id = %user_id, "User deleted");

    Ok(Json(Envelope::message("The user was successfully deleted.")))
}
