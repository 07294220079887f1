//! Database Models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub birthday: NaiveDate,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role model.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user privacy policy, created once at registration with defaults.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PrivacySetting {
    pub user_id: Uuid,
    pub profile_privacy: String,
    pub who_can_add: String,
    pub created_at: DateTime<Utc>,
}

/// Stored avatar record.
///
/// `path` is relative to the `user/` subtree of the store
/// (`<user_id>/<unix_ms>.<ext>`). Rows persist forever; only the
/// `is_current` flag moves between them.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAvatar {
    pub id: Uuid,
    pub user_id: Uuid,
    pub path: String,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile view row: user joined with privacy settings and current avatar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub birthday: NaiveDate,
    pub profile_privacy: String,
    pub who_can_add: String,
    pub avatar_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing row for the paginated user index.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSummaryRow {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Search result row: name plus current avatar path.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SearchRow {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub avatar_path: Option<String>,
}
