//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! All query functions include error context logging to aid debugging.

use chrono::NaiveDate;
use sqlx::{PgPool, QueryBuilder};
use tracing::error;
use uuid::Uuid;

use super::models::{ProfileRow, Role, SearchRow, User, UserAvatar, UserSummaryRow};

/// Log and return a database error with context.
///
/// This helper ensures all database errors are logged with relevant context
/// before being propagated, making production debugging easier.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by email.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_email", email = %email))
}

/// Check if email exists.
pub async fn email_exists(pool: &PgPool, email: &str) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(result.0)
}

/// Create a new user.
pub async fn create_user(
    pool: &PgPool,
    firstname: &str,
    lastname: &str,
    email: &str,
    gender: &str,
    birthday: NaiveDate,
    password_hash: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (firstname, lastname, email, gender, birthday, password_hash)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        ",
    )
    .bind(firstname)
    .bind(lastname)
    .bind(email)
    .bind(gender)
    .bind(birthday)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_user", email = %email))
}

/// Field set for partial user updates. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges<'a> {
    pub firstname: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub email: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub birthday: Option<NaiveDate>,
    pub password_hash: Option<&'a str>,
}

/// Update a user's profile fields.
///
/// Only `Some` fields are written. Returns `RowNotFound` if the user
/// does not exist.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    changes: &UserChanges<'_>,
) -> sqlx::Result<User> {
    let mut builder = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

    if let Some(v) = changes.firstname {
        builder.push(", firstname = ").push_bind(v);
    }
    if let Some(v) = changes.lastname {
        builder.push(", lastname = ").push_bind(v);
    }
    if let Some(v) = changes.email {
        builder.push(", email = ").push_bind(v);
    }
    if let Some(v) = changes.gender {
        builder.push(", gender = ").push_bind(v);
    }
    if let Some(v) = changes.birthday {
        builder.push(", birthday = ").push_bind(v);
    }
    if let Some(v) = changes.password_hash {
        builder.push(", password_hash = ").push_bind(v);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(user_id)
        .push(" RETURNING *");

    builder
        .build_query_as::<User>()
        .fetch_one(pool)
        .await
        .map_err(db_error!("update_user", user_id = %user_id))
}

/// Delete a user. Returns whether a row was removed.
///
/// Privacy settings, role links, and avatar rows cascade at the schema
/// level; files on disk are left behind (history is never reclaimed).
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(db_error!("delete_user", user_id = %user_id))?;

    Ok(result.rows_affected() > 0)
}

/// Profile view: user joined with privacy settings and current avatar.
pub async fn get_profile_view(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(
        r"
        SELECT u.id, u.firstname, u.lastname, u.email, u.gender, u.birthday,
               p.profile_privacy, p.who_can_add, a.path AS avatar_path, u.created_at
        FROM users u
        INNER JOIN privacy_settings p ON p.user_id = u.id
        LEFT JOIN user_avatars a ON a.user_id = u.id AND a.is_current
        WHERE u.id = $1
        ",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("get_profile_view", user_id = %user_id))
}

/// Count all users (for pagination).
pub async fn count_users(pool: &PgPool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// Fetch one page of users, oldest first.
pub async fn list_users(pool: &PgPool, page: u32, limit: u32) -> sqlx::Result<Vec<UserSummaryRow>> {
    let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);

    sqlx::query_as::<_, UserSummaryRow>(
        r"
        SELECT id, firstname, lastname, email, created_at
        FROM users
        ORDER BY created_at, id
        LIMIT $1 OFFSET $2
        ",
    )
    .bind(i64::from(limit))
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_users", page = page, limit = limit))
}

/// Search users by firstname prefix, including the current avatar path.
pub async fn search_users(pool: &PgPool, prefix: &str) -> sqlx::Result<Vec<SearchRow>> {
    sqlx::query_as::<_, SearchRow>(
        r"
        SELECT u.id, u.firstname, u.lastname, a.path AS avatar_path
        FROM users u
        LEFT JOIN user_avatars a ON a.user_id = u.id AND a.is_current
        WHERE u.firstname LIKE $1
        ORDER BY u.firstname, u.id
        ",
    )
    .bind(format!("{prefix}%"))
    .fetch_all(pool)
    .await
    .map_err(db_error!("search_users", prefix = %prefix))
}

// ============================================================================
// Role Queries
// ============================================================================

/// Find a role by its slug.
pub async fn find_role_by_slug(pool: &PgPool, slug: &str) -> sqlx::Result<Option<Role>> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_role_by_slug", slug = %slug))
}

/// Role slugs attached to a user.
pub async fn roles_for_user(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(
        r"
        SELECT r.slug
        FROM roles r
        INNER JOIN role_user ru ON ru.role_id = r.id
        WHERE ru.user_id = $1
        ORDER BY r.slug
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("roles_for_user", user_id = %user_id))
}

// ============================================================================
// Avatar Queries
// ============================================================================

/// Register `path` as the user's current avatar.
///
/// Clears any previously current rows and inserts the new one inside a
/// single transaction, so the at-most-one-current invariant holds even
/// under concurrent uploads for the same user. The partial unique index
/// on `user_avatars` backs this up at the schema level.
pub async fn set_current_avatar(
    pool: &PgPool,
    user_id: Uuid,
    path: &str,
) -> sqlx::Result<UserAvatar> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE user_avatars SET is_current = FALSE WHERE user_id = $1 AND is_current")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error!("set_current_avatar.clear", user_id = %user_id))?;

    let avatar = sqlx::query_as::<_, UserAvatar>(
        r"
        INSERT INTO user_avatars (user_id, path, is_current)
        VALUES ($1, $2, TRUE)
        RETURNING *
        ",
    )
    .bind(user_id)
    .bind(path)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error!("set_current_avatar.insert", user_id = %user_id))?;

    tx.commit().await?;

    Ok(avatar)
}

/// All avatar records for a user, newest first.
pub async fn list_avatars(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<UserAvatar>> {
    sqlx::query_as::<_, UserAvatar>(
        "SELECT * FROM user_avatars WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_avatars", user_id = %user_id))
}

/// The user's current avatar, if any.
pub async fn current_avatar(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Option<UserAvatar>> {
    sqlx::query_as::<_, UserAvatar>(
        "SELECT * FROM user_avatars WHERE user_id = $1 AND is_current",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("current_avatar", user_id = %user_id))
}
