//! Avatar HTTP Handlers
//!
//! The upload pipeline: multipart parse -> extension/size checks -> stage to
//! temp -> magic-byte sniff -> promote to the permanent tree -> flip the
//! current-avatar flag.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use uuid::Uuid;

use super::error::AvatarError;
use super::sniff::sniff_image;
use crate::api::{AppState, Envelope};
use crate::auth::AuthUser;
use crate::db::{self, UserAvatar};

/// Filename extensions accepted for avatar uploads. The stored file is
/// named by the sniffed type, not the claimed extension.
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jfif", "gif"];

/// Change the authenticated user's profile picture.
///
/// POST /api/users/me/avatar
///
/// Expects multipart form with an `avatar` file field. After a successful
/// change exactly one avatar row for the user is current, pointing at the
/// newly stored file; earlier rows keep their files but lose the flag.
#[tracing::instrument(skip(state, auth, multipart), fields(user_id = %auth.id))]
pub async fn change_avatar(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Envelope<UserAvatar>>, AvatarError> {
    let mut file_data: Option<axum::body::Bytes> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    // Parse multipart form
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("avatar") {
            filename = field.file_name().map(String::from);
            content_type = field.content_type().map(String::from);

            let data = field
                .bytes()
                .await
                .map_err(|e| AvatarError::Validation(e.to_string()))?;
            file_data = Some(data);
        }
        // Ignore unknown fields
    }

    let data = file_data.ok_or(AvatarError::NoFile)?;
    let filename = filename.ok_or(AvatarError::NoFile)?;

    // Extension allow-list on the claimed filename
    let ext = std::path::Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AvatarError::InvalidExtension { ext });
    }

    // Declared type must be an image, from the part header or guessed
    // from the filename; the sniff below decides the real type
    let claimed = content_type
        .or_else(|| {
            mime_guess::from_path(&filename)
                .first()
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());
    if !claimed.starts_with("image/") {
        return Err(AvatarError::InvalidMimeType { mime_type: claimed });
    }

    // Size limit, enforced before anything touches the store
    if data.len() > state.config.max_avatar_size {
        return Err(AvatarError::TooLarge {
            max_size: state.config.max_avatar_size,
        });
    }

    // Stage to temp, then sniff the true type from the file itself
    let temp = state.store.stage(&data).await?;

    let header = match state.store.read_header(&temp).await {
        Ok(header) => header,
        Err(e) => {
            state.store.discard(&temp).await;
            return Err(e.into());
        }
    };

    let Some(kind) = sniff_image(&header) else {
        state.store.discard(&temp).await;
        tracing::warn!(claimed_ext = %ext, "Upload content matches no image signature");
        return Err(AvatarError::InvalidImage);
    };

    // Promote removes the temp file on failure
    let path = state.store.promote(auth.id, &temp, kind.ext()).await?;

    // Flip the current flag; if the database write fails the stored file
    // is removed best-effort so the tree only holds recorded avatars
    let avatar = match db::set_current_avatar(&state.db, auth.id, &path).await {
        Ok(avatar) => avatar,
        Err(e) => {
            let orphan = state.store.file_path(&path);
            state.store.discard(&orphan).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        avatar_id = %avatar.id,
        path = %avatar.path,
        size = data.len(),
        "Profile picture changed"
    );

    Ok(Json(Envelope::with_data(
        "The profile picture has been changed.",
        avatar,
    )))
}

/// List all stored avatar records for a user, newest first.
///
/// GET /api/users/{id}/avatars
pub async fn list_avatars(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<UserAvatar>>>, AvatarError> {
    if db::find_user_by_id(&state.db, user_id).await?.is_none() {
        return Err(AvatarError::UserNotFound);
    }

    let avatars = db::list_avatars(&state.db, user_id).await?;

    Ok(Json(Envelope::with_data(
        "The avatars were successfully found.",
        avatars,
    )))
}
