//! Avatar File Store
//!
//! Local-filesystem storage for avatar images. Files live under
//! `<root>/user/<user_id>/<unix_ms>.<ext>`; uploads are staged under
//! `<root>/tmp/` first so promotion to the permanent tree is a same-filesystem
//! rename.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::info;
use uuid::Uuid;

use super::sniff::SNIFF_LEN;

/// Default avatar seeded into `<root>/default/account.png` when absent,
/// so registration always has a source file to copy. 1x1 transparent PNG.
const DEFAULT_AVATAR_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15,
    0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
    0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
    0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND
    0xAE, 0x42, 0x60, 0x82,
];

/// Store-related errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to initialize the store directories.
    #[error("Failed to initialize store: {0}")]
    Init(String),

    /// Failed to create a user's directory.
    #[error("Failed to create user directory: {0}")]
    CreateDir(String),

    /// Failed to seed the default avatar.
    #[error("Failed to seed default avatar: {0}")]
    Seed(String),

    /// Failed to stage an upload in the temp directory.
    #[error("Failed to stage upload: {0}")]
    Stage(String),

    /// Failed to read back a staged upload.
    #[error("Failed to read staged upload: {0}")]
    ReadBack(String),

    /// Failed to move a staged upload into the permanent tree.
    #[error("Failed to store file: {0}")]
    Promote(String),
}

/// Filesystem store for avatar images.
#[derive(Clone)]
pub struct AvatarStore {
    root: PathBuf,
}

impl AvatarStore {
    /// Create a store rooted at the given directory.
    ///
    /// Call [`AvatarStore::init`] before serving requests.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the store directory tree (`user/`, `tmp/`, `default/`) and
    /// seed the default avatar if it is missing.
    pub async fn init(&self) -> Result<(), StoreError> {
        for sub in ["user", "tmp", "default"] {
            fs::create_dir_all(self.root.join(sub))
                .await
                .map_err(|e| StoreError::Init(format!("{sub}: {e}")))?;
        }

        let default_avatar = self.default_avatar_path();
        if !fs::try_exists(&default_avatar)
            .await
            .map_err(|e| StoreError::Init(e.to_string()))?
        {
            fs::write(&default_avatar, DEFAULT_AVATAR_PNG)
                .await
                .map_err(|e| StoreError::Init(e.to_string()))?;
        }

        info!(root = %self.root.display(), "Avatar store initialized");
        Ok(())
    }

    /// Absolute path of the default avatar source file.
    #[must_use]
    pub fn default_avatar_path(&self) -> PathBuf {
        self.root.join("default").join("account.png")
    }

    /// Absolute path of a stored file from its relative `path` column value.
    #[must_use]
    pub fn file_path(&self, relative: &str) -> PathBuf {
        self.root.join("user").join(relative)
    }

    /// Absolute path of a user's directory.
    #[must_use]
    pub fn user_dir(&self, user_id: Uuid) -> PathBuf {
        self.root.join("user").join(user_id.to_string())
    }

    /// Create a user's directory. Called once at registration.
    pub async fn create_user_dir(&self, user_id: Uuid) -> Result<(), StoreError> {
        fs::create_dir_all(self.user_dir(user_id))
            .await
            .map_err(|e| StoreError::CreateDir(e.to_string()))
    }

    /// Copy the default avatar into a user's directory and return the
    /// relative path (`<user_id>/<unix_ms>.png`) for the database row.
    pub async fn seed_default(&self, user_id: Uuid) -> Result<String, StoreError> {
        let relative = self
            .free_relative_path(user_id, "png")
            .await
            .map_err(|e| StoreError::Seed(e.to_string()))?;

        fs::copy(self.default_avatar_path(), self.file_path(&relative))
            .await
            .map_err(|e| StoreError::Seed(e.to_string()))?;

        Ok(relative)
    }

    /// Write upload bytes to a fresh temp file under `<root>/tmp/` and
    /// return its path. The caller owns the file from here: promote it or
    /// discard it.
    pub async fn stage(&self, data: &[u8]) -> Result<PathBuf, StoreError> {
        let temp = self.root.join("tmp").join(format!("{}.upload", Uuid::now_v7()));

        fs::write(&temp, data)
            .await
            .map_err(|e| StoreError::Stage(e.to_string()))?;

        Ok(temp)
    }

    /// Read the leading bytes of a staged file for magic-byte sniffing.
    ///
    /// Returns fewer than [`SNIFF_LEN`] bytes for very small files.
    pub async fn read_header(&self, temp: &Path) -> Result<Vec<u8>, StoreError> {
        let mut file = fs::File::open(temp)
            .await
            .map_err(|e| StoreError::ReadBack(e.to_string()))?;

        let mut header = vec![0u8; SNIFF_LEN];
        let mut filled = 0;
        while filled < SNIFF_LEN {
            let n = file
                .read(&mut header[filled..])
                .await
                .map_err(|e| StoreError::ReadBack(e.to_string()))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        header.truncate(filled);

        Ok(header)
    }

    /// Move a validated temp file into the user's directory and return the
    /// relative path for the database row.
    ///
    /// The temp file is removed best-effort when the rename fails; a rename
    /// failure is fatal for the request.
    pub async fn promote(
        &self,
        user_id: Uuid,
        temp: &Path,
        ext: &str,
    ) -> Result<String, StoreError> {
        let relative = self
            .free_relative_path(user_id, ext)
            .await
            .map_err(|e| StoreError::Promote(e.to_string()))?;

        if let Err(e) = fs::rename(temp, self.file_path(&relative)).await {
            self.discard(temp).await;
            return Err(StoreError::Promote(e.to_string()));
        }

        Ok(relative)
    }

    /// Remove a temp file, best-effort. Rejected uploads must not
    /// accumulate in the temp directory.
    pub async fn discard(&self, temp: &Path) {
        if let Err(e) = fs::remove_file(temp).await {
            tracing::warn!(path = %temp.display(), error = %e, "Failed to remove temp file");
        }
    }

    /// Pick `<user_id>/<unix_ms>.<ext>` with the timestamp bumped past any
    /// existing file, so rapid sequential uploads never overwrite.
    async fn free_relative_path(&self, user_id: Uuid, ext: &str) -> std::io::Result<String> {
        let mut ts = Utc::now().timestamp_millis();

        loop {
            let relative = format!("{user_id}/{ts}.{ext}");
            if !fs::try_exists(self.file_path(&relative)).await? {
                return Ok(relative);
            }
            ts += 1;
        }
    }
}
