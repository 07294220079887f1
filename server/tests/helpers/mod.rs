//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for building and sending requests through the full axum
//! router, plus utilities for user creation, JWT generation, and multipart
//! bodies.
//!
//! Each `TestApp` gets its own temp-directory avatar store; the database
//! pool is shared across all tests in the same binary.
#![allow(dead_code)]

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, Method, Request, Response};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

use amity_server::api::{create_router, AppState};
use amity_server::auth::jwt;
use amity_server::avatar::AvatarStore;
use amity_server::config::Config;
use amity_server::db;

// ============================================================================
// Shared resources
// ============================================================================

/// Shared database pool across all tests in the same binary.
static SHARED_POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Shared config across all tests in the same binary.
static SHARED_CONFIG: OnceCell<Config> = OnceCell::const_new();

/// Get or create a shared config.
pub async fn shared_config() -> &'static Config {
    SHARED_CONFIG
        .get_or_init(|| async { Config::default_for_test() })
        .await
}

/// Get or create a shared database pool.
///
/// Reuses a single pool across all test cases in the same binary,
/// avoiding connection exhaustion from creating pools per-test.
pub async fn shared_pool() -> &'static PgPool {
    SHARED_POOL
        .get_or_init(|| async {
            let config = shared_config().await;
            db::create_pool(&config.database_url)
                .await
                .expect("Failed to connect to test DB")
        })
        .await
}

// ============================================================================
// Cleanup Guard
// ============================================================================

/// Async cleanup action type.
type CleanupAction = Box<dyn FnOnce(PgPool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// RAII guard that runs cleanup actions on drop, even if the test panics.
pub struct CleanupGuard {
    pool: PgPool,
    actions: Vec<CleanupAction>,
}

impl CleanupGuard {
    /// Create a new cleanup guard for the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            actions: Vec::new(),
        }
    }

    /// Register a generic async cleanup action.
    pub fn add<F, Fut>(&mut self, action: F)
    where
        F: FnOnce(PgPool) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.actions
            .push(Box::new(move |pool| Box::pin(action(pool))));
    }

    /// Register cleanup to delete a user by ID (cascades settings, roles,
    /// and avatar rows).
    pub fn delete_user(&mut self, user_id: Uuid) {
        self.add(move |pool| async move {
            let _ = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&pool)
                .await;
        });
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let actions = std::mem::take(&mut self.actions);
        if actions.is_empty() {
            return;
        }

        let pool = self.pool.clone();
        let handle = tokio::runtime::Handle::current();

        // Spawn a blocking thread to run async cleanup.
        // This works regardless of tokio runtime flavor.
        std::thread::spawn(move || {
            handle.block_on(async move {
                for action in actions {
                    action(pool.clone()).await;
                }
            });
        })
        .join()
        .expect("Cleanup thread panicked");
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Arc<Config>,
    store_dir: tempfile::TempDir,
}

impl TestApp {
    /// Create a new test app with a shared DB pool and a fresh temp store.
    pub async fn new() -> Self {
        let mut config = shared_config().await.clone();
        let store_dir = tempfile::tempdir().expect("Failed to create temp store");
        config.store_root = store_dir.path().to_path_buf();

        Self::build(config, store_dir).await
    }

    /// Create a test app with a custom config (for limit testing). The
    /// store root is still replaced with a fresh temp directory.
    pub async fn with_config(mut config: Config) -> Self {
        let store_dir = tempfile::tempdir().expect("Failed to create temp store");
        config.store_root = store_dir.path().to_path_buf();

        Self::build(config, store_dir).await
    }

    async fn build(config: Config, store_dir: tempfile::TempDir) -> Self {
        let pool = shared_pool().await.clone();

        let store = AvatarStore::new(config.store_root.clone());
        store.init().await.expect("Failed to init avatar store");

        let state = AppState::new(pool.clone(), config.clone(), store);
        let router = create_router(state);

        Self {
            router,
            pool,
            config: Arc::new(config),
            store_dir,
        }
    }

    /// Root of this app's temp avatar store.
    pub fn store_root(&self) -> &Path {
        self.store_dir.path()
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// Create a [`CleanupGuard`] for this app's pool.
    pub fn cleanup_guard(&self) -> CleanupGuard {
        CleanupGuard::new(self.pool.clone())
    }
}

// ============================================================================
// User & Auth helpers
// ============================================================================

/// Password used by users registered through the API.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Create a test user directly in the database and return `(user_id, email)`.
///
/// Also creates the privacy-settings row so profile views resolve. Does NOT
/// touch the store; use [`register_via_api`] when registration side-effects
/// matter.
pub async fn create_test_user(pool: &PgPool) -> (Uuid, String) {
    let test_id = Uuid::new_v4().to_string()[..8].to_string();
    let email = format!("httptest_{test_id}@example.com");
    let birthday = NaiveDate::from_ymd_opt(1995, 3, 2).expect("valid date");

    let user = db::create_user(pool, "Http", "Tester", &email, "other", birthday, "hash")
        .await
        .expect("Failed to create test user");

    sqlx::query("INSERT INTO privacy_settings (user_id) VALUES ($1)")
        .bind(user.id)
        .execute(pool)
        .await
        .expect("Failed to create privacy settings");

    (user.id, email)
}

/// Attach the `user` role to an account.
pub async fn attach_user_role(pool: &PgPool, user_id: Uuid) {
    sqlx::query(
        "INSERT INTO role_user (user_id, role_id) SELECT $1, id FROM roles WHERE slug = 'user'",
    )
    .bind(user_id)
    .execute(pool)
    .await
    .expect("Failed to attach role");
}

/// Generate an access token for the given user.
pub fn generate_access_token(config: &Config, user_id: Uuid) -> String {
    jwt::generate_access_token(user_id, &config.jwt_secret, config.jwt_expiry)
        .expect("Failed to generate access token")
}

/// Register a user through `POST /auth/register` (full side-effects: privacy
/// row, role link, default avatar on disk) and return the new user's ID.
pub async fn register_via_api(app: &TestApp, email: &str) -> Uuid {
    let body = serde_json::json!({
        "firstname": "Reg",
        "lastname": "Istrant",
        "gender": "other",
        "birthday": "1992-01-30",
        "email": email,
        "password": TEST_PASSWORD,
    });

    let req = TestApp::request(Method::POST, "/auth/register")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), 200, "Registration should succeed");

    let user = db::find_user_by_email(&app.pool, email)
        .await
        .expect("Query failed")
        .expect("Registered user not found");
    user.id
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

// ============================================================================
// Multipart & image fixtures
// ============================================================================

/// Boundary used by [`multipart_file_body`].
pub const MULTIPART_BOUNDARY: &str = "----TestBoundary";

/// Content-Type header value matching [`multipart_file_body`].
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")
}

/// Build a multipart body with a single file field.
pub fn multipart_file_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Complete 1x1 transparent PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Leading bytes of a JFIF-style JPEG, enough for magic-byte sniffing.
pub const JPEG_HEADER: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00,
];

/// Leading bytes of a GIF89a file, enough for magic-byte sniffing.
pub const GIF_HEADER: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00";

/// Names of the regular files directly inside a directory. Missing
/// directories count as empty.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect()
}
