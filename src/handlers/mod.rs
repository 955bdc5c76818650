//! HTTP handlers, grouped by resource, plus the shared router state.

use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtKeys;
use crate::services::file_service::FileService;
use crate::services::folder_service::FolderService;
use crate::services::user_service::UserService;

pub mod auth_handlers;
pub mod file_handlers;
pub mod folder_handlers;
pub mod health_handlers;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub files: FileService,
    pub folders: FolderService,
    pub users: UserService,
    pub jwt: JwtKeys,
    /// Validity window for issued presigned URLs.
    pub presign_ttl: Duration,
    /// Kept for the readiness probe.
    pub pool: Arc<SqlitePool>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> JwtKeys {
        state.jwt.clone()
    }
}
