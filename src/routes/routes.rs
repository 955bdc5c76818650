//! Route table for the cloud drive API.
//!
//! ## Structure
//! - **Auth**: register, login, current user
//! - **Files**: two-phase upload (intent → finalize), listing, download
//!   URLs, rename, trash (mark/restore), permanent delete, storage usage
//! - **Folders**: CRUD with parent-scoped listing
//! - **Health**: liveness and readiness probes
//!
//! On `/files/{id}/finalize` the id segment is the generated object key;
//! everywhere else it is the numeric file id.

use crate::handlers::{
    AppState,
    auth_handlers::{login, me, register},
    file_handlers::{
        create_intent, delete_file, download_url, finalize, get_file, list_files,
        mark_pending_deletion, rename_file, restore_pending_deletion, storage_usage,
    },
    folder_handlers::{create_folder, delete_folder, get_folder, list_folders, rename_folder},
    health_handlers::{healthz, readyz},
};
use axum::{
    Router,
    routing::{get, patch, post, put},
};

/// Build and return the router for all API routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        // files
        .route("/files", get(list_files))
        .route("/files/intent", post(create_intent))
        .route("/files/storage-usage", get(storage_usage))
        .route("/files/{id}", get(get_file).delete(delete_file))
        .route("/files/{id}/finalize", post(finalize))
        .route("/files/{id}/download-url", get(download_url))
        .route("/files/{id}/rename", patch(rename_file))
        .route("/files/{id}/mark-pending-deletion", put(mark_pending_deletion))
        .route(
            "/files/{id}/restore-pending-deletion",
            put(restore_pending_deletion),
        )
        // folders
        .route("/folders", post(create_folder).get(list_folders))
        .route("/folders/{id}", get(get_folder).delete(delete_folder))
        .route("/folders/{id}/rename", patch(rename_folder))
}
