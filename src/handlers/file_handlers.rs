//! File lifecycle endpoints. The owner id always comes from the verified
//! bearer token, never from the request body.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::file::FileDto;
use crate::services::file_service::StorageUsage;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    pub upload_url: String,
    /// The generated object key; the client echoes it back on finalize.
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub object_key: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub new_name: String,
}

/// POST /files/intent
pub async fn create_intent(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, AppError> {
    let content_type = match req.content_type.as_deref() {
        Some(ct) if !ct.trim().is_empty() => ct,
        _ => "application/octet-stream",
    };

    let intent = state
        .files
        .create_upload_intent(
            auth.user_id(),
            &req.file_name,
            content_type,
            req.size_bytes,
            state.presign_ttl,
        )
        .await?;

    Ok(Json(CreateIntentResponse {
        upload_url: intent.upload_url,
        file_id: intent.object_key,
    }))
}

/// POST /files/{id}/finalize — the path id is the object key; the body
/// carries the authoritative copy.
pub async fn finalize(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(_id): Path<String>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FileDto>, AppError> {
    let dto = state
        .files
        .finalize(
            auth.user_id(),
            &req.object_key,
            &req.original_name,
            &req.content_type,
            req.size_bytes,
        )
        .await?;
    Ok(Json(dto))
}

/// GET /files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FileDto>>, AppError> {
    Ok(Json(state.files.list(auth.user_id()).await?))
}

/// GET /files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<FileDto>, AppError> {
    Ok(Json(state.files.get_by_id(auth.user_id(), id).await?))
}

/// GET /files/{id}/download-url
pub async fn download_url(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<String>, AppError> {
    let url = state
        .files
        .download_url(auth.user_id(), id, state.presign_ttl)
        .await?;
    Ok(Json(url))
}

/// GET /files/storage-usage
pub async fn storage_usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<StorageUsage>, AppError> {
    Ok(Json(state.files.storage_usage(auth.user_id()).await?))
}

/// PATCH /files/{id}/rename
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RenameRequest>,
) -> Result<StatusCode, AppError> {
    state.files.rename(auth.user_id(), id, &req.new_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /files/{id}/mark-pending-deletion
pub async fn mark_pending_deletion(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.files.mark_pending_deletion(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /files/{id}/restore-pending-deletion
pub async fn restore_pending_deletion(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .files
        .restore_from_pending_deletion(auth.user_id(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.files.delete(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
