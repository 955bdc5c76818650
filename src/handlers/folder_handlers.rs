//! Folder endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use super::AppState;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::folder::FolderDto;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_folder_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersQuery {
    /// Children of this folder; omitted lists the roots.
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameFolderRequest {
    pub new_name: String,
}

/// POST /folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<Json<FolderDto>, AppError> {
    let folder = state
        .folders
        .create(auth.user_id(), &req.name, req.parent_folder_id)
        .await?;
    Ok(Json(folder))
}

/// GET /folders?parentId=N
pub async fn list_folders(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ListFoldersQuery>,
) -> Result<Json<Vec<FolderDto>>, AppError> {
    Ok(Json(state.folders.list(query.parent_id).await?))
}

/// GET /folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<FolderDto>, AppError> {
    Ok(Json(state.folders.get_by_id(id).await?))
}

/// PATCH /folders/{id}/rename
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RenameFolderRequest>,
) -> Result<StatusCode, AppError> {
    state.folders.rename(id, auth.user_id(), &req.new_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.folders.delete(id, auth.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
