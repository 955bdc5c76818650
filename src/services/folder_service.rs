//! FolderService — CRUD over the folder tree.
//!
//! No quota interaction: folders are pure metadata. Deleting a folder is a
//! soft delete and is refused while live children exist (restrict, never
//! cascade).

use thiserror::Error;

use crate::models::DomainError;
use crate::models::folder::FolderDto;
use crate::repositories::{FolderRepository, NewFolder};

#[derive(Debug, Error)]
pub enum FolderError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("folder not found")]
    NotFound,
    #[error("parent folder `{0}` does not exist")]
    ParentNotFound(i64),
    #[error("folder `{0}` still contains folders")]
    NotEmpty(i64),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type FolderResult<T> = Result<T, FolderError>;

#[derive(Clone)]
pub struct FolderService {
    folders: FolderRepository,
}

impl FolderService {
    pub fn new(folders: FolderRepository) -> Self {
        Self { folders }
    }

    /// Create a folder, optionally inside a parent. The parent must exist
    /// and be live.
    pub async fn create(
        &self,
        user_id: i64,
        name: &str,
        parent_folder_id: Option<i64>,
    ) -> FolderResult<FolderDto> {
        if name.trim().is_empty() {
            return Err(FolderError::Missing("name"));
        }
        if let Some(parent_id) = parent_folder_id {
            self.folders
                .get_by_id(parent_id)
                .await?
                .ok_or(FolderError::ParentNotFound(parent_id))?;
        }

        let folder = self
            .folders
            .insert(NewFolder {
                name: name.to_string(),
                parent_folder_id,
                created_by: user_id,
            })
            .await?;
        Ok(folder.into())
    }

    pub async fn get_by_id(&self, id: i64) -> FolderResult<FolderDto> {
        let folder = self.folders.get_by_id(id).await?.ok_or(FolderError::NotFound)?;
        Ok(folder.into())
    }

    /// Children of `parent`, or the root folders when `parent` is `None`.
    pub async fn list(&self, parent: Option<i64>) -> FolderResult<Vec<FolderDto>> {
        let folders = self.folders.list_by_parent(parent).await?;
        Ok(folders.into_iter().map(FolderDto::from).collect())
    }

    pub async fn rename(&self, id: i64, user_id: i64, new_name: &str) -> FolderResult<()> {
        if new_name.trim().is_empty() {
            return Err(FolderError::Missing("newName"));
        }
        let mut folder = self.folders.get_by_id(id).await?.ok_or(FolderError::NotFound)?;
        folder.rename(new_name, user_id)?;
        self.folders.update(&folder).await?;
        Ok(())
    }

    /// Soft-delete a folder. Refused while it still has live children.
    pub async fn delete(&self, id: i64, user_id: i64) -> FolderResult<()> {
        let mut folder = self.folders.get_by_id(id).await?.ok_or(FolderError::NotFound)?;
        if self.folders.count_live_children(id).await? > 0 {
            return Err(FolderError::NotEmpty(id));
        }
        folder.soft_delete(user_id);
        self.folders.update(&folder).await?;
        Ok(())
    }
}
