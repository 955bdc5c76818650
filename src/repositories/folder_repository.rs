//! Folder persistence.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::folder::Folder;

#[derive(Debug, Clone)]
pub struct NewFolder {
    pub name: String,
    pub parent_folder_id: Option<i64>,
    pub created_by: i64,
}

#[derive(Clone)]
pub struct FolderRepository {
    pool: Arc<SqlitePool>,
}

impl FolderRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> sqlx::Result<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_folder_id, is_deleted, created_at, created_by,
                    updated_at, updated_by, deleted_at, deleted_by
             FROM folders
             WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
    }

    pub async fn insert(&self, new: NewFolder) -> sqlx::Result<Folder> {
        let now = Utc::now();
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (
                name, parent_folder_id, is_deleted, created_at, created_by,
                updated_at, updated_by, deleted_at, deleted_by
             ) VALUES (?, ?, 0, ?, ?, ?, ?, NULL, NULL)
             RETURNING id, name, parent_folder_id, is_deleted, created_at, created_by,
                       updated_at, updated_by, deleted_at, deleted_by",
        )
        .bind(&new.name)
        .bind(new.parent_folder_id)
        .bind(now)
        .bind(new.created_by)
        .bind(now)
        .bind(new.created_by)
        .fetch_one(&*self.pool)
        .await
    }

    pub async fn update(&self, folder: &Folder) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE folders
             SET name = ?, is_deleted = ?, updated_at = ?, updated_by = ?,
                 deleted_at = ?, deleted_by = ?
             WHERE id = ?",
        )
        .bind(&folder.name)
        .bind(folder.is_deleted)
        .bind(folder.updated_at)
        .bind(folder.updated_by)
        .bind(folder.deleted_at)
        .bind(folder.deleted_by)
        .bind(folder.id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Children of a parent, or the root folders when `parent` is `None`.
    /// `IS ?` makes the NULL case match like an equality.
    pub async fn list_by_parent(&self, parent: Option<i64>) -> sqlx::Result<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_folder_id, is_deleted, created_at, created_by,
                    updated_at, updated_by, deleted_at, deleted_by
             FROM folders
             WHERE parent_folder_id IS ? AND is_deleted = 0
             ORDER BY id ASC",
        )
        .bind(parent)
        .fetch_all(&*self.pool)
        .await
    }

    /// Live children count, used for the restrict-on-delete check.
    pub async fn count_live_children(&self, id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM folders WHERE parent_folder_id = ? AND is_deleted = 0",
        )
        .bind(id)
        .fetch_one(&*self.pool)
        .await
    }
}
