//! Hierarchical folder containers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DomainError;

/// A folder row. Folders form a tree via `parent_folder_id`; a null parent
/// means the folder sits at the root. Deleting a parent never cascades.
#[derive(Debug, Clone, FromRow)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub parent_folder_id: Option<i64>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl Folder {
    fn touch(&mut self, user_id: i64) {
        self.updated_at = Utc::now();
        self.updated_by = user_id;
    }

    pub fn rename(&mut self, new_name: &str, user_id: i64) -> Result<(), DomainError> {
        if new_name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        self.name = new_name.to_string();
        self.touch(user_id);
        Ok(())
    }

    /// Idempotent soft delete; the row stays for audit.
    pub fn soft_delete(&mut self, user_id: i64) {
        if self.is_deleted {
            return;
        }
        self.is_deleted = true;
        self.deleted_at = Some(Utc::now());
        self.deleted_by = Some(user_id);
        self.touch(user_id);
    }
}

/// JSON shape of a folder as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDto {
    pub id: i64,
    pub name: String,
    pub parent_folder_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Folder> for FolderDto {
    fn from(f: Folder) -> Self {
        Self {
            id: f.id,
            name: f.name,
            parent_folder_id: f.parent_folder_id,
            created_at: f.created_at,
        }
    }
}
