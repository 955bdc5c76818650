//! Represents one stored object's metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::DomainError;

/// Lifecycle state of a file row.
///
/// A single discriminated status instead of separate deleted/trashed
/// flags, so the states can never disagree:
///
/// ```text
/// RESERVED --finalize----> ACTIVE --mark-pending--> PENDING_DELETION
///     |                      ^                            |
///     +--ttl expiry (swept)  +---------restore-----------+
///
/// ACTIVE | PENDING_DELETION --delete--> DELETED (terminal, hidden)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum FileStatus {
    /// Upload intent issued; counted against quota, not yet visible.
    Reserved,
    /// Finalized and visible in listings.
    Active,
    /// In the trash, restorable.
    PendingDeletion,
    /// Permanently removed from the user's view; row kept for audit.
    Deleted,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Reserved => "reserved",
            FileStatus::Active => "active",
            FileStatus::PendingDeletion => "pending_deletion",
            FileStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file metadata row. The payload bytes live in the object store under
/// `bucket`/`object_key`; this server never touches them.
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: i64,

    /// Display name shown to the owner. Mutable via rename.
    pub name: String,

    /// Size in bytes. Fixed once the file leaves `Reserved`.
    pub size_bytes: i64,

    /// MIME type reported at upload time.
    pub content_type: String,

    /// When the upload was finalized (or reserved, until then).
    pub uploaded_at: DateTime<Utc>,

    /// Object store bucket holding the payload.
    pub bucket: String,

    /// Object key within the bucket. Unique together with `bucket`.
    pub object_key: String,

    /// Owning user. Fixed at creation.
    pub owner_id: i64,

    pub status: FileStatus,

    /// Reservation deadline; only set while `status` is `Reserved`.
    pub reserved_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub created_by: i64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

impl File {
    fn touch(&mut self, user_id: i64) {
        self.updated_at = Utc::now();
        self.updated_by = user_id;
    }

    /// Change the display name. Rejects empty/whitespace names and leaves
    /// the stored name untouched on failure.
    pub fn rename(&mut self, new_name: &str, user_id: i64) -> Result<(), DomainError> {
        if new_name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }
        self.name = new_name.to_string();
        self.touch(user_id);
        Ok(())
    }

    /// Promote a reservation to a live file (the finalize step).
    pub fn activate(&mut self, user_id: i64) -> Result<(), DomainError> {
        if self.status != FileStatus::Reserved {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: FileStatus::Active,
            });
        }
        self.status = FileStatus::Active;
        self.reserved_until = None;
        self.touch(user_id);
        Ok(())
    }

    /// Move to the trash. Reversible via [`File::restore`].
    pub fn mark_pending_deletion(&mut self, user_id: i64) -> Result<(), DomainError> {
        if self.status != FileStatus::Active {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: FileStatus::PendingDeletion,
            });
        }
        self.status = FileStatus::PendingDeletion;
        self.touch(user_id);
        Ok(())
    }

    /// Take back out of the trash.
    pub fn restore(&mut self, user_id: i64) -> Result<(), DomainError> {
        if self.status != FileStatus::PendingDeletion {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: FileStatus::Active,
            });
        }
        self.status = FileStatus::Active;
        self.touch(user_id);
        Ok(())
    }

    /// Terminal transition. The row is kept but hidden from every read.
    pub fn soft_delete(&mut self, user_id: i64) -> Result<(), DomainError> {
        match self.status {
            FileStatus::Active | FileStatus::PendingDeletion => {
                self.status = FileStatus::Deleted;
                self.deleted_at = Some(Utc::now());
                self.deleted_by = Some(user_id);
                self.touch(user_id);
                Ok(())
            }
            other => Err(DomainError::InvalidTransition {
                from: other,
                to: FileStatus::Deleted,
            }),
        }
    }
}

/// JSON shape of a file as the API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDto {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub bucket: String,
    pub object_key: String,
    pub status: FileStatus,
}

impl From<File> for FileDto {
    fn from(f: File) -> Self {
        Self {
            id: f.id,
            name: f.name,
            size: f.size_bytes,
            content_type: f.content_type,
            uploaded_at: f.uploaded_at,
            bucket: f.bucket,
            object_key: f.object_key,
            status: f.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: FileStatus) -> File {
        let now = Utc::now();
        File {
            id: 1,
            name: "report.pdf".into(),
            size_bytes: 5 * 1024 * 1024,
            content_type: "application/pdf".into(),
            uploaded_at: now,
            bucket: "nimbus".into(),
            object_key: "abc-report.pdf".into(),
            owner_id: 7,
            status,
            reserved_until: None,
            created_at: now,
            created_by: 7,
            updated_at: now,
            updated_by: 7,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn activate_only_from_reserved() {
        let mut f = sample(FileStatus::Reserved);
        assert!(f.activate(7).is_ok());
        assert_eq!(f.status, FileStatus::Active);

        let mut f = sample(FileStatus::Active);
        assert_eq!(
            f.activate(7),
            Err(DomainError::InvalidTransition {
                from: FileStatus::Active,
                to: FileStatus::Active,
            })
        );
    }

    #[test]
    fn trash_round_trip_returns_to_active() {
        let mut f = sample(FileStatus::Active);
        f.mark_pending_deletion(7).unwrap();
        assert_eq!(f.status, FileStatus::PendingDeletion);
        f.restore(7).unwrap();
        assert_eq!(f.status, FileStatus::Active);
        assert!(f.deleted_at.is_none());
    }

    #[test]
    fn restore_requires_pending_deletion() {
        let mut f = sample(FileStatus::Active);
        assert!(f.restore(7).is_err());
        assert_eq!(f.status, FileStatus::Active);
    }

    #[test]
    fn delete_is_terminal() {
        let mut f = sample(FileStatus::PendingDeletion);
        f.soft_delete(7).unwrap();
        assert_eq!(f.status, FileStatus::Deleted);
        assert!(f.deleted_at.is_some());
        assert_eq!(f.deleted_by, Some(7));

        assert!(f.soft_delete(7).is_err());
        assert!(f.restore(7).is_err());
        assert!(f.mark_pending_deletion(7).is_err());
    }

    #[test]
    fn rename_rejects_blank_names() {
        let mut f = sample(FileStatus::Active);
        assert_eq!(f.rename("", 7), Err(DomainError::EmptyName));
        assert_eq!(f.rename("   ", 7), Err(DomainError::EmptyName));
        assert_eq!(f.name, "report.pdf");

        f.rename("summary.pdf", 7).unwrap();
        assert_eq!(f.name, "summary.pdf");
        assert_eq!(f.updated_by, 7);
    }
}
