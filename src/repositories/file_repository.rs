//! File metadata persistence.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::models::file::{File, FileStatus};

/// Fields supplied when inserting a new file row; the database assigns the
/// id and the repository stamps the audit columns.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub bucket: String,
    pub object_key: String,
    pub owner_id: i64,
    pub status: FileStatus,
    pub reserved_until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct FileRepository {
    pool: Arc<SqlitePool>,
}

impl FileRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Owner-scoped point lookup. Reserved and deleted rows are invisible,
    /// and so is any row belonging to someone else.
    pub async fn get_for_owner(&self, id: i64, owner_id: i64) -> sqlx::Result<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT id, name, size_bytes, content_type, uploaded_at, bucket, object_key,
                    owner_id, status, reserved_until, created_at, created_by, updated_at,
                    updated_by, deleted_at, deleted_by
             FROM files
             WHERE id = ? AND owner_id = ? AND status IN ('active', 'pending_deletion')",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
    }

    /// Look up an owner's un-finalized reservation by its object key.
    pub async fn get_reservation(
        &self,
        owner_id: i64,
        bucket: &str,
        object_key: &str,
    ) -> sqlx::Result<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT id, name, size_bytes, content_type, uploaded_at, bucket, object_key,
                    owner_id, status, reserved_until, created_at, created_by, updated_at,
                    updated_by, deleted_at, deleted_by
             FROM files
             WHERE bucket = ? AND object_key = ? AND owner_id = ? AND status = 'reserved'",
        )
        .bind(bucket)
        .bind(object_key)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
    }

    /// All of an owner's visible files (active and trashed), oldest first.
    pub async fn list_by_owner(&self, owner_id: i64) -> sqlx::Result<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT id, name, size_bytes, content_type, uploaded_at, bucket, object_key,
                    owner_id, status, reserved_until, created_at, created_by, updated_at,
                    updated_by, deleted_at, deleted_by
             FROM files
             WHERE owner_id = ? AND status IN ('active', 'pending_deletion')
             ORDER BY id ASC",
        )
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
    }

    pub async fn insert(&self, new: NewFile) -> sqlx::Result<File> {
        let now = Utc::now();
        sqlx::query_as::<_, File>(
            "INSERT INTO files (
                name, size_bytes, content_type, uploaded_at, bucket, object_key,
                owner_id, status, reserved_until, created_at, created_by, updated_at,
                updated_by, deleted_at, deleted_by
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
             RETURNING id, name, size_bytes, content_type, uploaded_at, bucket, object_key,
                       owner_id, status, reserved_until, created_at, created_by, updated_at,
                       updated_by, deleted_at, deleted_by",
        )
        .bind(&new.name)
        .bind(new.size_bytes)
        .bind(&new.content_type)
        .bind(new.uploaded_at)
        .bind(&new.bucket)
        .bind(&new.object_key)
        .bind(new.owner_id)
        .bind(new.status)
        .bind(new.reserved_until)
        .bind(now)
        .bind(new.owner_id)
        .bind(now)
        .bind(new.owner_id)
        .fetch_one(&*self.pool)
        .await
    }

    /// Persist the mutable portion of a row after an entity transition.
    pub async fn update(&self, file: &File) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE files
             SET name = ?, size_bytes = ?, content_type = ?, uploaded_at = ?, status = ?,
                 reserved_until = ?, updated_at = ?, updated_by = ?, deleted_at = ?,
                 deleted_by = ?
             WHERE id = ?",
        )
        .bind(&file.name)
        .bind(file.size_bytes)
        .bind(&file.content_type)
        .bind(file.uploaded_at)
        .bind(file.status)
        .bind(file.reserved_until)
        .bind(file.updated_at)
        .bind(file.updated_by)
        .bind(file.deleted_at)
        .bind(file.deleted_by)
        .bind(file.id)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Bytes the owner sees as used: active plus trashed files.
    pub async fn used_bytes(&self, owner_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM files
             WHERE owner_id = ? AND status IN ('active', 'pending_deletion')",
        )
        .bind(owner_id)
        .fetch_one(&*self.pool)
        .await
    }

    /// Bytes charged against the quota: visible files plus outstanding
    /// reservations, so concurrent intents cannot oversubscribe.
    pub async fn charged_bytes(&self, owner_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM files
             WHERE owner_id = ? AND status IN ('reserved', 'active', 'pending_deletion')",
        )
        .bind(owner_id)
        .fetch_one(&*self.pool)
        .await
    }

    /// Per-owner quota policy record, if one exists.
    pub async fn quota_for_owner(&self, owner_id: i64) -> sqlx::Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT max_bytes FROM storage_quotas WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_optional(&*self.pool)
            .await
    }

    pub async fn set_quota_for_owner(&self, owner_id: i64, max_bytes: i64) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO storage_quotas (owner_id, max_bytes) VALUES (?, ?)
             ON CONFLICT(owner_id) DO UPDATE SET max_bytes = excluded.max_bytes",
        )
        .bind(owner_id)
        .bind(max_bytes)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Reservations whose deadline has passed, ready for the sweeper.
    pub async fn expired_reservations(&self, cutoff: DateTime<Utc>) -> sqlx::Result<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT id, name, size_bytes, content_type, uploaded_at, bucket, object_key,
                    owner_id, status, reserved_until, created_at, created_by, updated_at,
                    updated_by, deleted_at, deleted_by
             FROM files
             WHERE status = 'reserved' AND reserved_until IS NOT NULL AND reserved_until < ?",
        )
        .bind(cutoff)
        .fetch_all(&*self.pool)
        .await
    }

    /// Physically drop a row. Only used for reservations that never
    /// finalized; deleted files keep their row for audit.
    pub async fn delete_row(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
