//! FileService — the file lifecycle and quota core.
//!
//! Uploads are two-phase: an intent reserves quota and returns a presigned
//! PUT URL, then finalize promotes the reservation to a visible file once
//! the client has written the bytes. Trash, restore, and permanent delete
//! are transitions on a single status column. The service holds no state
//! of its own; every operation re-reads through the repository.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::blob_store::{BlobError, BlobStore};
use crate::models::DomainError;
use crate::models::file::{FileDto, FileStatus};
use crate::repositories::{FileRepository, NewFile};

const MB: i64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error(
        "storage quota exceeded: available {available}MB, requested {requested}MB, total quota {total}MB"
    )]
    QuotaExceeded {
        available: i64,
        requested: i64,
        total: i64,
    },
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type FileResult<T> = Result<T, FileError>;

/// Result of a successful upload intent.
#[derive(Debug, Clone)]
pub struct UploadIntent {
    pub object_key: String,
    pub upload_url: String,
    pub expires_in_secs: u64,
}

/// Storage usage report for one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub used_bytes: i64,
    pub max_bytes: i64,
    pub usage_percentage: f64,
}

#[derive(Clone)]
pub struct FileService {
    files: FileRepository,
    blob_store: Arc<dyn BlobStore>,
    bucket: String,
    default_quota_bytes: i64,
    reservation_ttl: Duration,
}

impl FileService {
    pub fn new(
        files: FileRepository,
        blob_store: Arc<dyn BlobStore>,
        bucket: String,
        default_quota_bytes: i64,
        reservation_ttl: Duration,
    ) -> Self {
        Self {
            files,
            blob_store,
            bucket,
            default_quota_bytes,
            reservation_ttl,
        }
    }

    /// The owner's quota ceiling: their policy record, or the configured
    /// default when none exists.
    async fn quota_ceiling(&self, owner_id: i64) -> FileResult<i64> {
        Ok(self
            .files
            .quota_for_owner(owner_id)
            .await?
            .unwrap_or(self.default_quota_bytes))
    }

    fn quota_exceeded(charged: i64, requested: i64, ceiling: i64) -> FileError {
        FileError::QuotaExceeded {
            available: (ceiling - charged).max(0) / MB,
            requested: requested / MB,
            total: ceiling / MB,
        }
    }

    /// Whether `candidate_bytes` more would still fit under the ceiling.
    pub async fn can_upload(&self, owner_id: i64, candidate_bytes: i64) -> FileResult<bool> {
        let charged = self.files.charged_bytes(owner_id).await?;
        let ceiling = self.quota_ceiling(owner_id).await?;
        Ok(charged + candidate_bytes <= ceiling)
    }

    /// Phase one of an upload: check quota, persist a reservation charged
    /// against it, and hand back a presigned PUT URL. No file becomes
    /// visible until finalize.
    pub async fn create_upload_intent(
        &self,
        owner_id: i64,
        file_name: &str,
        content_type: &str,
        size_bytes: i64,
        ttl: Duration,
    ) -> FileResult<UploadIntent> {
        if file_name.trim().is_empty() {
            return Err(FileError::Missing("fileName"));
        }

        let charged = self.files.charged_bytes(owner_id).await?;
        let ceiling = self.quota_ceiling(owner_id).await?;
        if charged + size_bytes > ceiling {
            return Err(Self::quota_exceeded(charged, size_bytes, ceiling));
        }

        let object_key = generate_object_key(file_name);
        let now = Utc::now();
        self.files
            .insert(NewFile {
                name: file_name.to_string(),
                size_bytes,
                content_type: content_type.to_string(),
                uploaded_at: now,
                bucket: self.bucket.clone(),
                object_key: object_key.clone(),
                owner_id,
                status: FileStatus::Reserved,
                reserved_until: Some(
                    now + chrono::Duration::seconds(self.reservation_ttl.as_secs() as i64),
                ),
            })
            .await?;

        let upload_url = self
            .blob_store
            .presigned_put_url(&self.bucket, &object_key, ttl)
            .await?;

        debug!(owner_id, %object_key, size_bytes, "issued upload intent");
        Ok(UploadIntent {
            object_key,
            upload_url,
            expires_in_secs: ttl.as_secs(),
        })
    }

    /// Phase two: promote the reservation to an active file. The declared
    /// size is re-checked against the quota when it differs from the
    /// reserved one (a forged or corrected figure).
    pub async fn finalize(
        &self,
        owner_id: i64,
        object_key: &str,
        original_name: &str,
        content_type: &str,
        size_bytes: i64,
    ) -> FileResult<FileDto> {
        if object_key.trim().is_empty() {
            return Err(FileError::Missing("objectKey"));
        }
        if original_name.trim().is_empty() {
            return Err(FileError::Missing("originalName"));
        }

        let mut file = self
            .files
            .get_reservation(owner_id, &self.bucket, object_key)
            .await?
            .ok_or(FileError::NotFound)?;

        if size_bytes != file.size_bytes {
            let charged = self.files.charged_bytes(owner_id).await?;
            let ceiling = self.quota_ceiling(owner_id).await?;
            let without_reservation = charged - file.size_bytes;
            if without_reservation + size_bytes > ceiling {
                return Err(Self::quota_exceeded(without_reservation, size_bytes, ceiling));
            }
        }

        file.name = original_name.to_string();
        file.content_type = content_type.to_string();
        file.size_bytes = size_bytes;
        file.uploaded_at = Utc::now();
        file.activate(owner_id)?;
        self.files.update(&file).await?;

        info!(owner_id, file_id = file.id, %object_key, "upload finalized");
        Ok(file.into())
    }

    pub async fn get_by_id(&self, owner_id: i64, id: i64) -> FileResult<FileDto> {
        let file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;
        Ok(file.into())
    }

    pub async fn list(&self, owner_id: i64) -> FileResult<Vec<FileDto>> {
        let files = self.files.list_by_owner(owner_id).await?;
        Ok(files.into_iter().map(FileDto::from).collect())
    }

    /// Presigned GET for a file the owner can see.
    pub async fn download_url(&self, owner_id: i64, id: i64, ttl: Duration) -> FileResult<String> {
        let file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;
        Ok(self
            .blob_store
            .presigned_get_url(&file.bucket, &file.object_key, ttl)
            .await?)
    }

    /// Metadata-only rename.
    pub async fn rename(&self, owner_id: i64, id: i64, new_name: &str) -> FileResult<()> {
        if new_name.trim().is_empty() {
            return Err(FileError::Missing("newName"));
        }
        let mut file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;
        file.rename(new_name, owner_id)?;
        self.files.update(&file).await?;
        Ok(())
    }

    /// Move to the trash. Pure metadata flip, reversible.
    pub async fn mark_pending_deletion(&self, owner_id: i64, id: i64) -> FileResult<()> {
        let mut file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;
        file.mark_pending_deletion(owner_id)?;
        self.files.update(&file).await?;
        Ok(())
    }

    /// Take back out of the trash.
    pub async fn restore_from_pending_deletion(&self, owner_id: i64, id: i64) -> FileResult<()> {
        let mut file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;
        file.restore(owner_id)?;
        self.files.update(&file).await?;
        Ok(())
    }

    /// Permanent delete: remove the object from the store first, then flag
    /// the row. If the store call fails the row is left untouched, so the
    /// file stays visible and intact.
    pub async fn delete(&self, owner_id: i64, id: i64) -> FileResult<()> {
        let mut file = self
            .files
            .get_for_owner(id, owner_id)
            .await?
            .ok_or(FileError::NotFound)?;

        self.blob_store.delete(&file.bucket, &file.object_key).await?;

        file.soft_delete(owner_id)?;
        self.files.update(&file).await?;
        info!(owner_id, file_id = id, "file deleted");
        Ok(())
    }

    /// Bytes the owner currently has stored (active + trashed files).
    pub async fn user_storage_usage(&self, owner_id: i64) -> FileResult<i64> {
        Ok(self.files.used_bytes(owner_id).await?)
    }

    pub async fn storage_usage(&self, owner_id: i64) -> FileResult<StorageUsage> {
        let used_bytes = self.files.used_bytes(owner_id).await?;
        let max_bytes = self.quota_ceiling(owner_id).await?;
        let usage_percentage = if max_bytes > 0 {
            used_bytes as f64 / max_bytes as f64 * 100.0
        } else {
            0.0
        };
        Ok(StorageUsage {
            used_bytes,
            max_bytes,
            usage_percentage,
        })
    }

    /// Collect reservations whose deadline passed without a finalize:
    /// best-effort delete of the (possibly never written) object, then
    /// drop the row, releasing its quota charge. A failed store delete
    /// leaves the row for the next sweep.
    pub async fn sweep_expired_reservations(&self) -> FileResult<usize> {
        let expired = self.files.expired_reservations(Utc::now()).await?;
        let mut swept = 0;
        for file in expired {
            if let Err(err) = self.blob_store.delete(&file.bucket, &file.object_key).await {
                warn!(
                    file_id = file.id,
                    object_key = %file.object_key,
                    "failed to delete expired reservation object: {err}"
                );
                continue;
            }
            self.files.delete_row(file.id).await?;
            swept += 1;
        }
        if swept > 0 {
            info!(swept, "expired upload reservations swept");
        }
        Ok(swept)
    }
}

/// Globally-unique object key: a random prefix plus the sanitized display
/// name, so the key stays recognizable in the bucket.
fn generate_object_key(file_name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Keep keys to a safe single-segment charset: alphanumerics, dot, dash,
/// underscore. Everything else (separators, control chars, spaces)
/// becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::test_pool;
    use crate::repositories::{NewUser, UserRepository};
    use sqlx::SqlitePool;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    const TEN_MB: i64 = 10 * MB;
    const TTL: Duration = Duration::from_secs(600);

    #[derive(Default)]
    struct MockBlobStore {
        deleted: Mutex<Vec<String>>,
        fail_delete: AtomicBool,
    }

    #[async_trait::async_trait]
    impl BlobStore for MockBlobStore {
        async fn presigned_put_url(
            &self,
            bucket: &str,
            key: &str,
            _ttl: Duration,
        ) -> Result<String, BlobError> {
            Ok(format!("http://blob.test/{bucket}/{key}?method=put"))
        }

        async fn presigned_get_url(
            &self,
            bucket: &str,
            key: &str,
            _ttl: Duration,
        ) -> Result<String, BlobError> {
            Ok(format!("http://blob.test/{bucket}/{key}?method=get"))
        }

        async fn delete(&self, _bucket: &str, key: &str) -> Result<(), BlobError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(BlobError::UnexpectedStatus(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }
    }

    struct Fixture {
        service: FileService,
        repo: FileRepository,
        blob: Arc<MockBlobStore>,
        pool: Arc<SqlitePool>,
        owner: i64,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;
        let owner = UserRepository::new(pool.clone())
            .insert(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap()
            .id;
        let repo = FileRepository::new(pool.clone());
        let blob = Arc::new(MockBlobStore::default());
        let service = FileService::new(
            repo.clone(),
            blob.clone(),
            "nimbus".into(),
            TEN_MB,
            Duration::from_secs(3600),
        );
        Fixture {
            service,
            repo,
            blob,
            pool,
            owner,
        }
    }

    async fn upload(fx: &Fixture, name: &str, size: i64) -> FileDto {
        let intent = fx
            .service
            .create_upload_intent(fx.owner, name, "application/pdf", size, TTL)
            .await
            .unwrap();
        fx.service
            .finalize(fx.owner, &intent.object_key, name, "application/pdf", size)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn intent_rejects_blank_file_name() {
        let fx = fixture().await;
        for name in ["", "   "] {
            let err = fx
                .service
                .create_upload_intent(fx.owner, name, "text/plain", 10, TTL)
                .await
                .unwrap_err();
            assert!(matches!(err, FileError::Missing("fileName")));
        }
    }

    #[tokio::test]
    async fn intent_then_finalize_then_overrun_quota() {
        let fx = fixture().await;

        let intent = fx
            .service
            .create_upload_intent(fx.owner, "report.pdf", "application/pdf", 5 * MB, TTL)
            .await
            .unwrap();
        assert!(intent.object_key.contains("report.pdf"));
        assert!(intent.upload_url.contains(&intent.object_key));
        assert_eq!(intent.expires_in_secs, 600);

        let dto = fx
            .service
            .finalize(fx.owner, &intent.object_key, "report.pdf", "application/pdf", 5 * MB)
            .await
            .unwrap();
        assert_eq!(dto.size, 5 * MB);
        assert_eq!(dto.status, FileStatus::Active);
        assert_eq!(dto.object_key, intent.object_key);

        // 5MB left of 10MB: a 6MB intent must fail with the exact figures.
        let err = fx
            .service
            .create_upload_intent(fx.owner, "big.bin", "application/octet-stream", 6 * MB, TTL)
            .await
            .unwrap_err();
        match err {
            FileError::QuotaExceeded {
                available,
                requested,
                total,
            } => {
                assert_eq!((available, requested, total), (5, 6, 10));
            }
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_error_message_reports_megabytes() {
        let fx = fixture().await;
        upload(&fx, "a.bin", 5 * MB).await;
        let err = fx
            .service
            .create_upload_intent(fx.owner, "b.bin", "application/octet-stream", 6 * MB, TTL)
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("available 5MB"), "{msg}");
        assert!(msg.contains("requested 6MB"), "{msg}");
        assert!(msg.contains("total quota 10MB"), "{msg}");
    }

    #[tokio::test]
    async fn reservations_alone_charge_the_quota() {
        let fx = fixture().await;
        fx.service
            .create_upload_intent(fx.owner, "one.bin", "application/octet-stream", 6 * MB, TTL)
            .await
            .unwrap();

        // Nothing finalized yet, but the second 6MB intent no longer fits.
        let err = fx
            .service
            .create_upload_intent(fx.owner, "two.bin", "application/octet-stream", 6 * MB, TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::QuotaExceeded { .. }));

        // And the usage report still shows zero visible bytes.
        assert_eq!(fx.service.user_storage_usage(fx.owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn finalize_rechecks_quota_when_size_differs() {
        let fx = fixture().await;
        let intent = fx
            .service
            .create_upload_intent(fx.owner, "small.bin", "application/octet-stream", MB, TTL)
            .await
            .unwrap();

        let err = fx
            .service
            .finalize(fx.owner, &intent.object_key, "small.bin", "application/octet-stream", 12 * MB)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::QuotaExceeded { .. }));

        // The honest size still goes through.
        let dto = fx
            .service
            .finalize(fx.owner, &intent.object_key, "small.bin", "application/octet-stream", MB)
            .await
            .unwrap();
        assert_eq!(dto.size, MB);
    }

    #[tokio::test]
    async fn finalize_validates_input_and_reservation() {
        let fx = fixture().await;
        let err = fx
            .service
            .finalize(fx.owner, " ", "name.txt", "text/plain", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Missing("objectKey")));

        let err = fx
            .service
            .finalize(fx.owner, "some-key", "", "text/plain", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::Missing("originalName")));

        // A key that was never reserved cannot be finalized.
        let err = fx
            .service
            .finalize(fx.owner, "forged-key", "name.txt", "text/plain", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::NotFound));
    }

    #[tokio::test]
    async fn exactly_filling_the_quota_is_allowed() {
        let fx = fixture().await;
        assert!(fx.service.can_upload(fx.owner, TEN_MB).await.unwrap());
        assert!(!fx.service.can_upload(fx.owner, TEN_MB + 1).await.unwrap());

        upload(&fx, "all.bin", TEN_MB).await;
        assert!(fx.service.can_upload(fx.owner, 0).await.unwrap());
        assert!(!fx.service.can_upload(fx.owner, 1).await.unwrap());
    }

    #[tokio::test]
    async fn rename_rejects_blank_and_preserves_name() {
        let fx = fixture().await;
        let dto = upload(&fx, "draft.txt", MB).await;

        for bad in ["", "   "] {
            let err = fx.service.rename(fx.owner, dto.id, bad).await.unwrap_err();
            assert!(matches!(err, FileError::Missing("newName")));
        }
        assert_eq!(fx.service.get_by_id(fx.owner, dto.id).await.unwrap().name, "draft.txt");

        fx.service.rename(fx.owner, dto.id, "final.txt").await.unwrap();
        assert_eq!(fx.service.get_by_id(fx.owner, dto.id).await.unwrap().name, "final.txt");
    }

    #[tokio::test]
    async fn trash_round_trip_is_invisible_in_listings() {
        let fx = fixture().await;
        upload(&fx, "keep.txt", MB).await;
        let target = upload(&fx, "trash-me.txt", MB).await;
        let before = fx.service.list(fx.owner).await.unwrap();

        fx.service.mark_pending_deletion(fx.owner, target.id).await.unwrap();
        let trashed = fx.service.get_by_id(fx.owner, target.id).await.unwrap();
        assert_eq!(trashed.status, FileStatus::PendingDeletion);

        fx.service
            .restore_from_pending_deletion(fx.owner, target.id)
            .await
            .unwrap();
        let after = fx.service.list(fx.owner).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn illegal_transitions_are_conflicts() {
        let fx = fixture().await;
        let dto = upload(&fx, "a.txt", MB).await;

        // Restoring a file that is not in the trash.
        let err = fx
            .service
            .restore_from_pending_deletion(fx.owner, dto.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::Domain(DomainError::InvalidTransition { .. })
        ));

        // Double-trashing.
        fx.service.mark_pending_deletion(fx.owner, dto.id).await.unwrap();
        let err = fx
            .service
            .mark_pending_deletion(fx.owner, dto.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileError::Domain(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn delete_removes_blob_then_hides_file_forever() {
        let fx = fixture().await;
        let dto = upload(&fx, "gone.txt", 3 * MB).await;

        fx.service.delete(fx.owner, dto.id).await.unwrap();

        assert_eq!(*fx.blob.deleted.lock().unwrap(), vec![dto.object_key.clone()]);
        assert!(fx.service.list(fx.owner).await.unwrap().is_empty());
        assert!(matches!(
            fx.service.get_by_id(fx.owner, dto.id).await.unwrap_err(),
            FileError::NotFound
        ));
        assert!(matches!(
            fx.service.download_url(fx.owner, dto.id, TTL).await.unwrap_err(),
            FileError::NotFound
        ));
        assert_eq!(fx.service.user_storage_usage(fx.owner).await.unwrap(), 0);

        // The row itself is retained for audit.
        let status: String =
            sqlx::query_scalar("SELECT status FROM files WHERE id = ?")
                .bind(dto.id)
                .fetch_one(&*fx.pool)
                .await
                .unwrap();
        assert_eq!(status, "deleted");
    }

    #[tokio::test]
    async fn deleting_from_the_trash_also_works() {
        let fx = fixture().await;
        let dto = upload(&fx, "trash-then-purge.txt", MB).await;
        fx.service.mark_pending_deletion(fx.owner, dto.id).await.unwrap();
        fx.service.delete(fx.owner, dto.id).await.unwrap();
        assert!(fx.service.list(fx.owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_blob_delete_leaves_the_file_intact() {
        let fx = fixture().await;
        let dto = upload(&fx, "sturdy.txt", MB).await;

        fx.blob.fail_delete.store(true, Ordering::SeqCst);
        let err = fx.service.delete(fx.owner, dto.id).await.unwrap_err();
        assert!(matches!(err, FileError::Blob(_)));

        // No metadata write happened: the file is still visible.
        let still_there = fx.service.get_by_id(fx.owner, dto.id).await.unwrap();
        assert_eq!(still_there.status, FileStatus::Active);
        assert_eq!(fx.service.user_storage_usage(fx.owner).await.unwrap(), MB);
    }

    #[tokio::test]
    async fn reads_and_mutations_are_owner_scoped() {
        let fx = fixture().await;
        let dto = upload(&fx, "private.txt", MB).await;
        let stranger = fx.owner + 100;

        assert!(matches!(
            fx.service.get_by_id(stranger, dto.id).await.unwrap_err(),
            FileError::NotFound
        ));
        assert!(matches!(
            fx.service.download_url(stranger, dto.id, TTL).await.unwrap_err(),
            FileError::NotFound
        ));
        assert!(matches!(
            fx.service.rename(stranger, dto.id, "stolen.txt").await.unwrap_err(),
            FileError::NotFound
        ));
        assert!(matches!(
            fx.service.delete(stranger, dto.id).await.unwrap_err(),
            FileError::NotFound
        ));
    }

    #[tokio::test]
    async fn quota_policy_record_raises_the_ceiling() {
        let fx = fixture().await;
        let gb = 1024 * MB;
        fx.repo.set_quota_for_owner(fx.owner, 250 * gb).await.unwrap();

        // 100GB against a default 10MB ceiling: only the policy record
        // makes this possible.
        let intent = fx
            .service
            .create_upload_intent(fx.owner, "huge.iso", "application/octet-stream", 100 * gb, TTL)
            .await
            .unwrap();
        assert!(intent.object_key.contains("huge.iso"));

        let usage = fx.service.storage_usage(fx.owner).await.unwrap();
        assert_eq!(usage.max_bytes, 250 * gb);
    }

    #[tokio::test]
    async fn storage_usage_reports_percentage() {
        let fx = fixture().await;
        upload(&fx, "half.bin", 5 * MB).await;

        let usage = fx.service.storage_usage(fx.owner).await.unwrap();
        assert_eq!(usage.used_bytes, 5 * MB);
        assert_eq!(usage.max_bytes, TEN_MB);
        assert!((usage.usage_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn sweep_collects_only_expired_reservations() {
        let fx = fixture().await;

        // One reservation in the future (via the service), one already
        // expired (seeded directly).
        fx.service
            .create_upload_intent(fx.owner, "fresh.bin", "application/octet-stream", MB, TTL)
            .await
            .unwrap();
        let stale = fx
            .repo
            .insert(NewFile {
                name: "stale.bin".into(),
                size_bytes: 2 * MB,
                content_type: "application/octet-stream".into(),
                uploaded_at: Utc::now(),
                bucket: "nimbus".into(),
                object_key: "stale-key".into(),
                owner_id: fx.owner,
                status: FileStatus::Reserved,
                reserved_until: Some(Utc::now() - chrono::Duration::minutes(1)),
            })
            .await
            .unwrap();
        assert_eq!(fx.repo.charged_bytes(fx.owner).await.unwrap(), 3 * MB);

        let swept = fx.service.sweep_expired_reservations().await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(*fx.blob.deleted.lock().unwrap(), vec!["stale-key".to_string()]);
        assert_eq!(fx.repo.charged_bytes(fx.owner).await.unwrap(), MB);
        assert!(fx.repo.get_reservation(fx.owner, "nimbus", &stale.object_key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_retries_rows_whose_blob_delete_failed() {
        let fx = fixture().await;
        fx.repo
            .insert(NewFile {
                name: "stuck.bin".into(),
                size_bytes: MB,
                content_type: "application/octet-stream".into(),
                uploaded_at: Utc::now(),
                bucket: "nimbus".into(),
                object_key: "stuck-key".into(),
                owner_id: fx.owner,
                status: FileStatus::Reserved,
                reserved_until: Some(Utc::now() - chrono::Duration::minutes(1)),
            })
            .await
            .unwrap();

        fx.blob.fail_delete.store(true, Ordering::SeqCst);
        assert_eq!(fx.service.sweep_expired_reservations().await.unwrap(), 0);
        assert_eq!(fx.repo.charged_bytes(fx.owner).await.unwrap(), MB);

        fx.blob.fail_delete.store(false, Ordering::SeqCst);
        assert_eq!(fx.service.sweep_expired_reservations().await.unwrap(), 1);
        assert_eq!(fx.repo.charged_bytes(fx.owner).await.unwrap(), 0);
    }

    #[test]
    fn object_keys_are_sanitized_and_unique() {
        let a = generate_object_key("my report (v2).pdf");
        let b = generate_object_key("my report (v2).pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("my_report__v2_.pdf"));
        assert!(!a.contains('/'));
        assert!(!a.contains(' '));
    }
}
