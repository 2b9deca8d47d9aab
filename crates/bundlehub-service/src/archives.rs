//! Archive and retrieval submission bookkeeping.
//!
//! Archival and retrieval are performed by an external system; this
//! service only records submissions, completions, and the checksums
//! used to verify restored files.

use tracing::info;

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_database::Store;
use bundlehub_entity::{Archive, BundleFile};
use bundlehub_storage::{DataRoot, sha1_checksum};

/// Records external archival/retrieval jobs against tracked files.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    store: Store,
    root: DataRoot,
}

impl ArchiveService {
    pub fn new(store: Store, root: DataRoot) -> Self {
        Self { store, root }
    }

    /// Record a file's submission to archiving.
    ///
    /// The file's content checksum is computed and stored first, so a
    /// later restore can be verified against it. A file may be
    /// submitted at most once.
    pub async fn submit_archiving(&self, file_id: i64, task_id: i64) -> AppResult<Archive> {
        let file = self.get_file(file_id).await?;

        let checksum = sha1_checksum(&file.full_path(self.root.path())).await?;
        self.store.update_file_checksum(file.id, &checksum).await?;

        let archive = self.store.create_archive(file.id, task_id).await?;
        info!(path = %file.path, task_id, "Submitted file for archiving");
        Ok(archive)
    }

    /// Record a fresh task id for a re-submitted archival job.
    pub async fn resubmit_archiving(&self, file_id: i64, task_id: i64) -> AppResult<()> {
        let archive = self.get_archive(file_id).await?;
        self.store.update_archiving_task_id(archive.id, task_id).await
    }

    /// Record a file's submission to retrieval from the archive.
    pub async fn submit_retrieval(&self, file_id: i64, task_id: i64) -> AppResult<()> {
        let archive = self.get_archive(file_id).await?;
        self.store.update_retrieval_task_id(archive.id, task_id).await
    }

    /// Stamp every archive of a finished archival task; returns how many.
    pub async fn mark_archival_task_done(&self, task_id: i64) -> AppResult<u64> {
        let stamped = self.store.update_finished_archival_task(task_id).await?;
        info!(task_id, stamped, "Archival task finished");
        Ok(stamped)
    }

    /// Stamp every archive of a finished retrieval task; returns how many.
    pub async fn mark_retrieval_task_done(&self, task_id: i64) -> AppResult<u64> {
        let stamped = self.store.update_finished_retrieval_task(task_id).await?;
        info!(task_id, stamped, "Retrieval task finished");
        Ok(stamped)
    }

    /// Verify a restored file's content against its recorded checksum.
    pub async fn verify_restored(&self, file: &BundleFile) -> AppResult<()> {
        let recorded = file.checksum.as_deref().ok_or_else(|| {
            AppError::validation(format!("File {} has no recorded checksum", file.path))
        })?;
        let actual = sha1_checksum(&file.full_path(self.root.path())).await?;
        if actual != recorded {
            return Err(AppError::validation(format!(
                "Checksum mismatch for {}: recorded {recorded}, found {actual}",
                file.path
            )));
        }
        Ok(())
    }

    async fn get_file(&self, file_id: i64) -> AppResult<BundleFile> {
        self.store
            .get_file_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    async fn get_archive(&self, file_id: i64) -> AppResult<Archive> {
        self.store
            .get_archive_by_file_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} has no archive")))
    }
}
