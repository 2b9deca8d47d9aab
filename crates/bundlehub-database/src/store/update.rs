//! Archive/retrieval bookkeeping and inclusion primitives.

use chrono::{DateTime, Utc};

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;

use super::Store;

impl Store {
    /// Stamp an archive's completion time, if not already stamped.
    ///
    /// Idempotent: repeated calls after the first are no-ops, preserving
    /// the original completion time. Returns whether a stamp was written.
    pub async fn update_archiving_time_stamp(&self, archive_id: i64) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE archives SET archived_at = ? WHERE id = ? AND archived_at IS NULL")
                .bind(Utc::now())
                .bind(archive_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to stamp archival", e)
                })?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp an archive's retrieval time, if not already stamped.
    pub async fn update_retrieval_time_stamp(&self, archive_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE archives SET retrieved_at = ? WHERE id = ? AND retrieved_at IS NULL",
        )
        .bind(Utc::now())
        .bind(archive_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to stamp retrieval", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp every unstamped archive submitted under an archival task id.
    ///
    /// One task id may fan out to many files; returns how many archives
    /// were stamped.
    pub async fn update_finished_archival_task(&self, archiving_task_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE archives SET archived_at = ? \
             WHERE archiving_task_id = ? AND archived_at IS NULL",
        )
        .bind(Utc::now())
        .bind(archiving_task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to finish archival task", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Stamp every unstamped archive submitted under a retrieval task id.
    pub async fn update_finished_retrieval_task(&self, retrieval_task_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE archives SET retrieved_at = ? \
             WHERE retrieval_task_id = ? AND retrieved_at IS NULL",
        )
        .bind(Utc::now())
        .bind(retrieval_task_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to finish retrieval task", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Record the task id of a (re-)submitted archival job.
    pub async fn update_archiving_task_id(
        &self,
        archive_id: i64,
        archiving_task_id: i64,
    ) -> AppResult<()> {
        sqlx::query("UPDATE archives SET archiving_task_id = ? WHERE id = ?")
            .bind(archiving_task_id)
            .bind(archive_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set archival task id", e)
            })?;
        Ok(())
    }

    /// Record the task id of a (re-)submitted retrieval job.
    pub async fn update_retrieval_task_id(
        &self,
        archive_id: i64,
        retrieval_task_id: i64,
    ) -> AppResult<()> {
        sqlx::query("UPDATE archives SET retrieval_task_id = ? WHERE id = ?")
            .bind(retrieval_task_id)
            .bind(archive_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set retrieval task id", e)
            })?;
        Ok(())
    }

    /// Mark a version as included, exactly once.
    ///
    /// The guarded update is the store-side arbiter for racing inclusion
    /// attempts: at most one caller's stamp can win. A version that is
    /// already included fails with its original timestamp attached.
    pub async fn set_version_included(
        &self,
        version_id: i64,
        included_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE versions SET included_at = ? WHERE id = ? AND included_at IS NULL")
                .bind(included_at)
                .bind(version_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to mark inclusion", e)
                })?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.get_version_by_id(version_id).await? {
            Some(version) => match version.included_at {
                Some(at) => Err(AppError::already_included(at)),
                None => Err(AppError::database(format!(
                    "Failed to mark version {version_id} included"
                ))),
            },
            None => Err(AppError::not_found(format!(
                "Version {version_id} not found"
            ))),
        }
    }

    /// Rewrite a file's stored path.
    pub async fn update_file_path(&self, file_id: i64, path: &str) -> AppResult<()> {
        sqlx::query("UPDATE files SET path = ? WHERE id = ?")
            .bind(path)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update file path", e)
            })?;
        Ok(())
    }

    /// Record a file's content checksum.
    pub async fn update_file_checksum(&self, file_id: i64, checksum: &str) -> AppResult<()> {
        sqlx::query("UPDATE files SET checksum = ? WHERE id = ?")
            .bind(checksum)
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update checksum", e)
            })?;
        Ok(())
    }
}
