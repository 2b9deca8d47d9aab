//! Row deletion.
//!
//! Deleting a bundle cascades to its versions and their files through
//! the schema's foreign keys; no per-row cleanup is needed here. On-disk
//! cleanup and the archived-file refusal are policy of the service layer.

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;

use super::Store;

impl Store {
    /// Delete a bundle and, by cascade, its versions and files.
    pub async fn delete_bundle(&self, bundle_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bundles WHERE id = ?")
            .bind(bundle_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete bundle", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a version and, by cascade, its files.
    pub async fn delete_version(&self, version_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM versions WHERE id = ?")
            .bind(version_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete version", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a single file row.
    pub async fn delete_file(&self, file_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }
}
