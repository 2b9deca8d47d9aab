//! Materializing a bundle version into the data root.
//!
//! Inclusion hard-links every file of a version into
//! `<root>/<bundle>/<version date>/` and rewrites the stored paths to be
//! root-relative. It happens at most once per version: the store-side
//! guarded update arbitrates racing attempts.

use std::collections::HashSet;

use chrono::Utc;
use tracing::info;

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_database::{FilterParams, Store};
use bundlehub_entity::Version;
use bundlehub_storage::DataRoot;

/// Hard-links version files into the data root, exactly once per version.
#[derive(Debug, Clone)]
pub struct InclusionEngine {
    store: Store,
    root: DataRoot,
}

impl InclusionEngine {
    pub fn new(store: Store, root: DataRoot) -> Self {
        Self { store, root }
    }

    /// Include a version: link its files under the version directory and
    /// mark the version included.
    ///
    /// Partially linked files are not rolled back on failure; hard links
    /// are cheap and a retry after the underlying problem is fixed will
    /// fail on the guarded inclusion mark, never corrupt data.
    pub async fn include_version(&self, version_id: i64) -> AppResult<Version> {
        let version = self
            .store
            .get_version_by_id(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;
        if let Some(at) = version.included_at {
            return Err(AppError::already_included(at));
        }

        let bundle = self
            .store
            .get_bundle_by_id(version.bundle_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Bundle {} not found", version.bundle_id))
            })?;
        let files = self
            .store
            .get_files(&FilterParams {
                version_id: Some(version.id),
                ..Default::default()
            })
            .await?;

        // Every file lands flat in one directory under its base name, so
        // duplicate base names must be rejected before any link is made.
        let mut seen = HashSet::new();
        for file in &files {
            let name = base_name(file)?;
            if !seen.insert(name.to_string()) {
                return Err(AppError::validation(format!(
                    "Version {} has colliding file name '{name}'",
                    version.id
                )));
            }
        }

        let dir = self.root.version_dir(&bundle.name, version.created_at);
        for file in &files {
            let src = file.full_path(self.root.path());
            let dest = dir.join(base_name(file)?);
            self.root.hard_link(&src, &dest).await?;

            let relative = self.root.relativize(&dest).await?;
            self.store
                .update_file_path(file.id, &relative.display().to_string())
                .await?;
        }

        self.store
            .set_version_included(version.id, Utc::now())
            .await?;
        info!(bundle = %bundle.name, version = version.id, files = files.len(), "Included version");

        self.store
            .get_version_by_id(version.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {} not found", version.id)))
    }
}

fn base_name(file: &bundlehub_entity::BundleFile) -> AppResult<&str> {
    file.file_name()
        .ok_or_else(|| AppError::validation(format!("File path has no name: {}", file.path)))
}
