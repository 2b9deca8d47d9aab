//! Bundle registration, file listings, and deletion with on-disk cleanup.

use tokio::fs;
use tracing::{info, warn};

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use bundlehub_database::{FilterParams, Store};
use bundlehub_entity::{Bundle, BundleFile, BundleRequest, Version};
use bundlehub_storage::DataRoot;

/// Bundle lifecycle operations.
#[derive(Debug, Clone)]
pub struct BundleService {
    store: Store,
    root: DataRoot,
}

impl BundleService {
    pub fn new(store: Store, root: DataRoot) -> Self {
        Self { store, root }
    }

    /// Register a new bundle version after verifying every source file.
    ///
    /// All of the request's paths must exist on disk before anything is
    /// persisted; one missing file rejects the whole request. Returns
    /// `Ok(None)` when the version was already registered.
    pub async fn add_bundle(
        &self,
        request: &BundleRequest,
    ) -> AppResult<Option<(Bundle, Version)>> {
        request.validate()?;
        self.check_sources(request)?;

        let added = self.store.add_bundle(request).await?;
        if let Some((bundle, version)) = &added {
            info!(bundle = %bundle.name, version = version.id, "Registered bundle version");
        }
        Ok(added)
    }

    /// Append a version to an existing bundle, resolved by name.
    pub async fn add_version(
        &self,
        bundle_name: &str,
        request: &BundleRequest,
    ) -> AppResult<Option<Version>> {
        request.validate()?;
        self.check_sources(request)?;
        let bundle = self.get_bundle(bundle_name).await?;
        self.store.add_version(&bundle, request).await
    }

    /// Attach a file to the latest version of an existing bundle.
    pub async fn add_file(
        &self,
        path: &str,
        bundle_name: &str,
        to_archive: bool,
        tag_names: &[String],
    ) -> AppResult<BundleFile> {
        if !self.root.is_on_disk(path) {
            return Err(AppError::missing_file(path));
        }
        let bundle = self.get_bundle(bundle_name).await?;
        self.store.add_file(path, &bundle, to_archive, tag_names).await
    }

    /// Resolve a bundle by name, failing when it does not exist.
    pub async fn get_bundle(&self, name: &str) -> AppResult<Bundle> {
        self.store
            .get_bundle_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Bundle '{name}' not found")))
    }

    /// List files matching the criteria, optionally partitioned by
    /// on-disk presence.
    ///
    /// `local_only` keeps files whose stored path resolves to a file on
    /// disk; `remote_only` keeps the rest. Disk presence is a runtime
    /// property, so the partition happens after the query.
    pub async fn get_files(
        &self,
        params: &FilterParams,
        local_only: bool,
        remote_only: bool,
    ) -> AppResult<Vec<BundleFile>> {
        if local_only && remote_only {
            return Err(AppError::validation(
                "local_only and remote_only are mutually exclusive",
            ));
        }
        let mut files = self.store.get_files(params).await?;
        if local_only {
            files.retain(|f| self.root.is_on_disk(&f.path));
        } else if remote_only {
            files.retain(|f| !self.root.is_on_disk(&f.path));
        }
        Ok(files)
    }

    /// The files of a list whose stored path no longer resolves on disk.
    ///
    /// Pure over the given list; callers holding an already-materialized
    /// listing can partition it without another query.
    pub fn files_not_on_disk<'a>(&self, files: &'a [BundleFile]) -> Vec<&'a BundleFile> {
        files
            .iter()
            .filter(|f| !self.root.is_on_disk(&f.path))
            .collect()
    }

    /// Delete a file row, cleaning up its on-disk link when it was
    /// materialized by inclusion.
    ///
    /// Files with an archive row are refused; the archive bookkeeping
    /// must be resolved first.
    pub async fn delete_file(&self, file_id: i64) -> AppResult<BundleFile> {
        let file = self
            .store
            .get_file_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        if self.store.get_archive_by_file_id(file.id).await?.is_some() {
            return Err(AppError::conflict(format!(
                "File {} has an archive and cannot be deleted",
                file.path
            )));
        }

        let version = self.store.get_version_by_id(file.version_id).await?;
        let included = version.as_ref().is_some_and(Version::is_included);
        if included && self.root.is_on_disk(&file.path) {
            remove_file(&self.root.full_path(&file.path)).await?;
        }

        self.store.delete_file(file.id).await?;
        info!(path = %file.path, "Deleted file");
        Ok(file)
    }

    /// Delete a version, removing its materialized directory first.
    pub async fn delete_version(&self, version_id: i64) -> AppResult<()> {
        let version = self
            .store
            .get_version_by_id(version_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Version {version_id} not found")))?;
        let bundle = self
            .store
            .get_bundle_by_id(version.bundle_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Bundle {} not found", version.bundle_id))
            })?;

        if version.is_included() {
            remove_dir(&self.root.version_dir(&bundle.name, version.created_at)).await?;
        }
        self.store.delete_version(version.id).await?;
        info!(bundle = %bundle.name, version = version.id, "Deleted version");
        Ok(())
    }

    /// Delete a bundle and all of its versions, including their
    /// materialized directories.
    pub async fn delete_bundle(&self, name: &str) -> AppResult<()> {
        let bundle = self.get_bundle(name).await?;

        for version in self.store.get_versions_for_bundle(bundle.id).await? {
            if version.is_included() {
                remove_dir(&self.root.version_dir(&bundle.name, version.created_at)).await?;
            }
        }
        self.store.delete_bundle(bundle.id).await?;
        info!(bundle = %bundle.name, "Deleted bundle");
        Ok(())
    }

    /// Reject the request when any referenced source file is absent.
    fn check_sources(&self, request: &BundleRequest) -> AppResult<()> {
        for path in request.all_paths() {
            if !self.root.is_on_disk(path) {
                warn!(path, "Source file missing, rejecting request");
                return Err(AppError::missing_file(path));
            }
        }
        Ok(())
    }
}

async fn remove_file(path: &std::path::Path) -> AppResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::with_source(
            bundlehub_core::error::ErrorKind::Storage,
            format!("Failed to remove file: {}", path.display()),
            e,
        )),
    }
}

async fn remove_dir(path: &std::path::Path) -> AppResult<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::with_source(
            bundlehub_core::error::ErrorKind::Storage,
            format!("Failed to remove directory: {}", path.display()),
            e,
        )),
    }
}
