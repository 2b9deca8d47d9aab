//! The managed data root.
//!
//! Every included file lives under one root directory, laid out as
//! `<root>/<bundle name>/<version date>/<file name>`. Stored paths that
//! are relative are interpreted against this root; absolute stored paths
//! point outside it and are left untouched.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;

/// Root directory under which bundle versions are materialized.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    /// Open (creating if needed) a data root at the given path.
    ///
    /// The root is canonicalized so that prefix checks against it are
    /// not fooled by `..` segments or symlinks.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create data root: {}", root.display()),
                e,
            )
        })?;
        let root = fs::canonicalize(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to canonicalize data root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// The root directory itself.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a stored path to an absolute one.
    ///
    /// Absolute stored paths are returned unchanged; relative ones are
    /// joined under the root.
    pub fn full_path(&self, stored: &str) -> PathBuf {
        let path = Path::new(stored);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// The directory a bundle version's files are linked into.
    pub fn version_dir(&self, bundle_name: &str, created_at: DateTime<Utc>) -> PathBuf {
        self.root
            .join(bundle_name)
            .join(created_at.format("%Y-%m-%d").to_string())
    }

    /// Express an absolute path inside the root as a root-relative one.
    ///
    /// Fails when the path does not live under the root.
    pub async fn relativize(&self, path: &Path) -> AppResult<PathBuf> {
        let canonical = fs::canonicalize(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to canonicalize path: {}", path.display()),
                e,
            )
        })?;
        canonical
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .map_err(|_| {
                AppError::storage(format!(
                    "Path is outside the data root: {}",
                    canonical.display()
                ))
            })
    }

    /// Hard-link `src` to `dest`, creating `dest`'s parent directories.
    pub async fn hard_link(&self, src: &Path, dest: &Path) -> AppResult<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        fs::hard_link(src, dest).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!(
                    "Failed to hard-link {} -> {}",
                    src.display(),
                    dest.display()
                ),
                e,
            )
        })?;
        debug!(src = %src.display(), dest = %dest.display(), "Linked file");
        Ok(())
    }

    /// Whether a stored path currently resolves to a file on disk.
    pub fn is_on_disk(&self, stored: &str) -> bool {
        self.full_path(stored).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn root(dir: &tempfile::TempDir) -> DataRoot {
        DataRoot::new(dir.path().join("bundles").to_str().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir).await;

        assert_eq!(
            root.full_path("case42/2024-01-01/a.vcf"),
            root.path().join("case42/2024-01-01/a.vcf")
        );
        assert_eq!(
            root.full_path("/outside/a.vcf"),
            PathBuf::from("/outside/a.vcf")
        );
    }

    #[tokio::test]
    async fn test_version_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir).await;

        let created = "2024-01-15T23:59:59Z".parse().unwrap();
        assert_eq!(
            root.version_dir("case42", created),
            root.path().join("case42").join("2024-01-15")
        );
    }

    #[tokio::test]
    async fn test_relativize_inside_and_outside() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir).await;

        let inside = root.path().join("case42/2024-01-01/a.vcf");
        std::fs::create_dir_all(inside.parent().unwrap()).unwrap();
        std::fs::write(&inside, b"x").unwrap();
        assert_eq!(
            root.relativize(&inside).await.unwrap(),
            PathBuf::from("case42/2024-01-01/a.vcf")
        );

        let outside = dir.path().join("elsewhere.vcf");
        std::fs::write(&outside, b"x").unwrap();
        assert!(root.relativize(&outside).await.is_err());
    }

    #[tokio::test]
    async fn test_hard_link_shares_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = root(&dir).await;

        let src = dir.path().join("src.vcf");
        std::fs::write(&src, b"payload").unwrap();

        let dest = root.path().join("case42/2024-01-01/src.vcf");
        root.hard_link(&src, &dest).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
        assert!(root.is_on_disk("case42/2024-01-01/src.vcf"));
    }
}
