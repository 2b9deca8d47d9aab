//! Tracked file entity model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One tracked file belonging to exactly one version.
///
/// The stored path is absolute while the owning version is un-included
/// and rewritten to be root-relative at inclusion time. Paths are
/// globally unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BundleFile {
    /// Unique file identifier.
    pub id: i64,
    /// The owning version.
    pub version_id: i64,
    /// Stored path; absolute before inclusion, root-relative after.
    pub path: String,
    /// Content checksum, filled in when the file is submitted for
    /// archiving or verified after a restore.
    pub checksum: Option<String>,
    /// Whether this file should be preserved in long-term storage.
    pub to_archive: bool,
}

impl BundleFile {
    /// Resolve the stored path against the data root.
    ///
    /// An absolute stored path is returned unchanged; a relative one is
    /// joined onto the root.
    pub fn full_path(&self, root: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// The file's basename, if the stored path has one.
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path).file_name().and_then(|n| n.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> BundleFile {
        BundleFile {
            id: 1,
            version_id: 1,
            path: path.to_string(),
            checksum: None,
            to_archive: false,
        }
    }

    #[test]
    fn test_full_path_absolute_unchanged() {
        let f = file("/tmp/source/a.vcf");
        assert_eq!(
            f.full_path(Path::new("/data/bundles")),
            PathBuf::from("/tmp/source/a.vcf")
        );
    }

    #[test]
    fn test_full_path_relative_joined() {
        let f = file("case42/2024-01-01/a.vcf");
        assert_eq!(
            f.full_path(Path::new("/data/bundles")),
            PathBuf::from("/data/bundles/case42/2024-01-01/a.vcf")
        );
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file("/tmp/a.vcf").file_name(), Some("a.vcf"));
    }
}
