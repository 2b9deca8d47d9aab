//! Add-bundle request schema.
//!
//! This is the input contract consumed when registering a bundle version:
//! `{name, created, expires?, files: [{path: string | [string], archive,
//! tags}]}`. A missing `name` or `created` fails deserialization before
//! any store mutation.

use bundlehub_core::error::AppError;
use bundlehub_core::result::AppResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request to register one bundle version and its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRequest {
    /// Bundle name (required).
    pub name: String,
    /// Version timestamp (required); the business key with the name.
    pub created: DateTime<Utc>,
    /// When the version's files may be cleaned up.
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    /// Free-text version classification, distinct from file tags.
    #[serde(default)]
    pub tag: Option<String>,
    /// The files of this version.
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

/// One file entry of an add-bundle request.
///
/// A single entry may name several literal paths sharing the same tag set;
/// each path becomes its own file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    /// One path, or a list of paths sharing this entry's tags.
    pub path: PathSpec,
    /// Whether the file(s) should be preserved in long-term storage.
    #[serde(default)]
    pub archive: bool,
    /// Tag names to attach to every path of this entry.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Either a single literal path or a list of paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSpec {
    /// One literal path.
    One(String),
    /// Several literal paths fanning out to one file row each.
    Many(Vec<String>),
}

impl PathSpec {
    /// The literal paths of this spec.
    pub fn paths(&self) -> &[String] {
        match self {
            Self::One(path) => std::slice::from_ref(path),
            Self::Many(paths) => paths,
        }
    }
}

impl BundleRequest {
    /// Validate the request shape before touching the store.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Bundle name must not be empty"));
        }
        for spec in &self.files {
            if spec.path.paths().is_empty() {
                return Err(AppError::validation(format!(
                    "File entry of bundle '{}' names no paths",
                    self.name
                )));
            }
            if spec.path.paths().iter().any(|p| p.trim().is_empty()) {
                return Err(AppError::validation(format!(
                    "File entry of bundle '{}' contains an empty path",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// All literal paths of the request, in entry order.
    pub fn all_paths(&self) -> Vec<&str> {
        self.files
            .iter()
            .flat_map(|spec| spec.path.paths())
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_path() {
        let request: BundleRequest = serde_json::from_str(
            r#"{
                "name": "case42",
                "created": "2024-01-01T12:00:00Z",
                "files": [{"path": "/tmp/a.vcf", "archive": false, "tags": ["vcf"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(request.files[0].path.paths(), ["/tmp/a.vcf"]);
        request.validate().unwrap();
    }

    #[test]
    fn test_parse_path_list_fans_out() {
        let request: BundleRequest = serde_json::from_str(
            r#"{
                "name": "case42",
                "created": "2024-01-01T12:00:00Z",
                "files": [{"path": ["/tmp/a.vcf", "/tmp/b.vcf"], "tags": ["vcf"]}]
            }"#,
        )
        .unwrap();
        assert_eq!(request.all_paths(), ["/tmp/a.vcf", "/tmp/b.vcf"]);
        assert!(!request.files[0].archive);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result: Result<BundleRequest, _> =
            serde_json::from_str(r#"{"created": "2024-01-01T12:00:00Z", "files": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_name_fails_validation() {
        let request: BundleRequest = serde_json::from_str(
            r#"{"name": "  ", "created": "2024-01-01T12:00:00Z", "files": []}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_path_fails_validation() {
        let request: BundleRequest = serde_json::from_str(
            r#"{
                "name": "case42",
                "created": "2024-01-01T12:00:00Z",
                "files": [{"path": ""}]
            }"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }
}
