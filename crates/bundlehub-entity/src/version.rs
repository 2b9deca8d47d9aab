//! Version entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One snapshot-in-time of a bundle's file set.
///
/// The pair (bundle_id, created_at) is unique: re-adding a version with
/// the same bundle name and timestamp is treated as "already added".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Version {
    /// Unique version identifier.
    pub id: i64,
    /// The owning bundle.
    pub bundle_id: i64,
    /// Creation timestamp; the business key together with the bundle name.
    pub created_at: DateTime<Utc>,
    /// When this version's files may be cleaned up.
    pub expires_at: Option<DateTime<Utc>>,
    /// Set exactly once when the version's files are materialized into
    /// the data root. Never cleared by normal operation.
    pub included_at: Option<DateTime<Utc>>,
    /// Legacy whole-version archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
    /// Legacy path of the whole-version archive.
    pub archive_path: Option<String>,
    /// Legacy checksum of the whole-version archive.
    pub archive_checksum: Option<String>,
    /// Free-text classification, distinct from file tags.
    pub tag: Option<String>,
}

impl Version {
    /// Whether this version's files were materialized into the data root.
    pub fn is_included(&self) -> bool {
        self.included_at.is_some()
    }
}
