//! Bundle entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named logical grouping of file-delivery sets.
///
/// A bundle owns an ordered collection of [`crate::Version`]s, newest
/// first. Deleting a bundle cascades to its versions and their files.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bundle {
    /// Unique bundle identifier.
    pub id: i64,
    /// Globally unique bundle name.
    pub name: String,
    /// When the bundle was created.
    pub created_at: DateTime<Utc>,
}
