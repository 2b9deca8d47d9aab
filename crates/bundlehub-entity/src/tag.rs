//! Tag entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A label, reusable across files.
///
/// Tag names are unique; creation is idempotent at the store level
/// (requesting an existing name returns the existing row).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: i64,
    /// Globally unique tag name.
    pub name: String,
    /// Optional grouping category.
    pub category: Option<String>,
    /// When the tag was first created.
    pub created_at: DateTime<Utc>,
}
