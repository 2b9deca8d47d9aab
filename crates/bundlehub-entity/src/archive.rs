//! Archive entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tracks an out-of-band archival job for exactly one file.
///
/// At most one archive row may exist per file, enforced by a uniqueness
/// constraint on `file_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Archive {
    /// Unique archive identifier.
    pub id: i64,
    /// The archived file (one-to-one).
    pub file_id: i64,
    /// Task id of the external archival submission.
    pub archiving_task_id: i64,
    /// Null while archiving is in progress.
    pub archived_at: Option<DateTime<Utc>>,
    /// Task id of the most recent retrieval submission, if any.
    pub retrieval_task_id: Option<i64>,
    /// Null while no retrieval finished.
    pub retrieved_at: Option<DateTime<Utc>>,
}

impl Archive {
    /// Whether an archival job is currently in flight.
    pub fn archiving_ongoing(&self) -> bool {
        self.archived_at.is_none()
    }

    /// Whether a retrieval job is currently in flight.
    pub fn retrieval_ongoing(&self) -> bool {
        self.retrieval_task_id.is_some() && self.retrieved_at.is_none()
    }
}
