//! Composable query filters.
//!
//! Every predicate has the uniform shape `fn(&mut QueryBuilder, &FilterParams)`
//! and appends `AND ...` clauses to a base query. A filter whose parameter is
//! unset pushes nothing, so callers can select an ordered list of filters and
//! pass only the parameters relevant to them. [`apply`] folds the list
//! left-to-right over the base query.
//!
//! Filters over files assume the canonical base query of the store: `files`
//! joined to `versions` and `bundles`, LEFT JOINed to `archives`.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

/// Sparse parameters consumed by the filter functions.
///
/// Unset fields turn the corresponding filters into no-ops.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    /// Bundle surrogate key.
    pub bundle_id: Option<i64>,
    /// Exact bundle name.
    pub bundle_name: Option<String>,
    /// Version surrogate key.
    pub version_id: Option<i64>,
    /// Exact version creation timestamp.
    pub version_created_at: Option<DateTime<Utc>>,
    /// Strict upper bound on the version creation timestamp.
    pub before: Option<DateTime<Utc>>,
    /// File surrogate key.
    pub file_id: Option<i64>,
    /// Exact stored file path.
    pub file_path: Option<String>,
    /// Exact tag name.
    pub tag_name: Option<String>,
    /// Tag-set membership: a file matches only if it carries every listed
    /// tag. An empty list is a no-op.
    pub tag_names: Vec<String>,
    /// Restrict to files with (true) or without (false) an archive row.
    pub is_archived: Option<bool>,
    /// Restrict to archives whose archival job is in flight.
    pub archiving_ongoing: bool,
    /// Restrict to archives whose retrieval job is in flight.
    pub retrieval_ongoing: bool,
    /// Exact archival task id.
    pub archiving_task_id: Option<i64>,
    /// Exact retrieval task id.
    pub retrieval_task_id: Option<i64>,
    /// Strict upper bound on the retrieval timestamp.
    pub retrieved_before: Option<DateTime<Utc>>,
    /// Cap on the number of returned rows.
    pub limit: Option<i64>,
}

/// A single composable filter with the uniform signature.
pub type Filter = for<'a, 'b> fn(&'b mut QueryBuilder<'a, Sqlite>, &FilterParams);

/// Fold an ordered list of filters left-to-right over a base query.
pub fn apply(qb: &mut QueryBuilder<'_, Sqlite>, filters: &[Filter], params: &FilterParams) {
    for filter in filters {
        filter(qb, params);
    }
}

/// Restrict to one bundle by surrogate key.
pub fn bundle_by_id(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(id) = params.bundle_id {
        qb.push(" AND bundles.id = ").push_bind(id);
    }
}

/// Restrict to one bundle by exact name.
pub fn bundle_by_name(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(name) = &params.bundle_name {
        qb.push(" AND bundles.name = ").push_bind(name.clone());
    }
}

/// Restrict to one version by surrogate key.
pub fn version_by_id(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(id) = params.version_id {
        qb.push(" AND versions.id = ").push_bind(id);
    }
}

/// Restrict to versions created strictly before a date.
pub fn version_created_before(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(before) = params.before {
        qb.push(" AND versions.created_at < ").push_bind(before);
    }
}

/// Restrict to versions created at an exact timestamp.
///
/// Combined with [`bundle_by_name`] this backs the version-uniqueness check.
pub fn version_created_at(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(at) = params.version_created_at {
        qb.push(" AND versions.created_at = ").push_bind(at);
    }
}

/// Restrict to one file by surrogate key.
pub fn file_by_id(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(id) = params.file_id {
        qb.push(" AND files.id = ").push_bind(id);
    }
}

/// Restrict to one file by exact stored path.
pub fn file_by_path(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(path) = &params.file_path {
        qb.push(" AND files.path = ").push_bind(path.clone());
    }
}

/// Restrict to files carrying every tag of the requested set.
///
/// Computed via join, group, and count-having so that "all of", not
/// "any of", semantics hold. An empty set pushes nothing; grouping over
/// it would wrongly exclude untagged files.
pub fn file_by_tags(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if params.tag_names.is_empty() {
        return;
    }
    qb.push(
        " AND files.id IN (\
         SELECT file_tags.file_id FROM file_tags \
         JOIN tags ON tags.id = file_tags.tag_id \
         WHERE tags.name IN (",
    );
    {
        let mut names = qb.separated(", ");
        for name in &params.tag_names {
            names.push_bind(name.clone());
        }
    }
    qb.push(
        ") GROUP BY file_tags.file_id \
         HAVING COUNT(DISTINCT tags.id) = ",
    )
    .push_bind(params.tag_names.len() as i64)
    .push(")");
}

/// Restrict to files with or without an archive row.
///
/// Relies on the base query's LEFT JOIN onto `archives`.
pub fn file_is_archived(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    match params.is_archived {
        Some(true) => {
            qb.push(" AND archives.id IS NOT NULL");
        }
        Some(false) => {
            qb.push(" AND archives.id IS NULL");
        }
        None => {}
    }
}

/// Restrict to one tag by exact name.
pub fn tag_by_name(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(name) = &params.tag_name {
        qb.push(" AND tags.name = ").push_bind(name.clone());
    }
}

/// Restrict to archives whose archival job is still in flight.
pub fn archive_archiving_ongoing(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if params.archiving_ongoing {
        qb.push(" AND archives.archiving_task_id IS NOT NULL AND archives.archived_at IS NULL");
    }
}

/// Restrict to archives whose retrieval job is still in flight.
pub fn archive_retrieval_ongoing(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if params.retrieval_ongoing {
        qb.push(" AND archives.retrieval_task_id IS NOT NULL AND archives.retrieved_at IS NULL");
    }
}

/// Restrict to archives submitted under an archival task id.
pub fn archive_by_archiving_task(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(task_id) = params.archiving_task_id {
        qb.push(" AND archives.archiving_task_id = ").push_bind(task_id);
    }
}

/// Restrict to archives submitted under a retrieval task id.
pub fn archive_by_retrieval_task(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(task_id) = params.retrieval_task_id {
        qb.push(" AND archives.retrieval_task_id = ").push_bind(task_id);
    }
}

/// Restrict to archives retrieved strictly before a date.
pub fn archive_retrieved_before(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(before) = params.retrieved_before {
        qb.push(" AND archives.retrieved_at < ").push_bind(before);
    }
}

/// Cap the number of returned rows. Apply last.
pub fn limit(qb: &mut QueryBuilder<'_, Sqlite>, params: &FilterParams) {
    if let Some(limit) = params.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
}
