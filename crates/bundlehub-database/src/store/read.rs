//! Read-only lookups and listings, built from the filter library.
//!
//! All by-key lookups return `Ok(None)` when nothing matches; reacting
//! to absence is the caller's responsibility.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;
use bundlehub_entity::{Archive, Bundle, BundleFile, Tag, Version};

use crate::filters::{self, Filter, FilterParams};
use super::Store;

/// Canonical base query for file listings: files joined to their version
/// and bundle, LEFT JOINed to archives so archive-presence filters can
/// test `archives.id` for null.
const FILE_BASE: &str = "SELECT files.* FROM files \
     JOIN versions ON versions.id = files.version_id \
     JOIN bundles ON bundles.id = versions.bundle_id \
     LEFT JOIN archives ON archives.file_id = files.id \
     WHERE 1 = 1";

const ARCHIVE_BASE: &str = "SELECT archives.* FROM archives WHERE 1 = 1";

/// The ordered filter pipeline every file listing runs through.
const FILE_FILTERS: &[Filter] = &[
    filters::file_by_id,
    filters::file_by_path,
    filters::bundle_by_name,
    filters::version_by_id,
    filters::file_by_tags,
    filters::file_is_archived,
    filters::version_created_before,
    filters::archive_retrieved_before,
    filters::limit,
];

const ARCHIVE_FILTERS: &[Filter] = &[
    filters::archive_archiving_ongoing,
    filters::archive_retrieval_ongoing,
    filters::archive_by_archiving_task,
    filters::archive_by_retrieval_task,
];

impl Store {
    /// Find a bundle by ID.
    pub async fn get_bundle_by_id(&self, id: i64) -> AppResult<Option<Bundle>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT bundles.* FROM bundles WHERE 1 = 1");
        filters::bundle_by_id(
            &mut qb,
            &FilterParams {
                bundle_id: Some(id),
                ..Default::default()
            },
        );
        qb.build_query_as::<Bundle>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find bundle", e))
    }

    /// Find a bundle by exact name.
    pub async fn get_bundle_by_name(&self, name: &str) -> AppResult<Option<Bundle>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT bundles.* FROM bundles WHERE 1 = 1");
        filters::bundle_by_name(
            &mut qb,
            &FilterParams {
                bundle_name: Some(name.to_string()),
                ..Default::default()
            },
        );
        qb.build_query_as::<Bundle>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find bundle by name", e)
            })
    }

    /// List all bundles, newest first.
    pub async fn get_bundles(&self) -> AppResult<Vec<Bundle>> {
        sqlx::query_as::<_, Bundle>("SELECT * FROM bundles ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bundles", e))
    }

    /// Find a version by ID.
    pub async fn get_version_by_id(&self, id: i64) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>("SELECT * FROM versions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    /// Find the version of a bundle created at an exact timestamp.
    ///
    /// Backs the version-uniqueness check of the create operations.
    pub async fn get_version_by_date_and_bundle_name(
        &self,
        created_at: DateTime<Utc>,
        bundle_name: &str,
    ) -> AppResult<Option<Version>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT versions.* FROM versions \
             JOIN bundles ON bundles.id = versions.bundle_id \
             WHERE 1 = 1",
        );
        let params = FilterParams {
            bundle_name: Some(bundle_name.to_string()),
            version_created_at: Some(created_at),
            ..Default::default()
        };
        filters::apply(
            &mut qb,
            &[filters::bundle_by_name, filters::version_created_at],
            &params,
        );
        qb.build_query_as::<Version>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find version by date", e)
            })
    }

    /// List a bundle's versions, newest first.
    pub async fn get_versions_for_bundle(&self, bundle_id: i64) -> AppResult<Vec<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE bundle_id = ? ORDER BY created_at DESC",
        )
        .bind(bundle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    /// Find a bundle's most recent version.
    pub async fn get_latest_version(&self, bundle_id: i64) -> AppResult<Option<Version>> {
        sqlx::query_as::<_, Version>(
            "SELECT * FROM versions WHERE bundle_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(bundle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find latest version", e)
        })
    }

    /// Find a tag by exact name.
    pub async fn get_tag(&self, name: &str) -> AppResult<Option<Tag>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT tags.* FROM tags WHERE 1 = 1");
        filters::tag_by_name(
            &mut qb,
            &FilterParams {
                tag_name: Some(name.to_string()),
                ..Default::default()
            },
        );
        qb.build_query_as::<Tag>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tag", e))
    }

    /// List all tags.
    pub async fn get_tags(&self) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tags", e))
    }

    /// Find a file by ID.
    pub async fn get_file_by_id(&self, id: i64) -> AppResult<Option<BundleFile>> {
        let mut qb = QueryBuilder::<Sqlite>::new(FILE_BASE);
        let params = FilterParams {
            file_id: Some(id),
            ..Default::default()
        };
        filters::apply(&mut qb, FILE_FILTERS, &params);
        qb.build_query_as::<BundleFile>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List files matching the supplied criteria, conjunctively.
    pub async fn get_files(&self, params: &FilterParams) -> AppResult<Vec<BundleFile>> {
        let mut qb = QueryBuilder::<Sqlite>::new(FILE_BASE);
        filters::apply(&mut qb, FILE_FILTERS, params);
        qb.build_query_as::<BundleFile>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// List files whose version was created strictly before a date.
    pub async fn get_files_before(
        &self,
        bundle_name: Option<&str>,
        tag_names: &[String],
        before: DateTime<Utc>,
    ) -> AppResult<Vec<BundleFile>> {
        self.get_files(&FilterParams {
            bundle_name: bundle_name.map(str::to_string),
            tag_names: tag_names.to_vec(),
            before: Some(before),
            ..Default::default()
        })
        .await
    }

    /// List a bundle's files, matching the tags, that have an archive row.
    pub async fn get_archived_files_for_bundle(
        &self,
        bundle_name: &str,
        tag_names: &[String],
    ) -> AppResult<Vec<BundleFile>> {
        self.get_files(&FilterParams {
            bundle_name: Some(bundle_name.to_string()),
            tag_names: tag_names.to_vec(),
            is_archived: Some(true),
            ..Default::default()
        })
        .await
    }

    /// List a bundle's files, matching the tags, that lack an archive row.
    pub async fn get_non_archived_files_for_bundle(
        &self,
        bundle_name: &str,
        tag_names: &[String],
    ) -> AppResult<Vec<BundleFile>> {
        self.get_files(&FilterParams {
            bundle_name: Some(bundle_name.to_string()),
            tag_names: tag_names.to_vec(),
            is_archived: Some(false),
            ..Default::default()
        })
        .await
    }

    /// List all files system-wide matching the tags and lacking an
    /// archive row, optionally capped.
    pub async fn get_non_archived_files(
        &self,
        tag_names: &[String],
        limit: Option<i64>,
    ) -> AppResult<Vec<BundleFile>> {
        self.get_files(&FilterParams {
            tag_names: tag_names.to_vec(),
            is_archived: Some(false),
            limit,
            ..Default::default()
        })
        .await
    }

    /// List files whose archive was retrieved strictly before a date.
    pub async fn get_files_retrieved_before(
        &self,
        before: DateTime<Utc>,
        tag_names: &[String],
    ) -> AppResult<Vec<BundleFile>> {
        self.get_files(&FilterParams {
            tag_names: tag_names.to_vec(),
            retrieved_before: Some(before),
            ..Default::default()
        })
        .await
    }

    /// List archives whose archival job is still in flight.
    pub async fn get_ongoing_archivals(&self) -> AppResult<Vec<Archive>> {
        self.get_archive_rows(&FilterParams {
            archiving_ongoing: true,
            ..Default::default()
        })
        .await
    }

    /// List archives whose retrieval job is still in flight.
    pub async fn get_ongoing_retrievals(&self) -> AppResult<Vec<Archive>> {
        self.get_archive_rows(&FilterParams {
            retrieval_ongoing: true,
            ..Default::default()
        })
        .await
    }

    /// List archives matching either or both task ids; neither means all.
    pub async fn get_archives(
        &self,
        archiving_task_id: Option<i64>,
        retrieval_task_id: Option<i64>,
    ) -> AppResult<Vec<Archive>> {
        self.get_archive_rows(&FilterParams {
            archiving_task_id,
            retrieval_task_id,
            ..Default::default()
        })
        .await
    }

    /// Find the archive row of a file, if any.
    pub async fn get_archive_by_file_id(&self, file_id: i64) -> AppResult<Option<Archive>> {
        sqlx::query_as::<_, Archive>("SELECT * FROM archives WHERE file_id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find archive", e))
    }

    /// Resolve the owning bundle's name for a stored file path.
    pub async fn get_bundle_name_from_file_path(&self, path: &str) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT bundles.name FROM bundles \
             JOIN versions ON versions.bundle_id = bundles.id \
             JOIN files ON files.version_id = versions.id \
             WHERE files.path = ? LIMIT 1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to resolve bundle name", e)
        })
    }

    async fn get_archive_rows(&self, params: &FilterParams) -> AppResult<Vec<Archive>> {
        let mut qb = QueryBuilder::<Sqlite>::new(ARCHIVE_BASE);
        filters::apply(&mut qb, ARCHIVE_FILTERS, params);
        qb.build_query_as::<Archive>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list archives", e))
    }
}
