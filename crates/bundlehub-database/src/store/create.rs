//! Bundle, version, file, tag, and archive construction.
//!
//! All multi-row operations run inside one transaction; nothing is
//! visible to readers until the whole operation commits.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::debug;

use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;
use bundlehub_entity::{Archive, Bundle, BundleFile, BundleRequest, Tag, Version};

use super::Store;

impl Store {
    /// Register a bundle version and its files.
    ///
    /// Creates the bundle when no bundle of that name exists. Returns
    /// `Ok(None)` when the bundle already has a version at the request's
    /// `created` timestamp; re-submitting the same version is an
    /// idempotent no-op, not an error.
    pub async fn add_bundle(
        &self,
        request: &BundleRequest,
    ) -> AppResult<Option<(Bundle, Version)>> {
        let mut tx = self.begin().await?;

        let existing: Option<Bundle> =
            sqlx::query_as("SELECT * FROM bundles WHERE name = ?")
                .bind(&request.name)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to find bundle", e)
                })?;

        if let Some(bundle) = &existing
            && version_exists(&mut tx, bundle.id, request).await?
        {
            debug!(bundle = %request.name, created = %request.created, "Version already added");
            return Ok(None);
        }

        let bundle = match existing {
            Some(bundle) => bundle,
            None => sqlx::query_as::<_, Bundle>(
                "INSERT INTO bundles (name, created_at) VALUES (?, ?) RETURNING *",
            )
            .bind(&request.name)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to create bundle", e)
            })?,
        };

        let version = insert_version(&mut tx, bundle.id, request).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;

        debug!(bundle = %bundle.name, version = version.id, "Added bundle version");
        Ok(Some((bundle, version)))
    }

    /// Append a version to an already-resolved bundle.
    ///
    /// Returns `Ok(None)` on the same duplicate-timestamp condition as
    /// [`Store::add_bundle`].
    pub async fn add_version(
        &self,
        bundle: &Bundle,
        request: &BundleRequest,
    ) -> AppResult<Option<Version>> {
        let mut tx = self.begin().await?;

        if version_exists(&mut tx, bundle.id, request).await? {
            debug!(bundle = %bundle.name, created = %request.created, "Version already added");
            return Ok(None);
        }

        let version = insert_version(&mut tx, bundle.id, request).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;
        Ok(Some(version))
    }

    /// Attach a new file to the latest version of an existing bundle.
    pub async fn add_file(
        &self,
        path: &str,
        bundle: &Bundle,
        to_archive: bool,
        tag_names: &[String],
    ) -> AppResult<BundleFile> {
        let mut tx = self.begin().await?;

        let version: Version = sqlx::query_as(
            "SELECT * FROM versions WHERE bundle_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(bundle.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find latest version", e)
        })?
        .ok_or_else(|| {
            AppError::not_found(format!("Bundle '{}' has no versions", bundle.name))
        })?;

        let file = insert_file(&mut tx, version.id, path, to_archive).await?;
        for name in tag_names {
            let tag = get_or_create_tag(&mut tx, name, None).await?;
            link_tag(&mut tx, file.id, tag.id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;
        Ok(file)
    }

    /// Resolve a tag by name, creating it on first reference.
    pub async fn get_or_create_tag(
        &self,
        name: &str,
        category: Option<&str>,
    ) -> AppResult<Tag> {
        let mut tx = self.begin().await?;
        let tag = get_or_create_tag(&mut tx, name, category).await?;
        tx.commit()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to commit", e))?;
        Ok(tag)
    }

    /// Record an external archival submission for a file.
    ///
    /// At most one archive may exist per file; a second submission
    /// surfaces the uniqueness constraint as a conflict.
    pub async fn create_archive(
        &self,
        file_id: i64,
        archiving_task_id: i64,
    ) -> AppResult<Archive> {
        sqlx::query_as::<_, Archive>(
            "INSERT INTO archives (file_id, archiving_task_id) VALUES (?, ?) RETURNING *",
        )
        .bind(file_id)
        .bind(archiving_task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("File {file_id} already has an archive"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create archive", e),
        })
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }
}

/// Whether the bundle already has a version at the request's timestamp.
async fn version_exists(
    tx: &mut Transaction<'_, Sqlite>,
    bundle_id: i64,
    request: &BundleRequest,
) -> AppResult<bool> {
    let duplicate: Option<Version> =
        sqlx::query_as("SELECT * FROM versions WHERE bundle_id = ? AND created_at = ?")
            .bind(bundle_id)
            .bind(request.created)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to check for duplicate", e)
            })?;
    Ok(duplicate.is_some())
}

/// Insert a version and its files, resolving the request's tag union once.
async fn insert_version(
    tx: &mut Transaction<'_, Sqlite>,
    bundle_id: i64,
    request: &BundleRequest,
) -> AppResult<Version> {
    let version: Version = sqlx::query_as(
        "INSERT INTO versions (bundle_id, created_at, expires_at, tag) \
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(bundle_id)
    .bind(request.created)
    .bind(request.expires)
    .bind(&request.tag)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create version", e))?;

    // One lookup per distinct tag name across the whole request, reused
    // for every file entry.
    let mut tag_map: HashMap<&str, Tag> = HashMap::new();
    for spec in &request.files {
        for name in &spec.tags {
            if !tag_map.contains_key(name.as_str()) {
                let tag = get_or_create_tag(tx, name, None).await?;
                tag_map.insert(name.as_str(), tag);
            }
        }
    }

    for spec in &request.files {
        for path in spec.path.paths() {
            let file = insert_file(tx, version.id, path, spec.archive).await?;
            for name in &spec.tags {
                if let Some(tag) = tag_map.get(name.as_str()) {
                    link_tag(tx, file.id, tag.id).await?;
                }
            }
        }
    }

    Ok(version)
}

async fn insert_file(
    tx: &mut Transaction<'_, Sqlite>,
    version_id: i64,
    path: &str,
    to_archive: bool,
) -> AppResult<BundleFile> {
    sqlx::query_as::<_, BundleFile>(
        "INSERT INTO files (version_id, path, to_archive) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(version_id)
    .bind(path)
    .bind(to_archive)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::conflict(format!("File path already tracked: {path}"))
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
    })
}

async fn link_tag(
    tx: &mut Transaction<'_, Sqlite>,
    file_id: i64,
    tag_id: i64,
) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO file_tags (file_id, tag_id) VALUES (?, ?)")
        .bind(file_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to attach tag", e))?;
    Ok(())
}

async fn get_or_create_tag(
    conn: &mut SqliteConnection,
    name: &str,
    category: Option<&str>,
) -> AppResult<Tag> {
    let existing: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tag", e))?;

    if let Some(tag) = existing {
        return Ok(tag);
    }

    sqlx::query_as::<_, Tag>(
        "INSERT INTO tags (name, category, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(name)
    .bind(category)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create tag", e))
}
