//! File listing commands.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_database::FilterParams;
use bundlehub_service::BundleService;

use crate::output::{self, OutputFormat};

/// Arguments for the files command
#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Restrict to one bundle
    #[arg(short, long)]
    pub bundle: Option<String>,

    /// Require every given tag (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Only files whose version was created before this time (RFC 3339)
    #[arg(long)]
    pub before: Option<DateTime<Utc>>,

    /// Only files currently present on disk
    #[arg(long)]
    pub local: bool,

    /// Only files missing from disk
    #[arg(long)]
    pub remote: bool,

    /// Only files with an archive (true) or without one (false)
    #[arg(long)]
    pub archived: Option<bool>,

    /// Cap the number of results
    #[arg(short, long)]
    pub limit: Option<i64>,
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File ID
    id: i64,
    /// Version ID
    version_id: i64,
    /// Path (squashed for display)
    path: String,
    /// Marked for archiving
    to_archive: bool,
    /// Content checksum
    checksum: String,
}

/// Execute the files command
pub async fn execute(
    args: &FilesArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;
    let service = BundleService::new(store, root);

    let params = FilterParams {
        bundle_name: args.bundle.clone(),
        tag_names: args.tags.clone(),
        before: args.before,
        is_archived: args.archived,
        limit: args.limit,
        ..Default::default()
    };
    let files = service.get_files(&params, args.local, args.remote).await?;

    let rows: Vec<FileRow> = files
        .iter()
        .map(|f| FileRow {
            id: f.id,
            version_id: f.version_id,
            path: output::squash_path(&f.path),
            to_archive: f.to_archive,
            checksum: f.checksum.clone().unwrap_or_default(),
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
