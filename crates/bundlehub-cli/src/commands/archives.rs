//! Archive and retrieval bookkeeping commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_entity::Archive;
use bundlehub_service::ArchiveService;

use crate::output::{self, OutputFormat};

/// Arguments for archive commands
#[derive(Debug, Args)]
pub struct ArchivesArgs {
    /// Archive subcommand
    #[command(subcommand)]
    pub command: ArchivesCommand,
}

/// Archive subcommands
#[derive(Debug, Subcommand)]
pub enum ArchivesCommand {
    /// List archives
    List {
        /// Only archives whose archival job is still running
        #[arg(long)]
        ongoing_archivals: bool,
        /// Only archives whose retrieval job is still running
        #[arg(long)]
        ongoing_retrievals: bool,
        /// Restrict to one archival task
        #[arg(long)]
        archiving_task_id: Option<i64>,
        /// Restrict to one retrieval task
        #[arg(long)]
        retrieval_task_id: Option<i64>,
    },
    /// Submit a file for archiving
    Submit {
        /// File ID
        file_id: i64,
        /// External task ID
        #[arg(short, long)]
        task_id: i64,
    },
    /// Record a fresh task id for a re-submitted archival
    Resubmit {
        /// File ID
        file_id: i64,
        /// External task ID
        #[arg(short, long)]
        task_id: i64,
    },
    /// Submit a file for retrieval from the archive
    Retrieve {
        /// File ID
        file_id: i64,
        /// External task ID
        #[arg(short, long)]
        task_id: i64,
    },
    /// Verify a restored file against its recorded checksum
    Verify {
        /// File ID
        file_id: i64,
    },
}

/// Archive display row
#[derive(Debug, Serialize, Tabled)]
struct ArchiveRow {
    /// Archive ID
    id: i64,
    /// File ID
    file_id: i64,
    /// Archival task
    archiving_task_id: i64,
    /// Archived at (empty while ongoing)
    archived_at: String,
    /// Retrieval task (empty if never retrieved)
    retrieval_task_id: String,
    /// Retrieved at (empty while ongoing)
    retrieved_at: String,
}

impl From<&Archive> for ArchiveRow {
    fn from(a: &Archive) -> Self {
        Self {
            id: a.id,
            file_id: a.file_id,
            archiving_task_id: a.archiving_task_id,
            archived_at: a
                .archived_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            retrieval_task_id: a
                .retrieval_task_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            retrieved_at: a
                .retrieved_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Execute archive commands
pub async fn execute(
    args: &ArchivesArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;
    let service = ArchiveService::new(store.clone(), root);

    match &args.command {
        ArchivesCommand::List {
            ongoing_archivals,
            ongoing_retrievals,
            archiving_task_id,
            retrieval_task_id,
        } => {
            let archives = if *ongoing_archivals {
                store.get_ongoing_archivals().await?
            } else if *ongoing_retrievals {
                store.get_ongoing_retrievals().await?
            } else {
                store.get_archives(*archiving_task_id, *retrieval_task_id).await?
            };
            let rows: Vec<ArchiveRow> = archives.iter().map(ArchiveRow::from).collect();
            output::print_list(&rows, format);
        }
        ArchivesCommand::Submit { file_id, task_id } => {
            let archive = service.submit_archiving(*file_id, *task_id).await?;
            output::print_success(&format!(
                "Submitted file {file_id} for archiving (archive {}, task {task_id})",
                archive.id
            ));
        }
        ArchivesCommand::Resubmit { file_id, task_id } => {
            service.resubmit_archiving(*file_id, *task_id).await?;
            output::print_success(&format!(
                "Re-submitted file {file_id} for archiving (task {task_id})"
            ));
        }
        ArchivesCommand::Retrieve { file_id, task_id } => {
            service.submit_retrieval(*file_id, *task_id).await?;
            output::print_success(&format!(
                "Submitted file {file_id} for retrieval (task {task_id})"
            ));
        }
        ArchivesCommand::Verify { file_id } => {
            let file = store
                .get_file_by_id(*file_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;
            service.verify_restored(&file).await?;
            output::print_success(&format!("File {} matches its recorded checksum", file.path));
        }
    }
    Ok(())
}
