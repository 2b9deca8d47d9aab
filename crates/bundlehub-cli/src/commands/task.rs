//! External task completion commands.

use clap::{Args, Subcommand};

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_service::ArchiveService;

use crate::output;

/// Arguments for task commands
#[derive(Debug, Args)]
pub struct TaskArgs {
    /// Task subcommand
    #[command(subcommand)]
    pub command: TaskCommand,
}

/// Task subcommands
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Mark an archival task as finished
    ArchivalDone {
        /// External task ID
        task_id: i64,
    },
    /// Mark a retrieval task as finished
    RetrievalDone {
        /// External task ID
        task_id: i64,
    },
}

/// Execute task commands
pub async fn execute(args: &TaskArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;
    let service = ArchiveService::new(store, root);

    match &args.command {
        TaskCommand::ArchivalDone { task_id } => {
            let stamped = service.mark_archival_task_done(*task_id).await?;
            output::print_success(&format!(
                "Archival task {task_id} finished; stamped {stamped} archive(s)"
            ));
        }
        TaskCommand::RetrievalDone { task_id } => {
            let stamped = service.mark_retrieval_task_done(*task_id).await?;
            output::print_success(&format!(
                "Retrieval task {task_id} finished; stamped {stamped} archive(s)"
            ));
        }
    }
    Ok(())
}
