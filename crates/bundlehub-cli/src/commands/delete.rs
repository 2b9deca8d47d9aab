//! Deletion commands.

use clap::{Args, Subcommand};

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_service::BundleService;

use crate::output;

/// Arguments for delete commands
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Delete subcommand
    #[command(subcommand)]
    pub command: DeleteCommand,
}

/// Delete subcommands
#[derive(Debug, Subcommand)]
pub enum DeleteCommand {
    /// Delete a bundle, its versions, and their files
    Bundle {
        /// Bundle name
        name: String,
    },
    /// Delete a single version and its files
    Version {
        /// Version ID
        version_id: i64,
    },
    /// Delete a single file
    File {
        /// File ID
        file_id: i64,
    },
}

/// Execute delete commands
pub async fn execute(args: &DeleteArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;
    let service = BundleService::new(store, root);

    match &args.command {
        DeleteCommand::Bundle { name } => {
            service.delete_bundle(name).await?;
            output::print_success(&format!("Deleted bundle '{name}'"));
        }
        DeleteCommand::Version { version_id } => {
            service.delete_version(*version_id).await?;
            output::print_success(&format!("Deleted version {version_id}"));
        }
        DeleteCommand::File { file_id } => {
            let file = service.delete_file(*file_id).await?;
            output::print_success(&format!("Deleted file {}", file.path));
        }
    }
    Ok(())
}
