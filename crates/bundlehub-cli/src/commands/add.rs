//! Bundle, version, and file registration commands.

use clap::{Args, Subcommand};
use tokio::fs;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_entity::BundleRequest;
use bundlehub_service::BundleService;

use crate::output::{self, OutputFormat};

/// Arguments for add commands
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Add subcommand
    #[command(subcommand)]
    pub command: AddCommand,
}

/// Add subcommands
#[derive(Debug, Subcommand)]
pub enum AddCommand {
    /// Register a bundle version from a JSON request file
    Bundle {
        /// Path to the JSON request file
        request_file: String,
    },
    /// Append a version to an existing bundle from a JSON request file
    Version {
        /// Bundle name
        #[arg(short, long)]
        bundle: String,
        /// Path to the JSON request file
        request_file: String,
    },
    /// Attach a single file to the latest version of a bundle
    File {
        /// Path of the file to track
        path: String,
        /// Bundle name
        #[arg(short, long)]
        bundle: String,
        /// Mark the file for long-term archiving
        #[arg(long)]
        archive: bool,
        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

/// Execute add commands
pub async fn execute(
    args: &AddArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;
    let service = BundleService::new(store, root);

    match &args.command {
        AddCommand::Bundle { request_file } => {
            let request = read_request(request_file).await?;
            match service.add_bundle(&request).await? {
                Some((bundle, version)) => {
                    output::print_success(&format!(
                        "Registered bundle '{}' version {} ({} files)",
                        bundle.name,
                        version.id,
                        request.all_paths().len()
                    ));
                }
                None => {
                    output::print_success(&format!(
                        "Bundle '{}' already has a version at {}; nothing to do",
                        request.name, request.created
                    ));
                }
            }
        }
        AddCommand::Version {
            bundle,
            request_file,
        } => {
            let request = read_request(request_file).await?;
            match service.add_version(bundle, &request).await? {
                Some(version) => output::print_success(&format!(
                    "Added version {} to bundle '{bundle}'",
                    version.id
                )),
                None => output::print_success(&format!(
                    "Bundle '{bundle}' already has a version at {}; nothing to do",
                    request.created
                )),
            }
        }
        AddCommand::File {
            path,
            bundle,
            archive,
            tags,
        } => {
            let file = service.add_file(path, bundle, *archive, tags).await?;
            output::print_item(&file, format);
        }
    }
    Ok(())
}

async fn read_request(path: &str) -> Result<BundleRequest, AppError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::validation(format!("Cannot read request file {path}: {e}")))?;
    let request: BundleRequest = serde_json::from_str(&raw)?;
    Ok(request)
}
