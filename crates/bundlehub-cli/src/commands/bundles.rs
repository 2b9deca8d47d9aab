//! Bundle listing and inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_service::BundleService;

use crate::output::{self, OutputFormat};

/// Arguments for bundle commands
#[derive(Debug, Args)]
pub struct BundlesArgs {
    /// Bundle subcommand
    #[command(subcommand)]
    pub command: BundlesCommand,
}

/// Bundle subcommands
#[derive(Debug, Subcommand)]
pub enum BundlesCommand {
    /// List all bundles
    List,
    /// Show a bundle's versions
    Show {
        /// Bundle name
        name: String,
    },
}

/// Bundle display row
#[derive(Debug, Serialize, Tabled)]
struct BundleRow {
    /// Bundle ID
    id: i64,
    /// Name
    name: String,
    /// Created at
    created_at: String,
}

/// Version display row
#[derive(Debug, Serialize, Tabled)]
struct VersionRow {
    /// Version ID
    id: i64,
    /// Created at
    created_at: String,
    /// Included at (empty if never included)
    included_at: String,
    /// Expires at (empty if never)
    expires_at: String,
    /// Version tag
    tag: String,
}

/// Execute bundle commands
pub async fn execute(
    args: &BundlesArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let store = super::open_store(config).await?;

    match &args.command {
        BundlesCommand::List => {
            let rows: Vec<BundleRow> = store
                .get_bundles()
                .await?
                .iter()
                .map(|b| BundleRow {
                    id: b.id,
                    name: b.name.clone(),
                    created_at: b.created_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        BundlesCommand::Show { name } => {
            let root = super::open_root(config).await?;
            let bundle = BundleService::new(store.clone(), root).get_bundle(name).await?;
            let rows: Vec<VersionRow> = store
                .get_versions_for_bundle(bundle.id)
                .await?
                .iter()
                .map(|v| VersionRow {
                    id: v.id,
                    created_at: v.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    included_at: v
                        .included_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                    expires_at: v
                        .expires_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default(),
                    tag: v.tag.clone().unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}
