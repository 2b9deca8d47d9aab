//! CLI command definitions and dispatch.

pub mod add;
pub mod archives;
pub mod bundles;
pub mod delete;
pub mod files;
pub mod include;
pub mod init;
pub mod tags;
pub mod task;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;
use bundlehub_core::config::AppConfig;
use bundlehub_core::config::logging::LoggingConfig;
use bundlehub_core::error::AppError;
use bundlehub_database::Store;
use bundlehub_storage::DataRoot;

/// BundleHub — file bundle metadata tracker
#[derive(Debug, Parser)]
#[command(name = "bundlehub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize the database and data root
    Init,
    /// Register bundles, versions, and files
    Add(add::AddArgs),
    /// Materialize a version into the data root
    Include(include::IncludeArgs),
    /// List and inspect bundles
    Bundles(bundles::BundlesArgs),
    /// List tracked files
    Files(files::FilesArgs),
    /// List tags
    Tags,
    /// Archive and retrieval bookkeeping
    Archives(archives::ArchivesArgs),
    /// Mark external tasks as finished
    Task(task::TaskArgs),
    /// Delete bundles, versions, and files
    Delete(delete::DeleteArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config)?;
        init_logging(&config.logging);
        debug!(config = %self.config, "Dispatching command");

        match &self.command {
            Commands::Init => init::execute(&config).await,
            Commands::Add(args) => add::execute(args, &config, self.format).await,
            Commands::Include(args) => include::execute(args, &config).await,
            Commands::Bundles(args) => bundles::execute(args, &config, self.format).await,
            Commands::Files(args) => files::execute(args, &config, self.format).await,
            Commands::Tags => tags::execute(&config, self.format).await,
            Commands::Archives(args) => archives::execute(args, &config, self.format).await,
            Commands::Task(args) => task::execute(args, &config).await,
            Commands::Delete(args) => delete::execute(args, &config).await,
        }
    }
}

/// Initialize tracing; `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.format == "compact" {
        builder.compact().init();
    } else {
        builder.init();
    }
}

/// Helper: open the configured database pool as a store.
pub async fn open_store(config: &AppConfig) -> Result<Store, AppError> {
    let pool = bundlehub_database::connection::create_pool(&config.database).await?;
    Ok(Store::new(pool))
}

/// Helper: open the configured data root.
pub async fn open_root(config: &AppConfig) -> Result<DataRoot, AppError> {
    DataRoot::new(&config.store.root).await
}
