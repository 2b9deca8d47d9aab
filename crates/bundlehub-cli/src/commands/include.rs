//! Version inclusion command.

use clap::Args;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;
use bundlehub_service::InclusionEngine;

use crate::output;

/// Arguments for the include command
#[derive(Debug, Args)]
pub struct IncludeArgs {
    /// Version ID to materialize
    pub version_id: i64,
}

/// Execute the include command
pub async fn execute(args: &IncludeArgs, config: &AppConfig) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    let root = super::open_root(config).await?;

    let version = InclusionEngine::new(store, root)
        .include_version(args.version_id)
        .await?;
    output::print_success(&format!(
        "Included version {} at {}",
        version.id,
        version
            .included_at
            .map(|t| t.to_string())
            .unwrap_or_default()
    ));
    Ok(())
}
