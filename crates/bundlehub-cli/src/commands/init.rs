//! Database and data-root initialization.

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;

use crate::output;

/// Create the database schema and the data root directory.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let store = super::open_store(config).await?;
    bundlehub_database::migration::run_migrations(store.pool()).await?;

    let root = super::open_root(config).await?;
    output::print_success(&format!(
        "Initialized database at {} with data root {}",
        config.database.url,
        root.path().display()
    ));
    Ok(())
}
