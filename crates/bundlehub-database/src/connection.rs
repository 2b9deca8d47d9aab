//! SQLite connection pool management.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::info;

use bundlehub_core::config::database::DatabaseConfig;
use bundlehub_core::error::{AppError, ErrorKind};
use bundlehub_core::result::AppResult;

/// Create a connection pool from configuration.
///
/// Foreign keys are enabled on every connection so that the cascade
/// deletes from bundles to versions to files take effect.
pub async fn create_pool(config: &DatabaseConfig) -> AppResult<SqlitePool> {
    info!(
        url = %config.url,
        max_connections = config.max_connections,
        "Connecting to SQLite"
    );

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Invalid database URL: {e}"),
                e,
            )
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(config.busy_timeout_seconds));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to connect to database: {e}"),
                e,
            )
        })?;

    info!("Successfully connected to SQLite");
    Ok(pool)
}

/// Create an in-memory pool with the full schema applied.
///
/// The pool is pinned to a single never-expiring connection; an
/// in-memory SQLite database lives and dies with its connection.
pub async fn memory_pool() -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Invalid memory URL", e))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to open in-memory database", e)
        })?;

    crate::migration::run_migrations(&pool).await?;
    Ok(pool)
}
