//! Database configuration.

use serde::{Deserialize, Serialize};

/// SQLite connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    ///
    /// SQLite permits limited write concurrency; a single connection avoids
    /// persistent "database is locked" failures.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Busy timeout in seconds before a locked database read/write fails.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_connections: default_max_connections(),
            busy_timeout_seconds: default_busy_timeout(),
        }
    }
}

fn default_url() -> String {
    "sqlite:data/bundlehub.db".to_string()
}

fn default_max_connections() -> u32 {
    1
}

fn default_busy_timeout() -> u64 {
    5
}
