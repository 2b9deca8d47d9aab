//! Data root configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the canonical on-disk data root.
///
/// Included versions are materialized under
/// `<root>/<bundle_name>/<version_date>/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory for all included bundle files.
    #[serde(default = "default_root")]
    pub root: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> String {
    "./data/bundles".to_string()
}
