//! Tag listing command.

use serde::Serialize;
use tabled::Tabled;

use bundlehub_core::config::AppConfig;
use bundlehub_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Tag display row
#[derive(Debug, Serialize, Tabled)]
struct TagRow {
    /// Tag ID
    id: i64,
    /// Name
    name: String,
    /// Category
    category: String,
    /// Created at
    created_at: String,
}

/// Execute the tags command
pub async fn execute(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let store = super::open_store(config).await?;

    let rows: Vec<TagRow> = store
        .get_tags()
        .await?
        .iter()
        .map(|t| TagRow {
            id: t.id,
            name: t.name.clone(),
            category: t.category.clone().unwrap_or_default(),
            created_at: t.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    output::print_list(&rows, format);
    Ok(())
}
