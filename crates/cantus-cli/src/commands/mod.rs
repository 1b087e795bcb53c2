pub mod attendance;
pub mod config;
pub mod drive_file;
pub mod event;
pub mod setlist;
pub mod singer;
pub mod song;
pub mod status;
pub mod user;

use anyhow::{Context, Result};
use cantus_core::schema::Database;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::config::Config;

/// Open the configured database, creating its directory on first use.
pub fn open_database(config: &Config) -> Result<Database> {
    let db_path = &config.database_path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    db.set_busy_timeout(config.busy_timeout())?;
    Ok(db)
}

/// Read a JSON array of records exported by an external system.
pub fn read_json_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
