use anyhow::Result;
use cantus_core::model::{DriveFileId, GoogleDriveFile};
use chrono::Utc;
use std::path::PathBuf;

use super::{open_database, read_json_records};
use crate::config::Config;

#[derive(Debug, clap::Subcommand)]
pub enum DriveFileCommand {
    /// Insert or refresh file records from a JSON folder listing
    Sync { file: PathBuf },
    /// List known files
    List,
    /// Delete a file record; song links keep their URL
    Delete { id: String },
}

pub fn run(config: &Config, command: DriveFileCommand) -> Result<()> {
    let db = open_database(config)?;
    match command {
        DriveFileCommand::Sync { file } => {
            let files: Vec<GoogleDriveFile> = read_json_records(&file)?;
            let now = Utc::now();
            let count = files.len();
            for mut drive_file in files {
                drive_file.last_sync_at = now;
                db.upsert_drive_file(&drive_file)?;
            }
            println!("✓ Synced {count} files from {}", file.display());
        }
        DriveFileCommand::List => {
            for drive_file in db.list_drive_files()? {
                println!(
                    "{:<40} {:<24} {}",
                    drive_file.name, drive_file.mime_type, drive_file.id
                );
            }
        }
        DriveFileCommand::Delete { id } => {
            db.delete_drive_file(&DriveFileId::new(id.as_str()))?;
            println!("✓ Deleted file record {id}");
        }
    }
    Ok(())
}
