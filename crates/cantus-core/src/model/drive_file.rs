use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::DriveFileId;

/// Cached metadata of a file in the shared drive folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleDriveFile {
    pub id: DriveFileId,
    pub name: String,
    pub mime_type: String,
    pub download_url: String,
    #[serde(default = "Utc::now")]
    pub last_sync_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl GoogleDriveFile {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DriveFileId::new(id),
            name: name.into(),
            mime_type: mime_type.into(),
            download_url: download_url.into(),
            last_sync_at: now,
            created_at: now,
        }
    }
}
