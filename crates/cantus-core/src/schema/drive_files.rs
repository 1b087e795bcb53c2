use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::model::{required_text, DriveFileId, GoogleDriveFile};

use super::codec::{get_ts, ts};
use super::constraint::WriteResultExt;
use super::Database;

const DRIVE_FILE_COLUMNS: &str =
    r#"id, name, "mimeType", "downloadUrl", "lastSyncAt", "createdAt""#;

// GoogleDriveFile CRUD
impl Database {
    /// Insert a file record or refresh the metadata of a known one.
    /// `createdAt` of an existing record is kept.
    pub fn upsert_drive_file(&self, file: &GoogleDriveFile) -> Result<()> {
        let name = required_text("file name", &file.name)?;
        self.conn()
            .execute(
                &format!(
                    r#"INSERT INTO "GoogleDriveFile" ({DRIVE_FILE_COLUMNS})
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                       ON CONFLICT(id) DO UPDATE SET
                           name = excluded.name,
                           "mimeType" = excluded."mimeType",
                           "downloadUrl" = excluded."downloadUrl",
                           "lastSyncAt" = excluded."lastSyncAt""#
                ),
                rusqlite::params![
                    file.id,
                    name,
                    file.mime_type,
                    file.download_url,
                    ts(&file.last_sync_at),
                    ts(&file.created_at),
                ],
            )
            .on_write("GoogleDriveFile", &file.id)?;
        Ok(())
    }

    pub fn get_drive_file(&self, id: &DriveFileId) -> Result<GoogleDriveFile> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {DRIVE_FILE_COLUMNS} FROM "GoogleDriveFile" WHERE id = ?1"#),
                [id],
                row_to_drive_file,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("GoogleDriveFile", id))
    }

    pub fn list_drive_files(&self) -> Result<Vec<GoogleDriveFile>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {DRIVE_FILE_COLUMNS} FROM "GoogleDriveFile" ORDER BY name"#
        ))?;
        let files = stmt
            .query_map([], row_to_drive_file)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Delete a file record. Song links pointing at it keep their URL but
    /// lose the file reference.
    pub fn delete_drive_file(&self, id: &DriveFileId) -> Result<()> {
        self.delete_row("GoogleDriveFile", id)
    }
}

fn row_to_drive_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<GoogleDriveFile> {
    Ok(GoogleDriveFile {
        id: row.get(0)?,
        name: row.get(1)?,
        mime_type: row.get(2)?,
        download_url: row.get(3)?,
        last_sync_at: get_ts(row, 4)?,
        created_at: get_ts(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkType, Song, SongFileLink};
    use crate::ErrorKind;

    fn score() -> GoogleDriveFile {
        GoogleDriveFile::new(
            "1AbC",
            "Ave Maria.pdf",
            "application/pdf",
            "https://drive.example/1AbC",
        )
    }

    #[test]
    fn test_upsert_keeps_created_at() {
        let db = Database::open_in_memory().unwrap();
        let file = score();
        db.upsert_drive_file(&file).unwrap();

        let mut renamed = GoogleDriveFile::new(
            "1AbC",
            "Ave Maria (SATB).pdf",
            "application/pdf",
            "https://drive.example/1AbC",
        );
        renamed.created_at = file.created_at + chrono::Duration::days(1);
        db.upsert_drive_file(&renamed).unwrap();

        let loaded = db.get_drive_file(&file.id).unwrap();
        assert_eq!(loaded.name, "Ave Maria (SATB).pdf");
        assert_eq!(loaded.created_at, file.created_at);
        assert_eq!(db.list_drive_files().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_drive_file_clears_song_links() {
        let db = Database::open_in_memory().unwrap();
        let file = score();
        db.upsert_drive_file(&file).unwrap();
        let song = Song::new("Ave Maria");
        db.insert_song(&song).unwrap();
        let link = SongFileLink::new(song.id, LinkType::Pdf, "Score", &file.download_url)
            .with_drive_file(file.id.clone());
        db.insert_song_file_link(&link).unwrap();

        db.delete_drive_file(&file.id).unwrap();

        let links = db.list_song_file_links(song.id).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].google_drive_id, None);
        assert_eq!(links[0].url, file.download_url);
    }

    #[test]
    fn test_link_to_unknown_drive_file_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let song = Song::new("Ave Maria");
        db.insert_song(&song).unwrap();
        let link = SongFileLink::new(song.id, LinkType::Pdf, "Score", "https://x")
            .with_drive_file(DriveFileId::new("missing"));
        let err = db.insert_song_file_link(&link).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_drive_file_referenced_by_one_link_only() {
        let db = Database::open_in_memory().unwrap();
        let file = score();
        db.upsert_drive_file(&file).unwrap();
        let song = Song::new("Ave Maria");
        db.insert_song(&song).unwrap();
        db.insert_song_file_link(
            &SongFileLink::new(song.id, LinkType::Pdf, "Score", "https://a")
                .with_drive_file(file.id.clone()),
        )
        .unwrap();
        let err = db
            .insert_song_file_link(
                &SongFileLink::new(song.id, LinkType::Pdf, "Copy", "https://b")
                    .with_drive_file(file.id.clone()),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}
