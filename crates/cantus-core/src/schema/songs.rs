use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{required_text, Song, SongFileLink, SongId, SongWithLinks};

use super::codec::{get_ts, ts};
use super::constraint::WriteResultExt;
use super::Database;

const SONG_COLUMNS: &str = r#"id, name, "key", lyrics, notes, "createdAt""#;
const LINK_COLUMNS: &str = r#""songId", "type", label, url, "googleDriveId", "createdAt""#;

// Song CRUD
impl Database {
    /// Insert a new song. Song names are unique; a duplicate name is a
    /// conflict and leaves the existing song untouched.
    pub fn insert_song(&self, song: &Song) -> Result<()> {
        let name = required_text("song name", &song.name)?;
        self.conn()
            .execute(
                &format!(r#"INSERT INTO "Song" ({SONG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#),
                rusqlite::params![
                    song.id,
                    name,
                    song.key,
                    song.lyrics,
                    song.notes,
                    ts(&song.created_at),
                ],
            )
            .on_write("Song", &name)?;
        log::debug!("Inserted song '{}' ({})", name, song.id);
        Ok(())
    }

    /// Update name, key, lyrics and notes of an existing song.
    pub fn update_song(&self, song: &Song) -> Result<()> {
        let name = required_text("song name", &song.name)?;
        let updated = self
            .conn()
            .execute(
                r#"UPDATE "Song" SET name = ?2, "key" = ?3, lyrics = ?4, notes = ?5 WHERE id = ?1"#,
                rusqlite::params![song.id, name, song.key, song.lyrics, song.notes],
            )
            .on_write("Song", &name)?;
        if updated == 0 {
            return Err(Error::not_found("Song", song.id));
        }
        Ok(())
    }

    pub fn get_song(&self, id: SongId) -> Result<Song> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {SONG_COLUMNS} FROM "Song" WHERE id = ?1"#),
                [id],
                row_to_song,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Song", id))
    }

    pub fn find_song_by_name(&self, name: &str) -> Result<Option<Song>> {
        Ok(self
            .conn()
            .query_row(
                &format!(r#"SELECT {SONG_COLUMNS} FROM "Song" WHERE name = ?1"#),
                [name.trim()],
                row_to_song,
            )
            .optional()?)
    }

    /// All songs ordered by name.
    pub fn list_songs(&self) -> Result<Vec<Song>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(r#"SELECT {SONG_COLUMNS} FROM "Song" ORDER BY name"#))?;
        let songs = stmt
            .query_map([], row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    /// All songs ordered by name, each with its file links.
    pub fn list_songs_with_links(&self) -> Result<Vec<SongWithLinks>> {
        self.list_songs()?
            .into_iter()
            .map(|song| {
                let file_links = self.list_song_file_links(song.id)?;
                Ok(SongWithLinks { song, file_links })
            })
            .collect()
    }

    pub fn count_songs(&self) -> Result<u64> {
        self.count_rows("Song")
    }

    /// Delete a song. Its file links and setlist entries go with it.
    pub fn delete_song(&self, id: SongId) -> Result<()> {
        self.delete_row("Song", &id)
    }
}

// SongFileLink CRUD
impl Database {
    /// Add a link to a song. Labels are unique per song.
    pub fn insert_song_file_link(&self, link: &SongFileLink) -> Result<()> {
        insert_link(self.conn(), link)
    }

    /// Links of a song, ordered by label.
    pub fn list_song_file_links(&self, song_id: SongId) -> Result<Vec<SongFileLink>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {LINK_COLUMNS} FROM "SongFileLink" WHERE "songId" = ?1 ORDER BY label"#
        ))?;
        let links = stmt
            .query_map([song_id], row_to_link)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(links)
    }

    /// Replace all links of a song with `links` in one transaction.
    ///
    /// Every link must belong to `song_id` and labels must be distinct;
    /// on any failure the previous links are kept.
    pub fn replace_song_file_links(
        &self,
        song_id: SongId,
        links: &[SongFileLink],
    ) -> Result<Vec<SongFileLink>> {
        let mut labels = HashSet::new();
        for link in links {
            if link.song_id != song_id {
                return Err(Error::validation(format!(
                    "link '{}' belongs to song {}, not {}",
                    link.label, link.song_id, song_id
                )));
            }
            if !labels.insert(link.label.trim()) {
                return Err(Error::Conflict {
                    entity: "SongFileLink",
                    detail: format!("label '{}' appears twice for song {}", link.label, song_id),
                });
            }
        }

        self.require("Song", &song_id)?;
        let tx = self.transaction()?;
        let removed = tx.execute(r#"DELETE FROM "SongFileLink" WHERE "songId" = ?1"#, [song_id])?;
        for link in links {
            insert_link(&tx, link)?;
        }
        tx.commit()?;

        log::info!(
            "Replaced {} file links of song {} with {}",
            removed,
            song_id,
            links.len()
        );
        self.list_song_file_links(song_id)
    }

    pub fn delete_song_file_link(&self, song_id: SongId, label: &str) -> Result<()> {
        let deleted = self.conn().execute(
            r#"DELETE FROM "SongFileLink" WHERE "songId" = ?1 AND label = ?2"#,
            rusqlite::params![song_id, label],
        )?;
        if deleted == 0 {
            return Err(Error::not_found("SongFileLink", format!("{song_id}/{label}")));
        }
        Ok(())
    }
}

fn insert_link(conn: &Connection, link: &SongFileLink) -> Result<()> {
    let label = required_text("link label", &link.label)?;
    let url = required_text("link url", &link.url)?;
    conn.execute(
        &format!(r#"INSERT INTO "SongFileLink" ({LINK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#),
        rusqlite::params![
            link.song_id,
            link.link_type,
            label,
            url,
            link.google_drive_id,
            ts(&link.created_at),
        ],
    )
    .on_write("SongFileLink", format!("{}/{}", link.song_id, label))?;
    Ok(())
}

fn row_to_song(row: &rusqlite::Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        name: row.get(1)?,
        key: row.get(2)?,
        lyrics: row.get(3)?,
        notes: row.get(4)?,
        created_at: get_ts(row, 5)?,
    })
}

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<SongFileLink> {
    Ok(SongFileLink {
        song_id: row.get(0)?,
        link_type: row.get(1)?,
        label: row.get(2)?,
        url: row.get(3)?,
        google_drive_id: row.get(4)?,
        created_at: get_ts(row, 5)?,
    })
}
