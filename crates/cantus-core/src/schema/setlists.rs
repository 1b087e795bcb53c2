use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::model::{required_text, Setlist, SetlistEntryKey, SetlistId, SetlistSongInfo, SongId};

use super::codec::{get_ts, ts};
use super::constraint::WriteResultExt;
use super::Database;

const SETLIST_COLUMNS: &str = r#"id, name, notes, "createdAt""#;
const ENTRY_COLUMNS: &str = r#""setlistId", "songId", "order", notes, "createdAt""#;

// Setlist CRUD
impl Database {
    pub fn insert_setlist(&self, setlist: &Setlist) -> Result<()> {
        let name = required_text("setlist name", &setlist.name)?;
        self.conn()
            .execute(
                &format!(r#"INSERT INTO "Setlist" ({SETLIST_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"#),
                rusqlite::params![setlist.id, name, setlist.notes, ts(&setlist.created_at)],
            )
            .on_write("Setlist", setlist.id)?;
        Ok(())
    }

    pub fn get_setlist(&self, id: SetlistId) -> Result<Setlist> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {SETLIST_COLUMNS} FROM "Setlist" WHERE id = ?1"#),
                [id],
                row_to_setlist,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Setlist", id))
    }

    /// All setlists, newest first.
    pub fn list_setlists(&self) -> Result<Vec<Setlist>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {SETLIST_COLUMNS} FROM "Setlist" ORDER BY "createdAt" DESC"#
        ))?;
        let setlists = stmt
            .query_map([], row_to_setlist)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(setlists)
    }

    /// Delete a setlist together with all of its entries.
    pub fn delete_setlist(&self, id: SetlistId) -> Result<()> {
        self.delete_row("Setlist", &id)
    }
}

// SetlistSongInfo operations
impl Database {
    /// Place a song at `entry.key.order` in a setlist.
    ///
    /// The caller picks the position. Inserting an existing
    /// `(setlist, song, order)` triple is a conflict; it never overwrites.
    pub fn add_setlist_entry(&self, entry: &SetlistSongInfo) -> Result<()> {
        insert_entry(self.conn(), entry)
    }

    /// Place a song after the current last entry of the setlist.
    pub fn append_to_setlist(
        &self,
        setlist_id: SetlistId,
        song_id: SongId,
        notes: Option<String>,
    ) -> Result<SetlistSongInfo> {
        let tx = self.immediate_transaction()?;
        let last: Option<i32> = tx.query_row(
            r#"SELECT MAX("order") FROM "SetlistSongInfo" WHERE "setlistId" = ?1"#,
            [setlist_id],
            |row| row.get(0),
        )?;
        let order = match last {
            None => 1,
            Some(last) => last.checked_add(1).ok_or_else(|| {
                Error::Validation(format!("setlist {setlist_id} has no position after {last}"))
            })?,
        };
        let mut entry = SetlistSongInfo::new(SetlistEntryKey::new(setlist_id, song_id, order));
        entry.notes = notes;
        insert_entry(&tx, &entry)?;
        tx.commit()?;
        Ok(entry)
    }

    /// Entries of a setlist in play order.
    pub fn list_setlist_entries(&self, setlist_id: SetlistId) -> Result<Vec<SetlistSongInfo>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {ENTRY_COLUMNS} FROM "SetlistSongInfo"
               WHERE "setlistId" = ?1 ORDER BY "order", "createdAt""#
        ))?;
        let entries = stmt
            .query_map([setlist_id], row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn remove_setlist_entry(&self, key: SetlistEntryKey) -> Result<()> {
        let removed = delete_entry(self.conn(), key)?;
        if removed.is_none() {
            return Err(Error::not_found("SetlistSongInfo", describe(key)));
        }
        Ok(())
    }

    /// Move an entry to `new_order`.
    ///
    /// The position is key material, so this deletes the entry and inserts
    /// it again under the new key, keeping its notes. If the new position
    /// is already taken by the same song, nothing changes and a conflict is
    /// reported.
    pub fn move_setlist_entry(
        &self,
        key: SetlistEntryKey,
        new_order: i32,
    ) -> Result<SetlistSongInfo> {
        if key.order == new_order {
            return self.get_setlist_entry(key);
        }
        let tx = self.transaction()?;
        let Some(mut entry) = delete_entry(&tx, key)? else {
            return Err(Error::not_found("SetlistSongInfo", describe(key)));
        };
        entry.key = key.at(new_order);
        insert_entry(&tx, &entry)?;
        tx.commit()?;
        log::debug!("Moved {} to position {}", describe(key), new_order);
        Ok(entry)
    }

    pub fn get_setlist_entry(&self, key: SetlistEntryKey) -> Result<SetlistSongInfo> {
        select_entry(self.conn(), key)?
            .ok_or_else(|| Error::not_found("SetlistSongInfo", describe(key)))
    }
}

fn describe(key: SetlistEntryKey) -> String {
    format!("{}/{}@{}", key.setlist_id, key.song_id, key.order)
}

fn insert_entry(conn: &Connection, entry: &SetlistSongInfo) -> Result<()> {
    conn.execute(
        &format!(r#"INSERT INTO "SetlistSongInfo" ({ENTRY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"#),
        rusqlite::params![
            entry.key.setlist_id,
            entry.key.song_id,
            entry.key.order,
            entry.notes,
            ts(&entry.created_at),
        ],
    )
    .on_write("SetlistSongInfo", describe(entry.key))?;
    Ok(())
}

fn select_entry(conn: &Connection, key: SetlistEntryKey) -> Result<Option<SetlistSongInfo>> {
    Ok(conn
        .query_row(
            &format!(
                r#"SELECT {ENTRY_COLUMNS} FROM "SetlistSongInfo"
                   WHERE "setlistId" = ?1 AND "songId" = ?2 AND "order" = ?3"#
            ),
            rusqlite::params![key.setlist_id, key.song_id, key.order],
            row_to_entry,
        )
        .optional()?)
}

/// Delete one entry, returning what was removed.
fn delete_entry(conn: &Connection, key: SetlistEntryKey) -> Result<Option<SetlistSongInfo>> {
    let Some(entry) = select_entry(conn, key)? else {
        return Ok(None);
    };
    conn.execute(
        r#"DELETE FROM "SetlistSongInfo"
           WHERE "setlistId" = ?1 AND "songId" = ?2 AND "order" = ?3"#,
        rusqlite::params![key.setlist_id, key.song_id, key.order],
    )?;
    Ok(Some(entry))
}

fn row_to_setlist(row: &rusqlite::Row<'_>) -> rusqlite::Result<Setlist> {
    Ok(Setlist {
        id: row.get(0)?,
        name: row.get(1)?,
        notes: row.get(2)?,
        created_at: get_ts(row, 3)?,
    })
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<SetlistSongInfo> {
    Ok(SetlistSongInfo {
        key: SetlistEntryKey::new(row.get(0)?, row.get(1)?, row.get(2)?),
        notes: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Song;
    use crate::ErrorKind;

    struct Fixture {
        db: Database,
        setlist: Setlist,
        song: Song,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let setlist = Setlist::new("Sommerkonzert");
        let song = Song::new("Ave Maria");
        db.insert_setlist(&setlist).unwrap();
        db.insert_song(&song).unwrap();
        Fixture { db, setlist, song }
    }

    fn entry(f: &Fixture, order: i32) -> SetlistSongInfo {
        SetlistSongInfo::new(SetlistEntryKey::new(f.setlist.id, f.song.id, order))
    }

    #[test]
    fn test_same_triple_twice_is_conflict() {
        let f = fixture();
        f.db.add_setlist_entry(&entry(&f, 1)).unwrap();
        let err = f.db.add_setlist_entry(&entry(&f, 1)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(f.db.list_setlist_entries(f.setlist.id).unwrap().len(), 1);
    }

    #[test]
    fn test_same_song_at_two_positions() {
        let f = fixture();
        f.db.add_setlist_entry(&entry(&f, 1)).unwrap();
        f.db.add_setlist_entry(&entry(&f, 5)).unwrap();

        let orders: Vec<_> = f
            .db
            .list_setlist_entries(f.setlist.id)
            .unwrap()
            .iter()
            .map(|e| e.key.order)
            .collect();
        assert_eq!(orders, vec![1, 5]);
    }

    #[test]
    fn test_entry_for_missing_song_is_not_found() {
        let f = fixture();
        let missing = SetlistSongInfo::new(SetlistEntryKey::new(f.setlist.id, SongId::new(), 1));
        let err = f.db.add_setlist_entry(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_append_continues_after_last_position() {
        let f = fixture();
        let first = f.db.append_to_setlist(f.setlist.id, f.song.id, None).unwrap();
        f.db.add_setlist_entry(&entry(&f, 7)).unwrap();
        let next = f
            .db
            .append_to_setlist(f.setlist.id, f.song.id, Some("Zugabe".to_string()))
            .unwrap();

        assert_eq!(first.key.order, 1);
        assert_eq!(next.key.order, 8);
        assert_eq!(next.notes.as_deref(), Some("Zugabe"));
    }

    #[test]
    fn test_append_after_highest_position_is_rejected() {
        let f = fixture();
        f.db.add_setlist_entry(&entry(&f, i32::MAX)).unwrap();

        let err = f
            .db
            .append_to_setlist(f.setlist.id, f.song.id, None)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(f.db.list_setlist_entries(f.setlist.id).unwrap().len(), 1);
    }

    #[test]
    fn test_move_is_delete_and_reinsert() {
        let f = fixture();
        let mut original = entry(&f, 2);
        original.notes = Some("a cappella".to_string());
        f.db.add_setlist_entry(&original).unwrap();

        let moved = f.db.move_setlist_entry(original.key, 4).unwrap();

        assert_eq!(moved.key.order, 4);
        assert_eq!(moved.notes.as_deref(), Some("a cappella"));
        let entries = f.db.list_setlist_entries(f.setlist.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.order, 4);
    }

    #[test]
    fn test_move_onto_taken_position_keeps_original() {
        let f = fixture();
        f.db.add_setlist_entry(&entry(&f, 1)).unwrap();
        f.db.add_setlist_entry(&entry(&f, 2)).unwrap();

        let err = f.db.move_setlist_entry(entry(&f, 1).key, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let orders: Vec<_> = f
            .db
            .list_setlist_entries(f.setlist.id)
            .unwrap()
            .iter()
            .map(|e| e.key.order)
            .collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn test_remove_missing_entry_is_not_found() {
        let f = fixture();
        let err = f.db.remove_setlist_entry(entry(&f, 3).key).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_setlist_leaves_other_setlists_alone() {
        let f = fixture();
        let other = Setlist::new("Adventsingen");
        f.db.insert_setlist(&other).unwrap();
        f.db.add_setlist_entry(&entry(&f, 1)).unwrap();
        f.db.add_setlist_entry(&entry(&f, 2)).unwrap();
        f.db.append_to_setlist(other.id, f.song.id, None).unwrap();

        f.db.delete_setlist(f.setlist.id).unwrap();

        assert!(f.db.list_setlist_entries(f.setlist.id).unwrap().is_empty());
        assert_eq!(f.db.list_setlist_entries(other.id).unwrap().len(), 1);
        assert_eq!(f.db.list_setlists().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_song_removes_its_setlist_entries() {
        let f = fixture();
        let other_song = Song::new("Abendlied");
        f.db.insert_song(&other_song).unwrap();
        f.db.add_setlist_entry(&entry(&f, 1)).unwrap();
        f.db.append_to_setlist(f.setlist.id, other_song.id, None).unwrap();

        f.db.delete_song(f.song.id).unwrap();

        let entries = f.db.list_setlist_entries(f.setlist.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key.song_id, other_song.id);
    }
}
