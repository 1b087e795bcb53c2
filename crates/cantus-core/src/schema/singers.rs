use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::model::{required_text, Singer, SingerId, VoiceGroup};

use super::codec::{get_ts, ts};
use super::constraint::WriteResultExt;
use super::Database;

const SINGER_COLUMNS: &str = r#"id, "firstName", "lastName", email, "voiceGroup", "createdAt""#;

// Singer CRUD
impl Database {
    /// Insert a new singer. A second singer with the same e-mail is a
    /// conflict; singers without e-mail never conflict.
    pub fn insert_singer(&self, singer: &Singer) -> Result<()> {
        let first_name = required_text("first name", &singer.first_name)?;
        let last_name = required_text("last name", &singer.last_name)?;
        let email = normalize_email(singer.email.as_deref());

        self.conn()
            .execute(
                &format!(
                    r#"INSERT INTO "Singer" ({SINGER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#
                ),
                rusqlite::params![
                    singer.id,
                    first_name,
                    last_name,
                    email,
                    singer.voice_group,
                    ts(&singer.created_at),
                ],
            )
            .on_write("Singer", singer.email.as_deref().unwrap_or(&singer.full_name()))?;
        log::debug!("Inserted singer {} ({})", singer.full_name(), singer.id);
        Ok(())
    }

    /// Change a singer's voice group.
    pub fn set_voice_group(&self, id: SingerId, voice_group: VoiceGroup) -> Result<()> {
        let updated = self.conn().execute(
            r#"UPDATE "Singer" SET "voiceGroup" = ?2 WHERE id = ?1"#,
            rusqlite::params![id, voice_group],
        )?;
        if updated == 0 {
            return Err(Error::not_found("Singer", id));
        }
        Ok(())
    }

    pub fn get_singer(&self, id: SingerId) -> Result<Singer> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {SINGER_COLUMNS} FROM "Singer" WHERE id = ?1"#),
                [id],
                row_to_singer,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Singer", id))
    }

    pub fn find_singer_by_email(&self, email: &str) -> Result<Option<Singer>> {
        let Some(email) = normalize_email(Some(email)) else {
            return Ok(None);
        };
        Ok(self
            .conn()
            .query_row(
                &format!(r#"SELECT {SINGER_COLUMNS} FROM "Singer" WHERE email = ?1"#),
                [email],
                row_to_singer,
            )
            .optional()?)
    }

    /// All singers, ordered by last and first name.
    pub fn list_singers(&self) -> Result<Vec<Singer>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {SINGER_COLUMNS} FROM "Singer" ORDER BY "lastName", "firstName""#
        ))?;
        let singers = stmt
            .query_map([], row_to_singer)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(singers)
    }

    /// Delete a singer.
    ///
    /// Fails with `ReferentialIntegrity` while attendance rows reference
    /// the singer; remove those first if deletion is really intended.
    pub fn delete_singer(&self, id: SingerId) -> Result<()> {
        self.delete_row("Singer", &id)
    }
}

/// E-mail is compared as stored; only surrounding whitespace is dropped
/// and blank input counts as absent.
pub(crate) fn normalize_email(email: Option<&str>) -> Option<String> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

fn row_to_singer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Singer> {
    Ok(Singer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        voice_group: row.get(4)?,
        created_at: get_ts(row, 5)?,
    })
}
