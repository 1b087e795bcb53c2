//! Conversions between model types and SQLite values.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::model::{
    AccountId, DriveFileId, EventId, LinkType, MusicalKey, SessionId, SetlistId, SingerId, SongId,
    UserId, VoiceGroup,
};

macro_rules! sql_text_enum {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: crate::Error| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

macro_rules! sql_uuid_id {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.to_string()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    uuid::Uuid::parse_str(value.as_str()?)
                        .map(Self::from_uuid)
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

macro_rules! sql_external_id {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    String::column_result(value).map(Self::new)
                }
            }
        )+
    };
}

sql_text_enum!(VoiceGroup, MusicalKey, LinkType);
sql_uuid_id!(UserId, AccountId, SessionId, SingerId, SongId, SetlistId);
sql_external_id!(EventId, DriveFileId);

/// Fixed-width RFC 3339 so that text order equals time order.
pub(crate) fn ts(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn opt_ts(instant: Option<&DateTime<Utc>>) -> Option<String> {
    instant.map(ts)
}

fn parse_ts(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn get_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    parse_ts(idx, &text)
}

pub(crate) fn get_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|text| parse_ts(idx, &text))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_as_text() {
        let early = Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        assert!(ts(&early) < ts(&late));
        assert_eq!(ts(&early), "2024-01-09T09:00:00.000000000Z");
    }

    #[test]
    fn test_enum_read_rejects_unknown_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<VoiceGroup> =
            conn.query_row("SELECT 'Bass'", [], |row| row.get(0));
        assert!(result.is_err());
        let ok: VoiceGroup = conn.query_row("SELECT 'B1'", [], |row| row.get(0)).unwrap();
        assert_eq!(ok, VoiceGroup::B1);
    }
}
