use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::model::{
    required_text, AttendanceKey, Event, EventAttendance, EventId, EventOverview, Singer, SingerId,
};

use super::codec::{get_ts, ts};
use super::constraint::WriteResultExt;
use super::Database;

const EVENT_COLUMNS: &str =
    r#"id, summary, description, location, "lastSyncAt", "start", "end""#;

/// Result of [`Database::mark_present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceOutcome {
    Recorded,
    AlreadyRecorded,
}

// Event CRUD
impl Database {
    /// Insert an event, or refresh it if the calendar id is already known.
    pub fn upsert_event(&self, event: &Event) -> Result<()> {
        let summary = required_text("event summary", &event.summary)?;
        if event.end < event.start {
            return Err(Error::validation(format!(
                "event {} ends before it starts",
                event.id
            )));
        }
        self.conn()
            .execute(
                &format!(
                    r#"INSERT INTO "Event" ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                       ON CONFLICT(id) DO UPDATE SET
                           summary = excluded.summary,
                           description = excluded.description,
                           location = excluded.location,
                           "lastSyncAt" = excluded."lastSyncAt",
                           "start" = excluded."start",
                           "end" = excluded."end""#
                ),
                rusqlite::params![
                    event.id,
                    summary,
                    event.description,
                    event.location,
                    ts(&event.last_sync_at),
                    ts(&event.start),
                    ts(&event.end),
                ],
            )
            .on_write("Event", &event.id)?;
        Ok(())
    }

    pub fn get_event(&self, id: &EventId) -> Result<Event> {
        self.conn()
            .query_row(
                &format!(r#"SELECT {EVENT_COLUMNS} FROM "Event" WHERE id = ?1"#),
                [id],
                row_to_event,
            )
            .optional()?
            .ok_or_else(|| Error::not_found("Event", id))
    }

    /// All events, latest start first.
    pub fn list_events(&self) -> Result<Vec<Event>> {
        let mut stmt = self.conn().prepare(&format!(
            r#"SELECT {EVENT_COLUMNS} FROM "Event" ORDER BY "start" DESC"#
        ))?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Past events and the current one, relative to `now`.
    pub fn event_overview(&self, now: DateTime<Utc>) -> Result<EventOverview> {
        Ok(EventOverview::from_events(self.list_events()?, now))
    }

    /// Delete an event. Blocked while attendance rows reference it.
    pub fn delete_event(&self, id: &EventId) -> Result<()> {
        self.delete_row("Event", id)
    }
}

// EventAttendance operations
impl Database {
    /// Record that a singer attended an event.
    ///
    /// A second record for the same pair is a conflict. Use
    /// [`Database::mark_present`] when "already recorded" is fine.
    pub fn record_attendance(&self, key: &AttendanceKey) -> Result<EventAttendance> {
        self.require("Singer", &key.singer_id)?;
        self.require("Event", &key.event_id)?;

        let attendance = EventAttendance {
            key: key.clone(),
            created_at: Utc::now(),
        };
        self.conn()
            .execute(
                r#"INSERT INTO "EventAttendance" ("singerId", "eventId", "createdAt")
                   VALUES (?1, ?2, ?3)"#,
                rusqlite::params![key.singer_id, key.event_id, ts(&attendance.created_at)],
            )
            .on_write(
                "EventAttendance",
                format!("{}/{}", key.singer_id, key.event_id),
            )?;
        Ok(attendance)
    }

    /// Record attendance, treating an existing record as success.
    pub fn mark_present(&self, key: &AttendanceKey) -> Result<AttendanceOutcome> {
        match self.record_attendance(key) {
            Ok(_) => Ok(AttendanceOutcome::Recorded),
            Err(Error::Conflict { .. }) => Ok(AttendanceOutcome::AlreadyRecorded),
            Err(e) => Err(e),
        }
    }

    pub fn remove_attendance(&self, key: &AttendanceKey) -> Result<()> {
        let removed = self.conn().execute(
            r#"DELETE FROM "EventAttendance" WHERE "singerId" = ?1 AND "eventId" = ?2"#,
            rusqlite::params![key.singer_id, key.event_id],
        )?;
        if removed == 0 {
            return Err(Error::not_found(
                "EventAttendance",
                format!("{}/{}", key.singer_id, key.event_id),
            ));
        }
        Ok(())
    }

    /// Remove every attendance row of a singer, returning how many went.
    pub fn clear_attendance_for_singer(&self, singer_id: SingerId) -> Result<usize> {
        let removed = self.conn().execute(
            r#"DELETE FROM "EventAttendance" WHERE "singerId" = ?1"#,
            [singer_id],
        )?;
        log::info!("Removed {removed} attendance records of singer {singer_id}");
        Ok(removed)
    }

    /// Remove every attendance row of an event, returning how many went.
    pub fn clear_attendance_for_event(&self, event_id: &EventId) -> Result<usize> {
        let removed = self.conn().execute(
            r#"DELETE FROM "EventAttendance" WHERE "eventId" = ?1"#,
            [event_id],
        )?;
        log::info!("Removed {removed} attendance records of event {event_id}");
        Ok(removed)
    }

    /// Singers recorded as present at an event, ordered by name.
    pub fn list_attendees(&self, event_id: &EventId) -> Result<Vec<Singer>> {
        let ids: Vec<SingerId> = {
            let mut stmt = self.conn().prepare(
                r#"SELECT a."singerId" FROM "EventAttendance" a
                   JOIN "Singer" s ON s.id = a."singerId"
                   WHERE a."eventId" = ?1
                   ORDER BY s."lastName", s."firstName""#,
            )?;
            let rows = stmt.query_map([event_id], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        ids.into_iter().map(|id| self.get_singer(id)).collect()
    }

    /// Attendance rows of an event, in the order they were recorded.
    pub fn list_attendance_for_event(&self, event_id: &EventId) -> Result<Vec<EventAttendance>> {
        let mut stmt = self.conn().prepare(
            r#"SELECT "singerId", "eventId", "createdAt" FROM "EventAttendance"
               WHERE "eventId" = ?1
               ORDER BY "createdAt""#,
        )?;
        let rows = stmt
            .query_map([event_id], row_to_attendance)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Attendance rows of a singer, latest event first.
    pub fn list_attendance_for_singer(&self, singer_id: SingerId) -> Result<Vec<EventAttendance>> {
        let mut stmt = self.conn().prepare(
            r#"SELECT a."singerId", a."eventId", a."createdAt" FROM "EventAttendance" a
               JOIN "Event" e ON e.id = a."eventId"
               WHERE a."singerId" = ?1
               ORDER BY e."start" DESC"#,
        )?;
        let rows = stmt
            .query_map([singer_id], row_to_attendance)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_attendance_for_event(&self, event_id: &EventId) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            r#"SELECT COUNT(*) FROM "EventAttendance" WHERE "eventId" = ?1"#,
            [event_id],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        summary: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        last_sync_at: get_ts(row, 4)?,
        start: get_ts(row, 5)?,
        end: get_ts(row, 6)?,
    })
}

fn row_to_attendance(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventAttendance> {
    Ok(EventAttendance {
        key: AttendanceKey::new(row.get(0)?, row.get(1)?),
        created_at: get_ts(row, 2)?,
    })
}
