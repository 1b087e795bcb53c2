use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{EventId, SingerId};

/// A rehearsal or performance, mirrored from the choir calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,

    /// When this record was last refreshed from the calendar.
    #[serde(default = "Utc::now")]
    pub last_sync_at: DateTime<Utc>,

    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub fn new(
        id: impl Into<EventId>,
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            description: None,
            location: None,
            last_sync_at: Utc::now(),
            start,
            end,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// An event is past once its end lies before `now`.
    #[must_use]
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// Identity of an attendance record: at most one per singer and event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceKey {
    pub singer_id: SingerId,
    pub event_id: EventId,
}

impl AttendanceKey {
    #[must_use]
    pub const fn new(singer_id: SingerId, event_id: EventId) -> Self {
        Self {
            singer_id,
            event_id,
        }
    }
}

/// A singer's recorded presence at an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttendance {
    pub key: AttendanceKey,
    pub created_at: DateTime<Utc>,
}

/// Events split the way the attendance overview presents them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventOverview {
    /// The upcoming or ongoing event that starts first.
    pub current: Option<Event>,
    /// Finished events, newest start first.
    pub past: Vec<Event>,
}

impl EventOverview {
    /// Split events relative to `now`. Input order does not matter.
    #[must_use]
    pub fn from_events(mut events: Vec<Event>, now: DateTime<Utc>) -> Self {
        events.sort_by(|a, b| b.start.cmp(&a.start));
        let (past, mut upcoming): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| e.is_past(now));
        Self {
            current: upcoming.pop(),
            past,
        }
    }
}
