use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{SetlistId, SongId};

/// A named, ordered selection of songs for a concert or rehearsal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setlist {
    pub id: SetlistId,
    pub name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Setlist {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SetlistId::new(),
            name: name.into(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Identity of a setlist entry.
///
/// The position is part of the key, so one song may appear several times
/// in the same setlist. Moving an entry means replacing its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetlistEntryKey {
    pub setlist_id: SetlistId,
    pub song_id: SongId,
    pub order: i32,
}

impl SetlistEntryKey {
    #[must_use]
    pub const fn new(setlist_id: SetlistId, song_id: SongId, order: i32) -> Self {
        Self {
            setlist_id,
            song_id,
            order,
        }
    }

    #[must_use]
    pub const fn at(self, order: i32) -> Self {
        Self { order, ..self }
    }
}

/// A song placed at a position in a setlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetlistSongInfo {
    pub key: SetlistEntryKey,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SetlistSongInfo {
    #[must_use]
    pub fn new(key: SetlistEntryKey) -> Self {
        Self {
            key,
            notes: None,
            created_at: Utc::now(),
        }
    }
}
