//! Per-relationship deletion policy.
//!
//! [`RELATIONS`] mirrors the foreign keys declared in the migrations. The
//! storage engine enforces them; every `delete_*` method on
//! [`super::Database`] goes through one routine that consults this table,
//! so blocked deletes are reported the same way everywhere.

use std::fmt;

/// What happens to a child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Child rows are deleted with the parent.
    Cascade,
    /// The parent cannot be deleted while child rows exist.
    Restrict,
    /// The child's reference is cleared.
    SetNull,
}

impl DeletePolicy {
    /// Spelling used by SQLite in `pragma_foreign_key_list`.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::SetNull => "SET NULL",
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A foreign key from `child.column` to `parent.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: &'static str,
    pub column: &'static str,
    pub parent: &'static str,
    pub on_delete: DeletePolicy,
}

const fn relation(
    child: &'static str,
    column: &'static str,
    parent: &'static str,
    on_delete: DeletePolicy,
) -> Relation {
    Relation {
        child,
        column,
        parent,
        on_delete,
    }
}

pub const RELATIONS: &[Relation] = &[
    relation("Account", "user_id", "User", DeletePolicy::Cascade),
    relation("Session", "user_id", "User", DeletePolicy::Cascade),
    relation("InviteToken", "user_id", "User", DeletePolicy::SetNull),
    relation("SongFileLink", "songId", "Song", DeletePolicy::Cascade),
    relation(
        "SongFileLink",
        "googleDriveId",
        "GoogleDriveFile",
        DeletePolicy::SetNull,
    ),
    relation("SetlistSongInfo", "setlistId", "Setlist", DeletePolicy::Cascade),
    relation("SetlistSongInfo", "songId", "Song", DeletePolicy::Cascade),
    relation("EventAttendance", "singerId", "Singer", DeletePolicy::Restrict),
    relation("EventAttendance", "eventId", "Event", DeletePolicy::Restrict),
];

/// Relations whose parent is `table`.
pub fn referencing(table: &str) -> impl Iterator<Item = &'static Relation> + '_ {
    RELATIONS.iter().filter(move |r| r.parent == table)
}
