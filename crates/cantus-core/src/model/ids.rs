use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    Error::Validation(format!("invalid {} '{}': {}", stringify!($name), s, e))
                })
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }
    };
}

/// Ids assigned by an external system (calendar, file store) and kept as-is.
macro_rules! define_external_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id!(UserId, "Unique identifier for a user account.");
define_id!(
    AccountId,
    "Unique identifier for a linked external-identity record."
);
define_id!(SessionId, "Unique identifier for a login session.");
define_id!(SingerId, "Unique identifier for a choir member profile.");
define_id!(SongId, "Unique identifier for a song.");
define_id!(SetlistId, "Unique identifier for a setlist.");

define_external_id!(EventId, "Calendar-assigned identifier for an event.");
define_external_id!(
    DriveFileId,
    "Identifier of a file in the external file store."
);

/// Row id of an invite token (assigned by the database).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteTokenId(pub i64);

impl fmt::Display for InviteTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singer_id_generation() {
        let id1 = SingerId::new();
        let id2 = SingerId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_song_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = SongId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_id_parse_round_trips_display() {
        let id = SetlistId::new();
        let parsed: SetlistId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<UserId>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_external_id_is_opaque() {
        let id = EventId::new("abc123_20240101T180000Z");
        assert_eq!(id.as_str(), "abc123_20240101T180000Z");
        assert_eq!(id.to_string(), "abc123_20240101T180000Z");
    }
}
