use std::fmt;

use thiserror::Error;

/// Why an invite token was not accepted for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRejection {
    /// Users already exist and no token was supplied.
    Missing,
    /// No token with this value exists.
    Unknown,
    /// The token was already consumed by another registration.
    Used,
    /// The token's expiry instant has passed.
    Expired,
}

impl fmt::Display for InviteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Missing => "an invite token is required",
            Self::Unknown => "invite token does not exist",
            Self::Used => "invite token has already been used",
            Self::Expired => "invite token has expired",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    Validation(String),

    #[error("conflict: {entity} {detail}")]
    Conflict { entity: &'static str, detail: String },

    /// A delete was blocked by a RESTRICT foreign key.
    #[error("cannot delete {entity} {id}: still referenced by {dependents}")]
    ReferentialIntegrity {
        entity: &'static str,
        id: String,
        dependents: String,
    },

    #[error("registration rejected: {0}")]
    InviteRejected(InviteRejection),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Coarse classification of an [`Error`], used by callers that make
/// per-item decisions (skip and report vs. abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    ReferentialIntegrity,
    NotFound,
    /// Anything that is not a constraint violation.
    Storage,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InviteRejected(InviteRejection::Missing | InviteRejection::Expired) => {
                ErrorKind::Validation
            }
            Self::Conflict { .. } | Self::InviteRejected(InviteRejection::Used) => {
                ErrorKind::Conflict
            }
            Self::ReferentialIntegrity { .. } => ErrorKind::ReferentialIntegrity,
            Self::NotFound { .. } | Self::InviteRejected(InviteRejection::Unknown) => {
                ErrorKind::NotFound
            }
            Self::Database(_) | Self::Io(_) | Self::Serialization(_) | Self::PasswordHash(_) => {
                ErrorKind::Storage
            }
        }
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict)
    }

    pub(crate) fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_rejections_map_to_distinct_kinds() {
        assert_eq!(
            Error::InviteRejected(InviteRejection::Unknown).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::InviteRejected(InviteRejection::Used).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::InviteRejected(InviteRejection::Expired).kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_conflict_display() {
        let err = Error::Conflict {
            entity: "Song",
            detail: "name already exists".to_string(),
        };
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "conflict: Song name already exists");
    }
}
