//! Classification of SQLite constraint failures.
//!
//! Constraint checks happen in the storage engine at write time; this
//! module only decides which [`Error`] a failed write becomes.

use std::fmt;

use rusqlite::{ffi, ErrorCode};

use crate::error::Error;

/// The kind of constraint a failed statement violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    Check,
    NotNull,
    Other,
}

pub(crate) fn violation(err: &rusqlite::Error) -> Option<Violation> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Violation::Unique
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Violation::ForeignKey,
                ffi::SQLITE_CONSTRAINT_CHECK => Violation::Check,
                ffi::SQLITE_CONSTRAINT_NOTNULL => Violation::NotNull,
                _ => Violation::Other,
            })
        }
        _ => None,
    }
}

fn message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        rusqlite::Error::SqliteFailure(e, None) => e.to_string(),
        other => other.to_string(),
    }
}

/// Classify a failed insert or update of `entity` identified by `key`.
pub(crate) fn write_error(
    err: rusqlite::Error,
    entity: &'static str,
    key: impl fmt::Display,
) -> Error {
    match violation(&err) {
        Some(Violation::Unique) => Error::Conflict {
            entity,
            detail: format!("{} already exists ({})", key, message(&err)),
        },
        Some(Violation::ForeignKey) => Error::NotFound {
            entity: "referenced row",
            id: format!("{entity} {key}"),
        },
        Some(Violation::Check | Violation::NotNull) => {
            Error::Validation(format!("{entity} {key}: {}", message(&err)))
        }
        Some(Violation::Other) | None => Error::Database(err),
    }
}

/// Extension for mapping write results through [`write_error`].
pub(crate) trait WriteResultExt<T> {
    fn on_write(self, entity: &'static str, key: impl fmt::Display) -> crate::Result<T>;
}

impl<T> WriteResultExt<T> for rusqlite::Result<T> {
    fn on_write(self, entity: &'static str, key: impl fmt::Display) -> crate::Result<T> {
        self.map_err(|e| write_error(e, entity, key))
    }
}
