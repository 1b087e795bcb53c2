use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

use super::constraint::{violation, Violation};
use super::migrations::MIGRATIONS;
use super::policy::{self, DeletePolicy};

/// A database connection with the operations of the choir data model.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Not persisted by SQLite; must be set on every connection.
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// How long a write waits for another process's lock before failing.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                let tx = self.conn.unchecked_transaction()?;
                tx.execute_batch(migration.sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    /// Start a deferred write transaction.
    pub(crate) fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Start a transaction that takes the write lock immediately, so reads
    /// inside it cannot be invalidated by a concurrent writer.
    pub(crate) fn immediate_transaction(&self) -> Result<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Delete one row of `table` by primary key `id`, honouring the
    /// relationship policy table.
    ///
    /// RESTRICT dependents are counted first so the error can name them;
    /// CASCADE and SET NULL are left to the storage engine.
    pub(crate) fn delete_row(&self, table: &'static str, id: &dyn fmt::Display) -> Result<()> {
        let id = id.to_string();
        let tx = self.transaction()?;

        let mut blocking = Vec::new();
        for relation in policy::referencing(table) {
            let count = count_dependents(&tx, relation.child, relation.column, &id)?;
            if count == 0 {
                continue;
            }
            match relation.on_delete {
                DeletePolicy::Restrict => blocking.push(format!("{count} {}", relation.child)),
                DeletePolicy::Cascade => log::debug!(
                    "Deleting {table} {id} cascades to {count} {} rows",
                    relation.child
                ),
                DeletePolicy::SetNull => log::debug!(
                    "Deleting {table} {id} clears {}.{} on {count} rows",
                    relation.child,
                    relation.column
                ),
            }
        }
        if !blocking.is_empty() {
            return Err(Error::ReferentialIntegrity {
                entity: table,
                id,
                dependents: blocking.join(", "),
            });
        }

        let deleted = tx
            .execute(&format!(r#"DELETE FROM "{table}" WHERE id = ?1"#), [&id])
            .map_err(|e| match violation(&e) {
                Some(Violation::ForeignKey) => Error::ReferentialIntegrity {
                    entity: table,
                    id: id.clone(),
                    dependents: "rows added concurrently".to_string(),
                },
                _ => Error::Database(e),
            })?;
        if deleted == 0 {
            return Err(Error::not_found(table, &id));
        }

        tx.commit()?;
        log::info!("Deleted {table} {id}");
        Ok(())
    }

    /// Whether a row with primary key `id` exists in `table`.
    pub(crate) fn exists(&self, table: &'static str, id: &dyn fmt::Display) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                &format!(r#"SELECT 1 FROM "{table}" WHERE id = ?1"#),
                [id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Fail with `NotFound` unless the row exists.
    pub(crate) fn require(&self, table: &'static str, id: &dyn fmt::Display) -> Result<()> {
        if self.exists(table, id)? {
            Ok(())
        } else {
            Err(Error::not_found(table, id))
        }
    }

    pub(crate) fn count_rows(&self, table: &'static str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!(r#"SELECT COUNT(*) FROM "{table}""#), [], |row| {
                row.get(0)
            })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn count_dependents(conn: &Connection, child: &str, column: &str, id: &str) -> Result<i64> {
    Ok(conn.query_row(
        &format!(r#"SELECT COUNT(*) FROM "{child}" WHERE "{column}" = ?1"#),
        [id],
        |row| row.get(0),
    )?)
}
