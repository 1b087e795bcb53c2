//! Integration tests for integrity rules on an on-disk database.
//!
//! These reopen the database file between steps so that per-connection
//! settings (foreign keys, migrations) are exercised the way the CLI sees
//! them.

use cantus_core::model::{
    AttendanceKey, Event, Setlist, SetlistEntryKey, SetlistSongInfo, Singer, Song, VoiceGroup,
};
use cantus_core::registration::Registration;
use cantus_core::schema::Database;
use cantus_core::{Error, ErrorKind, InviteRejection};
use chrono::{Duration, TimeZone, Utc};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

fn registration(email: &str, token: Option<String>) -> Registration {
    Registration {
        first_name: "Greta".to_string(),
        last_name: "Lind".to_string(),
        email: email.to_string(),
        password: "cantate domino".to_string(),
        invite_token: token,
    }
}

/// Reopening an existing file must not re-run migrations.
#[test]
fn test_reopen_keeps_data_and_migrations() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cantus.db");

    {
        let db = Database::open(&db_path).expect("Failed to open database");
        db.insert_song(&Song::new("Ubi caritas")).unwrap();
    }

    let db = Database::open(&db_path).expect("Failed to reopen database");
    assert_eq!(db.count_songs().unwrap(), 1);
    let migrations: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(migrations, 1);
}

/// Foreign keys are a per-connection setting in SQLite.
#[test]
fn test_foreign_keys_enforced_after_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cantus.db");

    let singer = Singer::new("Paul", "Ernst", VoiceGroup::T1);
    let start = Utc.with_ymd_and_hms(2024, 9, 3, 19, 0, 0).unwrap();
    let event = Event::new("cal-42", "Probe", start, start + Duration::hours(2));
    {
        let db = Database::open(&db_path).unwrap();
        db.insert_singer(&singer).unwrap();
        db.upsert_event(&event).unwrap();
        db.record_attendance(&AttendanceKey::new(singer.id, event.id.clone()))
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    let err = db.delete_singer(singer.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);

    let raw = db
        .conn()
        .execute(r#"DELETE FROM "Event" WHERE id = ?1"#, ["cal-42"]);
    assert!(raw.is_err(), "storage must enforce RESTRICT on its own");
}

#[test]
fn test_setlist_deletion_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path().join("cantus.db")).unwrap();

    let song = Song::new("Locus iste");
    db.insert_song(&song).unwrap();
    let advent = Setlist::new("Advent");
    let easter = Setlist::new("Easter");
    db.insert_setlist(&advent).unwrap();
    db.insert_setlist(&easter).unwrap();

    for setlist in [&advent, &easter] {
        db.add_setlist_entry(&SetlistSongInfo::new(SetlistEntryKey::new(
            setlist.id, song.id, 1,
        )))
        .unwrap();
        db.add_setlist_entry(&SetlistSongInfo::new(SetlistEntryKey::new(
            setlist.id, song.id, 4,
        )))
        .unwrap();
    }

    db.delete_setlist(advent.id).unwrap();

    assert_eq!(db.list_setlist_entries(easter.id).unwrap().len(), 2);
    assert!(db.list_setlist_entries(advent.id).unwrap().is_empty());
    assert!(db.get_song(song.id).is_ok());
}

#[test]
fn test_registration_bootstrap_then_invites() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cantus.db");
    let now = Utc::now();

    {
        let db = Database::open(&db_path).unwrap();
        db.register_user(&registration("admin@example.org", None), now)
            .unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    let err = db
        .register_user(&registration("second@example.org", None), now)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InviteRejected(InviteRejection::Missing)
    ));

    let invite = db.create_invite(Some(now + Duration::days(7))).unwrap();
    db.register_user(
        &registration("second@example.org", Some(invite.token.clone())),
        now,
    )
    .unwrap();
    assert_eq!(db.count_users().unwrap(), 2);

    let err = db
        .register_user(&registration("third@example.org", Some(invite.token)), now)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

/// While another connection holds the write lock, a registration cannot
/// read the user count and fails instead of bootstrapping.
#[test]
fn test_bootstrap_waits_for_write_lock() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cantus.db");
    let holder = Database::open(&db_path).unwrap();
    let other = Database::open(&db_path).unwrap();
    other.set_busy_timeout(StdDuration::from_millis(50)).unwrap();
    let now = Utc::now();

    holder.conn().execute_batch("BEGIN IMMEDIATE").unwrap();
    let err = other
        .register_user(&registration("other@example.org", None), now)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    holder.conn().execute_batch("ROLLBACK").unwrap();

    holder
        .register_user(&registration("holder@example.org", None), now)
        .unwrap();
    let err = other
        .register_user(&registration("other@example.org", None), now)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InviteRejected(InviteRejection::Missing)
    ));
    assert_eq!(holder.count_users().unwrap(), 1);
}

#[test]
fn test_concurrent_first_registrations_bootstrap_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cantus.db");
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["alto@example.org", "bass@example.org"]
        .into_iter()
        .map(|email| {
            let db = Database::open(&db_path).unwrap();
            db.set_busy_timeout(StdDuration::from_secs(30)).unwrap();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                db.register_user(&registration(email, None), Utc::now())
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let err = results.into_iter().find_map(Result::err).unwrap();
    assert!(
        matches!(err, Error::InviteRejected(InviteRejection::Missing))
            || err.kind() == ErrorKind::Storage,
        "unexpected error: {err}"
    );
    let db = Database::open(&db_path).unwrap();
    assert_eq!(db.count_users().unwrap(), 1);
}

#[test]
fn test_raw_sql_cannot_store_unknown_enum_values() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path().join("cantus.db")).unwrap();

    let bad_key = db.conn().execute(
        r#"INSERT INTO "Song" (id, name, "key", "createdAt")
           VALUES ('s1', 'Gloria', 'H', '2024-01-01T00:00:00.000000000Z')"#,
        [],
    );
    assert!(bad_key.is_err());

    let song = Song::new("Gloria");
    db.insert_song(&song).unwrap();
    let bad_type = db.conn().execute(
        r#"INSERT INTO "SongFileLink" ("songId", "type", label, url, "createdAt")
           VALUES (?1, 'Midi', 'x', 'y', '2024-01-01T00:00:00.000000000Z')"#,
        [song.id.to_string()],
    );
    assert!(bad_type.is_err());
    let good_type = db.conn().execute(
        r#"INSERT INTO "SongFileLink" ("songId", "type", label, url, "createdAt")
           VALUES (?1, 'MuseScore', 'x', 'y', '2024-01-01T00:00:00.000000000Z')"#,
        [song.id.to_string()],
    );
    assert!(good_type.is_ok());
}
