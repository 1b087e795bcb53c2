/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

// Table and column names match the schema other tooling reads; keep them.
const MIGRATION_001: &str = r#"
-- Accounts and identity
CREATE TABLE IF NOT EXISTS "User" (
    id TEXT PRIMARY KEY NOT NULL,
    "firstName" TEXT NOT NULL,
    "lastName" TEXT NOT NULL,
    email TEXT,
    "passwordHash" TEXT,
    "emailVerified" TEXT,
    "createdAt" TEXT NOT NULL,
    image TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS "User_email_key" ON "User"(email);

CREATE TABLE IF NOT EXISTS "Account" (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL
        REFERENCES "User"(id) ON DELETE CASCADE ON UPDATE CASCADE,
    "type" TEXT NOT NULL,
    provider TEXT NOT NULL,
    provider_account_id TEXT NOT NULL,
    refresh_token TEXT,
    access_token TEXT,
    expires_at INTEGER,
    token_type TEXT,
    scope TEXT,
    id_token TEXT,
    session_state TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS "Account_provider_provider_account_id_key"
    ON "Account"(provider, provider_account_id);
CREATE INDEX IF NOT EXISTS "Account_user_id_idx" ON "Account"(user_id);

CREATE TABLE IF NOT EXISTS "Session" (
    id TEXT PRIMARY KEY NOT NULL,
    session_token TEXT NOT NULL,
    user_id TEXT NOT NULL
        REFERENCES "User"(id) ON DELETE CASCADE ON UPDATE CASCADE,
    expires TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS "Session_session_token_key" ON "Session"(session_token);
CREATE INDEX IF NOT EXISTS "Session_user_id_idx" ON "Session"(user_id);

CREATE TABLE IF NOT EXISTS "InviteToken" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    token TEXT NOT NULL,
    used INTEGER NOT NULL DEFAULT 0 CHECK (used IN (0, 1)),
    "createdAt" TEXT NOT NULL,
    expires TEXT,
    "usedAt" TEXT,
    user_id TEXT
        REFERENCES "User"(id) ON DELETE SET NULL ON UPDATE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS "InviteToken_token_key" ON "InviteToken"(token);
CREATE UNIQUE INDEX IF NOT EXISTS "InviteToken_user_id_key" ON "InviteToken"(user_id);

CREATE TABLE IF NOT EXISTS "VerificationToken" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    identifier TEXT NOT NULL,
    token TEXT NOT NULL,
    expires TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS "VerificationToken_token_key"
    ON "VerificationToken"(token);
CREATE UNIQUE INDEX IF NOT EXISTS "VerificationToken_identifier_token_key"
    ON "VerificationToken"(identifier, token);

-- Choir data
CREATE TABLE IF NOT EXISTS "GoogleDriveFile" (
    id TEXT PRIMARY KEY NOT NULL,
    "createdAt" TEXT NOT NULL,
    name TEXT NOT NULL,
    "mimeType" TEXT NOT NULL,
    "downloadUrl" TEXT NOT NULL,
    "lastSyncAt" TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS "Event" (
    id TEXT PRIMARY KEY NOT NULL,
    summary TEXT NOT NULL,
    description TEXT,
    location TEXT,
    "lastSyncAt" TEXT NOT NULL,
    "start" TEXT NOT NULL,
    "end" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "Event_start_idx" ON "Event"("start");

CREATE TABLE IF NOT EXISTS "Singer" (
    id TEXT PRIMARY KEY NOT NULL,
    "firstName" TEXT NOT NULL,
    "lastName" TEXT NOT NULL,
    email TEXT,
    "createdAt" TEXT NOT NULL,
    "voiceGroup" TEXT NOT NULL CHECK ("voiceGroup" IN (
        'S1', 'S2', 'S2_M', 'A1_M', 'A1', 'A2', 'T1', 'T2', 'B1', 'B2', 'D'
    ))
);

CREATE UNIQUE INDEX IF NOT EXISTS "Singer_email_key" ON "Singer"(email);

CREATE TABLE IF NOT EXISTS "Song" (
    id TEXT PRIMARY KEY NOT NULL,
    "createdAt" TEXT NOT NULL,
    name TEXT NOT NULL,
    "key" TEXT CHECK ("key" IN (
        'C', 'C#', 'Db', 'D', 'D#', 'Eb', 'E', 'F', 'F#',
        'Gb', 'G', 'G#', 'Ab', 'A', 'A#', 'Bb', 'B'
    )),
    lyrics TEXT,
    notes TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS "Song_name_key" ON "Song"(name);

CREATE TABLE IF NOT EXISTS "Setlist" (
    id TEXT PRIMARY KEY NOT NULL,
    "createdAt" TEXT NOT NULL,
    name TEXT NOT NULL,
    notes TEXT
);

-- Attendance history must outlive casual deletes: RESTRICT, not CASCADE.
CREATE TABLE IF NOT EXISTS "EventAttendance" (
    "singerId" TEXT NOT NULL
        REFERENCES "Singer"(id) ON DELETE RESTRICT ON UPDATE CASCADE,
    "eventId" TEXT NOT NULL
        REFERENCES "Event"(id) ON DELETE RESTRICT ON UPDATE CASCADE,
    "createdAt" TEXT NOT NULL,
    PRIMARY KEY ("singerId", "eventId")
);

CREATE INDEX IF NOT EXISTS "EventAttendance_eventId_idx" ON "EventAttendance"("eventId");

CREATE TABLE IF NOT EXISTS "SetlistSongInfo" (
    "setlistId" TEXT NOT NULL
        REFERENCES "Setlist"(id) ON DELETE CASCADE,
    "songId" TEXT NOT NULL
        REFERENCES "Song"(id) ON DELETE CASCADE,
    "order" INTEGER NOT NULL,
    "createdAt" TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY ("setlistId", "songId", "order")
);

CREATE INDEX IF NOT EXISTS "SetlistSongInfo_songId_idx" ON "SetlistSongInfo"("songId");

CREATE TABLE IF NOT EXISTS "SongFileLink" (
    "songId" TEXT NOT NULL
        REFERENCES "Song"(id) ON DELETE CASCADE,
    "createdAt" TEXT NOT NULL,
    "type" TEXT NOT NULL CHECK ("type" IN (
        'Audio', 'AudioRecording', 'AudioPracticeTrack', 'AudioInitialNotes',
        'Video', 'PDF', 'MuseScore', 'Other'
    )),
    label TEXT NOT NULL,
    url TEXT NOT NULL,
    "googleDriveId" TEXT
        REFERENCES "GoogleDriveFile"(id) ON DELETE SET NULL ON UPDATE CASCADE,
    PRIMARY KEY ("songId", label)
);

CREATE UNIQUE INDEX IF NOT EXISTS "SongFileLink_googleDriveId_key"
    ON "SongFileLink"("googleDriveId");
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
