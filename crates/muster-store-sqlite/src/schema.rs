//! SQL schema for the Muster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- `active` only ever moves from 1 to 0. Rows are never deleted.
CREATE TABLE IF NOT EXISTS sessions (
    session_id  TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    label       TEXT,
    active      INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    created_at  TEXT NOT NULL     -- RFC 3339 UTC, microsecond precision
);

-- Check-ins are write-once. The UNIQUE constraint is the only guard
-- against duplicate check-ins.
CREATE TABLE IF NOT EXISTS checkins (
    checkin_id      TEXT PRIMARY KEY,
    session_id      TEXT NOT NULL REFERENCES sessions(session_id),
    subject_id      TEXT NOT NULL,
    subject_label   TEXT,
    subject_contact TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (session_id, subject_id)
);

CREATE INDEX IF NOT EXISTS sessions_owner_idx ON sessions(owner_id, created_at);

PRAGMA user_version = 1;
";
