//! SQL schema for the MATM SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS contacts (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id          TEXT    NOT NULL UNIQUE,
    username            TEXT    NOT NULL,
    phonenumber         INTEGER NOT NULL,
    email               TEXT    NOT NULL,
    email_opt_in_status INTEGER NOT NULL,
    sms_opt_in_status   INTEGER NOT NULL,
    country             TEXT,
    state               TEXT,
    matm_owner          TEXT    NOT NULL,
    individual_id       TEXT,
    status              TEXT,
    created_at          TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at          TEXT    NOT NULL
);

-- Contact points are append-only projections of contacts.
CREATE TABLE IF NOT EXISTS email_opt_in (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL,
    email       TEXT NOT NULL,
    country     TEXT,
    state       TEXT,
    matm_owner  TEXT NOT NULL,
    contact_id  TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS mobile_opt_in (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT    NOT NULL,
    phonenumber INTEGER NOT NULL,
    country     TEXT,
    state       TEXT,
    matm_owner  TEXT    NOT NULL,
    contact_id  TEXT    NOT NULL,
    recorded_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS individual (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL,
    individual_id TEXT NOT NULL,
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS email_opt_in_email_idx  ON email_opt_in(email);
CREATE INDEX IF NOT EXISTS mobile_opt_in_phone_idx ON mobile_opt_in(phonenumber);
CREATE INDEX IF NOT EXISTS individual_id_idx       ON individual(individual_id);

PRAGMA user_version = 1;
";
