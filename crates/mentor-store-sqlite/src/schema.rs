//! SQL schema for the Mentor SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (user, item). Rows are updated in place, never deleted.
-- Creation order is rowid order.
CREATE TABLE IF NOT EXISTS review_items (
    user_id       TEXT    NOT NULL,
    item_id       TEXT    NOT NULL,
    topic         TEXT    NOT NULL,
    interval_days INTEGER NOT NULL CHECK (interval_days >= 1),
    ease_factor   REAL    NOT NULL CHECK (ease_factor BETWEEN 1.3 AND 4.0),
    repetitions   INTEGER NOT NULL CHECK (repetitions >= 0),
    next_review   TEXT    NOT NULL,   -- RFC 3339 UTC
    last_reviewed TEXT,               -- RFC 3339 UTC or NULL
    PRIMARY KEY (user_id, item_id)
);

-- The mastery ledger is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS points_ledger (
    entry_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT    NOT NULL,
    recorded_at TEXT    NOT NULL,
    points      INTEGER NOT NULL,
    reason      TEXT    NOT NULL
);

-- Earned badges; membership is monotonic.
CREATE TABLE IF NOT EXISTS user_badges (
    user_id   TEXT NOT NULL,
    badge_id  TEXT NOT NULL,
    earned_at TEXT NOT NULL,
    PRIMARY KEY (user_id, badge_id)
);

CREATE TABLE IF NOT EXISTS user_progress (
    user_id        TEXT    PRIMARY KEY,
    current_streak INTEGER NOT NULL DEFAULT 0 CHECK (current_streak >= 0)
);

CREATE INDEX IF NOT EXISTS points_ledger_user_idx ON points_ledger(user_id);

PRAGMA user_version = 1;
";
