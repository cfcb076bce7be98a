//! SQL schema for the registry's SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are never deleted. Rejection is a status, not a removal.
CREATE TABLE IF NOT EXISTS items (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    description    TEXT NOT NULL,
    location_found TEXT,
    contact_info   TEXT NOT NULL,
    photo_url      TEXT,
    date_found     TEXT NOT NULL,   -- YYYY-MM-DD
    created_at     TEXT NOT NULL,   -- RFC 3339 UTC; server-assigned
    approved_at    TEXT,
    status         TEXT NOT NULL DEFAULT 'pending_review'
                   CHECK (status IN ('pending_review', 'approved', 'rejected', 'claimed')),
    claim_id       INTEGER REFERENCES claims(id),
    CHECK ((status = 'claimed') = (claim_id IS NOT NULL))
);

CREATE TABLE IF NOT EXISTS claims (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id       INTEGER NOT NULL REFERENCES items(id),
    claimer_name  TEXT NOT NULL,
    claimer_email TEXT NOT NULL,
    match_details TEXT NOT NULL,
    submitted_at  TEXT NOT NULL,
    reviewed_at   TEXT,
    status        TEXT NOT NULL DEFAULT 'new_claim'
                  CHECK (status IN ('new_claim', 'approved', 'rejected'))
);

-- At most one approved claim per item.
CREATE UNIQUE INDEX IF NOT EXISTS claims_one_approved_idx
    ON claims(item_id) WHERE status = 'approved';

CREATE INDEX IF NOT EXISTS items_listing_idx ON items(status, date_found);
CREATE INDEX IF NOT EXISTS claims_item_idx   ON claims(item_id);

PRAGMA user_version = 1;
";
