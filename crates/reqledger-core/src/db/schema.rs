//! Canonical SQLite schema for the request ledger.
//!
//! - `request_versions` holds one immutable row per `(id, version)`; the
//!   current state of an id is its max-version row
//! - `ledger_meta` tracks the applied schema version
//!
//! The table is `WITHOUT ROWID` so rows are clustered by the `(id, version)`
//! primary key. The latest row of an id is the last entry of its key range,
//! which serves both `latest` and the per-id `MAX(version)` used by listings.

/// Migration v1: version rows plus ledger metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS request_versions (
    id TEXT NOT NULL CHECK (length(id) = 36),
    version INTEGER NOT NULL CHECK (version >= 1),
    hotel_id TEXT NOT NULL CHECK (length(trim(hotel_id)) > 0),
    guest_id TEXT,
    user_id TEXT,
    reservation_id TEXT,
    room_id TEXT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    description TEXT,
    request_category TEXT,
    request_type TEXT NOT NULL CHECK (length(trim(request_type)) > 0),
    department TEXT,
    status TEXT NOT NULL CHECK (length(trim(status)) > 0),
    priority TEXT NOT NULL CHECK (length(trim(priority)) > 0),
    estimated_completion_time INTEGER,
    scheduled_time_us INTEGER,
    completed_at_us INTEGER,
    notes TEXT,
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (id, version),
    CHECK (updated_at_us = created_at_us)
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS ledger_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO ledger_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: listing indexes and immutability guards.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_request_versions_id_version_desc
    ON request_versions(id, version DESC);

CREATE INDEX IF NOT EXISTS idx_request_versions_status
    ON request_versions(status, id);

CREATE INDEX IF NOT EXISTS idx_request_versions_hotel
    ON request_versions(hotel_id, id);

CREATE TRIGGER IF NOT EXISTS request_versions_no_update
BEFORE UPDATE ON request_versions
BEGIN
    SELECT RAISE(ABORT, 'request_versions rows are immutable');
END;

CREATE TRIGGER IF NOT EXISTS request_versions_no_delete
BEFORE DELETE ON request_versions
BEGIN
    SELECT RAISE(ABORT, 'request_versions rows are immutable');
END;

UPDATE ledger_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the read paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_request_versions_id_version_desc",
    "idx_request_versions_status",
    "idx_request_versions_hotel",
];

/// Triggers that reject in-place edits of version rows.
pub const IMMUTABILITY_TRIGGERS: &[&str] =
    &["request_versions_no_update", "request_versions_no_delete"];
