//! SQLite ledger database utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` so readers never block the single writer
//! - `busy_timeout = 5s` so writers queue for the write lock instead of failing
//! - `foreign_keys = ON` for any relational tables added later

pub mod codec;
pub mod migrations;
pub mod pool;
pub mod schema;
pub mod sqlite;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

pub use pool::{Pool, Source};
pub use sqlite::SqliteStore;

/// Busy timeout used for ledger DB connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the ledger database, apply runtime pragmas, and migrate
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_ledger_db(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let mut conn = connect(path, busy_timeout)?;
    migrations::migrate(&mut conn).context("apply ledger migrations")?;
    Ok(conn)
}

/// Open a configured connection without running migrations.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or SQLite
/// rejects the file.
pub fn connect(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create ledger db directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("open ledger database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    Ok(conn)
}

/// Pragmas every ledger connection runs with.
pub(crate) fn configure_connection(
    conn: &Connection,
    busy_timeout: Duration,
) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
