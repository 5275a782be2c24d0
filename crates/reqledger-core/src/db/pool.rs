//! Bounded connection pool over `r2d2`.
//!
//! File databases get up to `pool_size` connections, each with its own WAL
//! read snapshot, so concurrent callers really do race at the SQLite write
//! lock. An in-memory database lives inside its one connection, so its pool
//! has exactly one slot, never reaps it, and callers take turns.

use super::{DEFAULT_BUSY_TIMEOUT, configure_connection, migrations, open_ledger_db};
use crate::config::DatabaseConfig;
use crate::error::LedgerError;
use crate::ledger::Cancel;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest single wait for a free connection before re-checking the
/// cancellation token.
const WAIT_SLICE: Duration = Duration::from_millis(25);

/// Give up on a checkout that has waited this long without a deadline.
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Memory,
}

pub struct Pool {
    source: Source,
    busy_timeout: Duration,
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl Pool {
    /// Open a pool for `config.path`. The schema is migrated once, before
    /// any pooled connection exists.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the database cannot be opened or
    /// migrated.
    pub fn open(config: &DatabaseConfig) -> Result<Self, LedgerError> {
        let busy_timeout = config.busy_timeout();
        drop(
            open_ledger_db(&config.path, busy_timeout)
                .map_err(|err| LedgerError::store("open database", err))?,
        );

        let manager = SqliteConnectionManager::file(&config.path)
            .with_init(move |conn| configure_connection(conn, busy_timeout));
        let max_size = u32::try_from(config.pool_size.max(1)).unwrap_or(u32::MAX);
        let pool = Self::build(
            Source::File(config.path.clone()),
            manager,
            max_size,
            busy_timeout,
        )?;
        debug!(path = %config.path.display(), max_size, "opened ledger database");
        Ok(pool)
    }

    /// Pool over a private in-memory database.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the schema cannot be created.
    pub fn in_memory() -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            configure_connection(conn, DEFAULT_BUSY_TIMEOUT)?;
            migrations::migrate(conn).map(drop)
        });
        let pool = Self::build(Source::Memory, manager, 1, DEFAULT_BUSY_TIMEOUT)?;

        // create the database now so schema errors surface at open
        pool.inner
            .get_timeout(CHECKOUT_TIMEOUT)
            .map_err(|err| LedgerError::store("open database", err))?;
        Ok(pool)
    }

    fn build(
        source: Source,
        manager: SqliteConnectionManager,
        max_size: u32,
        busy_timeout: Duration,
    ) -> Result<Self, LedgerError> {
        let inner = r2d2::Pool::builder()
            .max_size(max_size)
            .min_idle(Some(0))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .map_err(|err| LedgerError::store("build connection pool", err))?;
        Ok(Self {
            source,
            busy_timeout,
            inner,
        })
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Busy timeout every pooled connection is configured with.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.inner.max_size()
    }

    /// Run `f` on a pooled connection, waiting for one to free up if all are
    /// busy. The connection goes back to the pool afterwards, even if `f`
    /// panics.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Cancelled`] if `cancel` trips while waiting;
    /// [`LedgerError::StoreUnavailable`] if no connection could be had.
    pub fn with_connection<T>(
        &self,
        cancel: &Cancel,
        f: impl FnOnce(&Connection) -> T,
    ) -> Result<T, LedgerError> {
        let conn = self.checkout(cancel)?;
        Ok(f(&conn))
    }

    fn checkout(
        &self,
        cancel: &Cancel,
    ) -> Result<PooledConnection<SqliteConnectionManager>, LedgerError> {
        let give_up = Instant::now() + CHECKOUT_TIMEOUT;
        loop {
            cancel.check()?;
            match self.inner.get_timeout(cancel.clamp(WAIT_SLICE)) {
                Ok(conn) => return Ok(conn),
                Err(err) if Instant::now() >= give_up => {
                    return Err(LedgerError::store("connection checkout", err));
                }
                Err(_) => {}
            }
        }
    }
}
