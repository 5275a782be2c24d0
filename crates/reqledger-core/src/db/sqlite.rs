//! SQLite-backed [`VersionStore`].
//!
//! Writes run in `BEGIN IMMEDIATE` transactions. The write lock is taken
//! before the existence or max-version check, so the check and the insert
//! see the same table state and at most one writer can claim a given
//! `(id, version)`. The primary key rejects a duplicate claim regardless.
//!
//! Every call installs the caller's [`Cancel`] as the connection's progress
//! handler and clamps the busy timeout to the remaining deadline, so
//! neither a long statement nor a wait for the write lock outlives it.

use super::codec::{
    RowCodec, insert_sql, record_from_row, record_values, select_columns, text_value, uuid_value,
    version_value,
};
use super::pool::Pool;
use crate::config::DatabaseConfig;
use crate::error::{FieldViolation, LedgerError};
use crate::ledger::{Cancel, ListQuery, Version, VersionStore, VersionedRecord};
use rusqlite::types::Value;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior, ffi,
    params_from_iter,
};
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{trace, warn};
use uuid::Uuid;

/// VM instructions between cancellation polls.
const PROGRESS_OPS: i32 = 1_000;

pub struct SqliteStore<S> {
    pool: Pool,
    _snapshot: PhantomData<fn() -> S>,
}

enum Failure {
    Ledger(LedgerError),
    Sql {
        context: &'static str,
        source: rusqlite::Error,
    },
}

impl From<LedgerError> for Failure {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

fn sql(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Failure {
    move |source| Failure::Sql { context, source }
}

/// Per-call connection settings: the cancellation progress handler and,
/// under a deadline, a shortened busy timeout. Dropping the scope restores
/// both, so an early return or a panic never leaks them into the next
/// checkout of the pooled connection.
struct CallScope<'c> {
    conn: &'c Connection,
    restore_busy: Option<Duration>,
}

impl<'c> CallScope<'c> {
    fn enter(
        conn: &'c Connection,
        cancel: &Cancel,
        busy: Duration,
        clamped: Option<Duration>,
    ) -> Result<Self, Failure> {
        let scope = Self {
            conn,
            restore_busy: clamped.map(|_| busy),
        };
        if let Some(clamped) = clamped {
            conn.busy_timeout(clamped).map_err(sql("set busy timeout"))?;
        }
        conn.progress_handler(PROGRESS_OPS, Some(cancel.interrupter()));
        Ok(scope)
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.conn.progress_handler(0, None::<fn() -> bool>);
        if let Some(busy) = self.restore_busy {
            if let Err(err) = self.conn.busy_timeout(busy) {
                warn!(%err, "could not restore the busy timeout of a pooled connection");
            }
        }
    }
}

impl<S: RowCodec> SqliteStore<S> {
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self {
            pool,
            _snapshot: PhantomData,
        }
    }

    /// Open (creating and migrating if needed) the database at
    /// `config.path`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the database cannot be opened.
    pub fn open(config: &DatabaseConfig) -> Result<Self, LedgerError> {
        Pool::open(config).map(Self::new)
    }

    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Pool::in_memory().map(Self::new)
    }

    #[must_use]
    pub const fn pool(&self) -> &Pool {
        &self.pool
    }

    fn run<T>(
        &self,
        cancel: &Cancel,
        f: impl FnOnce(&Connection) -> Result<T, Failure>,
    ) -> Result<T, LedgerError> {
        cancel.check()?;
        let busy = self.pool.busy_timeout();
        let clamped = cancel.clamp(busy);
        let deadline_bound = clamped < busy;

        let outcome = self.pool.with_connection(cancel, |conn| {
            let clamp = deadline_bound.then_some(clamped);
            let _scope = CallScope::enter(conn, cancel, busy, clamp)?;
            f(conn)
        })?;

        outcome.map_err(|failure| match failure {
            Failure::Ledger(err) => err,
            Failure::Sql { context, source } => classify(source, context, cancel, deadline_bound),
        })
    }

    fn read_one(
        conn: &Connection,
        sql_text: &str,
        params: Vec<Value>,
    ) -> Result<Option<VersionedRecord<S>>, Failure> {
        conn.prepare_cached(sql_text)
            .map_err(sql("prepare read"))?
            .query_row(params_from_iter(params), record_from_row::<S>)
            .optional()
            .map_err(sql("read version row"))
    }

    fn read_many(
        conn: &Connection,
        sql_text: &str,
        params: Vec<Value>,
    ) -> Result<Vec<VersionedRecord<S>>, Failure> {
        let mut stmt = conn.prepare(sql_text).map_err(sql("prepare read"))?;
        let rows = stmt
            .query_map(params_from_iter(params), record_from_row::<S>)
            .map_err(sql("read version rows"))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(sql("decode version row"))
    }
}

impl<S: RowCodec> VersionStore<S> for SqliteStore<S> {
    fn insert_initial(
        &self,
        record: &VersionedRecord<S>,
        cancel: &Cancel,
    ) -> Result<(), LedgerError> {
        let id = record.id;
        self.run(cancel, |conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                .map_err(sql("begin insert"))?;

            let exists: bool = tx
                .query_row(
                    &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", S::TABLE),
                    [uuid_value(id)],
                    |row| row.get(0),
                )
                .map_err(sql("check existing id"))?;
            if exists {
                return Err(LedgerError::AlreadyExists { id }.into());
            }

            tx.execute(&insert_sql::<S>(), params_from_iter(record_values(record)))
                .map_err(|source| {
                    if is_key_violation(&source) {
                        Failure::Ledger(LedgerError::AlreadyExists { id })
                    } else {
                        Failure::Sql {
                            context: "insert initial version",
                            source,
                        }
                    }
                })?;
            tx.commit().map_err(sql("commit insert"))?;
            trace!(%id, "inserted initial row");
            Ok(())
        })
    }

    fn insert_next(&self, record: &VersionedRecord<S>, cancel: &Cancel) -> Result<(), LedgerError> {
        let id = record.id;
        let version = record.version;
        let expected = version.predecessor().map(version_value);

        self.run(cancel, |conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                .map_err(sql("begin append"))?;

            let current: Option<i64> = tx
                .query_row(
                    &format!("SELECT MAX(version) FROM {} WHERE id = ?1", S::TABLE),
                    [uuid_value(id)],
                    |row| row.get(0),
                )
                .map_err(sql("read max version"))?;
            let current = current.map(Value::Integer);

            if current != expected {
                let err = if current.is_none() {
                    LedgerError::NotFound { id, version: None }
                } else {
                    LedgerError::VersionConflict {
                        id,
                        version: version.get(),
                    }
                };
                return Err(err.into());
            }

            tx.execute(&insert_sql::<S>(), params_from_iter(record_values(record)))
                .map_err(|source| {
                    if is_key_violation(&source) {
                        Failure::Ledger(LedgerError::VersionConflict {
                            id,
                            version: version.get(),
                        })
                    } else {
                        Failure::Sql {
                            context: "append version",
                            source,
                        }
                    }
                })?;
            tx.commit().map_err(sql("commit append"))?;
            trace!(%id, %version, "inserted row");
            Ok(())
        })
    }

    fn latest(&self, id: Uuid, cancel: &Cancel) -> Result<Option<VersionedRecord<S>>, LedgerError> {
        let query = format!(
            "SELECT {} FROM {} r WHERE r.id = ?1 ORDER BY r.version DESC LIMIT 1",
            select_columns::<S>("r"),
            S::TABLE
        );
        self.run(cancel, |conn| {
            Self::read_one(conn, &query, vec![uuid_value(id)])
        })
    }

    fn at(
        &self,
        id: Uuid,
        version: Version,
        cancel: &Cancel,
    ) -> Result<Option<VersionedRecord<S>>, LedgerError> {
        let query = format!(
            "SELECT {} FROM {} r WHERE r.id = ?1 AND r.version = ?2",
            select_columns::<S>("r"),
            S::TABLE
        );
        self.run(cancel, |conn| {
            Self::read_one(conn, &query, vec![uuid_value(id), version_value(version)])
        })
    }

    fn history(&self, id: Uuid, cancel: &Cancel) -> Result<Vec<VersionedRecord<S>>, LedgerError> {
        let query = format!(
            "SELECT {} FROM {} r WHERE r.id = ?1 ORDER BY r.version ASC",
            select_columns::<S>("r"),
            S::TABLE
        );
        self.run(cancel, |conn| {
            Self::read_many(conn, &query, vec![uuid_value(id)])
        })
    }

    fn list_latest(
        &self,
        query: &ListQuery,
        cancel: &Cancel,
    ) -> Result<Vec<VersionedRecord<S>>, LedgerError> {
        let unknown: Vec<FieldViolation> = query
            .filters
            .iter()
            .filter(|filter| !S::FILTER_COLUMNS.contains(&filter.column))
            .map(|filter| FieldViolation {
                field: filter.column,
                reason: "is not a filterable column",
            })
            .collect();
        if !unknown.is_empty() {
            return Err(LedgerError::Validation(unknown));
        }

        let (sql_text, params) = list_latest_sql::<S>(query);
        self.run(cancel, |conn| Self::read_many(conn, &sql_text, params))
    }
}

/// Latest row per id in a single statement, so the whole page comes from
/// one read snapshot.
fn list_latest_sql<S: RowCodec>(query: &ListQuery) -> (String, Vec<Value>) {
    let mut params: Vec<Value> = Vec::new();
    let mut conditions = vec![format!(
        "r.version = (SELECT MAX(m.version) FROM {} m WHERE m.id = r.id)",
        S::TABLE
    )];

    if let Some(after) = query.after {
        params.push(uuid_value(after));
        conditions.push(format!("r.id > ?{}", params.len()));
    }

    for filter in &query.filters {
        params.push(text_value(&filter.value));
        conditions.push(format!("r.{} = ?{}", filter.column, params.len()));
    }

    let limit_clause = query.limit.map_or_else(String::new, |limit| {
        params.push(Value::Integer(i64::from(limit)));
        format!(" LIMIT ?{}", params.len())
    });

    let sql_text = format!(
        "SELECT {} FROM {} r WHERE {} ORDER BY r.id ASC{limit_clause}",
        select_columns::<S>("r"),
        S::TABLE,
        conditions.join(" AND ")
    );
    (sql_text, params)
}

fn is_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn classify(
    err: rusqlite::Error,
    context: &'static str,
    cancel: &Cancel,
    deadline_bound: bool,
) -> LedgerError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        match e.code {
            ErrorCode::OperationInterrupted => return LedgerError::Cancelled,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                if deadline_bound || cancel.is_cancelled() =>
            {
                return LedgerError::Cancelled;
            }
            _ => {}
        }
    }
    LedgerError::store(context, err)
}
