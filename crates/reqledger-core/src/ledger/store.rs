//! The append-only ledger: create, append, and read versioned snapshots.
//!
//! [`Ledger`] owns the write discipline. An append is
//! read latest → merge → allocate `latest + 1` → conditional insert, and a
//! lost race restarts the whole sequence from a fresh read. Only
//! [`LedgerError::VersionConflict`] is retried; every other failure is
//! returned as-is on the first occurrence.

use super::backend::{ListQuery, VersionStore};
use super::cancel::Cancel;
use super::merge::{Snapshot, merge, validate};
use super::record::{VersionedRecord, now_micros};
use super::retry::RetryPolicy;
use super::version::{Version, initial_version, next_version};
use crate::error::LedgerError;
use std::marker::PhantomData;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

pub struct Ledger<S, B> {
    backend: B,
    retry: RetryPolicy,
    _snapshot: PhantomData<fn() -> S>,
}

impl<S, B> Ledger<S, B>
where
    S: Snapshot,
    B: VersionStore<S>,
{
    pub const fn new(backend: B, retry: RetryPolicy) -> Self {
        Self {
            backend,
            retry,
            _snapshot: PhantomData,
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Write version 1 of a resource.
    ///
    /// A fresh id is generated when `id` is `None`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if `initial` breaks a required-field rule
    /// - [`LedgerError::AlreadyExists`] if `id` was supplied and already has rows
    /// - store and cancellation failures
    #[instrument(level = "debug", skip(self, initial, cancel))]
    pub fn create(
        &self,
        id: Option<Uuid>,
        initial: S,
        cancel: &Cancel,
    ) -> Result<VersionedRecord<S>, LedgerError> {
        let initial = initial.normalized();
        validate(&initial)?;
        cancel.check()?;

        let id = id.unwrap_or_else(Uuid::new_v4);
        let record = VersionedRecord::stamped(id, initial_version(), initial, now_micros());
        self.backend.insert_initial(&record, cancel)?;

        debug!(%id, "created version 1");
        Ok(record)
    }

    /// Current state of `id`: its max-version row.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if `id` has no rows; store and cancellation
    /// failures.
    pub fn latest(&self, id: Uuid, cancel: &Cancel) -> Result<VersionedRecord<S>, LedgerError> {
        cancel.check()?;
        self.backend
            .latest(id, cancel)?
            .ok_or(LedgerError::NotFound { id, version: None })
    }

    /// Apply `update` on top of the latest version of `id` and append the
    /// result as the next version.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] if `id` has no rows
    /// - [`LedgerError::Validation`] if the merged snapshot is invalid
    /// - [`LedgerError::Conflict`] when every attempt lost a version race
    /// - store and cancellation failures
    #[instrument(level = "debug", skip(self, update, cancel))]
    pub fn append(
        &self,
        id: Uuid,
        update: &S::Update,
        cancel: &Cancel,
    ) -> Result<VersionedRecord<S>, LedgerError> {
        let mut attempt = 0_u32;
        loop {
            attempt += 1;

            let previous = self.latest(id, cancel)?;
            let snapshot = merge(&previous.snapshot, update)?;
            let version = next_version(id, previous.version)?;
            let record = VersionedRecord::stamped(id, version, snapshot, now_micros());

            match self.backend.insert_next(&record, cancel) {
                Ok(()) => {
                    debug!(%id, %version, attempt, "appended version");
                    return Ok(record);
                }
                Err(LedgerError::VersionConflict { .. }) if attempt < self.retry.max_attempts => {
                    warn!(%id, %version, attempt, "version claimed by another writer, retrying");
                    self.retry.pause(attempt, cancel)?;
                }
                Err(LedgerError::VersionConflict { .. }) => {
                    warn!(%id, attempts = attempt, "append abandoned under sustained contention");
                    return Err(LedgerError::Conflict {
                        id,
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Latest row of every id matching `query`, ordered by id.
    ///
    /// # Errors
    ///
    /// Store and cancellation failures.
    pub fn list_latest(
        &self,
        query: &ListQuery,
        cancel: &Cancel,
    ) -> Result<Vec<VersionedRecord<S>>, LedgerError> {
        cancel.check()?;
        self.backend.list_latest(query, cancel)
    }

    /// Exact historical version of `id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if `(id, version)` does not exist; store and
    /// cancellation failures.
    pub fn at(
        &self,
        id: Uuid,
        version: Version,
        cancel: &Cancel,
    ) -> Result<VersionedRecord<S>, LedgerError> {
        cancel.check()?;
        self.backend
            .at(id, version, cancel)?
            .ok_or(LedgerError::NotFound {
                id,
                version: Some(version.get()),
            })
    }

    /// Every version of `id`, oldest first.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if `id` has no rows; store and cancellation
    /// failures.
    pub fn history(
        &self,
        id: Uuid,
        cancel: &Cancel,
    ) -> Result<Vec<VersionedRecord<S>>, LedgerError> {
        cancel.check()?;
        let rows = self.backend.history(id, cancel)?;
        if rows.is_empty() {
            return Err(LedgerError::NotFound { id, version: None });
        }
        Ok(rows)
    }
}
