use super::cancel::Cancel;
use super::merge::Snapshot;
use super::record::VersionedRecord;
use super::version::Version;
use crate::error::LedgerError;
use uuid::Uuid;

/// Equality filter on a snapshot column of the latest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: &'static str,
    pub value: String,
}

/// Parameters for listing the latest row of every id.
///
/// Results are ordered by id. `after` is an exclusive id cursor; filters are
/// evaluated against each id's latest row only, never against history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filters: Vec<ColumnFilter>,
    pub after: Option<Uuid>,
    pub limit: Option<u32>,
}

/// Row storage behind a [`super::store::Ledger`].
///
/// Backends never update or delete a row. Both insert methods must perform
/// their existence/max check and the insert in one atomic unit.
pub trait VersionStore<S: Snapshot>: Send + Sync {
    /// Insert `record` as version 1 of a new id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AlreadyExists`] if any row exists for `record.id`.
    fn insert_initial(&self, record: &VersionedRecord<S>, cancel: &Cancel)
    -> Result<(), LedgerError>;

    /// Insert `record` on top of `record.version - 1`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::VersionConflict`] if the current maximum version of
    /// `record.id` is no longer `record.version - 1`.
    fn insert_next(&self, record: &VersionedRecord<S>, cancel: &Cancel) -> Result<(), LedgerError>;

    /// Max-version row of `id`.
    ///
    /// # Errors
    ///
    /// Store or cancellation failures.
    fn latest(&self, id: Uuid, cancel: &Cancel) -> Result<Option<VersionedRecord<S>>, LedgerError>;

    /// Exact historical row.
    ///
    /// # Errors
    ///
    /// Store or cancellation failures.
    fn at(
        &self,
        id: Uuid,
        version: Version,
        cancel: &Cancel,
    ) -> Result<Option<VersionedRecord<S>>, LedgerError>;

    /// Every row of `id`, oldest first.
    ///
    /// # Errors
    ///
    /// Store or cancellation failures.
    fn history(&self, id: Uuid, cancel: &Cancel) -> Result<Vec<VersionedRecord<S>>, LedgerError>;

    /// Latest row per id, in one consistent read.
    ///
    /// # Errors
    ///
    /// Store or cancellation failures, or a filter on an unknown column.
    fn list_latest(
        &self,
        query: &ListQuery,
        cancel: &Cancel,
    ) -> Result<Vec<VersionedRecord<S>>, LedgerError>;
}
