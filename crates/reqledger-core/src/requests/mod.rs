//! Typed request ledger over SQLite.
//!
//! [`RequestLedger`] is the entry point used by the CLI and by any
//! transport layered on top: it fixes the generic [`Ledger`] to
//! [`MakeRequest`] snapshots in the `request_versions` table and adds
//! cursor pagination.

mod codec;

use crate::config::LedgerConfig;
use crate::db::SqliteStore;
use crate::error::{FieldViolation, LedgerError};
use crate::ledger::{Cancel, ColumnFilter, Ledger, ListQuery, RetryPolicy, Version};
use crate::model::{MakeRequest, Request, UpdateRequest};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Page size when a query does not name one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page a single query may ask for.
pub const MAX_PAGE_LIMIT: u32 = 500;

/// Filters and cursor for [`RequestLedger::list_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestQuery {
    pub status: Option<String>,
    pub hotel_id: Option<String>,
    /// Exclusive cursor: only ids greater than this one are returned.
    pub after: Option<Uuid>,
    pub limit: Option<u32>,
}

/// One page of latest requests, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPage {
    pub items: Vec<Request>,
    /// Cursor for the next page; `None` once a short page shows the end.
    pub next_cursor: Option<Uuid>,
}

pub struct RequestLedger {
    inner: Ledger<MakeRequest, SqliteStore<MakeRequest>>,
}

impl RequestLedger {
    /// Open the ledger database named by `config`, creating and migrating
    /// it when needed.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the database cannot be opened.
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = SqliteStore::open(&config.database)?;
        info!(
            path = %config.database.path.display(),
            max_attempts = config.append.max_attempts,
            "request ledger ready"
        );
        Ok(Self::from_store(store, RetryPolicy::from(&config.append)))
    }

    /// Ledger over a private in-memory database.
    ///
    /// # Errors
    ///
    /// [`LedgerError::StoreUnavailable`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Ok(Self::from_store(
            SqliteStore::open_in_memory()?,
            RetryPolicy::default(),
        ))
    }

    #[must_use]
    pub const fn from_store(store: SqliteStore<MakeRequest>, retry: RetryPolicy) -> Self {
        Self {
            inner: Ledger::new(store, retry),
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger<MakeRequest, SqliteStore<MakeRequest>> {
        &self.inner
    }

    /// Create a request with a generated id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] for a missing required field; store and
    /// cancellation failures.
    pub fn insert(&self, request: MakeRequest, cancel: &Cancel) -> Result<Request, LedgerError> {
        self.inner.create(None, request, cancel)
    }

    /// Create a request under a caller-chosen id.
    ///
    /// # Errors
    ///
    /// As [`RequestLedger::insert`], plus [`LedgerError::AlreadyExists`] if
    /// `id` is taken.
    pub fn insert_with_id(
        &self,
        id: Uuid,
        request: MakeRequest,
        cancel: &Cancel,
    ) -> Result<Request, LedgerError> {
        self.inner.create(Some(id), request, cancel)
    }

    /// Apply a partial update and return the new version.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`], [`LedgerError::Validation`],
    /// [`LedgerError::Conflict`]; store and cancellation failures.
    pub fn update(
        &self,
        id: Uuid,
        update: &UpdateRequest,
        cancel: &Cancel,
    ) -> Result<Request, LedgerError> {
        self.inner.append(id, update, cancel)
    }

    /// Latest version of `id`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`]; store and cancellation failures.
    pub fn get(&self, id: Uuid, cancel: &Cancel) -> Result<Request, LedgerError> {
        self.inner.latest(id, cancel)
    }

    /// # Errors
    ///
    /// [`LedgerError::NotFound`] if that version does not exist; store and
    /// cancellation failures.
    pub fn get_version(
        &self,
        id: Uuid,
        version: Version,
        cancel: &Cancel,
    ) -> Result<Request, LedgerError> {
        self.inner.at(id, version, cancel)
    }

    /// # Errors
    ///
    /// [`LedgerError::NotFound`]; store and cancellation failures.
    pub fn history(&self, id: Uuid, cancel: &Cancel) -> Result<Vec<Request>, LedgerError> {
        self.inner.history(id, cancel)
    }

    /// Latest version of every request, ordered by id.
    ///
    /// # Errors
    ///
    /// Store and cancellation failures.
    pub fn list(&self, cancel: &Cancel) -> Result<Vec<Request>, LedgerError> {
        self.inner.list_latest(&ListQuery::default(), cancel)
    }

    /// One page of latest versions matching `query`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Validation`] for a limit outside
    /// `1..=MAX_PAGE_LIMIT`; store and cancellation failures.
    pub fn list_page(
        &self,
        query: &RequestQuery,
        cancel: &Cancel,
    ) -> Result<RequestPage, LedgerError> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(LedgerError::Validation(vec![FieldViolation {
                field: "limit",
                reason: "must be between 1 and 500",
            }]));
        }

        let filters = [("status", &query.status), ("hotel_id", &query.hotel_id)]
            .into_iter()
            .filter_map(|(column, value)| {
                value.as_ref().map(|value| ColumnFilter {
                    column,
                    value: value.clone(),
                })
            })
            .collect();

        let items = self.inner.list_latest(
            &ListQuery {
                filters,
                after: query.after,
                limit: Some(limit),
            },
            cancel,
        )?;

        let full = u32::try_from(items.len()).is_ok_and(|len| len == limit);
        let next_cursor = if full {
            items.last().map(|request| request.id)
        } else {
            None
        };
        Ok(RequestPage { items, next_cursor })
    }
}
