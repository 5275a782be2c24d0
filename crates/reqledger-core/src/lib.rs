//! reqledger-core library.
//!
//! An append-only, versioned store for hotel service requests. Every write
//! adds a full snapshot row `(id, version)`; nothing is edited in place.
//!
//! - [`ledger`]: storage-agnostic merge engine, version allocation, retry,
//!   cancellation, and the generic [`ledger::Ledger`]
//! - [`db`]: SQLite schema, migrations, connection pool, and the
//!   [`db::SqliteStore`] backend
//! - [`model`]: request snapshot and partial-update types
//! - [`requests`]: the typed [`requests::RequestLedger`] entry point
//!
//! # Conventions
//!
//! - **Errors**: library APIs return [`error::LedgerError`]; setup helpers
//!   return `anyhow::Result`.
//! - **Logging**: `tracing` macros only. The binary installs the subscriber.

pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod model;
pub mod requests;

pub use error::{ErrorCode, FieldViolation, LedgerError};
pub use ledger::{Cancel, Version};
pub use model::{MakeRequest, Patch, Request, UpdateRequest};
pub use requests::{RequestLedger, RequestPage, RequestQuery};
