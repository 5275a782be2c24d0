//! Generic versioned ledger.
//!
//! Storage-agnostic pieces of the ledger live here: the merge engine, the
//! version allocator, retry and cancellation, and [`store::Ledger`], which
//! ties them together over any [`backend::VersionStore`]. The SQLite
//! backend is in [`crate::db`].

pub mod backend;
pub mod cancel;
pub mod merge;
pub mod record;
pub mod retry;
pub mod store;
pub mod version;

pub use backend::{ColumnFilter, ListQuery, VersionStore};
pub use cancel::Cancel;
pub use merge::{Snapshot, merge};
pub use record::VersionedRecord;
pub use retry::RetryPolicy;
pub use store::Ledger;
pub use version::Version;
