use super::version::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable row of the ledger: a full snapshot plus its position in
/// the id's history.
///
/// `updated_at` always equals `created_at`. A row is never edited after it
/// is written, so the timestamp of the row is the timestamp of the version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedRecord<S> {
    pub id: Uuid,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: S,
}

impl<S> VersionedRecord<S> {
    /// Build a record stamped with `at`, truncated to the microsecond
    /// precision the store keeps.
    #[must_use]
    pub fn stamped(id: Uuid, version: Version, snapshot: S, at: DateTime<Utc>) -> Self {
        let at = truncate_to_micros(at);
        Self {
            id,
            version,
            created_at: at,
            updated_at: at,
            snapshot,
        }
    }
}

/// Current time at store precision.
#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    truncate_to_micros(Utc::now())
}

/// Drop sub-microsecond precision.
#[must_use]
pub fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}
