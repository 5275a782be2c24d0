//! Version allocation.
//!
//! Versions are dense per id: the first row is `1` and every later row is
//! exactly the previous maximum plus one. Allocation only computes the
//! candidate; the backend's insert is what claims it, inside one write
//! transaction that re-checks the maximum and is guarded by the
//! `(id, version)` primary key. A lost claim surfaces as
//! [`LedgerError::VersionConflict`].

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of a row within one id's history. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Version(u64);

impl Version {
    /// Version written by `create`.
    pub const INITIAL: Self = Self(1);

    /// Largest version the SQLite `INTEGER` column can hold.
    pub const MAX: Self = Self(i64::MAX.unsigned_abs());

    /// Wrap a raw version number, rejecting `0` and values beyond [`Self::MAX`].
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 || raw > Self::MAX.0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The version that must follow `self`, if there is room for one.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// The version this one was derived from. `None` for [`Self::INITIAL`].
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        Self::new(self.0 - 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Version {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or_else(|| format!("version must be between 1 and {}", Self::MAX))
    }
}

impl From<Version> for u64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Version for a brand-new id.
#[must_use]
pub const fn initial_version() -> Version {
    Version::INITIAL
}

/// Version for the next row of `id`, given the version currently on top.
///
/// # Errors
///
/// Returns [`LedgerError::VersionOverflow`] if `current` is already
/// [`Version::MAX`].
pub fn next_version(id: Uuid, current: Version) -> Result<Version, LedgerError> {
    current
        .successor()
        .ok_or(LedgerError::VersionOverflow { id })
}

#[cfg(test)]
mod tests {
    use super::{Version, initial_version, next_version};
    use crate::error::LedgerError;
    use uuid::Uuid;

    #[test]
    fn zero_is_not_a_version() {
        assert_eq!(Version::new(0), None);
        assert_eq!(Version::new(1), Some(Version::INITIAL));
        assert_eq!(initial_version().get(), 1);
    }

    #[test]
    fn next_is_exactly_one_more() {
        let id = Uuid::new_v4();
        let mut current = initial_version();
        for expected in 2..=10 {
            current = next_version(id, current).expect("room for more versions");
            assert_eq!(current.get(), expected);
        }
    }

    #[test]
    fn next_version_reports_overflow() {
        let id = Uuid::new_v4();
        let err = next_version(id, Version::MAX).expect_err("no room after MAX");
        assert!(matches!(err, LedgerError::VersionOverflow { id: got } if got == id));
    }

    #[test]
    fn predecessor_of_initial_is_none() {
        assert_eq!(Version::INITIAL.predecessor(), None);
        let three = Version::new(3).expect("valid version");
        assert_eq!(three.predecessor(), Version::new(2));
    }

    #[test]
    fn serde_rejects_zero() {
        assert!(serde_json::from_str::<Version>("0").is_err());
        let v: Version = serde_json::from_str("7").expect("parse version");
        assert_eq!(v.get(), 7);
        assert_eq!(serde_json::to_string(&v).expect("serialize"), "7");
    }
}
