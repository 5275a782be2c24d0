//! Copy-forward merge of a partial update onto a full snapshot.
//!
//! The merge is a pure function of its inputs. `Ledger::append` re-runs it
//! from scratch on every retry, so a retried update produces the same
//! snapshot as the first attempt would have against the same predecessor.

use crate::error::{FieldViolation, LedgerError};

/// Full state of one resource at one version.
pub trait Snapshot: Clone + PartialEq + Send + Sync + 'static {
    /// Partial payload with explicit per-field presence.
    type Update: Send + Sync;

    /// Copy-forward: fields absent from `update` keep their value from
    /// `self`, present fields replace it. Performs no validation.
    #[must_use]
    fn apply(&self, update: &Self::Update) -> Self;

    /// Required-field rules this snapshot breaks. Empty when valid.
    fn violations(&self) -> Vec<FieldViolation>;

    /// Round values to what the store can hold, so a written record equals
    /// the row read back. Identity unless a field is finer than the store.
    #[must_use]
    fn normalized(self) -> Self {
        self
    }
}

/// Reject a snapshot that breaks its required-field rules.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] listing every violation.
pub fn validate<S: Snapshot>(snapshot: &S) -> Result<(), LedgerError> {
    let violations = snapshot.violations();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Validation(violations))
    }
}

/// Produce the snapshot that follows `previous` once `update` is applied.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] if the merged snapshot would break a
/// required-field rule, for example by clearing a required field.
pub fn merge<S: Snapshot>(previous: &S, update: &S::Update) -> Result<S, LedgerError> {
    let next = previous.apply(update).normalized();
    validate(&next)?;
    Ok(next)
}

/// Standard check for a required text field.
#[must_use]
pub fn require_text(field: &'static str, value: &str) -> Option<FieldViolation> {
    value.trim().is_empty().then_some(FieldViolation {
        field,
        reason: "must not be an empty string",
    })
}
