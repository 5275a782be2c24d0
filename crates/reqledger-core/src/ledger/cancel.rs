//! Cancellation tokens for ledger operations.
//!
//! A [`Cancel`] combines an explicit flag, shared by every clone, with an
//! optional deadline. Backends poll it between steps and hand
//! [`Cancel::interrupter`] to SQLite so that a statement already running
//! is aborted too. An aborted write transaction is rolled back as a whole.

use crate::error::LedgerError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct Cancel {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancel {
    /// A token that only trips when [`Cancel::cancel`] is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that trips at `deadline` or on [`Cancel::cancel`].
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// A token that trips `timeout` from now or on [`Cancel::cancel`].
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Trip the token for this handle and every clone of it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        tripped(&self.flag, self.deadline)
    }

    /// Time left before the deadline; `None` when there is no deadline.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// # Errors
    ///
    /// Returns [`LedgerError::Cancelled`] once the token has tripped.
    pub fn check(&self) -> Result<(), LedgerError> {
        if self.is_cancelled() {
            Err(LedgerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Clamp a wait so it never outlives the deadline.
    #[must_use]
    pub fn clamp(&self, wait: Duration) -> Duration {
        self.remaining().map_or(wait, |left| left.min(wait))
    }

    /// Progress callback for `rusqlite::Connection::progress_handler`.
    /// Returning `true` makes SQLite abort the running statement.
    pub(crate) fn interrupter(
        &self,
    ) -> impl FnMut() -> bool + Send + std::panic::RefUnwindSafe + 'static {
        let flag = Arc::clone(&self.flag);
        let deadline = self.deadline;
        move || tripped(&flag, deadline)
    }
}

fn tripped(flag: &AtomicBool, deadline: Option<Instant>) -> bool {
    flag.load(Ordering::SeqCst) || deadline.is_some_and(|deadline| Instant::now() >= deadline)
}
