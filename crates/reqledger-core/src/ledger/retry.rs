//! Jittered backoff between append attempts that lost a version race.

use super::cancel::Cancel;
use crate::config::AppendConfig;
use crate::error::LedgerError;
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Bounded retry for appends that lose a version race.
///
/// Every retry re-reads the latest row and re-merges, so a larger budget
/// never risks a lost update; it only decides how long a writer keeps
/// trying under sustained contention before giving up with `Conflict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&AppendConfig::default())
    }
}

impl From<&AppendConfig> for RetryPolicy {
    fn from(config: &AppendConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that gives up after the first lost race.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_base: Duration::ZERO,
            backoff_max: Duration::ZERO,
        }
    }

    /// Upper bound of the wait after `attempt` failed attempts: doubles from
    /// `backoff_base`, capped at `backoff_max`.
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1 << shift)
            .min(self.backoff_max)
    }

    /// Sleep a jittered share of [`Self::ceiling`] before the next attempt.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Cancelled`] if `cancel` trips before or after
    /// the pause.
    pub fn pause(&self, attempt: u32, cancel: &Cancel) -> Result<(), LedgerError> {
        cancel.check()?;
        let ceiling = self.ceiling(attempt);
        if !ceiling.is_zero() {
            let micros = u64::try_from(ceiling.as_micros()).unwrap_or(u64::MAX);
            let jittered = Duration::from_micros(rand::thread_rng().gen_range(0..=micros));
            thread::sleep(cancel.clamp(jittered));
        }
        cancel.check()
    }
}
