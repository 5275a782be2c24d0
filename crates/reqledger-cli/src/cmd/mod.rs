pub mod create;
pub mod history;
pub mod init;
pub mod list;
pub mod show;
pub mod update;

use crate::output::{CliError, OutputMode, fail, render_error};
use reqledger_core::config::LedgerConfig;
use reqledger_core::{Cancel, ErrorCode, RequestLedger};
use std::time::Duration;

/// Resolved settings shared by every command.
pub struct Context {
    pub config: LedgerConfig,
    pub output: OutputMode,
    pub timeout: Option<Duration>,
}

impl Context {
    /// Token for one command: bounded by `--timeout-ms` when given.
    pub fn cancel(&self) -> Cancel {
        self.timeout.map_or_else(Cancel::new, Cancel::with_timeout)
    }

    /// Open the ledger database, which must already exist.
    pub fn open_existing(&self) -> anyhow::Result<RequestLedger> {
        let path = &self.config.database.path;
        if !path.exists() {
            render_error(
                self.output,
                &CliError::new(
                    format!("no ledger database at {}", path.display()),
                    ErrorCode::NotInitialized,
                ),
            )?;
            anyhow::bail!("ledger database not initialized");
        }
        self.open()
    }

    /// Open the ledger database, creating and migrating it when needed.
    pub fn open(&self) -> anyhow::Result<RequestLedger> {
        RequestLedger::open(&self.config).map_err(|err| fail(self.output, &err))
    }
}
