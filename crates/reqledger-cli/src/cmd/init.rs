//! `reqledger init`: create or migrate the ledger database.

use super::Context;
use crate::output::{pretty_kv, render};
use clap::Args;
use reqledger_core::db::migrations::LATEST_SCHEMA_VERSION;
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Args, Debug, Default)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    path: String,
    schema_version: u32,
}

/// # Errors
///
/// Returns an error if the database cannot be created or migrated.
pub fn run_init(_args: &InitArgs, ctx: &Context) -> anyhow::Result<()> {
    ctx.open()?;
    let report = InitReport {
        path: ctx.config.database.path.display().to_string(),
        schema_version: LATEST_SCHEMA_VERSION,
    };
    info!(path = %report.path, "ledger initialized");

    render(ctx.output, &report, |report, w| {
        writeln!(w, "Initialized request ledger")?;
        pretty_kv(w, "path", &report.path)?;
        pretty_kv(w, "schema_version", report.schema_version.to_string())
    })
}
