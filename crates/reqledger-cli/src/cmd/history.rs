//! `reqledger history`: every version of a request, oldest first.

use super::Context;
use crate::output::{fail, render, write_request_row};
use clap::Args;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Request id.
    pub id: Uuid,
}

/// # Errors
///
/// Returns an error if the request does not exist or the read fails.
pub fn run_history(args: &HistoryArgs, ctx: &Context) -> anyhow::Result<()> {
    let ledger = ctx.open_existing()?;
    let versions = ledger
        .history(args.id, &ctx.cancel())
        .map_err(|err| fail(ctx.output, &err))?;

    render(ctx.output, &versions, |versions, w| {
        for request in versions {
            write_request_row(w, request)?;
        }
        Ok(())
    })
}
