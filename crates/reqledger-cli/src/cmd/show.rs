//! `reqledger show`: display the latest or an exact version of a request.

use super::Context;
use crate::output::{CliError, fail, render, render_error, write_request};
use clap::Args;
use reqledger_core::{ErrorCode, Version};
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Request id.
    pub id: Uuid,

    /// Show this historical version instead of the latest.
    #[arg(long)]
    pub version: Option<u64>,
}

/// # Errors
///
/// Returns an error if the request or version does not exist or the read
/// fails.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let version = match args.version.map(Version::try_from).transpose() {
        Ok(version) => version,
        Err(reason) => {
            render_error(
                ctx.output,
                &CliError::new(
                    format!("invalid --version: {reason}"),
                    ErrorCode::ValidationViolation,
                ),
            )?;
            anyhow::bail!("invalid --version: {reason}");
        }
    };

    let ledger = ctx.open_existing()?;
    let cancel = ctx.cancel();
    let request = match version {
        Some(version) => ledger.get_version(args.id, version, &cancel),
        None => ledger.get(args.id, &cancel),
    }
    .map_err(|err| fail(ctx.output, &err))?;

    render(ctx.output, &request, |request, w| write_request(w, request))
}
