//! `reqledger list`: latest version of each request, one page at a time.

use super::Context;
use crate::output::{fail, render, write_request_row};
use clap::Args;
use reqledger_core::RequestQuery;
use reqledger_core::requests::DEFAULT_PAGE_LIMIT;
use std::io::Write;
use uuid::Uuid;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only requests whose latest status is this.
    #[arg(long)]
    pub status: Option<String>,

    /// Only requests whose latest hotel is this.
    #[arg(long)]
    pub hotel_id: Option<String>,

    /// Start after this id (the `next_cursor` of the previous page).
    #[arg(long)]
    pub after: Option<Uuid>,

    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub limit: u32,
}

impl ListArgs {
    fn to_query(&self) -> RequestQuery {
        RequestQuery {
            status: self.status.clone(),
            hotel_id: self.hotel_id.clone(),
            after: self.after,
            limit: Some(self.limit),
        }
    }
}

/// # Errors
///
/// Returns an error if the query is invalid or the read fails.
pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let ledger = ctx.open_existing()?;
    let page = ledger
        .list_page(&args.to_query(), &ctx.cancel())
        .map_err(|err| fail(ctx.output, &err))?;

    render(ctx.output, &page, |page, w| {
        if page.items.is_empty() {
            return writeln!(w, "No requests found.");
        }
        for request in &page.items {
            write_request_row(w, request)?;
        }
        if let Some(cursor) = page.next_cursor {
            writeln!(w, "next: --after {cursor}")?;
        }
        Ok(())
    })
}
