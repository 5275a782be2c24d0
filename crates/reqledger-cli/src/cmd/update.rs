//! `reqledger update`: append a new version from a partial update.
//!
//! The update starts from `--payload` (absent keys keep, `null` clears),
//! then field flags set values, then `--clear` removes fields.

use super::Context;
use crate::output::{CliError, fail, render, render_error, write_request};
use chrono::{DateTime, Utc};
use clap::Args;
use clap::builder::PossibleValuesParser;
use reqledger_core::model::UPDATE_FIELDS;
use reqledger_core::{ErrorCode, Patch, UpdateRequest};
use tracing::debug;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Request id.
    pub id: Uuid,

    /// Partial update as a JSON object.
    #[arg(long)]
    pub payload: Option<String>,

    #[arg(long)]
    pub hotel_id: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub request_type: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub guest_id: Option<String>,

    #[arg(long)]
    pub user_id: Option<String>,

    #[arg(long)]
    pub reservation_id: Option<String>,

    #[arg(long)]
    pub room_id: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub request_category: Option<String>,

    #[arg(long)]
    pub department: Option<String>,

    #[arg(long)]
    pub estimated_completion_time: Option<i32>,

    #[arg(long)]
    pub scheduled_time: Option<DateTime<Utc>>,

    #[arg(long)]
    pub completed_at: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Clear a field (repeatable).
    #[arg(long = "clear", value_name = "FIELD", value_parser = PossibleValuesParser::new(UPDATE_FIELDS.iter().copied()))]
    pub clear: Vec<String>,
}

fn set<T: Clone>(patch: &mut Patch<T>, value: Option<&T>) {
    if let Some(value) = value {
        *patch = Patch::Set(value.clone());
    }
}

impl UpdateArgs {
    fn to_update(&self) -> Result<UpdateRequest, serde_json::Error> {
        let mut update = match self.payload {
            Some(ref payload) => serde_json::from_str(payload)?,
            None => UpdateRequest::default(),
        };

        set(&mut update.hotel_id, self.hotel_id.as_ref());
        set(&mut update.name, self.name.as_ref());
        set(&mut update.request_type, self.request_type.as_ref());
        set(&mut update.status, self.status.as_ref());
        set(&mut update.priority, self.priority.as_ref());
        set(&mut update.guest_id, self.guest_id.as_ref());
        set(&mut update.user_id, self.user_id.as_ref());
        set(&mut update.reservation_id, self.reservation_id.as_ref());
        set(&mut update.room_id, self.room_id.as_ref());
        set(&mut update.description, self.description.as_ref());
        set(&mut update.request_category, self.request_category.as_ref());
        set(&mut update.department, self.department.as_ref());
        set(
            &mut update.estimated_completion_time,
            self.estimated_completion_time.as_ref(),
        );
        set(&mut update.scheduled_time, self.scheduled_time.as_ref());
        set(&mut update.completed_at, self.completed_at.as_ref());
        set(&mut update.notes, self.notes.as_ref());

        for field in &self.clear {
            // values are restricted to UPDATE_FIELDS by the parser
            update.clear(field);
        }
        Ok(update)
    }
}

/// # Errors
///
/// Returns an error if the payload is malformed, the request does not
/// exist, the merged request is invalid, or the write fails.
pub fn run_update(args: &UpdateArgs, ctx: &Context) -> anyhow::Result<()> {
    let update = match args.to_update() {
        Ok(update) => update,
        Err(err) => {
            render_error(
                ctx.output,
                &CliError::new(
                    format!("invalid --payload: {err}"),
                    ErrorCode::ValidationViolation,
                ),
            )?;
            anyhow::bail!("invalid --payload: {err}");
        }
    };
    if update.is_empty() {
        debug!(id = %args.id, "empty update, appending an unchanged version");
    }

    let ledger = ctx.open_existing()?;
    let updated = ledger
        .update(args.id, &update, &ctx.cancel())
        .map_err(|err| fail(ctx.output, &err))?;

    render(ctx.output, &updated, |request, w| write_request(w, request))
}
