//! `reqledger create`: write version 1 of a new request.

use super::Context;
use crate::output::{CliError, fail, render, render_error, write_request};
use chrono::{DateTime, Utc};
use clap::Args;
use reqledger_core::{ErrorCode, MakeRequest};
use uuid::Uuid;

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Full request as a JSON object; replaces the field flags.
    #[arg(long, conflicts_with_all = ["hotel_id", "name", "request_type", "status", "priority"])]
    pub payload: Option<String>,

    /// Use this id instead of generating one.
    #[arg(long)]
    pub id: Option<Uuid>,

    #[arg(long, required_unless_present = "payload")]
    pub hotel_id: Option<String>,

    #[arg(long, required_unless_present = "payload")]
    pub name: Option<String>,

    #[arg(long, required_unless_present = "payload")]
    pub request_type: Option<String>,

    #[arg(long, required_unless_present = "payload")]
    pub status: Option<String>,

    #[arg(long, required_unless_present = "payload")]
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

    /// Estimated minutes to complete.
    #[arg(long)]
    pub estimated_completion_time: Option<i32>,

    /// RFC 3339 timestamp.
    #[arg(long)]
    pub scheduled_time: Option<DateTime<Utc>>,

    /// RFC 3339 timestamp.
    #[arg(long)]
    pub completed_at: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl CreateArgs {
    fn to_request(&self) -> Result<MakeRequest, serde_json::Error> {
        if let Some(ref payload) = self.payload {
            return serde_json::from_str(payload);
        }
        Ok(MakeRequest {
            hotel_id: self.hotel_id.clone().unwrap_or_default(),
            guest_id: self.guest_id.clone(),
            user_id: self.user_id.clone(),
            reservation_id: self.reservation_id.clone(),
            name: self.name.clone().unwrap_or_default(),
            description: self.description.clone(),
            room_id: self.room_id.clone(),
            request_category: self.request_category.clone(),
            request_type: self.request_type.clone().unwrap_or_default(),
            department: self.department.clone(),
            status: self.status.clone().unwrap_or_default(),
            priority: self.priority.clone().unwrap_or_default(),
            estimated_completion_time: self.estimated_completion_time,
            scheduled_time: self.scheduled_time,
            completed_at: self.completed_at,
            notes: self.notes.clone(),
        })
    }
}

/// # Errors
///
/// Returns an error if the payload is malformed, the request is invalid,
/// or the write fails.
pub fn run_create(args: &CreateArgs, ctx: &Context) -> anyhow::Result<()> {
    let request = match args.to_request() {
        Ok(request) => request,
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

    let ledger = ctx.open_existing()?;
    let cancel = ctx.cancel();
    let created = match args.id {
        Some(id) => ledger.insert_with_id(id, request, &cancel),
        None => ledger.insert(request, &cancel),
    }
    .map_err(|err| fail(ctx.output, &err))?;

    render(ctx.output, &created, |request, w| write_request(w, request))
}

#[cfg(test)]
mod tests {
    use super::CreateArgs;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn flags_build_a_request() {
        let w = Wrapper::parse_from([
            "test",
            "--hotel-id",
            "H1",
            "--name",
            "Towels",
            "--request-type",
            "one-time",
            "--status",
            "pending",
            "--priority",
            "high",
            "--room-id",
            "504",
            "--estimated-completion-time",
            "15",
        ]);
        let request = w.args.to_request().expect("request");
        assert_eq!(request.name, "Towels");
        assert_eq!(request.room_id.as_deref(), Some("504"));
        assert_eq!(request.estimated_completion_time, Some(15));
        assert_eq!(request.notes, None);
    }

    #[test]
    fn payload_replaces_required_flags() {
        let w = Wrapper::parse_from([
            "test",
            "--payload",
            r#"{"hotel_id":"H1","name":"Towels","request_type":"one-time","status":"pending","priority":"high"}"#,
        ]);
        let request = w.args.to_request().expect("request");
        assert_eq!(request.hotel_id, "H1");
    }

    #[test]
    fn missing_required_flag_is_a_usage_error() {
        let parsed = Wrapper::try_parse_from(["test", "--hotel-id", "H1", "--name", "Towels"]);
        assert!(parsed.is_err());
    }
}
