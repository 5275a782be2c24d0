//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Results go to stdout, errors to stderr. In JSON mode an error is one
//! object: `{"error": {"message", "code", "hint"}}`.

use reqledger_core::{LedgerError, Request};
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human separators.
pub const RULE_WIDTH: usize = 72;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<26} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A structured error with an optional hint and a stable code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>, code: reqledger_core::ErrorCode) -> Self {
        Self {
            message: message.into(),
            code: code.code().to_string(),
            hint: code.hint().map(str::to_string),
        }
    }
}

impl From<&LedgerError> for CliError {
    fn from(err: &LedgerError) -> Self {
        Self::new(err.to_string(), err.code())
    }
}

/// Render a serializable value to stdout: JSON as-is, otherwise through
/// `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            writeln!(out, "error[{}]: {}", error.code, error.message)?;
            if let Some(ref hint) = error.hint {
                writeln!(out, "  hint: {hint}")?;
            }
        }
    }
    Ok(())
}

/// Render `err` and turn it into the error returned from `main`.
pub fn fail(mode: OutputMode, err: &LedgerError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(err)) {
        return render_err;
    }
    anyhow::anyhow!("{err}")
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// Full detail view of one request version.
pub fn write_request(w: &mut dyn Write, request: &Request) -> io::Result<()> {
    let s = &request.snapshot;
    pretty_section(w, &format!("Request {} (v{})", request.id, request.version))?;
    writeln!(w, "{}", s.name)?;
    pretty_rule(w)?;
    pretty_kv(w, "hotel_id", &s.hotel_id)?;
    pretty_kv(w, "status", &s.status)?;
    pretty_kv(w, "priority", &s.priority)?;
    pretty_kv(w, "request_type", &s.request_type)?;
    pretty_kv(w, "request_category", opt(s.request_category.as_deref()))?;
    pretty_kv(w, "department", opt(s.department.as_deref()))?;
    pretty_kv(w, "room_id", opt(s.room_id.as_deref()))?;
    pretty_kv(w, "guest_id", opt(s.guest_id.as_deref()))?;
    pretty_kv(w, "user_id", opt(s.user_id.as_deref()))?;
    pretty_kv(w, "reservation_id", opt(s.reservation_id.as_deref()))?;
    pretty_kv(
        w,
        "estimated_completion_time",
        s.estimated_completion_time
            .map_or_else(|| "-".to_string(), |m| format!("{m} min")),
    )?;
    pretty_kv(
        w,
        "scheduled_time",
        s.scheduled_time
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
    )?;
    pretty_kv(
        w,
        "completed_at",
        s.completed_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
    )?;
    pretty_kv(w, "created_at", request.created_at.to_rfc3339())?;
    if let Some(ref description) = s.description {
        writeln!(w)?;
        writeln!(w, "{description}")?;
    }
    if let Some(ref notes) = s.notes {
        writeln!(w)?;
        writeln!(w, "notes: {notes}")?;
    }
    Ok(())
}

/// One-line summary used by listings.
pub fn write_request_row(w: &mut dyn Write, request: &Request) -> io::Result<()> {
    let s = &request.snapshot;
    writeln!(
        w,
        "{}  v{:<3} {:<12} {:<8} {:<10} {}",
        request.id, request.version, s.status, s.priority, s.hotel_id, s.name
    )
}

#[cfg(test)]
mod tests {
    use super::{CliError, OutputMode, write_request, write_request_row};
    use reqledger_core::{ErrorCode, LedgerError, MakeRequest, Request, Version};
    use reqledger_core::ledger::VersionedRecord;
    use uuid::Uuid;

    fn request() -> Request {
        let at = chrono::DateTime::<chrono::Utc>::from_timestamp(1_708_012_200, 0).expect("ts");
        VersionedRecord::stamped(
            Uuid::nil(),
            Version::INITIAL,
            MakeRequest::new("H1", "Towels", "one-time", "pending", "high"),
            at,
        )
    }

    #[test]
    fn ledger_errors_carry_code_and_hint() {
        let err = LedgerError::AlreadyExists { id: Uuid::nil() };
        let cli = CliError::from(&err);
        assert_eq!(cli.code, "E2002");
        assert!(cli.hint.is_some());

        let json = serde_json::to_value(&cli).expect("serialize");
        assert_eq!(json["code"], "E2002");
    }

    #[test]
    fn missing_hint_is_omitted() {
        let cli = CliError::new("gone", ErrorCode::RecordNotFound);
        let json = serde_json::to_value(&cli).expect("serialize");
        assert!(json.get("hint").is_none());
    }

    #[test]
    fn human_views_name_the_request() {
        let mut buf = Vec::new();
        write_request(&mut buf, &request()).expect("write detail");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("(v1)"));
        assert!(text.contains("Towels"));
        assert!(text.contains("room_id:"));

        let mut row = Vec::new();
        write_request_row(&mut row, &request()).expect("write row");
        let row = String::from_utf8(row).expect("utf8");
        assert!(row.starts_with("00000000-0000-0000-0000-000000000000  v1"));
        assert!(!OutputMode::Human.is_json());
    }
}
