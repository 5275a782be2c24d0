use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Machine-readable error codes for callers that map ledger failures to
/// transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    RecordNotFound,
    RecordAlreadyExists,
    WriteConflict,
    ValidationViolation,
    StoreUnavailable,
    Cancelled,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::RecordNotFound => "E2001",
            Self::RecordAlreadyExists => "E2002",
            Self::WriteConflict => "E2003",
            Self::ValidationViolation => "E2004",
            Self::StoreUnavailable => "E5001",
            Self::Cancelled => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Ledger database not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::RecordNotFound => "Record not found",
            Self::RecordAlreadyExists => "Record already exists",
            Self::WriteConflict => "Concurrent write conflict",
            Self::ValidationViolation => "Required field violation",
            Self::StoreUnavailable => "Store unavailable",
            Self::Cancelled => "Operation cancelled",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and clients.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `reqledger init` to create the database."),
            Self::ConfigParseError => Some("Fix syntax in reqledger.toml and retry."),
            Self::RecordNotFound => None,
            Self::RecordAlreadyExists => Some("Omit the id to let the ledger generate one."),
            Self::WriteConflict => {
                Some("Another writer kept winning the race; retry the whole update.")
            }
            Self::ValidationViolation => {
                Some("Required fields cannot be cleared or set to an empty string.")
            }
            Self::StoreUnavailable => Some("Check the database path, permissions, and disk space."),
            Self::Cancelled => None,
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// HTTP status an upstream transport should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::RecordNotFound => 404,
            Self::RecordAlreadyExists | Self::WriteConflict => 409,
            Self::ValidationViolation => 400,
            Self::Cancelled => 503,
            Self::NotInitialized
            | Self::ConfigParseError
            | Self::StoreUnavailable
            | Self::InternalUnexpected => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A required-field rule broken by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("no record for {id}{}", .version.map(|v| format!(" at version {v}")).unwrap_or_default())]
    NotFound { id: Uuid, version: Option<u64> },

    #[error("record {id} already exists")]
    AlreadyExists { id: Uuid },

    /// `append` lost the race for `id` on every attempt.
    #[error("update of {id} abandoned after {attempts} conflicting attempts")]
    Conflict { id: Uuid, attempts: u32 },

    #[error("invalid snapshot: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("store unavailable during {context}: {source}")]
    StoreUnavailable {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("operation cancelled")]
    Cancelled,

    /// Another writer claimed `version` first. Only returned by backends;
    /// `Ledger::append` retries it and never lets it escape.
    #[error("version {version} of {id} was claimed by another writer")]
    VersionConflict { id: Uuid, version: u64 },

    #[error("version counter for {id} is exhausted")]
    VersionOverflow { id: Uuid },
}

impl LedgerError {
    pub(crate) fn store(
        context: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StoreUnavailable {
            context,
            source: source.into(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::RecordNotFound,
            Self::AlreadyExists { .. } => ErrorCode::RecordAlreadyExists,
            Self::Conflict { .. } => ErrorCode::WriteConflict,
            Self::Validation(_) => ErrorCode::ValidationViolation,
            Self::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::VersionConflict { .. } | Self::VersionOverflow { .. } => {
                ErrorCode::InternalUnexpected
            }
        }
    }

    /// Optional remediation hint for operators and clients.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// HTTP status an upstream transport should map this error to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code().http_status()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, FieldViolation, LedgerError};
    use std::collections::HashSet;
    use uuid::Uuid;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotInitialized,
            ErrorCode::ConfigParseError,
            ErrorCode::RecordNotFound,
            ErrorCode::RecordAlreadyExists,
            ErrorCode::WriteConflict,
            ErrorCode::ValidationViolation,
            ErrorCode::StoreUnavailable,
            ErrorCode::Cancelled,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::WriteConflict.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn ledger_errors_map_to_upstream_statuses() {
        let id = Uuid::nil();
        assert_eq!(LedgerError::NotFound { id, version: None }.http_status(), 404);
        assert_eq!(LedgerError::AlreadyExists { id }.http_status(), 409);
        assert_eq!(LedgerError::Conflict { id, attempts: 3 }.http_status(), 409);
        assert_eq!(LedgerError::Validation(Vec::new()).http_status(), 400);
        assert_eq!(
            LedgerError::store("latest", std::io::Error::other("disk gone")).http_status(),
            500
        );
    }

    #[test]
    fn not_found_message_names_the_version_when_present() {
        let id = Uuid::nil();
        let whole = LedgerError::NotFound { id, version: None }.to_string();
        let exact = LedgerError::NotFound {
            id,
            version: Some(4),
        }
        .to_string();

        assert_eq!(whole, format!("no record for {id}"));
        assert_eq!(exact, format!("no record for {id} at version 4"));
    }

    #[test]
    fn validation_message_lists_every_field() {
        let err = LedgerError::Validation(vec![
            FieldViolation {
                field: "name",
                reason: "must not be empty",
            },
            FieldViolation {
                field: "status",
                reason: "must not be empty",
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid snapshot: name: must not be empty, status: must not be empty"
        );
    }
}
