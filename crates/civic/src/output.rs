//! Output formatting for CLI commands.
//!
//! Human-readable tables by default, `--json` envelopes for scripts:
//! `{success, data, metadata}` on success, `{success: false, error, metadata}`
//! on failure.

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::Display;
use std::io::{self, Write};

use crate::domain::{Issue, Payment, User};
use crate::errors::CivicError;

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "1.0.0";

/// Controls output verbosity
pub struct OutputContext {
    quiet: bool,
    json: bool,
}

impl OutputContext {
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Print essential output (always shown unless --json)
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        writeln_safe(&msg.to_string())
    }

    /// Print a confirmation (suppressed by --quiet or --json)
    pub fn print_success(&self, msg: impl Display) -> io::Result<()> {
        if self.quiet || self.json {
            return Ok(());
        }
        writeln_safe(&msg.to_string())
    }

    /// Print error (always shown, to stderr)
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        writeln_safe_stderr(&format!("Error: {}", msg))
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// println that exits quietly on a broken pipe
fn writeln_safe(msg: &str) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(0),
        Err(e) => Err(e),
    }
}

fn writeln_safe_stderr(msg: &str) -> io::Result<()> {
    match writeln!(io::stderr(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => std::process::exit(0),
        Err(e) => Err(e),
    }
}

// ============================================================================
// JSON envelopes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::new(command),
        }
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
                suggestions: Vec::new(),
            },
            metadata: Metadata::new(command),
        }
    }

    /// Envelope for a library error, with its code, message and hints.
    pub fn from_civic_error(err: &CivicError, command: impl Into<String>) -> Self {
        let mut json = Self::new(err.code(), err.user_message(), command).with_suggestions(err.suggestions());
        if let CivicError::RemoteRejected { status, .. } = err {
            json = json.with_details(serde_json::json!({ "status": status }));
        }
        json
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.error.suggestions.extend(suggestions);
        self
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Stable code, e.g. "INVALID_TRANSITION"
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: chrono::DateTime<Utc>,
    pub version: String,
    pub command: String,
}

impl Metadata {
    fn new(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: OUTPUT_VERSION.to_string(),
            command: command.into(),
        }
    }
}

fn serialize_timestamp<S>(dt: &chrono::DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// Exit codes
// ============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GenericError = 1,
    /// Invalid arguments, invalid input or refused transition
    InvalidArgument = 2,
    NotFound = 3,
    /// Already upvoted, self upvote, quota
    PolicyViolation = 4,
    PermissionDenied = 5,
    /// Not logged in or session expired
    AuthRequired = 6,
    /// Network or backend failure
    ExternalError = 10,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn for_error(err: &CivicError) -> Self {
        match err {
            CivicError::InvalidTransition { .. } | CivicError::Validation(_) => ExitCode::InvalidArgument,
            CivicError::SelfUpvoteNotAllowed
            | CivicError::AlreadyUpvoted
            | CivicError::QuotaExceeded { .. } => ExitCode::PolicyViolation,
            CivicError::Forbidden(_) => ExitCode::PermissionDenied,
            CivicError::SessionExpired | CivicError::NotAuthenticated => ExitCode::AuthRequired,
            CivicError::RemoteRejected { status, .. } => match status {
                400 | 409 | 422 => ExitCode::InvalidArgument,
                401 => ExitCode::AuthRequired,
                403 => ExitCode::PermissionDenied,
                404 => ExitCode::NotFound,
                _ => ExitCode::ExternalError,
            },
            CivicError::NetworkUnavailable(_) | CivicError::InvalidResponse(_) => ExitCode::ExternalError,
            CivicError::Storage(_) | CivicError::Cancelled => ExitCode::GenericError,
        }
    }
}

// ============================================================================
// Human-readable formatting
// ============================================================================

/// One line per issue: short id, flags, status, priority, title.
pub fn format_issue_line(issue: &Issue) -> String {
    format!(
        "{:<8} {} {:<11} {:<11} {:>3}▲  {}",
        issue.short_id(),
        if issue.is_boosted { "★" } else { " " },
        issue.status,
        issue.priority,
        issue.upvotes,
        issue.title
    )
}

pub fn format_issue_detail(issue: &Issue) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}  {}\n", issue.id, issue.title));
    out.push_str(&format!(
        "Status: {}   Priority: {}   Category: {}{}\n",
        issue.status,
        issue.priority,
        issue.category,
        if issue.is_boosted { "   (boosted)" } else { "" }
    ));
    out.push_str(&format!("Location: {} ({:.5}, {:.5})\n", issue.location.address, issue.location.latitude, issue.location.longitude));
    out.push_str(&format!("Reported by: {}\n", issue.citizen_id));
    if let Some(ref staff) = issue.assigned_to {
        out.push_str(&format!("Assigned to: {}\n", staff));
    }
    out.push_str(&format!("Upvotes: {}\n", issue.upvotes));
    if let Some(photo) = issue.primary_photo() {
        let shown = if photo.starts_with("data:") { "(embedded image)" } else { photo };
        out.push_str(&format!("Photo: {} ({} total)\n", shown, issue.photos.len()));
    }
    out.push_str(&format!("\n{}\n", issue.description));
    if !issue.status_history.is_empty() {
        out.push_str("\nHistory:\n");
        for entry in &issue.status_history {
            out.push_str(&format!(
                "  {}  {:<11} {} ({} {})\n",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                entry.status,
                entry.comment,
                entry.updated_by_role,
                entry.updated_by
            ));
        }
    }
    out
}

pub fn format_user_line(user: &User) -> String {
    let mut flags = Vec::new();
    if user.is_premium {
        flags.push("premium");
    }
    if user.is_blocked {
        flags.push("blocked");
    }
    format!(
        "{:<36} {:<7} {:<24} {}{}",
        user.id,
        user.role,
        user.name,
        user.email,
        if flags.is_empty() { String::new() } else { format!("  [{}]", flags.join(", ")) }
    )
}

pub fn format_payment_line(payment: &Payment) -> String {
    format!(
        "{}  {:<12} {:>6}  user {}{}",
        payment.created_at.format("%Y-%m-%d %H:%M"),
        format!("{:?}", payment.kind).to_lowercase(),
        payment.amount,
        payment.user_id,
        payment
            .issue_id
            .as_ref()
            .map(|id| format!("  issue {}", id))
            .unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::domain::{Role, Status};
    use serde_json::json;

    #[test]
    fn test_json_output_success() {
        let output = JsonOutput::success(json!({"id": "123"}), "issue show");
        assert!(output.success);
        assert_eq!(output.data["id"], "123");
        assert_eq!(output.metadata.command, "issue show");

        let text = output.to_json_string().unwrap();
        assert!(text.contains("\"success\": true"));
        assert!(text.contains("\"timestamp\":"));
    }

    #[test]
    fn test_json_error_from_remote_rejection() {
        let err = CivicError::RemoteRejected {
            status: 404,
            message: Some("Issue not found".to_string()),
        };
        let json = JsonError::from_civic_error(&err, "issue show");

        assert!(!json.success);
        assert_eq!(json.error.code, "NOT_FOUND");
        assert_eq!(json.error.message, "Issue not found");
        assert_eq!(json.error.details, Some(json!({"status": 404})));
    }

    #[test]
    fn test_json_error_carries_suggestions() {
        let err = CivicError::InvalidTransition {
            from: Status::Closed,
            to: Status::Working,
            role: Role::Staff,
        };
        let json = JsonError::from_civic_error(&err, "issue status");
        assert_eq!(json.error.code, "INVALID_TRANSITION");
        assert!(!json.error.suggestions.is_empty());

        let text = json.to_json_string().unwrap();
        assert!(text.contains("\"success\": false"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::for_error(&CivicError::SessionExpired), ExitCode::AuthRequired);
        assert_eq!(ExitCode::for_error(&CivicError::AlreadyUpvoted), ExitCode::PolicyViolation);
        assert_eq!(
            ExitCode::for_error(&CivicError::Forbidden(Capability::ManageStaff)),
            ExitCode::PermissionDenied
        );
        assert_eq!(
            ExitCode::for_error(&CivicError::RemoteRejected { status: 404, message: None }),
            ExitCode::NotFound
        );
        assert_eq!(
            ExitCode::for_error(&CivicError::NetworkUnavailable("down".into())).code(),
            10
        );
    }
}
