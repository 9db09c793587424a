//! Error taxonomy for policy checks and repository calls.
//!
//! Local policy rejections (`InvalidTransition`, `SelfUpvoteNotAllowed`,
//! `AlreadyUpvoted`, ...) are raised before any request is sent and are
//! never retried. Remote failures carry the backend's message verbatim when
//! it supplied one. Every variant is recoverable at the view level.

use thiserror::Error;

use crate::capability::Capability;
use crate::domain::{Role, Status};

/// Message shown when the backend rejects a request without explanation.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CivicError {
    /// Requested status change is not offered for this status and role
    #[error("Cannot change status from {from} to {to} as {role}")]
    InvalidTransition { from: Status, to: Status, role: Role },

    #[error("You cannot upvote your own issue")]
    SelfUpvoteNotAllowed,

    #[error("You have already upvoted this issue")]
    AlreadyUpvoted,

    /// Backend answered with an error for a locally valid request
    #[error("{}", message.as_deref().unwrap_or(GENERIC_FAILURE_MESSAGE))]
    RemoteRejected { status: u16, message: Option<String> },

    /// No response from the backend
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Backend answered 401; the local session has been cleared
    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Permission denied: requires {0}")]
    Forbidden(Capability),

    #[error("Free accounts can report at most {limit} issues; subscribe for unlimited reports")]
    QuotaExceeded { limit: usize },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local persistence (session file) failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// The owning view was closed before the request finished
    #[error("Request cancelled")]
    Cancelled,
}

impl CivicError {
    /// Text to show the user.
    ///
    /// Remote rejections surface the backend's message as-is, falling back
    /// to a generic sentence when none was provided.
    pub fn user_message(&self) -> String {
        match self {
            CivicError::RemoteRejected { message, .. } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
            other => other.to_string(),
        }
    }

    /// Whether an idempotent read may be retried after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            CivicError::NetworkUnavailable(_) => true,
            CivicError::RemoteRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Raised by local policy before any request is made
    pub fn is_local_policy(&self) -> bool {
        matches!(
            self,
            CivicError::InvalidTransition { .. }
                | CivicError::SelfUpvoteNotAllowed
                | CivicError::AlreadyUpvoted
                | CivicError::Forbidden(_)
                | CivicError::QuotaExceeded { .. }
                | CivicError::Validation(_)
        )
    }

    /// Stable machine-readable code for JSON output
    pub fn code(&self) -> &'static str {
        match self {
            CivicError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CivicError::SelfUpvoteNotAllowed => "SELF_UPVOTE_NOT_ALLOWED",
            CivicError::AlreadyUpvoted => "ALREADY_UPVOTED",
            CivicError::RemoteRejected { status: 404, .. } => "NOT_FOUND",
            CivicError::RemoteRejected { .. } => "REMOTE_REJECTED",
            CivicError::NetworkUnavailable(_) => "NETWORK_UNAVAILABLE",
            CivicError::SessionExpired => "SESSION_EXPIRED",
            CivicError::NotAuthenticated => "NOT_AUTHENTICATED",
            CivicError::Forbidden(_) => "PERMISSION_DENIED",
            CivicError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            CivicError::Validation(_) => "INVALID_ARGUMENT",
            CivicError::InvalidResponse(_) => "INVALID_RESPONSE",
            CivicError::Storage(_) => "STORAGE_ERROR",
            CivicError::Cancelled => "CANCELLED",
        }
    }

    /// Remediation hints shown under the error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CivicError::InvalidTransition { from, .. } => vec![format!(
                "List the allowed next statuses: civic workflow {} --role <role>",
                from
            )],
            CivicError::NetworkUnavailable(_) => vec![
                "Check that the API server is reachable".to_string(),
                "Verify api.base_url in civic.toml or CIVIC_API_URL".to_string(),
            ],
            CivicError::SessionExpired | CivicError::NotAuthenticated => {
                vec!["Log in: civic login --email <email> --password <password>".to_string()]
            }
            CivicError::QuotaExceeded { .. } => {
                vec!["Upgrade to premium: civic subscribe".to_string()]
            }
            _ => Vec::new(),
        }
    }
}

/// Result type for policy and repository operations
pub type CivicResult<T> = Result<T, CivicError>;
