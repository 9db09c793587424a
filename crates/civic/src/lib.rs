//! Civic issue tracker library
//!
//! Client-side core of a city infrastructure reporting service: the triage
//! ordering, the status workflow, the upvote policy, role capabilities and
//! the repositories that talk to the backend. The `civic` binary and the
//! reference server are both built on it.

pub mod capability;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ordering;
pub mod output;
pub mod retry;
pub mod session;
pub mod storage;
pub mod upvote;
pub mod validation;
pub mod workflow;

// Re-export commonly used types
pub use capability::{Capability, Route};
pub use commands::{CommandExecutor, ViewScope};
pub use domain::{Issue, IssueDraft, Priority, Role, Status, User};
pub use errors::{CivicError, CivicResult};
pub use ordering::{order_for_triage, TriageView};
pub use output::{ExitCode, JsonError, JsonOutput};
pub use session::SessionStore;
pub use storage::{AccountRepository, HttpRepository, InMemoryBackend, InMemoryRepository, IssueRepository};
