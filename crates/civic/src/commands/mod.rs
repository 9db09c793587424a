//! Command execution for the triage views.
//!
//! `CommandExecutor` is the controller between the CLI and a repository. It
//! applies the local policy (capabilities, workflow, upvote rules, quota,
//! validation) before any request is sent, and folds the repository's
//! answer back into the caller's copy of an issue.
//!
//! Submodules by functional area:
//! - `issue`: reporting, listing, triage queues, status changes, upvotes
//! - `account`: login/logout, users and staff
//! - `payment`: subscription, boosts and payment history
//! - `view`: cancellation scope for in-flight requests

mod account;
mod issue;
mod payment;
pub mod view;

#[cfg(test)]
pub mod test_helpers;

pub use view::ViewScope;

use crate::capability::{self, Capability, Route};
use crate::domain::{Identity, Issue};
use crate::errors::{CivicError, CivicResult};
use crate::session::SessionStore;
use crate::storage::{AccountRepository, IssueRepository};
use crate::validation::DEFAULT_FREE_REPORT_LIMIT;

/// Executes commands on behalf of the session's user.
///
/// Generic over the repository so the same logic runs against the REST API
/// and the in-memory backend.
pub struct CommandExecutor<R: IssueRepository + AccountRepository> {
    repo: R,
    session: SessionStore,
    free_report_limit: usize,
}

impl<R: IssueRepository + AccountRepository> CommandExecutor<R> {
    pub fn new(repo: R, session: SessionStore) -> Self {
        Self {
            repo,
            session,
            free_report_limit: DEFAULT_FREE_REPORT_LIMIT,
        }
    }

    /// Override the number of reports a free citizen may file.
    pub fn with_report_limit(mut self, limit: usize) -> Self {
        self.free_report_limit = limit;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Current identity with `capability`, or the reason there isn't one.
    fn authorize(&self, capability: Capability) -> CivicResult<Identity> {
        let identity = self.session.require_identity()?;
        capability::require(&identity, capability)?;
        Ok(identity)
    }

    /// Current identity if it may open `route`.
    fn open(&self, route: Route) -> CivicResult<Identity> {
        let identity = self.session.current_user();
        capability::guard(identity.as_ref(), route)?;
        identity.ok_or(CivicError::NotAuthenticated)
    }
}

/// Replace the issue with the same id, keeping its position.
///
/// Returns false when no issue in `issues` has that id.
pub fn replace_issue(issues: &mut [Issue], issue: Issue) -> bool {
    match issues.iter_mut().find(|i| i.id == issue.id) {
        Some(slot) => {
            *slot = issue;
            true
        }
        None => false,
    }
}
