//! Premium subscription, issue boosts and payment history (mocked)

use super::*;
use crate::domain::{Payment, User};
use crate::errors::CivicError;

impl<R: IssueRepository + AccountRepository> CommandExecutor<R> {
    /// Upgrade the current citizen to premium.
    ///
    /// The session's cached profile is refreshed so the quota check sees
    /// the new status without logging in again.
    pub async fn subscribe(&self) -> CivicResult<User> {
        let identity = self.authorize(Capability::Subscribe)?;
        if identity.is_premium {
            return Err(CivicError::Validation("Already a premium member".to_string()));
        }
        let user = self.repo.subscribe().await?;
        self.session
            .refresh_user(user.clone())
            .map_err(|e| CivicError::Storage(format!("{:#}", e)))?;
        Ok(user)
    }

    /// Pay to boost one of the current citizen's issues.
    pub async fn boost_issue(&self, issue_id: &str) -> CivicResult<Issue> {
        self.authorize(Capability::BoostIssue)?;
        let issue = self.repo.boost_issue(issue_id).await?;
        tracing::info!(issue = %issue.id, "issue boosted");
        Ok(issue)
    }

    /// All payments for admins, own payments for everyone else.
    ///
    /// The full ledger is the payments screen; a personal history is part
    /// of the profile.
    pub async fn list_payments(&self) -> CivicResult<Vec<Payment>> {
        let identity = self.session.require_identity()?;
        if capability::require(&identity, Capability::ViewPayments).is_ok() {
            self.open(Route::Payments)?;
        } else {
            self.open(Route::Profile)?;
        }
        self.repo.list_payments().await
    }
}
