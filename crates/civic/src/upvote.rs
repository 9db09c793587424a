//! Upvote gate.
//!
//! A user upvotes an issue at most once and never their own. The local
//! copy is updated after the repository accepts the vote, with the
//! repository's count taking precedence over the local increment.

use crate::domain::{Identity, Issue, UpvoteReceipt};
use crate::errors::{CivicError, CivicResult};

/// Check whether `actor_id` may upvote `issue`.
pub fn check(issue: &Issue, actor_id: &str) -> CivicResult<()> {
    if issue.citizen_id == actor_id {
        return Err(CivicError::SelfUpvoteNotAllowed);
    }
    if issue.has_upvoted(actor_id) {
        return Err(CivicError::AlreadyUpvoted);
    }
    Ok(())
}

/// Like [`check`], also refusing blocked accounts.
pub fn check_identity(issue: &Issue, actor: &Identity) -> CivicResult<()> {
    crate::capability::require(actor, crate::capability::Capability::Upvote)?;
    check(issue, &actor.id)
}

/// Apply the optimistic update: record the voter and count one more vote.
pub fn apply_optimistic(issue: &mut Issue, actor_id: &str) {
    if !issue.has_upvoted(actor_id) {
        issue.upvoted_by.push(actor_id.to_string());
        issue.upvotes = issue.upvotes.saturating_add(1);
    }
}

/// Reconcile with the repository: the returned count overwrites ours.
pub fn reconcile(issue: &mut Issue, actor_id: &str, receipt: UpvoteReceipt) {
    apply_optimistic(issue, actor_id);
    issue.upvotes = receipt.upvotes;
}
