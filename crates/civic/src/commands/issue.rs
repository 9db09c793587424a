//! Issue reporting, triage queues and status changes

use super::*;
use crate::domain::queries::{self, IssueFilter, StatusSummary};
use crate::domain::{IssueDraft, Role, Status, StatusEntry, UpvoteReceipt};
use crate::errors::CivicError;
use crate::ordering::{self, TriageView};
use crate::{upvote, validation, workflow};

impl<R: IssueRepository + AccountRepository> CommandExecutor<R> {
    /// Report a new issue as the current citizen.
    ///
    /// Capability, draft contents and the free-account quota are checked
    /// before anything is sent.
    pub async fn report_issue(&self, draft: IssueDraft) -> CivicResult<Issue> {
        let identity = self.authorize(Capability::ReportIssue)?;
        validation::validate_draft(&draft)?;

        if !identity.is_premium {
            let existing = self.repo.list_issues().await?;
            validation::check_report_quota(&identity, &existing, self.free_report_limit)?;
        }

        let issue = self.repo.create_issue(&draft).await?;
        tracing::info!(issue = %issue.id, "issue reported");
        Ok(issue)
    }

    pub async fn list_issues(&self, filter: &IssueFilter) -> CivicResult<Vec<Issue>> {
        let issues = self.repo.list_issues().await?;
        Ok(filter.apply(&issues))
    }

    pub async fn show_issue(&self, id: &str) -> CivicResult<Issue> {
        self.repo.get_issue(id).await
    }

    /// Resolve a full id or a unique id prefix (as shown in listings).
    pub async fn resolve_issue_id(&self, id_or_prefix: &str) -> CivicResult<String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(CivicError::Validation("Issue id is required".to_string()));
        }
        let issues = self.repo.list_issues().await?;
        if issues.iter().any(|i| i.id == needle) {
            return Ok(needle.to_string());
        }
        let matches: Vec<&Issue> = issues.iter().filter(|i| i.id.starts_with(needle)).collect();
        match matches.as_slice() {
            [issue] => Ok(issue.id.clone()),
            [] => Err(CivicError::RemoteRejected {
                status: 404,
                message: Some(format!("Issue not found: {}", needle)),
            }),
            many => Err(CivicError::Validation(format!(
                "Id prefix '{}' is ambiguous ({} issues match)",
                needle,
                many.len()
            ))),
        }
    }

    /// Issues that belong on the current user's dashboard: a citizen's own
    /// reports, a staff member's assignments, everything for an admin.
    pub async fn my_issues(&self) -> CivicResult<Vec<Issue>> {
        let identity = self.session.require_identity()?;
        self.open(Route::home(identity.role))?;
        let issues = self.repo.list_issues().await?;
        Ok(match identity.role {
            Role::Citizen => queries::query_by_citizen(&issues, &identity.id),
            Role::Staff => queries::query_by_assignee(&issues, &identity.id),
            Role::Admin => issues,
        })
    }

    /// Per-status counts over [`CommandExecutor::my_issues`].
    pub async fn dashboard(&self) -> CivicResult<StatusSummary> {
        let issues = self.my_issues().await?;
        Ok(queries::status_summary(&issues))
    }

    /// The ordered work queue for a triage view.
    pub async fn triage_queue(&self, view: TriageView) -> CivicResult<Vec<Issue>> {
        let issues = match view {
            TriageView::StaffAssigned => {
                let identity = self.open(Route::AssignedIssues)?;
                let issues = self.repo.list_issues().await?;
                queries::query_by_assignee(&issues, &identity.id)
            }
            TriageView::AdminManage => {
                self.open(Route::ManageIssues)?;
                self.repo.list_issues().await?
            }
        };
        Ok(ordering::order_for_triage(&issues, view))
    }

    /// Statuses the current user may move `issue` to.
    ///
    /// Staff only get options on issues assigned to them. `assigned` is
    /// never offered for an issue without an assignee.
    pub fn next_status_options(&self, issue: &Issue) -> Vec<Status> {
        let Some(identity) = self.session.current_user() else {
            return Vec::new();
        };
        if identity.is_blocked {
            return Vec::new();
        }
        if identity.role == Role::Staff && issue.assigned_to.as_deref() != Some(identity.id.as_str()) {
            return Vec::new();
        }
        let mut options = workflow::next_options(issue.status, identity.role);
        // `assigned` needs an assignee; only assign_issue sets one
        if issue.assigned_to.is_none() {
            options.retain(|s| *s != Status::Assigned);
        }
        options
    }

    /// Move `issue` to `target`.
    ///
    /// The transition is checked locally first; a refused transition never
    /// reaches the repository. On success the returned status is applied,
    /// one history entry is appended and the upvote count is overwritten
    /// when the response carries one. On any error `issue` is unchanged.
    pub async fn update_status(
        &self,
        issue: &mut Issue,
        target: Status,
        comment: Option<&str>,
    ) -> CivicResult<StatusEntry> {
        let identity = self.authorize(Capability::UpdateStatus)?;
        if !self.next_status_options(issue).contains(&target) {
            return Err(CivicError::InvalidTransition {
                from: issue.status,
                to: target,
                role: identity.role,
            });
        }

        let entry = workflow::history_entry(target, comment, &identity.id, identity.role);
        let update = self
            .repo
            .update_status(&issue.id, target, &entry.comment)
            .await?;

        let entry = StatusEntry {
            status: update.status,
            ..entry
        };
        workflow::record(issue, entry.clone());
        if let Some(upvotes) = update.upvotes {
            issue.upvotes = upvotes;
        }
        tracing::info!(issue = %issue.id, status = %issue.status, "status updated");
        Ok(entry)
    }

    /// Assign a pending issue to a staff member; returns the server's copy.
    pub async fn assign_issue(&self, issue_id: &str, staff_id: &str) -> CivicResult<Issue> {
        self.authorize(Capability::AssignIssue)?;
        self.repo.assign_issue(issue_id, staff_id).await?;
        self.repo.get_issue(issue_id).await
    }

    /// Reject a pending issue; returns the server's copy.
    pub async fn reject_issue(&self, issue_id: &str) -> CivicResult<Issue> {
        let identity = self.authorize(Capability::RejectIssue)?;
        let current = self.repo.get_issue(issue_id).await?;
        workflow::validate(current.status, Status::Rejected, identity.role)?;
        self.repo.reject_issue(issue_id).await?;
        self.repo.get_issue(issue_id).await
    }

    /// Assign and replace the issue in a loaded list.
    pub async fn assign_in_list(&self, issues: &mut [Issue], issue_id: &str, staff_id: &str) -> CivicResult<()> {
        let updated = self.assign_issue(issue_id, staff_id).await?;
        replace_issue(issues, updated);
        Ok(())
    }

    /// Upvote `issue` as the current user.
    ///
    /// The count from the response replaces the local one.
    pub async fn upvote(&self, issue: &mut Issue) -> CivicResult<UpvoteReceipt> {
        let identity = self.session.require_identity()?;
        upvote::check_identity(issue, &identity)?;

        let receipt = self.repo.upvote_issue(&issue.id).await?;
        upvote::reconcile(issue, &identity.id, receipt);
        Ok(receipt)
    }
}
