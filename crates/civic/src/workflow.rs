//! Issue status workflow.
//!
//! ```text
//! pending -> assigned -> in-progress -> working -> resolved -> closed
//!    \
//!     -> rejected   (admin only)
//! ```
//!
//! `resolved`, `closed` and `rejected` are terminal. The backend enforces the
//! same rules; this module only decides what the client offers and refuses
//! obviously invalid requests before they leave the machine.

use chrono::Utc;

use crate::domain::{Issue, Role, Status, StatusEntry};
use crate::errors::{CivicError, CivicResult};

/// The forward flow. `rejected` is a side branch and not part of it.
pub const FLOW: [Status; 6] = [
    Status::Pending,
    Status::Assigned,
    Status::InProgress,
    Status::Working,
    Status::Resolved,
    Status::Closed,
];

/// Statuses that may be offered as "next status" for `current` and `role`.
///
/// Order follows the flow; `rejected` comes last when offered.
pub fn next_options(current: Status, role: Role) -> Vec<Status> {
    if role == Role::Citizen || current.is_terminal() {
        return Vec::new();
    }

    let mut options: Vec<Status> = match FLOW.iter().position(|s| *s == current) {
        Some(index) => FLOW[index + 1..]
            .iter()
            .copied()
            .filter(|s| *s != Status::Pending)
            .collect(),
        None => Vec::new(),
    };

    if current == Status::Pending && role == Role::Admin {
        options.push(Status::Rejected);
    }

    options
}

/// Check that `target` is offered from `current` for `role`.
pub fn validate(current: Status, target: Status, role: Role) -> CivicResult<()> {
    if next_options(current, role).contains(&target) {
        Ok(())
    } else {
        Err(CivicError::InvalidTransition {
            from: current,
            to: target,
            role,
        })
    }
}

/// Comment recorded when the caller did not supply one
pub fn default_comment(status: Status) -> String {
    format!("Status updated to {}", status)
}

/// Build the history entry for a transition.
pub fn history_entry(
    status: Status,
    comment: Option<&str>,
    actor_id: &str,
    actor_role: Role,
) -> StatusEntry {
    let comment = comment
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_comment(status));

    StatusEntry {
        status,
        comment,
        updated_by: actor_id.to_string(),
        updated_by_role: actor_role,
        timestamp: Utc::now(),
    }
}

/// Validate and apply a transition to `issue`.
///
/// On success the status changes and exactly one entry is appended to the
/// history. On failure the issue is untouched.
pub fn apply(
    issue: &mut Issue,
    target: Status,
    actor_id: &str,
    actor_role: Role,
    comment: Option<&str>,
) -> CivicResult<StatusEntry> {
    validate(issue.status, target, actor_role)?;
    let entry = history_entry(target, comment, actor_id, actor_role);
    record(issue, entry.clone());
    Ok(entry)
}

/// Set the status and append an already-built entry.
pub(crate) fn record(issue: &mut Issue, entry: StatusEntry) {
    issue.status = entry.status;
    issue.updated_at = Some(entry.timestamp);
    issue.status_history.push(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, IssueDraft, Location};

    fn pending_issue() -> Issue {
        Issue::from_draft(
            IssueDraft {
                title: "Leak".to_string(),
                description: "Water main".to_string(),
                category: Category::WaterLeakage,
                priority: None,
                location: Location {
                    address: "Lake Rd".to_string(),
                    latitude: 1.0,
                    longitude: 1.0,
                },
                photos: Vec::new(),
            },
            "citizen-1",
        )
    }

    #[test]
    fn test_terminal_states_offer_nothing() {
        for status in [Status::Resolved, Status::Closed, Status::Rejected] {
            assert!(next_options(status, Role::Admin).is_empty());
            assert!(next_options(status, Role::Staff).is_empty());
        }
    }

    #[test]
    fn test_citizen_gets_no_options() {
        for status in Status::ALL {
            assert!(next_options(status, Role::Citizen).is_empty());
        }
    }

    #[test]
    fn test_pending_offers_reject_to_admin_only() {
        let admin = next_options(Status::Pending, Role::Admin);
        assert_eq!(
            admin,
            vec![
                Status::Assigned,
                Status::InProgress,
                Status::Working,
                Status::Resolved,
                Status::Closed,
                Status::Rejected,
            ]
        );

        let staff = next_options(Status::Pending, Role::Staff);
        assert!(!staff.contains(&Status::Rejected));
        assert_eq!(staff.len(), 5);
    }

    #[test]
    fn test_forward_options_preserve_order() {
        assert_eq!(
            next_options(Status::InProgress, Role::Staff),
            vec![Status::Working, Status::Resolved, Status::Closed]
        );
        assert_eq!(
            next_options(Status::Working, Role::Admin),
            vec![Status::Resolved, Status::Closed]
        );
    }

    #[test]
    fn test_never_offers_pending_or_current() {
        for status in Status::ALL {
            for role in [Role::Staff, Role::Admin] {
                let options = next_options(status, role);
                assert!(!options.contains(&Status::Pending));
                assert!(!options.contains(&status));
            }
        }
    }

    #[test]
    fn test_rejected_only_reachable_from_pending() {
        for status in Status::ALL {
            if status != Status::Pending {
                assert!(!next_options(status, Role::Admin).contains(&Status::Rejected));
            }
        }
    }

    #[test]
    fn test_closed_cannot_move_again() {
        let result = validate(Status::Closed, Status::Closed, Role::Admin);
        assert!(matches!(result, Err(CivicError::InvalidTransition { .. })));

        let result = validate(Status::Closed, Status::Resolved, Role::Admin);
        assert!(matches!(result, Err(CivicError::InvalidTransition { .. })));
    }

    #[test]
    fn test_apply_appends_exactly_one_entry() {
        let mut issue = pending_issue();
        let before = issue.status_history.clone();

        let entry = apply(&mut issue, Status::Assigned, "admin-1", Role::Admin, None).unwrap();

        assert_eq!(issue.status, Status::Assigned);
        assert_eq!(issue.status_history.len(), before.len() + 1);
        assert_eq!(&issue.status_history[..before.len()], &before[..]);
        assert_eq!(entry.comment, "Status updated to assigned");
        assert_eq!(entry.updated_by_role, Role::Admin);
    }

    #[test]
    fn test_apply_uses_caller_comment() {
        let mut issue = pending_issue();
        let entry = apply(
            &mut issue,
            Status::InProgress,
            "staff-1",
            Role::Staff,
            Some("Crew dispatched"),
        )
        .unwrap();
        assert_eq!(entry.comment, "Crew dispatched");
    }

    #[test]
    fn test_rejected_apply_leaves_issue_untouched() {
        let mut issue = pending_issue();
        let snapshot = issue.clone();

        let err = apply(&mut issue, Status::Rejected, "staff-1", Role::Staff, None).unwrap_err();

        assert!(matches!(err, CivicError::InvalidTransition { .. }));
        assert_eq!(issue, snapshot);
    }
}
