//! Triage ordering for staff and admin action queues.
//!
//! Boosted issues come first, then higher priority. Both views use a stable
//! sort so equal-rank issues keep their source order. The admin view breaks
//! remaining ties by creation date (newest first); the staff view does not.
//! The two views disagree on purpose and must not be unified here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::domain::Issue;

/// Which triage screen the list is ordered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageView {
    /// Staff "assigned issues" queue
    StaffAssigned,
    /// Admin "manage issues" table
    AdminManage,
}

/// Compare two issues by boosted flag (boosted first) then priority weight.
pub fn compare_rank(a: &Issue, b: &Issue) -> Ordering {
    b.is_boosted
        .cmp(&a.is_boosted)
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
}

/// Newest first; a missing timestamp counts as oldest.
fn compare_created_desc(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    b.cmp(&a)
}

/// Comparator for the given view
pub fn compare_for_view(view: TriageView, a: &Issue, b: &Issue) -> Ordering {
    let rank = compare_rank(a, b);
    match view {
        TriageView::StaffAssigned => rank,
        TriageView::AdminManage => {
            rank.then_with(|| compare_created_desc(a.created_at, b.created_at))
        }
    }
}

/// Order issues in place for a triage view. Stable.
pub fn sort_for_triage(issues: &mut [Issue], view: TriageView) {
    issues.sort_by(|a, b| compare_for_view(view, a, b));
}

/// Return a triage-ordered copy of `issues`.
pub fn order_for_triage(issues: &[Issue], view: TriageView) -> Vec<Issue> {
    let mut ordered = issues.to_vec();
    sort_for_triage(&mut ordered, view);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Location, Priority, Status};
    use chrono::TimeZone;

    fn make_issue(id: &str, boosted: bool, priority: Priority) -> Issue {
        Issue {
            id: id.to_string(),
            title: format!("Issue {}", id),
            description: String::new(),
            category: Category::Pothole,
            status: Status::Pending,
            priority,
            is_boosted: boosted,
            location: Location {
                address: "Somewhere".to_string(),
                latitude: 0.0,
                longitude: 0.0,
            },
            photos: Vec::new(),
            citizen_id: "citizen".to_string(),
            assigned_to: None,
            upvotes: 0,
            upvoted_by: Vec::new(),
            status_history: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn ids(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_boosted_precedes_higher_priority() {
        let issues = vec![
            make_issue("1", false, Priority::High),
            make_issue("2", true, Priority::Low),
        ];
        for view in [TriageView::StaffAssigned, TriageView::AdminManage] {
            assert_eq!(ids(&order_for_triage(&issues, view)), vec!["2", "1"]);
        }
    }

    #[test]
    fn test_priority_descending_within_same_boost() {
        let issues = vec![
            make_issue("1", false, Priority::Low),
            make_issue("2", false, Priority::High),
            make_issue("3", false, Priority::Medium),
        ];
        let ordered = order_for_triage(&issues, TriageView::StaffAssigned);
        assert_eq!(ids(&ordered), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_unspecified_priority_sorts_last() {
        let issues = vec![
            make_issue("1", false, Priority::Unspecified),
            make_issue("2", false, Priority::Low),
        ];
        let ordered = order_for_triage(&issues, TriageView::StaffAssigned);
        assert_eq!(ids(&ordered), vec!["2", "1"]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(order_for_triage(&[], TriageView::AdminManage).is_empty());

        let single = vec![make_issue("only", true, Priority::Medium)];
        assert_eq!(order_for_triage(&single, TriageView::AdminManage), single);
    }

    #[test]
    fn test_staff_view_is_stable_and_ignores_dates() {
        let mut older = make_issue("a", false, Priority::Medium);
        older.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut newer = make_issue("b", false, Priority::Medium);
        newer.created_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        let ordered = order_for_triage(&[older, newer], TriageView::StaffAssigned);
        assert_eq!(ids(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn test_admin_view_breaks_ties_by_newest_first() {
        let mut older = make_issue("a", false, Priority::Medium);
        older.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut newer = make_issue("b", false, Priority::Medium);
        newer.created_at = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let undated = make_issue("c", false, Priority::Medium);

        let ordered = order_for_triage(&[undated, older, newer], TriageView::AdminManage);
        assert_eq!(ids(&ordered), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_admin_date_tie_break_never_overrides_boost() {
        let mut new_plain = make_issue("new", false, Priority::High);
        new_plain.created_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let mut old_boosted = make_issue("old", true, Priority::Low);
        old_boosted.created_at = Some(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());

        let ordered = order_for_triage(&[new_plain, old_boosted], TriageView::AdminManage);
        assert_eq!(ids(&ordered), vec!["old", "new"]);
    }
}
