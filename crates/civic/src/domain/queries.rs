//! Pure query operations on issue collections.
//!
//! Filters used by the listing screens and dashboard tiles. None of these
//! touch the network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Category, Issue, Priority, Status};

/// Query issues by status.
pub fn query_by_status(issues: &[Issue], status: Status) -> Vec<Issue> {
    issues
        .iter()
        .filter(|i| i.status == status)
        .cloned()
        .collect()
}

/// Query issues by category.
pub fn query_by_category(issues: &[Issue], category: Category) -> Vec<Issue> {
    issues
        .iter()
        .filter(|i| i.category == category)
        .cloned()
        .collect()
}

/// Query issues assigned to a staff member.
pub fn query_by_assignee(issues: &[Issue], staff_id: &str) -> Vec<Issue> {
    issues
        .iter()
        .filter(|i| i.assigned_to.as_deref() == Some(staff_id))
        .cloned()
        .collect()
}

/// Query issues reported by a citizen.
pub fn query_by_citizen(issues: &[Issue], citizen_id: &str) -> Vec<Issue> {
    issues
        .iter()
        .filter(|i| i.citizen_id == citizen_id)
        .cloned()
        .collect()
}

/// Case-insensitive search over title, description and address.
pub fn search(issues: &[Issue], text: &str) -> Vec<Issue> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return issues.to_vec();
    }
    issues
        .iter()
        .filter(|i| matches_text(i, &needle))
        .cloned()
        .collect()
}

fn matches_text(issue: &Issue, needle: &str) -> bool {
    issue.title.to_lowercase().contains(needle)
        || issue.description.to_lowercase().contains(needle)
        || issue.location.address.to_lowercase().contains(needle)
}

/// Combined filter for the "all issues" screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<String>,
    pub citizen_id: Option<String>,
    pub boosted_only: bool,
    pub search: Option<String>,
}

impl IssueFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        if self.status.is_some_and(|s| issue.status != s) {
            return false;
        }
        if self.category.is_some_and(|c| issue.category != c) {
            return false;
        }
        if self.priority.is_some_and(|p| issue.priority != p) {
            return false;
        }
        if let Some(ref staff) = self.assigned_to {
            if issue.assigned_to.as_ref() != Some(staff) {
                return false;
            }
        }
        if let Some(ref citizen) = self.citizen_id {
            if &issue.citizen_id != citizen {
                return false;
            }
        }
        if self.boosted_only && !issue.is_boosted {
            return false;
        }
        if let Some(ref text) = self.search {
            let needle = text.trim().to_lowercase();
            if !needle.is_empty() && !matches_text(issue, &needle) {
                return false;
            }
        }
        true
    }

    /// Apply the filter, keeping source order.
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        issues.iter().filter(|i| self.matches(i)).cloned().collect()
    }
}

/// Per-status counts for dashboard tiles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub boosted: usize,
    pub by_status: BTreeMap<String, usize>,
}

/// Count issues per status. Every status appears, zero or not.
pub fn status_summary(issues: &[Issue]) -> StatusSummary {
    let mut by_status: BTreeMap<String, usize> = Status::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for issue in issues {
        *by_status.entry(issue.status.as_str().to_string()).or_default() += 1;
    }
    StatusSummary {
        total: issues.len(),
        boosted: issues.iter().filter(|i| i.is_boosted).count(),
        by_status,
    }
}
