//! Tests for the issue filters and dashboard summary

use civic::domain::queries::*;
use civic::domain::{Category, Issue, Location, Priority, Status};

fn make_issue(id: &str, title: &str, status: Status, category: Category) -> Issue {
    Issue {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        category,
        status,
        priority: Priority::Medium,
        is_boosted: false,
        location: Location {
            address: "1 Main St".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        },
        photos: Vec::new(),
        citizen_id: "citizen-1".to_string(),
        assigned_to: None,
        upvotes: 0,
        upvoted_by: Vec::new(),
        status_history: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

fn sample() -> Vec<Issue> {
    let mut lamp = make_issue("a", "Lamp out", Status::Assigned, Category::Streetlight);
    lamp.assigned_to = Some("staff-1".to_string());
    let mut leak = make_issue("b", "Leaking hydrant", Status::Pending, Category::WaterLeakage);
    leak.is_boosted = true;
    leak.citizen_id = "citizen-2".to_string();
    let mut hole = make_issue("c", "Pothole", Status::Pending, Category::Pothole);
    hole.location.address = "Harbour Bridge".to_string();
    vec![lamp, leak, hole]
}

fn ids(issues: &[Issue]) -> Vec<&str> {
    issues.iter().map(|i| i.id.as_str()).collect()
}

#[test]
fn test_query_by_status() {
    assert_eq!(ids(&query_by_status(&sample(), Status::Pending)), vec!["b", "c"]);
    assert!(query_by_status(&sample(), Status::Closed).is_empty());
}

#[test]
fn test_query_by_category_and_people() {
    let issues = sample();
    assert_eq!(ids(&query_by_category(&issues, Category::Streetlight)), vec!["a"]);
    assert_eq!(ids(&query_by_assignee(&issues, "staff-1")), vec!["a"]);
    assert_eq!(ids(&query_by_citizen(&issues, "citizen-2")), vec!["b"]);
}

#[test]
fn test_search_is_case_insensitive_and_covers_address() {
    let issues = sample();
    assert_eq!(ids(&search(&issues, "HYDRANT")), vec!["b"]);
    assert_eq!(ids(&search(&issues, "harbour")), vec!["c"]);
    assert_eq!(search(&issues, "   ").len(), 3);
}

#[test]
fn test_filter_combines_criteria() {
    let filter = IssueFilter {
        status: Some(Status::Pending),
        boosted_only: true,
        ..Default::default()
    };
    assert_eq!(ids(&filter.apply(&sample())), vec!["b"]);

    let filter = IssueFilter {
        status: Some(Status::Pending),
        search: Some("lamp".to_string()),
        ..Default::default()
    };
    assert!(filter.apply(&sample()).is_empty());
}

#[test]
fn test_empty_filter_keeps_everything_in_order() {
    assert_eq!(ids(&IssueFilter::default().apply(&sample())), vec!["a", "b", "c"]);
}

#[test]
fn test_status_summary_counts() {
    let summary = status_summary(&sample());
    assert_eq!(summary.total, 3);
    assert_eq!(summary.boosted, 1);
    assert_eq!(summary.by_status.get("pending"), Some(&2));
    assert_eq!(summary.by_status.get("assigned"), Some(&1));
    assert_eq!(summary.by_status.get("closed"), Some(&0));
}
