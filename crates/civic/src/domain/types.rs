//! Core domain types for citizen-reported infrastructure issues.
//!
//! Field names follow the backend's JSON contract (camelCase on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::CivicError;

/// Issue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Reported, waiting for an admin to act
    Pending,
    /// Handed to a staff member
    Assigned,
    /// Staff acknowledged and started
    InProgress,
    /// Crew on site
    Working,
    /// Fixed (terminal)
    Resolved,
    /// Closed after resolution (terminal)
    Closed,
    /// Refused by an admin (terminal)
    Rejected,
}

impl Status {
    /// Every status, in workflow order with the rejected branch last.
    pub const ALL: [Status; 7] = [
        Status::Pending,
        Status::Assigned,
        Status::InProgress,
        Status::Working,
        Status::Resolved,
        Status::Closed,
        Status::Rejected,
    ];

    /// Wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Assigned => "assigned",
            Status::InProgress => "in-progress",
            Status::Working => "working",
            Status::Resolved => "resolved",
            Status::Closed => "closed",
            Status::Rejected => "rejected",
        }
    }

    /// Terminal statuses offer no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Resolved | Status::Closed | Status::Rejected)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "pending" => Ok(Status::Pending),
            "assigned" => Ok(Status::Assigned),
            "in-progress" => Ok(Status::InProgress),
            "working" => Ok(Status::Working),
            "resolved" => Ok(Status::Resolved),
            "closed" => Ok(Status::Closed),
            "rejected" => Ok(Status::Rejected),
            other => Err(CivicError::Validation(format!(
                "Invalid status '{}'. Must be one of: pending, assigned, in-progress, working, resolved, closed, rejected",
                other
            ))),
        }
    }
}

/// Issue category as chosen on the report form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Pothole,
    Streetlight,
    WaterLeakage,
    Garbage,
    Footpath,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Pothole => "pothole",
            Category::Streetlight => "streetlight",
            Category::WaterLeakage => "water_leakage",
            Category::Garbage => "garbage",
            Category::Footpath => "footpath",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pothole" => Ok(Category::Pothole),
            "streetlight" => Ok(Category::Streetlight),
            "water_leakage" => Ok(Category::WaterLeakage),
            "garbage" => Ok(Category::Garbage),
            "footpath" => Ok(Category::Footpath),
            "other" => Ok(Category::Other),
            other => Err(CivicError::Validation(format!(
                "Invalid category '{}'. Must be one of: pothole, streetlight, water_leakage, garbage, footpath, other",
                other
            ))),
        }
    }
}

/// Issue priority level
///
/// Values the client does not recognise (or a missing field) decode as
/// `Unspecified`, which ranks below `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Priority {
    /// Triage weight: high 3, medium 2, low 1, anything else 0.
    pub fn weight(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Unspecified => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(CivicError::Validation(format!(
                "Invalid priority '{}'. Must be one of: low, medium, high",
                other
            ))),
        }
    }
}

/// Accepts `null` as well as unknown strings.
fn priority_or_unspecified<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Priority>::deserialize(deserializer)?.unwrap_or_default())
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "citizen" => Ok(Role::Citizen),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(CivicError::Validation(format!(
                "Invalid role '{}'. Must be one of: citizen, staff, admin",
                other
            ))),
        }
    }
}

/// Where the issue is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One entry of an issue's append-only status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: Status,
    pub comment: String,
    /// User id of the actor
    pub updated_by: String,
    pub updated_by_role: Role,
    pub timestamp: DateTime<Utc>,
}

/// A reported infrastructure issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: Status,
    #[serde(default, deserialize_with = "priority_or_unspecified")]
    pub priority: Priority,
    #[serde(default)]
    pub is_boosted: bool,
    pub location: Location,
    /// Image references, first is primary
    #[serde(default)]
    pub photos: Vec<String>,
    pub citizen_id: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub upvoted_by: Vec<String>,
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Build a freshly reported issue from a draft.
    ///
    /// The issue starts `pending` with a single history entry.
    pub fn from_draft(draft: IssueDraft, citizen_id: impl Into<String>) -> Self {
        let citizen_id = citizen_id.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            status: Status::Pending,
            priority: draft.priority.unwrap_or(Priority::Medium),
            is_boosted: false,
            location: draft.location,
            photos: draft.photos,
            citizen_id: citizen_id.clone(),
            assigned_to: None,
            upvotes: 0,
            upvoted_by: Vec::new(),
            status_history: vec![StatusEntry {
                status: Status::Pending,
                comment: "Issue reported".to_string(),
                updated_by: citizen_id,
                updated_by_role: Role::Citizen,
                timestamp: now,
            }],
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Primary photo, if any
    pub fn primary_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }

    /// Whether the given user has already upvoted this issue
    pub fn has_upvoted(&self, user_id: &str) -> bool {
        self.upvoted_by.iter().any(|id| id == user_id)
    }

    /// Short form of the id for human-readable listings
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

/// Payload submitted by the report form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    /// Backend defaults to `medium` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub location: Location,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// The slice of the profile that policy checks need
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            role: self.role,
            is_blocked: self.is_blocked,
            is_premium: self.is_premium,
        }
    }
}

/// The acting user as seen by the policy layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub is_premium: bool,
}

impl Identity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            is_blocked: false,
            is_premium: false,
        }
    }
}

/// Authenticated session: bearer token plus the profile captured at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Payload for creating a staff account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffDraft {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

/// Response of a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u32>,
}

/// Response of an upvote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpvoteReceipt {
    pub upvotes: u32,
}

/// What a (mocked) payment bought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Subscription,
    Boost,
}

/// A recorded payment; no money moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(alias = "_id")]
    pub id: String,
    pub user_id: String,
    pub kind: PaymentKind,
    pub amount: u32,
    #[serde(default)]
    pub issue_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
