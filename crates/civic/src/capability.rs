//! Role-based capability resolution.
//!
//! A single mapping from `(role, blocked)` to the set of things a user may
//! do. Route guards, navigation, and command checks all consult it instead
//! of testing roles ad hoc.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::domain::{Identity, Role};
use crate::errors::{CivicError, CivicResult};

/// A named permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewIssues,
    ReportIssue,
    Upvote,
    Subscribe,
    BoostIssue,
    ViewAssigned,
    UpdateStatus,
    ManageIssues,
    AssignIssue,
    RejectIssue,
    ManageUsers,
    ManageStaff,
    ViewPayments,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ViewIssues => "view_issues",
            Capability::ReportIssue => "report_issue",
            Capability::Upvote => "upvote",
            Capability::Subscribe => "subscribe",
            Capability::BoostIssue => "boost_issue",
            Capability::ViewAssigned => "view_assigned",
            Capability::UpdateStatus => "update_status",
            Capability::ManageIssues => "manage_issues",
            Capability::AssignIssue => "assign_issue",
            Capability::RejectIssue => "reject_issue",
            Capability::ManageUsers => "manage_users",
            Capability::ManageStaff => "manage_staff",
            Capability::ViewPayments => "view_payments",
        };
        f.write_str(name)
    }
}

/// Resolve the capabilities of a role. Blocked accounts keep read access only.
pub fn capabilities(role: Role, blocked: bool) -> BTreeSet<Capability> {
    use Capability::*;

    if blocked {
        return BTreeSet::from([ViewIssues]);
    }

    let granted: &[Capability] = match role {
        Role::Citizen => &[ViewIssues, ReportIssue, Upvote, Subscribe, BoostIssue],
        Role::Staff => &[ViewIssues, ViewAssigned, UpdateStatus],
        Role::Admin => &[
            ViewIssues,
            UpdateStatus,
            ManageIssues,
            AssignIssue,
            RejectIssue,
            ManageUsers,
            ManageStaff,
            ViewPayments,
        ],
    };
    granted.iter().copied().collect()
}

/// Capabilities of an identity
pub fn capabilities_of(identity: &Identity) -> BTreeSet<Capability> {
    capabilities(identity.role, identity.is_blocked)
}

/// Fail with `Forbidden` unless the identity holds `capability`.
pub fn require(identity: &Identity, capability: Capability) -> CivicResult<()> {
    if capabilities_of(identity).contains(&capability) {
        Ok(())
    } else {
        Err(CivicError::Forbidden(capability))
    }
}

/// Dashboard destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    ReportIssue,
    MyIssues,
    AssignedIssues,
    ManageIssues,
    ManageUsers,
    ManageStaff,
    Payments,
    Profile,
}

impl Route {
    pub const ALL: [Route; 8] = [
        Route::ReportIssue,
        Route::MyIssues,
        Route::AssignedIssues,
        Route::ManageIssues,
        Route::ManageUsers,
        Route::ManageStaff,
        Route::Payments,
        Route::Profile,
    ];

    /// Capability needed to open the route
    pub fn required_capability(self) -> Capability {
        match self {
            Route::ReportIssue => Capability::ReportIssue,
            Route::MyIssues => Capability::ReportIssue,
            Route::AssignedIssues => Capability::ViewAssigned,
            Route::ManageIssues => Capability::ManageIssues,
            Route::ManageUsers => Capability::ManageUsers,
            Route::ManageStaff => Capability::ManageStaff,
            Route::Payments => Capability::ViewPayments,
            Route::Profile => Capability::ViewIssues,
        }
    }

    /// The issue list a role lands on
    pub fn home(role: Role) -> Route {
        match role {
            Role::Citizen => Route::MyIssues,
            Role::Staff => Route::AssignedIssues,
            Role::Admin => Route::ManageIssues,
        }
    }

    /// Routes shown in the navigation for this identity, in display order
    pub fn navigation(identity: &Identity) -> Vec<Route> {
        let granted = capabilities_of(identity);
        Route::ALL
            .into_iter()
            .filter(|route| granted.contains(&route.required_capability()))
            .collect()
    }
}

/// Routing guard. Every view entry point goes through it.
pub fn guard(identity: Option<&Identity>, route: Route) -> CivicResult<()> {
    let identity = identity.ok_or(CivicError::NotAuthenticated)?;
    require(identity, route.required_capability())
}
