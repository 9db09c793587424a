//! In-memory backend and repository.
//!
//! `InMemoryBackend` keeps accounts, issues and payments in RAM and applies
//! the same rules the remote service does, answering with
//! `CivicError::RemoteRejected` and an HTTP-like status. The reference
//! server wraps it, and `InMemoryRepository` exposes it through the
//! repository traits so the command layer can be tested without a network.
//! Clones share the same data.

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::capability::{self, Capability};
use crate::domain::{
    Issue, IssueDraft, Payment, PaymentKind, Role, Session, StaffDraft, Status, StatusUpdate,
    UpvoteReceipt, User,
};
use crate::errors::{CivicError, CivicResult};
use crate::session::SessionStore;
use crate::storage::{AccountRepository, IssueRepository};
use crate::validation::{self, DEFAULT_FREE_REPORT_LIMIT};
use crate::{upvote, workflow};

/// Price of a premium subscription (mocked)
pub const SUBSCRIPTION_PRICE: u32 = 1000;
/// Price of boosting one issue (mocked)
pub const BOOST_PRICE: u32 = 100;

fn rejected(status: u16, message: impl Into<String>) -> CivicError {
    CivicError::RemoteRejected {
        status,
        message: Some(message.into()),
    }
}

fn bad_request(message: impl Into<String>) -> CivicError {
    rejected(400, message)
}

fn forbidden(message: impl Into<String>) -> CivicError {
    rejected(403, message)
}

fn not_found(message: impl Into<String>) -> CivicError {
    rejected(404, message)
}

fn conflict(message: impl Into<String>) -> CivicError {
    rejected(409, message)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn authorize(actor: &User, capability: Capability) -> CivicResult<()> {
    capability::require(&actor.identity(), capability)
        .map_err(|_| forbidden(format!("Forbidden: {} permission required", capability)))
}

struct Account {
    user: User,
    salt: String,
    password_hash: String,
}

#[derive(Default)]
struct BackendState {
    accounts: Vec<Account>,
    issues: Vec<Issue>,
    payments: Vec<Payment>,
    /// token -> user id
    tokens: HashMap<String, String>,
}

impl BackendState {
    fn account(&self, user_id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.user.id == user_id)
    }

    fn account_mut(&mut self, user_id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.user.id == user_id)
    }

    fn issue_mut(&mut self, id: &str) -> CivicResult<&mut Issue> {
        self.issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found(format!("Issue not found: {}", id)))
    }

    fn record_payment(&mut self, user_id: &str, kind: PaymentKind, amount: u32, issue_id: Option<String>) {
        self.payments.push(Payment {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            amount,
            issue_id,
            created_at: Utc::now(),
        });
    }
}

/// Shared in-memory data with server-side rules.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
    free_report_limit: usize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState::default())),
            free_report_limit: DEFAULT_FREE_REPORT_LIMIT,
        }
    }

    pub fn with_free_report_limit(mut self, limit: usize) -> Self {
        self.free_report_limit = limit;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account with the given role. Emails are unique (case-insensitive).
    pub fn register_user(&self, name: &str, email: &str, password: &str, role: Role) -> CivicResult<User> {
        let mut state = self.lock();
        let email = email.trim().to_lowercase();
        if state.accounts.iter().any(|a| a.user.email == email) {
            return Err(conflict(format!("Email already registered: {}", email)));
        }

        let salt = Uuid::new_v4().to_string();
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email,
            role,
            is_premium: false,
            is_blocked: false,
            phone: None,
            address: None,
            created_at: Some(Utc::now()),
        };
        state.accounts.push(Account {
            user: user.clone(),
            password_hash: hash_password(&salt, password),
            salt,
        });
        tracing::debug!(user = %user.id, role = %role, "account registered");
        Ok(user)
    }

    /// Check credentials and issue a fresh token.
    pub fn login(&self, email: &str, password: &str) -> CivicResult<Session> {
        let mut state = self.lock();
        let email = email.trim().to_lowercase();
        let user = state
            .accounts
            .iter()
            .find(|a| a.user.email == email && a.password_hash == hash_password(&a.salt, password))
            .map(|a| a.user.clone())
            .ok_or_else(|| rejected(401, "Invalid email or password"))?;

        let token = Uuid::new_v4().to_string();
        state.tokens.insert(token.clone(), user.id.clone());
        Ok(Session { token, user })
    }

    /// Resolve a bearer token to the current state of its account.
    pub fn authenticate(&self, token: &str) -> CivicResult<User> {
        let state = self.lock();
        state
            .tokens
            .get(token)
            .and_then(|user_id| state.account(user_id))
            .map(|a| a.user.clone())
            .ok_or_else(|| rejected(401, "Invalid or expired token"))
    }

    /// Forget a token, as if it had expired.
    pub fn revoke_token(&self, token: &str) {
        self.lock().tokens.remove(token);
    }

    // ------------------------------------------------------------------
    // Issues
    // ------------------------------------------------------------------

    /// Issues in insertion order.
    pub fn list_issues(&self) -> Vec<Issue> {
        self.lock().issues.clone()
    }

    pub fn get_issue(&self, id: &str) -> CivicResult<Issue> {
        self.lock()
            .issues
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| not_found(format!("Issue not found: {}", id)))
    }

    /// Store an issue as-is (fixtures and imports).
    pub fn insert_issue(&self, issue: Issue) {
        self.lock().issues.push(issue);
    }

    pub fn create_issue(&self, actor: &User, draft: IssueDraft) -> CivicResult<Issue> {
        authorize(actor, Capability::ReportIssue)?;
        validation::validate_draft(&draft).map_err(|e| bad_request(e.user_message()))?;

        let mut state = self.lock();
        validation::check_report_quota(&actor.identity(), &state.issues, self.free_report_limit)
            .map_err(|e| forbidden(e.user_message()))?;

        let issue = Issue::from_draft(draft, actor.id.clone());
        state.issues.push(issue.clone());
        tracing::info!(issue = %issue.id, citizen = %actor.id, "issue reported");
        Ok(issue)
    }

    pub fn assign_issue(&self, actor: &User, id: &str, staff_id: &str) -> CivicResult<Issue> {
        authorize(actor, Capability::AssignIssue)?;

        let mut guard = self.lock();
        let state = &mut *guard;
        let staff_name = state
            .accounts
            .iter()
            .find(|a| a.user.id == staff_id && a.user.role == Role::Staff && !a.user.is_blocked)
            .map(|a| a.user.name.clone())
            .ok_or_else(|| bad_request(format!("Staff member not found: {}", staff_id)))?;

        let issue = state.issue_mut(id)?;
        if issue.status != Status::Pending {
            return Err(bad_request("Only pending issues can be assigned"));
        }

        issue.assigned_to = Some(staff_id.to_string());
        let comment = format!("Issue assigned to {}", staff_name);
        let entry = workflow::history_entry(Status::Assigned, Some(&comment), &actor.id, actor.role);
        workflow::record(issue, entry);
        Ok(issue.clone())
    }

    pub fn reject_issue(&self, actor: &User, id: &str) -> CivicResult<Issue> {
        authorize(actor, Capability::RejectIssue)?;

        let mut state = self.lock();
        let issue = state.issue_mut(id)?;
        workflow::validate(issue.status, Status::Rejected, actor.role)
            .map_err(|_| bad_request("Only pending issues can be rejected"))?;

        let entry = workflow::history_entry(Status::Rejected, Some("Issue rejected"), &actor.id, actor.role);
        workflow::record(issue, entry);
        Ok(issue.clone())
    }

    pub fn update_status(
        &self,
        actor: &User,
        id: &str,
        status: Status,
        comment: &str,
    ) -> CivicResult<StatusUpdate> {
        authorize(actor, Capability::UpdateStatus)?;

        let mut state = self.lock();
        let issue = state.issue_mut(id)?;
        if actor.role == Role::Staff && issue.assigned_to.as_deref() != Some(actor.id.as_str()) {
            return Err(forbidden("This issue is not assigned to you"));
        }
        workflow::validate(issue.status, status, actor.role).map_err(|e| bad_request(e.to_string()))?;
        if status == Status::Assigned && issue.assigned_to.is_none() {
            return Err(bad_request("Use the assign action to hand an issue to a staff member"));
        }

        let entry = workflow::history_entry(status, Some(comment), &actor.id, actor.role);
        workflow::record(issue, entry);
        tracing::info!(issue = %issue.id, status = %status, actor = %actor.id, "status updated");
        Ok(StatusUpdate {
            status: issue.status,
            upvotes: Some(issue.upvotes),
        })
    }

    pub fn upvote_issue(&self, actor: &User, id: &str) -> CivicResult<UpvoteReceipt> {
        authorize(actor, Capability::Upvote)?;

        let mut state = self.lock();
        let issue = state.issue_mut(id)?;
        upvote::check(issue, &actor.id).map_err(|e| match e {
            CivicError::AlreadyUpvoted => conflict(e.to_string()),
            other => bad_request(other.to_string()),
        })?;

        issue.upvoted_by.push(actor.id.clone());
        issue.upvotes = issue.upvoted_by.len() as u32;
        Ok(UpvoteReceipt {
            upvotes: issue.upvotes,
        })
    }

    pub fn boost_issue(&self, actor: &User, id: &str) -> CivicResult<Issue> {
        authorize(actor, Capability::BoostIssue)?;

        let mut state = self.lock();
        let issue = state.issue_mut(id)?;
        if issue.citizen_id != actor.id {
            return Err(forbidden("Only the reporter can boost this issue"));
        }
        if issue.is_boosted {
            return Err(conflict("Issue is already boosted"));
        }
        if issue.status.is_terminal() {
            return Err(bad_request("Closed issues cannot be boosted"));
        }

        issue.is_boosted = true;
        issue.updated_at = Some(Utc::now());
        let boosted = issue.clone();
        state.record_payment(&actor.id, PaymentKind::Boost, BOOST_PRICE, Some(boosted.id.clone()));
        Ok(boosted)
    }

    // ------------------------------------------------------------------
    // Subscription, users and staff
    // ------------------------------------------------------------------

    pub fn subscribe(&self, actor: &User) -> CivicResult<User> {
        authorize(actor, Capability::Subscribe)?;

        let mut state = self.lock();
        let account = state
            .account_mut(&actor.id)
            .ok_or_else(|| not_found("Account not found"))?;
        if account.user.is_premium {
            return Err(conflict("Already a premium member"));
        }
        account.user.is_premium = true;
        let user = account.user.clone();
        state.record_payment(&actor.id, PaymentKind::Subscription, SUBSCRIPTION_PRICE, None);
        Ok(user)
    }

    fn users_with_role(&self, role: Role) -> Vec<User> {
        self.lock()
            .accounts
            .iter()
            .filter(|a| a.user.role == role)
            .map(|a| a.user.clone())
            .collect()
    }

    pub fn list_users(&self, actor: &User) -> CivicResult<Vec<User>> {
        authorize(actor, Capability::ManageUsers)?;
        Ok(self.users_with_role(Role::Citizen))
    }

    pub fn set_blocked(&self, actor: &User, user_id: &str, blocked: bool) -> CivicResult<User> {
        authorize(actor, Capability::ManageUsers)?;

        let mut state = self.lock();
        let account = state
            .account_mut(user_id)
            .ok_or_else(|| not_found(format!("User not found: {}", user_id)))?;
        if account.user.role == Role::Admin {
            return Err(forbidden("Admins cannot be blocked"));
        }
        account.user.is_blocked = blocked;
        Ok(account.user.clone())
    }

    pub fn list_staff(&self, actor: &User) -> CivicResult<Vec<User>> {
        authorize(actor, Capability::ManageStaff)?;
        Ok(self.users_with_role(Role::Staff))
    }

    pub fn create_staff(&self, actor: &User, draft: StaffDraft) -> CivicResult<User> {
        authorize(actor, Capability::ManageStaff)?;
        validation::validate_staff_draft(&draft).map_err(|e| bad_request(e.user_message()))?;

        let mut user = self.register_user(&draft.name, &draft.email, &draft.password, Role::Staff)?;
        if let Some(phone) = draft.phone.filter(|p| !p.trim().is_empty()) {
            let mut state = self.lock();
            if let Some(account) = state.account_mut(&user.id) {
                account.user.phone = Some(phone);
                user = account.user.clone();
            }
        }
        Ok(user)
    }

    pub fn remove_staff(&self, actor: &User, staff_id: &str) -> CivicResult<()> {
        authorize(actor, Capability::ManageStaff)?;

        let mut state = self.lock();
        let index = state
            .accounts
            .iter()
            .position(|a| a.user.id == staff_id && a.user.role == Role::Staff)
            .ok_or_else(|| not_found(format!("Staff member not found: {}", staff_id)))?;
        state.accounts.remove(index);
        state.tokens.retain(|_, user_id| user_id != staff_id);
        Ok(())
    }

    pub fn list_payments(&self, actor: &User) -> CivicResult<Vec<Payment>> {
        let state = self.lock();
        let sees_all = capability::capabilities_of(&actor.identity()).contains(&Capability::ViewPayments);
        Ok(state
            .payments
            .iter()
            .filter(|p| sees_all || p.user_id == actor.id)
            .cloned()
            .collect())
    }
}

/// Repository view of an [`InMemoryBackend`] acting as the session's user.
#[derive(Clone)]
pub struct InMemoryRepository {
    backend: InMemoryBackend,
    session: SessionStore,
}

impl InMemoryRepository {
    pub fn new(backend: InMemoryBackend, session: SessionStore) -> Self {
        Self { backend, session }
    }

    pub fn backend(&self) -> &InMemoryBackend {
        &self.backend
    }

    /// Map a 401 to an expired session, clearing it.
    fn guard<T>(&self, result: CivicResult<T>) -> CivicResult<T> {
        match result {
            Err(CivicError::RemoteRejected { status: 401, .. }) => {
                self.session.invalidate();
                Err(CivicError::SessionExpired)
            }
            other => other,
        }
    }

    fn actor(&self) -> CivicResult<User> {
        let token = self.session.token().ok_or(CivicError::NotAuthenticated)?;
        self.guard(self.backend.authenticate(&token))
    }
}

#[async_trait]
impl IssueRepository for InMemoryRepository {
    async fn list_issues(&self) -> CivicResult<Vec<Issue>> {
        Ok(self.backend.list_issues())
    }

    async fn get_issue(&self, id: &str) -> CivicResult<Issue> {
        self.backend.get_issue(id)
    }

    async fn create_issue(&self, draft: &IssueDraft) -> CivicResult<Issue> {
        let actor = self.actor()?;
        self.backend.create_issue(&actor, draft.clone())
    }

    async fn assign_issue(&self, id: &str, staff_id: &str) -> CivicResult<()> {
        let actor = self.actor()?;
        self.backend.assign_issue(&actor, id, staff_id).map(|_| ())
    }

    async fn reject_issue(&self, id: &str) -> CivicResult<()> {
        let actor = self.actor()?;
        self.backend.reject_issue(&actor, id).map(|_| ())
    }

    async fn update_status(&self, id: &str, status: Status, comment: &str) -> CivicResult<StatusUpdate> {
        let actor = self.actor()?;
        self.backend.update_status(&actor, id, status, comment)
    }

    async fn upvote_issue(&self, id: &str) -> CivicResult<UpvoteReceipt> {
        let actor = self.actor()?;
        self.backend.upvote_issue(&actor, id)
    }
}

#[async_trait]
impl AccountRepository for InMemoryRepository {
    async fn login(&self, email: &str, password: &str) -> CivicResult<Session> {
        self.backend.login(email, password)
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> CivicResult<User> {
        self.backend.register_user(name, email, password, Role::Citizen)
    }

    async fn list_users(&self) -> CivicResult<Vec<User>> {
        let actor = self.actor()?;
        self.backend.list_users(&actor)
    }

    async fn set_blocked(&self, user_id: &str, blocked: bool) -> CivicResult<User> {
        let actor = self.actor()?;
        self.backend.set_blocked(&actor, user_id, blocked)
    }

    async fn list_staff(&self) -> CivicResult<Vec<User>> {
        let actor = self.actor()?;
        self.backend.list_staff(&actor)
    }

    async fn create_staff(&self, draft: &StaffDraft) -> CivicResult<User> {
        let actor = self.actor()?;
        self.backend.create_staff(&actor, draft.clone())
    }

    async fn remove_staff(&self, staff_id: &str) -> CivicResult<()> {
        let actor = self.actor()?;
        self.backend.remove_staff(&actor, staff_id)
    }

    async fn subscribe(&self) -> CivicResult<User> {
        let actor = self.actor()?;
        self.backend.subscribe(&actor)
    }

    async fn boost_issue(&self, id: &str) -> CivicResult<Issue> {
        let actor = self.actor()?;
        self.backend.boost_issue(&actor, id)
    }

    async fn list_payments(&self) -> CivicResult<Vec<Payment>> {
        let actor = self.actor()?;
        self.backend.list_payments(&actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Location};

    fn draft(title: &str) -> IssueDraft {
        IssueDraft {
            title: title.to_string(),
            description: "Needs fixing".to_string(),
            category: Category::Pothole,
            priority: None,
            location: Location {
                address: "1 Ring Rd".to_string(),
                latitude: 10.0,
                longitude: 20.0,
            },
            photos: Vec::new(),
        }
    }

    struct Fixture {
        backend: InMemoryBackend,
        admin: User,
        staff: User,
        citizen: User,
    }

    fn fixture() -> Fixture {
        let backend = InMemoryBackend::new();
        let admin = backend.register_user("Admin", "admin@city.gov", "secret1", Role::Admin).unwrap();
        let staff = backend.register_user("Sam", "sam@city.gov", "secret1", Role::Staff).unwrap();
        let citizen = backend.register_user("Cora", "cora@mail.com", "secret1", Role::Citizen).unwrap();
        Fixture { backend, admin, staff, citizen }
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let f = fixture();
        let err = f
            .backend
            .register_user("Other", "CORA@mail.com", "secret1", Role::Citizen)
            .unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 409, .. }));
    }

    #[test]
    fn test_login_and_authenticate() {
        let f = fixture();
        let session = f.backend.login("cora@mail.com", "secret1").unwrap();
        assert_eq!(session.user.id, f.citizen.id);
        assert_eq!(f.backend.authenticate(&session.token).unwrap().id, f.citizen.id);

        let err = f.backend.login("cora@mail.com", "wrong").unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 401, .. }));

        f.backend.revoke_token(&session.token);
        assert!(f.backend.authenticate(&session.token).is_err());
    }

    #[test]
    fn test_assign_moves_pending_to_assigned_with_history() {
        let f = fixture();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();

        let assigned = f.backend.assign_issue(&f.admin, &issue.id, &f.staff.id).unwrap();

        assert_eq!(assigned.status, Status::Assigned);
        assert_eq!(assigned.assigned_to.as_deref(), Some(f.staff.id.as_str()));
        assert_eq!(assigned.status_history.len(), 2);
        assert_eq!(assigned.status_history[1].comment, "Issue assigned to Sam");
        assert_eq!(assigned.status_history[0], issue.status_history[0]);
    }

    #[test]
    fn test_staff_cannot_update_unassigned_issue() {
        let f = fixture();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();

        let err = f
            .backend
            .update_status(&f.staff, &issue.id, Status::InProgress, "")
            .unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 403, .. }));
    }

    #[test]
    fn test_status_update_cannot_assign_without_assignee() {
        let f = fixture();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();

        let err = f
            .backend
            .update_status(&f.admin, &issue.id, Status::Assigned, "")
            .unwrap_err();

        assert!(matches!(err, CivicError::RemoteRejected { status: 400, .. }));
        let stored = f.backend.get_issue(&issue.id).unwrap();
        assert_eq!(stored.status, Status::Pending);
        assert_eq!(stored.status_history.len(), 1);
        f.backend.assign_issue(&f.admin, &issue.id, &f.staff.id).unwrap();
    }

    #[test]
    fn test_update_status_enforces_workflow() {
        let f = fixture();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();
        f.backend.assign_issue(&f.admin, &issue.id, &f.staff.id).unwrap();

        let update = f
            .backend
            .update_status(&f.staff, &issue.id, Status::Resolved, "Patched")
            .unwrap();
        assert_eq!(update.status, Status::Resolved);

        let err = f
            .backend
            .update_status(&f.staff, &issue.id, Status::Closed, "")
            .unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 400, .. }));
    }

    #[test]
    fn test_free_citizen_quota() {
        let f = fixture();
        let backend = f.backend.with_free_report_limit(2);
        backend.create_issue(&f.citizen, draft("One")).unwrap();
        backend.create_issue(&f.citizen, draft("Two")).unwrap();

        let err = backend.create_issue(&f.citizen, draft("Three")).unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 403, .. }));

        let premium = backend.subscribe(&f.citizen).unwrap();
        assert!(premium.is_premium);
        assert!(backend.create_issue(&premium, draft("Three")).is_ok());
    }

    #[test]
    fn test_upvote_rules() {
        let f = fixture();
        let other = f
            .backend
            .register_user("Omar", "omar@mail.com", "secret1", Role::Citizen)
            .unwrap();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();

        let err = f.backend.upvote_issue(&f.citizen, &issue.id).unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 400, .. }));

        assert_eq!(f.backend.upvote_issue(&other, &issue.id).unwrap().upvotes, 1);
        let err = f.backend.upvote_issue(&other, &issue.id).unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 409, .. }));
    }

    #[test]
    fn test_boost_records_payment() {
        let f = fixture();
        let issue = f.backend.create_issue(&f.citizen, draft("Hole")).unwrap();

        let boosted = f.backend.boost_issue(&f.citizen, &issue.id).unwrap();
        assert!(boosted.is_boosted);

        let payments = f.backend.list_payments(&f.admin).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].kind, PaymentKind::Boost);
        assert_eq!(payments[0].amount, BOOST_PRICE);

        assert!(f.backend.list_payments(&f.staff).unwrap().is_empty());
    }

    #[test]
    fn test_admin_cannot_be_blocked() {
        let f = fixture();
        let err = f.backend.set_blocked(&f.admin, &f.admin.id, true).unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 403, .. }));

        let blocked = f.backend.set_blocked(&f.admin, &f.citizen.id, true).unwrap();
        assert!(blocked.is_blocked);
        let err = f.backend.create_issue(&blocked, draft("Nope")).unwrap_err();
        assert!(matches!(err, CivicError::RemoteRejected { status: 403, .. }));
    }

    #[test]
    fn test_remove_staff_revokes_tokens() {
        let f = fixture();
        let session = f.backend.login("sam@city.gov", "secret1").unwrap();

        f.backend.remove_staff(&f.admin, &f.staff.id).unwrap();

        assert!(f.backend.authenticate(&session.token).is_err());
        assert!(f.backend.list_staff(&f.admin).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repository_invalidates_session_on_unknown_token() {
        let f = fixture();
        let session_store = SessionStore::new();
        let repo = InMemoryRepository::new(f.backend.clone(), session_store.clone());

        let session = repo.login("cora@mail.com", "secret1").await.unwrap();
        session_store.login(session.clone()).unwrap();
        f.backend.revoke_token(&session.token);

        let err = repo.create_issue(&draft("Hole")).await.unwrap_err();
        assert_eq!(err, CivicError::SessionExpired);
        assert!(!session_store.is_authenticated());
    }
}
