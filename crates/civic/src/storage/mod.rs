//! Repository abstraction over the remote issue service.
//!
//! `IssueRepository` covers the issue operations the triage policy consumes;
//! `AccountRepository` covers accounts, staff and (mocked) payments. Both
//! are implemented over HTTP for real use and in memory for tests and
//! offline development.
//!
//! Repositories identify the actor through the shared
//! [`SessionStore`](crate::session::SessionStore). A 401 from the backend
//! clears that session and surfaces as `CivicError::SessionExpired`.

use async_trait::async_trait;

use crate::domain::{
    Issue, IssueDraft, Payment, Session, StaffDraft, Status, StatusUpdate, UpvoteReceipt, User,
};
use crate::errors::CivicResult;

pub mod http;
pub mod memory;

pub use http::HttpRepository;
pub use memory::{InMemoryBackend, InMemoryRepository};

/// Issue operations.
///
/// # Examples
///
/// ```
/// use civic::domain::Role;
/// use civic::session::SessionStore;
/// use civic::storage::{AccountRepository, InMemoryBackend, InMemoryRepository, IssueRepository};
///
/// # tokio_test_block(async {
/// let backend = InMemoryBackend::new();
/// backend.register_user("Admin", "admin@city.gov", "secret1", Role::Admin).unwrap();
///
/// let session = SessionStore::new();
/// let repo = InMemoryRepository::new(backend, session.clone());
/// session.login(repo.login("admin@city.gov", "secret1").await.unwrap()).unwrap();
///
/// assert!(repo.list_issues().await.unwrap().is_empty());
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// All issues visible to the caller.
    async fn list_issues(&self) -> CivicResult<Vec<Issue>>;

    async fn get_issue(&self, id: &str) -> CivicResult<Issue>;

    /// Report a new issue as the current user.
    async fn create_issue(&self, draft: &IssueDraft) -> CivicResult<Issue>;

    async fn assign_issue(&self, id: &str, staff_id: &str) -> CivicResult<()>;

    async fn reject_issue(&self, id: &str) -> CivicResult<()>;

    /// Change status. The response's `upvotes`, when present, is authoritative.
    async fn update_status(
        &self,
        id: &str,
        status: Status,
        comment: &str,
    ) -> CivicResult<StatusUpdate>;

    async fn upvote_issue(&self, id: &str) -> CivicResult<UpvoteReceipt>;
}

/// Account, staff and payment operations.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Exchange credentials for a session. Does not store it.
    async fn login(&self, email: &str, password: &str) -> CivicResult<Session>;

    /// Create a citizen account.
    async fn register(&self, name: &str, email: &str, password: &str) -> CivicResult<User>;

    /// Citizen accounts (admin only).
    async fn list_users(&self) -> CivicResult<Vec<User>>;

    async fn set_blocked(&self, user_id: &str, blocked: bool) -> CivicResult<User>;

    async fn list_staff(&self) -> CivicResult<Vec<User>>;

    async fn create_staff(&self, draft: &StaffDraft) -> CivicResult<User>;

    async fn remove_staff(&self, staff_id: &str) -> CivicResult<()>;

    /// Upgrade the current citizen to premium; returns the updated profile.
    async fn subscribe(&self) -> CivicResult<User>;

    /// Pay to boost an issue; returns the updated issue.
    async fn boost_issue(&self, id: &str) -> CivicResult<Issue>;

    /// All payments for admins, own payments otherwise.
    async fn list_payments(&self) -> CivicResult<Vec<Payment>>;
}
