//! Test helper functions for command tests.

use crate::commands::CommandExecutor;
use crate::domain::{Category, Issue, IssueDraft, Location, Role, User};
use crate::session::SessionStore;
use crate::storage::{AccountRepository, InMemoryBackend, InMemoryRepository};

pub fn draft(title: &str) -> IssueDraft {
    IssueDraft {
        title: title.to_string(),
        description: "Reported from the street".to_string(),
        category: Category::Pothole,
        priority: None,
        location: Location {
            address: "5 Station Rd".to_string(),
            latitude: 51.5,
            longitude: -0.12,
        },
        photos: Vec::new(),
    }
}

/// A pending issue with a fixed id, not stored anywhere.
pub fn sample_issue(id: &str) -> Issue {
    let mut issue = Issue::from_draft(draft(&format!("Issue {}", id)), "citizen-0");
    issue.id = id.to_string();
    issue
}

/// Backend seeded with one admin, one staff member and two citizens.
pub struct Fixture {
    pub backend: InMemoryBackend,
    pub admin: User,
    pub staff: User,
    pub citizen: User,
    pub neighbour: User,
}

pub fn fixture() -> Fixture {
    let backend = InMemoryBackend::new();
    let admin = backend
        .register_user("Ada Admin", "admin@city.gov", "secret1", Role::Admin)
        .unwrap();
    let staff = backend
        .register_user("Sam Staff", "sam@city.gov", "secret1", Role::Staff)
        .unwrap();
    let citizen = backend
        .register_user("Cora Citizen", "cora@mail.com", "secret1", Role::Citizen)
        .unwrap();
    let neighbour = backend
        .register_user("Ned Neighbour", "ned@mail.com", "secret1", Role::Citizen)
        .unwrap();
    Fixture {
        backend,
        admin,
        staff,
        citizen,
        neighbour,
    }
}

/// Executor logged in as `email` against `backend`.
pub async fn executor_as(backend: &InMemoryBackend, email: &str) -> CommandExecutor<InMemoryRepository> {
    let session = SessionStore::new();
    let repo = InMemoryRepository::new(backend.clone(), session.clone());
    let logged_in = repo.login(email, "secret1").await.unwrap();
    session.login(logged_in).unwrap();
    CommandExecutor::new(repo, session)
}

/// Executor with no session.
pub fn anonymous(backend: &InMemoryBackend) -> CommandExecutor<InMemoryRepository> {
    let session = SessionStore::new();
    CommandExecutor::new(InMemoryRepository::new(backend.clone(), session.clone()), session)
}
