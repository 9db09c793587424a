//! Session lifecycle, users and staff

use super::*;
use crate::domain::{Session, StaffDraft, User};
use crate::errors::CivicError;
use crate::validation;

impl<R: IssueRepository + AccountRepository> CommandExecutor<R> {
    /// Log in and keep the session.
    pub async fn login(&self, email: &str, password: &str) -> CivicResult<User> {
        let session: Session = self.repo.login(email.trim(), password).await?;
        let user = session.user.clone();
        self.session
            .login(session)
            .map_err(|e| CivicError::Storage(format!("{:#}", e)))?;
        tracing::info!(user = %user.id, role = %user.role, "logged in");
        Ok(user)
    }

    pub fn logout(&self) -> CivicResult<()> {
        self.session
            .logout()
            .map_err(|e| CivicError::Storage(format!("{:#}", e)))
    }

    /// Profile captured at login.
    pub fn whoami(&self) -> CivicResult<User> {
        self.session.user().ok_or(CivicError::NotAuthenticated)
    }

    /// Create a citizen account. Does not log in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> CivicResult<User> {
        validation::validate_credentials(name, email, password)?;
        self.repo.register(name.trim(), email.trim(), password).await
    }

    pub async fn list_users(&self) -> CivicResult<Vec<User>> {
        self.open(Route::ManageUsers)?;
        self.repo.list_users().await
    }

    pub async fn set_user_blocked(&self, user_id: &str, blocked: bool) -> CivicResult<User> {
        let identity = self.authorize(Capability::ManageUsers)?;
        if identity.id == user_id {
            return Err(CivicError::Validation("You cannot block yourself".to_string()));
        }
        let user = self.repo.set_blocked(user_id, blocked).await?;
        tracing::info!(user = %user.id, blocked, "block flag changed");
        Ok(user)
    }

    pub async fn list_staff(&self) -> CivicResult<Vec<User>> {
        self.open(Route::ManageStaff)?;
        self.repo.list_staff().await
    }

    pub async fn add_staff(&self, draft: StaffDraft) -> CivicResult<User> {
        self.authorize(Capability::ManageStaff)?;
        validation::validate_staff_draft(&draft)?;
        self.repo.create_staff(&draft).await
    }

    pub async fn remove_staff(&self, staff_id: &str) -> CivicResult<()> {
        self.authorize(Capability::ManageStaff)?;
        self.repo.remove_staff(staff_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::commands::test_helpers::{anonymous, executor_as, fixture};
    use crate::domain::{Role, StaffDraft};
    use crate::errors::CivicError;

    #[tokio::test]
    async fn test_login_stores_session_and_logout_clears_it() {
        let f = fixture();
        let executor = anonymous(&f.backend);

        let user = executor.login("cora@mail.com", "secret1").await.unwrap();
        assert_eq!(user.role, Role::Citizen);
        assert_eq!(executor.whoami().unwrap().id, f.citizen.id);

        executor.logout().unwrap();
        assert_eq!(executor.whoami().unwrap_err(), CivicError::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_bad_credentials_keep_backend_message() {
        let f = fixture();
        let executor = anonymous(&f.backend);
        let err = executor.login("cora@mail.com", "nope").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(!executor.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let f = fixture();
        let executor = anonymous(&f.backend);
        let user = executor
            .register("Rita", "rita@mail.com", "secret1")
            .await
            .unwrap();
        assert_eq!(user.role, Role::Citizen);
        assert!(executor.login("rita@mail.com", "secret1").await.is_ok());

        let err = executor.register("Rita", "not-an-email", "secret1").await.unwrap_err();
        assert!(matches!(err, CivicError::Validation(_)));
    }

    #[tokio::test]
    async fn test_admin_manages_staff() {
        let f = fixture();
        let admin = executor_as(&f.backend, "admin@city.gov").await;

        let added = admin
            .add_staff(StaffDraft {
                name: "Paula".to_string(),
                email: "paula@city.gov".to_string(),
                phone: Some("555-0100".to_string()),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(added.role, Role::Staff);
        assert_eq!(added.phone.as_deref(), Some("555-0100"));
        assert_eq!(admin.list_staff().await.unwrap().len(), 2);

        admin.remove_staff(&added.id).await.unwrap();
        assert_eq!(admin.list_staff().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blocking_a_citizen() {
        let f = fixture();
        let admin = executor_as(&f.backend, "admin@city.gov").await;
        let blocked = admin.set_user_blocked(&f.citizen.id, true).await.unwrap();
        assert!(blocked.is_blocked);

        let users = admin.list_users().await.unwrap();
        assert!(users.iter().all(|u| u.role == Role::Citizen));
        assert_eq!(users.len(), 2);

        let err = admin.set_user_blocked(&f.admin.id, true).await.unwrap_err();
        assert!(matches!(err, CivicError::Validation(_)));
    }

    #[tokio::test]
    async fn test_citizen_cannot_list_users() {
        let f = fixture();
        let citizen = executor_as(&f.backend, "cora@mail.com").await;
        let err = citizen.list_users().await.unwrap_err();
        assert!(matches!(err, CivicError::Forbidden(_)));
    }
}
