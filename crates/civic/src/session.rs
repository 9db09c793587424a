//! Explicit session lifecycle.
//!
//! The session is created by login, cleared by logout, and cleared by the
//! repository when the backend answers 401. Clones share the same state, so
//! the repository and the command layer see the same session. When a file
//! path is configured the session survives process restarts.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::{Identity, Session, User};
use crate::errors::{CivicError, CivicResult};

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// In-memory store with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a JSON file; an existing file restores the session.
    ///
    /// A corrupt file is discarded rather than failing startup.
    pub fn persistent(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let restored = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file {}", path.display()))?;
            match serde_json::from_str::<Session>(&content) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session file");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(restored)),
            path: Some(path),
        })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Begin a session.
    pub fn login(&self, session: Session) -> Result<()> {
        if let Some(ref path) = self.path {
            write_session_file(path, &session)?;
        }
        tracing::debug!(user = %session.user.id, role = %session.user.role, "session started");
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// End the session at the user's request.
    pub fn logout(&self) -> Result<()> {
        self.clear();
        if let Some(ref path) = self.path {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove session file {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Drop the session after the backend refused the token.
    pub fn invalidate(&self) {
        tracing::info!("session invalidated by backend");
        if let Err(e) = self.logout() {
            tracing::warn!(error = %e, "failed to remove persisted session");
        }
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Replace the cached profile, keeping the token (e.g. after subscribing).
    pub fn refresh_user(&self, user: User) -> Result<()> {
        let updated = {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            match guard.as_mut() {
                Some(session) if session.user.id == user.id => {
                    session.user = user;
                    Some(session.clone())
                }
                _ => None,
            }
        };
        if let (Some(session), Some(path)) = (updated, self.path.as_ref()) {
            write_session_file(path, &session)?;
        }
        Ok(())
    }

    /// The acting user, if logged in
    pub fn current_user(&self) -> Option<Identity> {
        self.read(|s| s.user.identity())
    }

    /// Cached profile, if logged in
    pub fn user(&self) -> Option<User> {
        self.read(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.read(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    /// The acting user or `NotAuthenticated`
    pub fn require_identity(&self) -> CivicResult<Identity> {
        self.current_user().ok_or(CivicError::NotAuthenticated)
    }

    fn read<T>(&self, f: impl FnOnce(&Session) -> T) -> Option<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

/// Write via a temp file so a crash never leaves half a session on disk.
fn write_session_file(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use tempfile::TempDir;

    fn session(role: Role) -> Session {
        Session {
            token: "tok-123".to_string(),
            user: User {
                id: "u1".to_string(),
                name: "Nadia".to_string(),
                email: "nadia@example.com".to_string(),
                role,
                is_premium: false,
                is_blocked: false,
                phone: None,
                address: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_login_and_logout_lifecycle() {
        let store = SessionStore::new();
        assert!(store.current_user().is_none());

        store.login(session(Role::Staff)).unwrap();
        let identity = store.current_user().unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.role, Role::Staff);
        assert_eq!(store.token().as_deref(), Some("tok-123"));

        store.logout().unwrap();
        assert!(!store.is_authenticated());
        assert_eq!(store.require_identity(), Err(CivicError::NotAuthenticated));
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::new();
        let shared = store.clone();
        store.login(session(Role::Admin)).unwrap();
        assert!(shared.is_authenticated());

        shared.invalidate();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_persistent_session_survives_restart() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");

        let store = SessionStore::persistent(&path).unwrap();
        store.login(session(Role::Citizen)).unwrap();
        assert!(path.exists());

        let restored = SessionStore::persistent(&path).unwrap();
        assert_eq!(restored.current_user().unwrap().role, Role::Citizen);
    }

    #[test]
    fn test_invalidate_removes_session_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");

        let store = SessionStore::persistent(&path).unwrap();
        store.login(session(Role::Citizen)).unwrap();
        store.invalidate();

        assert!(!path.exists());
        assert!(!SessionStore::persistent(&path).unwrap().is_authenticated());
    }

    #[test]
    fn test_corrupt_session_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let store = SessionStore::persistent(&path).unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_refresh_user_updates_profile() {
        let store = SessionStore::new();
        store.login(session(Role::Citizen)).unwrap();

        let mut user = store.user().unwrap();
        user.is_premium = true;
        store.refresh_user(user).unwrap();

        assert!(store.current_user().unwrap().is_premium);
        assert_eq!(store.token().as_deref(), Some("tok-123"));
    }
}
