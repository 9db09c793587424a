//! HTTP repository over the REST API.
//!
//! Reads go through the configured [`RetryPolicy`]; writes are sent once.
//! A token is attached whenever the session has one.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::config::EffectiveConfig;
use crate::domain::{
    Issue, IssueDraft, Payment, Session, StaffDraft, Status, StatusUpdate, UpvoteReceipt, User,
};
use crate::errors::{CivicError, CivicResult};
use crate::retry::RetryPolicy;
use crate::session::SessionStore;
use crate::storage::{AccountRepository, IssueRepository};

/// Error body returned by the API
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Extract the human-readable message from an error response body.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
}

fn transport_error(e: reqwest::Error) -> CivicError {
    if e.is_decode() {
        CivicError::InvalidResponse(e.to_string())
    } else {
        CivicError::NetworkUnavailable(e.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct StatusChange<'a> {
    status: Status,
    comment: &'a str,
}

/// Repository backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpRepository {
    client: Client,
    base_url: Url,
    session: SessionStore,
    retry: RetryPolicy,
}

impl HttpRepository {
    pub fn new(base_url: &str, timeout: Duration, session: SessionStore) -> CivicResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| CivicError::Validation(format!("Invalid API base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(CivicError::Validation(format!("Invalid API base URL '{}'", base_url)));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            base_url,
            session,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &EffectiveConfig, session: SessionStore) -> CivicResult<Self> {
        Ok(Self::new(&config.base_url(), config.timeout(), session)?.with_retry(config.retry_policy()))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint URL; each segment is percent-encoded, so ids cannot add
    /// path components or a query.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the bearer token, reporting whether one was present.
    fn authorize(&self, request: RequestBuilder) -> (RequestBuilder, bool) {
        match self.session.token() {
            Some(token) => (request.bearer_auth(token), true),
            None => (request, false),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> CivicResult<T> {
        let (request, authenticated) = self.authorize(request);
        let response = request.send().await.map_err(transport_error)?;
        self.handle_response(response, authenticated).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        authenticated: bool,
    ) -> CivicResult<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED && authenticated {
            tracing::info!("token rejected, clearing session");
            self.session.invalidate();
            return Err(CivicError::SessionExpired);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CivicError::RemoteRejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| CivicError::InvalidResponse(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> CivicResult<T> {
        let url = self.url(path);
        let url = url.as_str();
        tracing::debug!(url, "GET");
        self.retry
            .run(url, || async move { self.send(self.client.get(url)).await })
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> CivicResult<T> {
        tracing::debug!(path = ?path, "POST");
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &[&str]) -> CivicResult<T> {
        tracing::debug!(path = ?path, "POST");
        self.send(self.client.post(self.url(path))).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> CivicResult<T> {
        tracing::debug!(path = ?path, "PATCH");
        self.send(self.client.patch(self.url(path)).json(body)).await
    }

    async fn patch_empty<T: DeserializeOwned>(&self, path: &[&str]) -> CivicResult<T> {
        tracing::debug!(path = ?path, "PATCH");
        self.send(self.client.patch(self.url(path))).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &[&str]) -> CivicResult<T> {
        tracing::debug!(path = ?path, "DELETE");
        self.send(self.client.delete(self.url(path))).await
    }
}

#[async_trait]
impl IssueRepository for HttpRepository {
    async fn list_issues(&self) -> CivicResult<Vec<Issue>> {
        self.get(&["issues"]).await
    }

    async fn get_issue(&self, id: &str) -> CivicResult<Issue> {
        self.get(&["issues", id]).await
    }

    async fn create_issue(&self, draft: &IssueDraft) -> CivicResult<Issue> {
        self.post(&["issues"], draft).await
    }

    async fn assign_issue(&self, id: &str, staff_id: &str) -> CivicResult<()> {
        let _: IgnoredAny = self
            .patch(&["issues", id, "assign"], &json!({ "staffId": staff_id }))
            .await?;
        Ok(())
    }

    async fn reject_issue(&self, id: &str) -> CivicResult<()> {
        let _: IgnoredAny = self.patch_empty(&["issues", id, "reject"]).await?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: Status, comment: &str) -> CivicResult<StatusUpdate> {
        self.patch(
            &["issues", id, "status"],
            &StatusChange { status, comment },
        )
        .await
    }

    async fn upvote_issue(&self, id: &str) -> CivicResult<UpvoteReceipt> {
        self.patch_empty(&["issues", id, "upvote"]).await
    }
}

#[async_trait]
impl AccountRepository for HttpRepository {
    async fn login(&self, email: &str, password: &str) -> CivicResult<Session> {
        self.post(&["auth", "login"], &Credentials { email, password }).await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> CivicResult<User> {
        self.post(
            &["auth", "register"],
            &Registration {
                name,
                email,
                password,
            },
        )
        .await
    }

    async fn list_users(&self) -> CivicResult<Vec<User>> {
        self.get(&["users"]).await
    }

    async fn set_blocked(&self, user_id: &str, blocked: bool) -> CivicResult<User> {
        self.patch(&["users", user_id, "block"], &json!({ "blocked": blocked }))
            .await
    }

    async fn list_staff(&self) -> CivicResult<Vec<User>> {
        self.get(&["staff"]).await
    }

    async fn create_staff(&self, draft: &StaffDraft) -> CivicResult<User> {
        self.post(&["staff"], draft).await
    }

    async fn remove_staff(&self, staff_id: &str) -> CivicResult<()> {
        let _: IgnoredAny = self.delete(&["staff", staff_id]).await?;
        Ok(())
    }

    async fn subscribe(&self) -> CivicResult<User> {
        self.post_empty(&["payments", "subscribe"]).await
    }

    async fn boost_issue(&self, id: &str) -> CivicResult<Issue> {
        self.patch_empty(&["issues", id, "boost"]).await
    }

    async fn list_payments(&self) -> CivicResult<Vec<Payment>> {
        self.get(&["payments"]).await
    }
}
