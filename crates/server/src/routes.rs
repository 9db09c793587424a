//! API route definitions

use axum::{
    async_trait,
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use civic::domain::{Issue, IssueDraft, Payment, Role, Session, StaffDraft, Status, StatusUpdate, UpvoteReceipt, User};
use civic::errors::CivicError;
use civic::storage::InMemoryBackend;
use civic::validation;

/// Shared application state
pub type AppState = InMemoryBackend;

/// Create API routes
pub fn create_routes(backend: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/:id", get(get_issue))
        .route("/issues/:id/assign", patch(assign_issue))
        .route("/issues/:id/reject", patch(reject_issue))
        .route("/issues/:id/status", patch(update_status))
        .route("/issues/:id/upvote", patch(upvote_issue))
        .route("/issues/:id/boost", patch(boost_issue))
        .route("/users", get(list_users))
        .route("/users/:id/block", patch(set_blocked))
        .route("/staff", get(list_staff).post(create_staff))
        .route("/staff/:id", delete(remove_staff))
        .route("/payments", get(list_payments))
        .route("/payments/subscribe", post(subscribe))
        .with_state(backend)
}

// ============================================================================
// Errors and authentication
// ============================================================================

/// Error answered as `{"message": ...}` with the matching status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.to_string(),
        }
    }
}

impl From<CivicError> for ApiError {
    fn from(err: CivicError) -> Self {
        let status = match &err {
            CivicError::RemoteRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            CivicError::Validation(_) | CivicError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            CivicError::Forbidden(_) | CivicError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            CivicError::SelfUpvoteNotAllowed => StatusCode::BAD_REQUEST,
            CivicError::AlreadyUpvoted => StatusCode::CONFLICT,
            CivicError::NotAuthenticated | CivicError::SessionExpired => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, message = %self.message, "request failed");
        }
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// The account behind the request's bearer token
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, backend: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        Ok(CurrentUser(backend.authenticate(token)?))
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": text }))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "civic-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(State(backend): State<AppState>, Json(body): Json<LoginRequest>) -> ApiResult<Json<Session>> {
    Ok(Json(backend.login(&body.email, &body.password)?))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

async fn register(
    State(backend): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    validation::validate_credentials(&body.name, &body.email, &body.password)?;
    let user = backend.register_user(&body.name, &body.email, &body.password, Role::Citizen)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_issues(State(backend): State<AppState>) -> Json<Vec<Issue>> {
    Json(backend.list_issues())
}

async fn get_issue(State(backend): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Issue>> {
    Ok(Json(backend.get_issue(&id)?))
}

async fn create_issue(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<IssueDraft>,
) -> ApiResult<(StatusCode, Json<Issue>)> {
    let issue = backend.create_issue(&user, draft)?;
    Ok((StatusCode::CREATED, Json(issue)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    staff_id: String,
}

async fn assign_issue(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    backend.assign_issue(&user, &id, &body.staff_id)?;
    Ok(message("Issue assigned"))
}

async fn reject_issue(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    backend.reject_issue(&user, &id)?;
    Ok(message("Issue rejected"))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: Status,
    #[serde(default)]
    comment: String,
}

async fn update_status(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<StatusUpdate>> {
    Ok(Json(backend.update_status(&user, &id, body.status, &body.comment)?))
}

async fn upvote_issue(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UpvoteReceipt>> {
    Ok(Json(backend.upvote_issue(&user, &id)?))
}

async fn boost_issue(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Issue>> {
    Ok(Json(backend.boost_issue(&user, &id)?))
}

async fn list_users(State(backend): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(backend.list_users(&user)?))
}

#[derive(Debug, Deserialize)]
struct BlockRequest {
    blocked: bool,
}

async fn set_blocked(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<BlockRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(backend.set_blocked(&user, &id, body.blocked)?))
}

async fn list_staff(State(backend): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(backend.list_staff(&user)?))
}

async fn create_staff(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<StaffDraft>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let staff = backend.create_staff(&user, draft)?;
    Ok((StatusCode::CREATED, Json(staff)))
}

async fn remove_staff(
    State(backend): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    backend.remove_staff(&user, &id)?;
    Ok(message("Staff member removed"))
}

async fn subscribe(State(backend): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<User>> {
    Ok(Json(backend.subscribe(&user)?))
}

async fn list_payments(State(backend): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Vec<Payment>>> {
    Ok(Json(backend.list_payments(&user)?))
}
