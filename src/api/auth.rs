use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::session::{
    AuthSession, ClientMeta, build_session_cookie, clear_session_cookie, request_is_https,
    token_from_headers,
};
use super::{ApiError, AppState};
use crate::db::AuditEntry;
use crate::entities::users::{self, Role};
use crate::services::{
    CreateUserRequest, LoginAs, SignupRequest, UpdateUserRequest,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterAdminRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub login_as: Option<LoginAs>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct SignupStatusQuery {
    pub email: String,
}

#[derive(Deserialize)]
pub struct SetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub email: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct AdminKeyQuery {
    pub key: Option<String>,
}

/// User as exposed to admins. Never carries the password hash.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub disabled: bool,
    pub approved: bool,
    pub declined: bool,
    pub must_set_password: bool,
    pub signup_type: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<users::Model> for UserDto {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            disabled: user.disabled,
            approved: user.approved,
            declined: user.declined,
            must_set_password: user.must_set_password,
            signup_type: user.signup_type,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Public handlers
// ============================================================================

/// POST /auth/register-admin
/// One-shot bootstrap; refused once any admin exists.
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth()
        .register_admin(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok(Json(serde_json::json!({ "id": user.id, "email": user.email })))
}

/// POST /auth/login
/// Issues the `sid` session cookie on success.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let issued = state
        .auth()
        .login(&payload.email, &payload.password, payload.login_as)
        .await?;

    let cookie = build_session_cookie(state.config(), &issued.token, request_is_https(&headers));

    let body = Json(LoginResponse {
        id: issued.user_id,
        email: issued.email,
        role: issued.role,
    });

    Ok(([(header::SET_COOKIE, cookie.to_string())], body))
}

/// POST /auth/logout
/// Revokes whatever token the cookie carries; always succeeds.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = token_from_headers(&headers) {
        state.auth().logout(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie().to_string())],
        Json(serde_json::json!({ "ok": true })),
    ))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
) -> Result<impl IntoResponse, ApiError> {
    let info = state.auth().current_user(auth.user.id).await?;
    Ok(Json(info))
}

/// POST /auth/signup
/// Self-registration; the account waits for admin approval.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth().signup(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "id": user.id,
            "status": "pending",
        })),
    ))
}

/// GET /auth/signup-status?email=
pub async fn signup_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignupStatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.auth().signup_status(&query.email).await?;
    Ok(Json(status))
}

/// POST /auth/set-password
/// First-time password set via the reset token minted at approval.
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth()
        .set_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth()
        .change_password(&payload.email, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

// ============================================================================
// Admin handlers (session-gated by require_admin)
// ============================================================================

/// GET /auth/pending
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let pending = state.auth().list_pending().await?;
    let dtos: Vec<UserDto> = pending.into_iter().map(UserDto::from).collect();
    Ok(Json(dtos))
}

/// POST /auth/approve/:id
pub async fn approve_signup(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    meta: ClientMeta,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.auth().approve_signup(id).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: Some(auth.user.id),
            action: "approve".to_string(),
            entity: "User".to_string(),
            entity_id: Some(id),
            details: Some(serde_json::json!({ "email": outcome.email }).to_string()),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(outcome))
}

/// POST /auth/decline/:id
pub async fn decline_signup(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    meta: ClientMeta,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let declined = state.auth().decline_signup(id).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: Some(auth.user.id),
            action: "decline".to_string(),
            entity: "User".to_string(),
            entity_id: Some(id),
            details: Some(serde_json::json!({ "email": declined.email }).to_string()),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// POST /auth/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    meta: ClientMeta,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.auth().create_user(payload).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: Some(auth.user.id),
            action: "create".to_string(),
            entity: "User".to_string(),
            entity_id: Some(created.user.id),
            details: Some(serde_json::json!({ "email": created.user.email }).to_string()),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": UserDto::from(created.user),
            "resetToken": created.reset_token,
            "sent": created.sent,
        })),
    ))
}

/// GET /auth/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let all = state.auth().list_users().await?;
    let dtos: Vec<UserDto> = all.into_iter().map(UserDto::from).collect();
    Ok(Json(dtos))
}

/// PATCH /auth/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    meta: ClientMeta,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.auth().update_user(id, payload).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: Some(auth.user.id),
            action: "update".to_string(),
            entity: "User".to_string(),
            entity_id: Some(id),
            details: Some(
                serde_json::json!({
                    "email": updated.email,
                    "disabled": updated.disabled,
                    "role": updated.role,
                })
                .to_string(),
            ),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(UserDto::from(updated)))
}

// ============================================================================
// Admin-key side channel (no session; shared secret instead)
// ============================================================================

fn check_admin_key(
    state: &AppState,
    headers: &HeaderMap,
    query_key: Option<&str>,
) -> Result<(), ApiError> {
    let Some(expected) = state.config().admin.ui_key.as_deref() else {
        return Err(ApiError::Forbidden(
            "Admin key access is not enabled".to_string(),
        ));
    };

    let header_key = headers.get("x-admin-key").and_then(|v| v.to_str().ok());

    if query_key == Some(expected) || header_key == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Invalid admin key".to_string()))
    }
}

/// GET /auth/pending-public?key=
pub async fn list_pending_public(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminKeyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_admin_key(&state, &headers, query.key.as_deref())?;

    let pending = state.auth().list_pending().await?;
    let dtos: Vec<UserDto> = pending.into_iter().map(UserDto::from).collect();
    Ok(Json(dtos))
}

/// POST /auth/approve-public/:id?key=
pub async fn approve_signup_public(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    meta: ClientMeta,
    Path(id): Path<i32>,
    Query(query): Query<AdminKeyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_admin_key(&state, &headers, query.key.as_deref())?;

    let outcome = state.auth().approve_signup(id).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: None,
            action: "approve".to_string(),
            entity: "User".to_string(),
            entity_id: Some(id),
            details: Some(serde_json::json!({ "email": outcome.email }).to_string()),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(outcome))
}

/// POST /auth/decline-public/:id?key=
pub async fn decline_signup_public(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    meta: ClientMeta,
    Path(id): Path<i32>,
    Query(query): Query<AdminKeyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    check_admin_key(&state, &headers, query.key.as_deref())?;

    state.auth().decline_signup(id).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: None,
            action: "decline".to_string(),
            entity: "User".to_string(),
            entity_id: Some(id),
            details: None,
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(serde_json::json!({ "ok": true })))
}
