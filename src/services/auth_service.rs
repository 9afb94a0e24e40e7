//! Domain service for accounts, sessions and the signup approval workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::users::{self, Role};

/// Errors specific to authentication operations. The API layer maps each
/// variant to a status code.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Password not set")]
    PasswordNotSet,

    #[error("{0}")]
    RoleMismatch(String),

    #[error("User already exists")]
    UserExists,

    #[error("Admin already exists")]
    AdminExists,

    #[error("User not found")]
    NotFound,

    #[error("Already approved")]
    AlreadyApproved,

    #[error("Already declined")]
    AlreadyDeclined,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Signup not approved yet")]
    NotApproved,

    #[error("Signup was declined")]
    Declined,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Role the client claims to be logging in as. Checked against the
/// Employee/Customer extension rows (or the admin role) before a session
/// is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginAs {
    Employee,
    Customer,
    Admin,
}

/// Outcome of a successful login: identity plus the freshly minted session
/// token for the cookie.
#[derive(Debug, Clone)]
pub struct SessionIssued {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Current-user payload including customer branding fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeInfo {
    pub id: i32,
    pub email: String,
    pub role: Role,
    pub disabled: bool,
    pub name: String,
    pub signup_type: Option<String>,
    pub customer_name: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub signup_type: String,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub place: Option<String>,
}

/// Public signup-status probe result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignupStatus {
    NotFound,
    Declined,
    Pending,
    #[serde(rename_all = "camelCase")]
    Approved {
        must_set_password: bool,
    },
}

/// Outcome of approving a signup. The reset token is surfaced so an admin
/// can hand it over manually when the notifier only logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub id: i32,
    pub email: String,
    pub reset_token: String,
    pub sent: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub user: users::Model,
    pub reset_token: String,
    pub sent: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub disabled: Option<bool>,
}

/// Domain service trait for authentication and account management.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials, enforces the single-session-per-user
    /// invariant, and issues a fresh session token.
    async fn login(
        &self,
        email: &str,
        password: &str,
        login_as: Option<LoginAs>,
    ) -> Result<SessionIssued, AuthError>;

    /// Revokes the session behind the given token. Unknown tokens are a
    /// no-op.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Identity plus branding for the authenticated user.
    async fn current_user(&self, user_id: i32) -> Result<MeInfo, AuthError>;

    /// Self-registration; the account stays unusable until approved.
    async fn signup(&self, request: SignupRequest) -> Result<users::Model, AuthError>;

    /// Case-insensitive status probe by email.
    async fn signup_status(&self, email: &str) -> Result<SignupStatus, AuthError>;

    async fn list_pending(&self) -> Result<Vec<users::Model>, AuthError>;

    /// Approves a pending signup and mints a time-boxed reset token,
    /// dispatched via the notifier (non-fatal on failure).
    async fn approve_signup(&self, id: i32) -> Result<ApprovalOutcome, AuthError>;

    /// Declines a pending signup. Terminal; there is no un-decline.
    async fn decline_signup(&self, id: i32) -> Result<users::Model, AuthError>;

    /// First-time password set via reset token.
    async fn set_password(&self, token: &str, password: &str) -> Result<users::Model, AuthError>;

    /// Password rotation gated on the old password.
    async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// One-shot bootstrap; fails once any admin exists.
    async fn register_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<users::Model, AuthError>;

    /// Admin-created account: approved immediately, password set via the
    /// minted reset token.
    async fn create_user(&self, request: CreateUserRequest) -> Result<CreatedUser, AuthError>;

    async fn list_users(&self) -> Result<Vec<users::Model>, AuthError>;

    async fn update_user(
        &self,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<users::Model, AuthError>;

    /// Create-or-promote an admin account. Idempotent; used by the
    /// `seed-admin` CLI command.
    async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<users::Model, AuthError>;
}
