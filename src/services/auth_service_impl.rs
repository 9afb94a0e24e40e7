//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::config::Config;
use crate::db::repositories::user::{
    generate_token, hash_password_blocking, normalize_email,
};
use crate::db::{NewUser, Store};
use crate::entities::users::{self, Role};
use crate::services::auth_service::{
    ApprovalOutcome, AuthError, AuthService, CreateUserRequest, CreatedUser, LoginAs, MeInfo,
    SessionIssued, SignupRequest, SignupStatus, UpdateUserRequest,
};
use crate::services::notify::Notifier;

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<Config>,
    notifier: Arc<dyn Notifier>,
}

/// Expiry used when no idle timeout is configured: effectively
/// non-expiring until logout.
fn far_future() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap()
}

/// Trim and collapse inner whitespace so "Acme  Corp " and "Acme Corp"
/// land on one canonical customer record.
fn canonicalize_customer_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Default logo location derived from the canonical customer name.
fn default_logo_url(customer_name: &str) -> String {
    let slug: String = customer_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    format!("/logos/{slug}.png")
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: Arc<Config>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            config,
            notifier,
        }
    }

    fn min_password_length(&self) -> usize {
        self.config.security.min_password_length
    }

    fn check_password_length(&self, password: &str) -> Result<(), AuthError> {
        if password.len() < self.min_password_length() {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length()
            )));
        }
        Ok(())
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        Ok(hash_password_blocking(password, Some(self.config.security.clone())).await?)
    }

    async fn create_extension_row(
        &self,
        user: &users::Model,
        customer_name: Option<&str>,
        phone: Option<String>,
        country: Option<String>,
        place: Option<String>,
    ) -> Result<(), AuthError> {
        match user.role {
            Role::Employee => {
                self.store
                    .user_repo()
                    .create_employee(user.id, &user.name, &user.email, phone, country, place)
                    .await?;
            }
            Role::Customer => {
                let canonical =
                    canonicalize_customer_name(customer_name.unwrap_or(user.name.as_str()));
                let logo = default_logo_url(&canonical);
                self.store
                    .user_repo()
                    .create_customer(
                        user.id,
                        &user.name,
                        &user.email,
                        &canonical,
                        Some(logo),
                        phone,
                        country,
                        place,
                    )
                    .await?;
            }
            Role::Admin => {}
        }
        Ok(())
    }

    async fn mint_reset_token(
        &self,
        user: users::Model,
    ) -> Result<(users::Model, String), AuthError> {
        let token = generate_token();
        let expires_at =
            Utc::now() + chrono::Duration::hours(self.config.security.reset_token_ttl_hours);
        let updated = self
            .store
            .user_repo()
            .set_reset_token(user, &token, expires_at)
            .await?;
        Ok((updated, token))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
        login_as: Option<LoginAs>,
    ) -> Result<SessionIssued, AuthError> {
        let email = normalize_email(email);

        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.disabled {
            return Err(AuthError::AccountDisabled);
        }

        if user.password_hash.is_none() {
            return Err(AuthError::PasswordNotSet);
        }

        let ok = self.store.user_repo().verify_password(&user, password).await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        match login_as {
            Some(LoginAs::Employee) => {
                if self.store.get_employee_for_user(user.id).await?.is_none() {
                    return Err(AuthError::RoleMismatch("Not an employee".to_string()));
                }
            }
            Some(LoginAs::Customer) => {
                if self.store.get_customer_for_user(user.id).await?.is_none() {
                    return Err(AuthError::RoleMismatch("Not a customer".to_string()));
                }
            }
            Some(LoginAs::Admin) => {
                if user.role != Role::Admin {
                    return Err(AuthError::RoleMismatch("Admin access required".to_string()));
                }
            }
            None => {}
        }

        // One live session per user: the new login evicts every prior one.
        self.store.delete_sessions_for_user(user.id).await?;

        let token = generate_token();
        let expires_at = self
            .config
            .idle_timeout()
            .map_or_else(far_future, |idle| Utc::now() + idle);

        self.store.insert_session(user.id, &token, expires_at).await?;

        Ok(SessionIssued {
            user_id: user.id,
            email: user.email,
            role: user.role,
            token,
            expires_at,
        })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete_session(token).await?;
        Ok(())
    }

    async fn current_user(&self, user_id: i32) -> Result<MeInfo, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        let customer = self.store.get_customer_for_user(user.id).await?;

        Ok(MeInfo {
            id: user.id,
            email: user.email,
            role: user.role,
            disabled: user.disabled,
            name: user.name,
            signup_type: user.signup_type,
            customer_name: customer.as_ref().map(|c| c.customer_name.clone()),
            logo_url: customer.and_then(|c| c.logo_url),
        })
    }

    async fn signup(&self, request: SignupRequest) -> Result<users::Model, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }

        let role = match request.signup_type.as_str() {
            "employee" => Role::Employee,
            "customer" => Role::Customer,
            other => {
                return Err(AuthError::Validation(format!(
                    "Unknown signup type: {other}"
                )));
            }
        };

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let user = self
            .store
            .insert_user(NewUser {
                email,
                name: request.name,
                role,
                password_hash: None,
                approved: false,
                must_set_password: true,
                signup_type: Some(request.signup_type),
            })
            .await?;

        self.create_extension_row(
            &user,
            request.customer_name.as_deref(),
            request.phone,
            request.country,
            request.place,
        )
        .await?;

        Ok(user)
    }

    async fn signup_status(&self, email: &str) -> Result<SignupStatus, AuthError> {
        let email = normalize_email(email);

        let Some(user) = self.store.get_user_by_email(&email).await? else {
            return Ok(SignupStatus::NotFound);
        };

        if user.declined {
            return Ok(SignupStatus::Declined);
        }
        if !user.approved {
            return Ok(SignupStatus::Pending);
        }
        Ok(SignupStatus::Approved {
            must_set_password: user.must_set_password,
        })
    }

    async fn list_pending(&self) -> Result<Vec<users::Model>, AuthError> {
        Ok(self.store.list_pending_signups().await?)
    }

    async fn approve_signup(&self, id: i32) -> Result<ApprovalOutcome, AuthError> {
        let user = self
            .store
            .get_user_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.declined {
            return Err(AuthError::AlreadyDeclined);
        }
        if user.approved {
            return Err(AuthError::AlreadyApproved);
        }

        let token = generate_token();
        let expires_at =
            Utc::now() + chrono::Duration::hours(self.config.security.reset_token_ttl_hours);

        let updated = self
            .store
            .user_repo()
            .mark_approved(user, &token, expires_at)
            .await?;

        // Dispatch is best-effort; a failed send must not undo the approval.
        let sent = self
            .notifier
            .send_reset_token(&updated.email, &token)
            .await;

        Ok(ApprovalOutcome {
            id: updated.id,
            email: updated.email,
            reset_token: token,
            sent,
        })
    }

    async fn decline_signup(&self, id: i32) -> Result<users::Model, AuthError> {
        let user = self
            .store
            .get_user_by_id(id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.approved {
            return Err(AuthError::AlreadyApproved);
        }
        if user.declined {
            return Err(AuthError::AlreadyDeclined);
        }

        Ok(self.store.user_repo().mark_declined(user).await?)
    }

    async fn set_password(&self, token: &str, password: &str) -> Result<users::Model, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let user = self
            .store
            .user_repo()
            .get_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let expired = user
            .reset_token_expires_at
            .is_none_or(|at| at < Utc::now());
        if expired {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        if user.declined {
            return Err(AuthError::Declined);
        }
        if !user.approved {
            return Err(AuthError::NotApproved);
        }

        self.check_password_length(password)?;

        let hash = self.hash(password).await?;
        Ok(self.store.user_repo().set_password_hash(user, hash).await?)
    }

    async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);

        let user = self
            .store
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.declined {
            return Err(AuthError::Declined);
        }
        if !user.approved {
            return Err(AuthError::NotApproved);
        }

        let ok = self
            .store
            .user_repo()
            .verify_password(&user, old_password)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        self.check_password_length(new_password)?;

        let hash = self.hash(new_password).await?;
        self.store.user_repo().set_password_hash(user, hash).await?;
        Ok(())
    }

    async fn register_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<users::Model, AuthError> {
        if self.store.find_any_admin().await?.is_some() {
            return Err(AuthError::AdminExists);
        }

        self.check_password_length(password)?;

        let email = normalize_email(email);
        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let hash = self.hash(password).await?;

        Ok(self
            .store
            .insert_user(NewUser {
                email,
                name: name.to_string(),
                role: Role::Admin,
                password_hash: Some(hash),
                approved: true,
                must_set_password: false,
                signup_type: None,
            })
            .await?)
    }

    async fn create_user(&self, request: CreateUserRequest) -> Result<CreatedUser, AuthError> {
        let email = normalize_email(&request.email);
        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }

        if self.store.get_user_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let user = self
            .store
            .insert_user(NewUser {
                email,
                name: request.name,
                role: request.role,
                password_hash: None,
                approved: true,
                must_set_password: true,
                signup_type: None,
            })
            .await?;

        self.create_extension_row(
            &user,
            request.customer_name.as_deref(),
            request.phone,
            request.country,
            request.place,
        )
        .await?;

        let (user, token) = self.mint_reset_token(user).await?;
        let sent = self.notifier.send_reset_token(&user.email, &token).await;

        Ok(CreatedUser {
            user,
            reset_token: token,
            sent,
        })
    }

    async fn list_users(&self) -> Result<Vec<users::Model>, AuthError> {
        Ok(self.store.list_users().await?)
    }

    async fn update_user(
        &self,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<users::Model, AuthError> {
        self.store
            .update_user_profile(id, request.name, request.role, request.disabled)
            .await?
            .ok_or(AuthError::NotFound)
    }

    async fn seed_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<users::Model, AuthError> {
        let email = normalize_email(email);

        if let Some(existing) = self.store.get_user_by_email(&email).await? {
            if existing.role == Role::Admin {
                return Ok(existing);
            }
            return Ok(self.store.user_repo().promote_to_admin(existing).await?);
        }

        self.check_password_length(password)?;
        let hash = self.hash(password).await?;

        Ok(self
            .store
            .insert_user(NewUser {
                email,
                name: name.to_string(),
                role: Role::Admin,
                password_hash: Some(hash),
                approved: true,
                must_set_password: false,
                signup_type: None,
            })
            .await?)
    }
}
