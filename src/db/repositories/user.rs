use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::users::Role;
use crate::entities::{customers, employees, prelude::*, users};

/// Input for creating a user row. Extension rows are created separately.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: Option<String>,
    pub approved: bool,
    pub must_set_password: bool,
    pub signup_type: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Lookup by normalized email. Callers must normalize first; the column
    /// stores the normalized form, which is what makes uniqueness
    /// case-insensitive.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by id")
    }

    pub async fn find_any_admin(&self) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Role.eq(Role::Admin))
            .one(&self.conn)
            .await
            .context("Failed to query for admin user")
    }

    pub async fn get_by_reset_token(&self, token: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::ResetToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by reset token")
    }

    pub async fn insert(&self, data: NewUser) -> Result<users::Model> {
        let now = Utc::now();
        let active = users::ActiveModel {
            email: Set(data.email),
            password_hash: Set(data.password_hash),
            name: Set(data.name),
            role: Set(data.role),
            disabled: Set(false),
            approved: Set(data.approved),
            declined: Set(false),
            must_set_password: Set(data.must_set_password),
            signup_type: Set(data.signup_type),
            reset_token: Set(None),
            reset_token_expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active.insert(&self.conn).await.context("Failed to insert user")
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    /// Signups still awaiting an admin decision.
    pub async fn list_pending(&self) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Approved.eq(false))
            .filter(users::Column::Declined.eq(false))
            .order_by_asc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list pending signups")
    }

    pub async fn update_profile(
        &self,
        id: i32,
        name: Option<String>,
        role: Option<Role>,
        disabled: Option<bool>,
    ) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = name {
            active.name = Set(name);
        }
        if let Some(role) = role {
            active.role = Set(role);
        }
        if let Some(disabled) = disabled {
            active.disabled = Set(disabled);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    /// Flip a pending signup to approved and stash the minted reset token.
    pub async fn mark_approved(
        &self,
        user: users::Model,
        reset_token: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.approved = Set(true);
        active.reset_token = Set(Some(reset_token.to_string()));
        active.reset_token_expires_at = Set(Some(expires_at));
        active.must_set_password = Set(true);
        active.updated_at = Set(Utc::now());

        active.update(&self.conn).await.context("Failed to approve user")
    }

    pub async fn mark_declined(&self, user: users::Model) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.declined = Set(true);
        active.updated_at = Set(Utc::now());

        active.update(&self.conn).await.context("Failed to decline user")
    }

    pub async fn promote_to_admin(&self, user: users::Model) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.role = Set(Role::Admin);
        active.approved = Set(true);
        active.disabled = Set(false);
        active.updated_at = Set(Utc::now());

        active.update(&self.conn).await.context("Failed to promote user")
    }

    /// Store a freshly minted reset token without touching approval state.
    pub async fn set_reset_token(
        &self,
        user: users::Model,
        reset_token: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.reset_token = Set(Some(reset_token.to_string()));
        active.reset_token_expires_at = Set(Some(expires_at));
        active.updated_at = Set(Utc::now());

        active.update(&self.conn).await.context("Failed to set reset token")
    }

    /// Store a new password hash, consuming any outstanding reset token.
    pub async fn set_password_hash(&self, user: users::Model, hash: String) -> Result<users::Model> {
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(hash));
        active.reset_token = Set(None);
        active.reset_token_expires_at = Set(None);
        active.must_set_password = Set(false);
        active.updated_at = Set(Utc::now());

        active.update(&self.conn).await.context("Failed to update password")
    }

    /// Verify a candidate password against the user's stored hash.
    /// Runs on `spawn_blocking` because Argon2 is CPU-intensive and would
    /// stall the async runtime if run inline.
    pub async fn verify_password(&self, user: &users::Model, password: &str) -> Result<bool> {
        let Some(hash) = user.password_hash.clone() else {
            return Ok(false);
        };
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    // ========================================================================
    // Extension rows
    // ========================================================================

    pub async fn create_employee(
        &self,
        user_id: i32,
        name: &str,
        email: &str,
        phone: Option<String>,
        country: Option<String>,
        place: Option<String>,
    ) -> Result<employees::Model> {
        let active = employees::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(phone),
            country: Set(country),
            place: Set(place),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert employee row")
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_customer(
        &self,
        user_id: i32,
        name: &str,
        email: &str,
        customer_name: &str,
        logo_url: Option<String>,
        phone: Option<String>,
        country: Option<String>,
        place: Option<String>,
    ) -> Result<customers::Model> {
        let active = customers::ActiveModel {
            user_id: Set(user_id),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            customer_name: Set(customer_name.to_string()),
            logo_url: Set(logo_url),
            phone: Set(phone),
            country: Set(country),
            place: Set(place),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert customer row")
    }

    pub async fn get_employee_for_user(&self, user_id: i32) -> Result<Option<employees::Model>> {
        Employees::find()
            .filter(employees::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query employee row")
    }

    pub async fn get_customer_for_user(&self, user_id: i32) -> Result<Option<customers::Model>> {
        Customers::find()
            .filter(customers::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query customer row")
    }
}

/// Trim and lowercase, making every email comparison case- and
/// whitespace-insensitive.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Hash on a blocking task; the request path must not stall the runtime.
pub async fn hash_password_blocking(
    password: &str,
    config: Option<SecurityConfig>,
) -> Result<String> {
    let password = password.to_string();
    task::spawn_blocking(move || hash_password(&password, config.as_ref()))
        .await
        .context("Password hashing task panicked")?
}

/// Generate an unguessable token (64 character hex string). Used for both
/// session tokens and password reset tokens.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
