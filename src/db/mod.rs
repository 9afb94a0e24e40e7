use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::users::Role;
use crate::entities::{audit_logs, customers, employees, infra_tasks, sessions, tasks, users};

pub mod migrator;
pub mod repositories;

pub use repositories::audit::AuditEntry;
pub use repositories::infra_task::InfraTaskDraft;
pub use repositories::task::TaskDraft;
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn task_repo(&self) -> repositories::task::TaskRepository {
        repositories::task::TaskRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn infra_task_repo(&self) -> repositories::infra_task::InfraTaskRepository {
        repositories::infra_task::InfraTaskRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn find_any_admin(&self) -> Result<Option<users::Model>> {
        self.user_repo().find_any_admin().await
    }

    pub async fn insert_user(&self, data: NewUser) -> Result<users::Model> {
        self.user_repo().insert(data).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_all().await
    }

    pub async fn list_pending_signups(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_pending().await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        name: Option<String>,
        role: Option<Role>,
        disabled: Option<bool>,
    ) -> Result<Option<users::Model>> {
        self.user_repo().update_profile(id, name, role, disabled).await
    }

    pub async fn get_employee_for_user(&self, user_id: i32) -> Result<Option<employees::Model>> {
        self.user_repo().get_employee_for_user(user_id).await
    }

    pub async fn get_customer_for_user(&self, user_id: i32) -> Result<Option<customers::Model>> {
        self.user_repo().get_customer_for_user(user_id).await
    }

    // ========== Sessions ==========

    pub async fn delete_sessions_for_user(&self, user_id: i32) -> Result<u64> {
        self.session_repo().delete_for_user(user_id).await
    }

    pub async fn insert_session(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<sessions::Model> {
        self.session_repo().insert(user_id, token, expires_at).await
    }

    pub async fn get_session_with_user(
        &self,
        token: &str,
    ) -> Result<Option<(sessions::Model, users::Model)>> {
        self.session_repo().get_with_user(token).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<u64> {
        self.session_repo().delete_by_token(token).await
    }

    pub async fn extend_session(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.session_repo().update_expiry(token, expires_at).await
    }

    // ========== Tasks ==========

    pub async fn list_tasks(&self) -> Result<Vec<tasks::Model>> {
        self.task_repo().list_all().await
    }

    pub async fn insert_task(&self, draft: TaskDraft) -> Result<tasks::Model> {
        self.task_repo().insert(draft).await
    }

    pub async fn update_task(&self, id: i32, draft: TaskDraft) -> Result<Option<tasks::Model>> {
        self.task_repo().update(id, draft).await
    }

    pub async fn delete_task(&self, id: i32) -> Result<bool> {
        self.task_repo().delete(id).await
    }

    pub async fn replace_tasks(&self, drafts: Vec<TaskDraft>) -> Result<(u64, u64)> {
        self.task_repo().replace_all(drafts).await
    }

    // ========== Infra tasks ==========

    pub async fn list_infra_tasks(&self) -> Result<Vec<infra_tasks::Model>> {
        self.infra_task_repo().list_all().await
    }

    pub async fn insert_infra_task(&self, draft: InfraTaskDraft) -> Result<infra_tasks::Model> {
        self.infra_task_repo().insert(draft).await
    }

    pub async fn update_infra_task(
        &self,
        id: i32,
        draft: InfraTaskDraft,
    ) -> Result<Option<infra_tasks::Model>> {
        self.infra_task_repo().update(id, draft).await
    }

    // ========== Audit ==========

    pub async fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        self.audit_repo().append(entry).await
    }

    pub async fn list_audit(
        &self,
        limit: u64,
    ) -> Result<Vec<(audit_logs::Model, Option<users::Model>)>> {
        self.audit_repo().list_recent(limit).await
    }
}
