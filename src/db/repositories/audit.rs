use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set,
};

use crate::entities::{audit_logs, users};

/// One append-only audit entry.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i32>,
    pub details: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AuditRepository {
    conn: DatabaseConnection,
}

impl AuditRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn append(&self, entry: AuditEntry) -> Result<()> {
        let active = audit_logs::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            entity: Set(entry.entity),
            entity_id: Set(entry.entity_id),
            details: Set(entry.details),
            ip: Set(entry.ip),
            user_agent: Set(entry.user_agent),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to append audit entry")?;

        Ok(())
    }

    /// Most recent entries first, with the acting user joined in when one
    /// was attached.
    pub async fn list_recent(
        &self,
        limit: u64,
    ) -> Result<Vec<(audit_logs::Model, Option<users::Model>)>> {
        audit_logs::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list audit entries")
    }
}
