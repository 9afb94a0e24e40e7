use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

use crate::entities::infra_tasks::{self, InfraStatus};

/// Input for creating or updating an infra task. `start_date` is optional
/// here; the repository guarantees it never persists as null.
#[derive(Debug, Clone)]
pub struct InfraTaskDraft {
    pub infra_phase: String,
    pub task_name: String,
    pub status: InfraStatus,
    pub percent_complete: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub owner: String,
}

/// The schema requires a start date. Fall back to the end date, then "now".
#[must_use]
pub fn effective_start_date(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    start.or(end).unwrap_or(now)
}

pub struct InfraTaskRepository {
    conn: DatabaseConnection,
}

impl InfraTaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<infra_tasks::Model>> {
        infra_tasks::Entity::find()
            .order_by_asc(infra_tasks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list infra tasks")
    }

    pub async fn get(&self, id: i32) -> Result<Option<infra_tasks::Model>> {
        infra_tasks::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query infra task")
    }

    pub async fn insert(&self, draft: InfraTaskDraft) -> Result<infra_tasks::Model> {
        let now = Utc::now();
        let active = infra_tasks::ActiveModel {
            infra_phase: Set(draft.infra_phase),
            task_name: Set(draft.task_name),
            status: Set(draft.status),
            percent_complete: Set(draft.percent_complete),
            start_date: Set(effective_start_date(draft.start_date, draft.end_date, now)),
            end_date: Set(draft.end_date),
            owner: Set(draft.owner),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert infra task")
    }

    pub async fn update(
        &self,
        id: i32,
        draft: InfraTaskDraft,
    ) -> Result<Option<infra_tasks::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let mut active: infra_tasks::ActiveModel = existing.into();
        active.infra_phase = Set(draft.infra_phase);
        active.task_name = Set(draft.task_name);
        active.status = Set(draft.status);
        active.percent_complete = Set(draft.percent_complete);
        active.start_date = Set(effective_start_date(draft.start_date, draft.end_date, now));
        active.end_date = Set(draft.end_date);
        active.owner = Set(draft.owner);
        active.updated_at = Set(now);

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_date_falls_back_to_end_then_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        assert_eq!(effective_start_date(Some(start), Some(end), now), start);
        assert_eq!(effective_start_date(None, Some(end), now), end);
        assert_eq!(effective_start_date(None, None, now), now);
    }
}
