use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entities::tasks::{self, TaskStatus};

/// A fully normalized task row ready for insertion. Produced by the Excel
/// ingestion pipeline and by the manual add-row endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub workstream: String,
    pub deliverable: String,
    pub status: TaskStatus,
    pub duration: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub progress: i32,
    pub phase: String,
    pub milestone: String,
    pub owner: String,
}

/// Span of the task in whole days, rounded up. A task ending before it
/// starts clamps to zero rather than going negative.
#[must_use]
pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i32 {
    let millis = end.signed_duration_since(start).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis as u64).div_ceil(86_400_000) as i32
}

fn draft_to_active(draft: TaskDraft, now: DateTime<Utc>) -> tasks::ActiveModel {
    tasks::ActiveModel {
        workstream: Set(draft.workstream),
        deliverable: Set(draft.deliverable),
        status: Set(draft.status),
        duration: Set(draft.duration),
        start_date: Set(draft.start_date),
        end_date: Set(draft.end_date),
        progress: Set(draft.progress),
        phase: Set(draft.phase),
        milestone: Set(draft.milestone),
        owner: Set(draft.owner),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

pub struct TaskRepository {
    conn: DatabaseConnection,
}

impl TaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<tasks::Model>> {
        tasks::Entity::find()
            .order_by_desc(tasks::Column::CreatedAt)
            .order_by_desc(tasks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tasks")
    }

    pub async fn insert(&self, draft: TaskDraft) -> Result<tasks::Model> {
        draft_to_active(draft, Utc::now())
            .insert(&self.conn)
            .await
            .context("Failed to insert task")
    }

    pub async fn get(&self, id: i32) -> Result<Option<tasks::Model>> {
        tasks::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query task")
    }

    pub async fn update(&self, id: i32, draft: TaskDraft) -> Result<Option<tasks::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: tasks::ActiveModel = existing.into();
        active.workstream = Set(draft.workstream);
        active.deliverable = Set(draft.deliverable);
        active.status = Set(draft.status);
        active.duration = Set(draft.duration);
        active.start_date = Set(draft.start_date);
        active.end_date = Set(draft.end_date);
        active.progress = Set(draft.progress);
        active.phase = Set(draft.phase);
        active.milestone = Set(draft.milestone);
        active.owner = Set(draft.owner);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = tasks::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete task")?;

        Ok(res.rows_affected > 0)
    }

    /// Delete every existing row and bulk-insert the replacement set in one
    /// transaction. A mid-flight failure rolls back, leaving the prior rows
    /// intact rather than a half-emptied table.
    pub async fn replace_all(&self, drafts: Vec<TaskDraft>) -> Result<(u64, u64)> {
        let now = Utc::now();
        let inserted = drafts.len() as u64;

        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let deleted = tasks::Entity::delete_many()
            .exec(&txn)
            .await
            .context("Failed to clear tasks")?
            .rows_affected;

        if !drafts.is_empty() {
            let models = drafts.into_iter().map(|d| draft_to_active(d, now));
            tasks::Entity::insert_many(models)
                .exec(&txn)
                .await
                .context("Failed to bulk-insert tasks")?;
        }

        txn.commit().await.context("Failed to commit replace")?;

        Ok((deleted, inserted))
    }

    /// Insert unless a row with the same descriptive fields already exists.
    /// Used by the strict append ingestion mode.
    pub async fn insert_unless_duplicate(&self, draft: TaskDraft) -> Result<bool> {
        let existing = tasks::Entity::find()
            .filter(tasks::Column::Workstream.eq(draft.workstream.clone()))
            .filter(tasks::Column::Deliverable.eq(draft.deliverable.clone()))
            .filter(tasks::Column::Milestone.eq(draft.milestone.clone()))
            .filter(tasks::Column::StartDate.eq(draft.start_date))
            .filter(tasks::Column::EndDate.eq(draft.end_date))
            .filter(tasks::Column::Owner.eq(draft.owner.clone()))
            .count(&self.conn)
            .await
            .context("Failed to check for duplicate task")?;

        if existing > 0 {
            return Ok(false);
        }

        self.insert(draft).await?;
        Ok(true)
    }
}
