use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TaskStatus {
    #[sea_orm(string_value = "WIP")]
    #[serde(rename = "WIP")]
    Wip,

    #[sea_orm(string_value = "Delayed")]
    Delayed,

    #[sea_orm(string_value = "Blocked")]
    Blocked,

    #[sea_orm(string_value = "Closed")]
    Closed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Wip
    }
}

/// Program-tracker row. Rows are created by Excel ingestion or manual
/// add-row and edited inline; the Excel "replace" operation swaps the whole
/// table in one transaction.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "tasks")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub workstream: String,

    pub deliverable: String,

    pub status: TaskStatus,

    /// Whole days, derived from the date span on create.
    pub duration: i32,

    pub start_date: DateTimeUtc,

    pub end_date: DateTimeUtc,

    /// 0-100.
    pub progress: i32,

    pub phase: String,

    pub milestone: String,

    pub owner: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
