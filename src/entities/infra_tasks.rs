use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum InfraStatus {
    #[sea_orm(string_value = "Planned")]
    Planned,

    #[sea_orm(string_value = "WIP")]
    #[serde(rename = "WIP")]
    Wip,

    #[sea_orm(string_value = "Blocked")]
    Blocked,

    #[sea_orm(string_value = "Completed")]
    Completed,
}

impl Default for InfraStatus {
    fn default() -> Self {
        Self::Planned
    }
}

/// Infrastructure-setup tracker row. `start_date` must never persist as
/// null; the repository falls back to `end_date`, then "now".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "infra_tasks")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub infra_phase: String,

    pub task_name: String,

    pub status: InfraStatus,

    /// 0-100.
    pub percent_complete: i32,

    pub start_date: DateTimeUtc,

    pub end_date: Option<DateTimeUtc>,

    pub owner: String,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
