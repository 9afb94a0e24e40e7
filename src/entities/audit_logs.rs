use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Append-only trail of administrative actions. Never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// None for system/public actions.
    pub user_id: Option<i32>,

    pub action: String,

    pub entity: String,

    pub entity_id: Option<i32>,

    /// Free-form JSON payload.
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,

    pub ip: Option<String>,

    pub user_agent: Option<String>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
