use sea_orm::entity::prelude::*;

/// One row per live session. The auth service enforces at most one row per
/// user: login deletes all prior rows before inserting.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Opaque 64-char hex token carried by the `sid` cookie.
    #[sea_orm(unique)]
    pub token: String,

    pub user_id: i32,

    /// Pinned to 9999-12-31T23:59:59Z when no idle timeout is configured.
    pub expires_at: DateTimeUtc,

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
