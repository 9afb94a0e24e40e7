use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User role. Employee/Customer carry a 1:1 extension row; Admin does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "admin")]
    Admin,

    #[sea_orm(string_value = "employee")]
    Employee,

    #[sea_orm(string_value = "customer")]
    Customer,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored normalized: trimmed + lowercased. Uniqueness is therefore
    /// case-insensitive.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id hash. None until the user sets a password via reset token.
    pub password_hash: Option<String>,

    pub name: String,

    pub role: Role,

    pub disabled: bool,

    pub approved: bool,

    pub declined: bool,

    pub must_set_password: bool,

    /// "employee" or "customer" as chosen at self-signup.
    pub signup_type: Option<String>,

    /// Single-use password-set token minted at approval.
    pub reset_token: Option<String>,

    pub reset_token_expires_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,

    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::employees::Entity")]
    Employee,

    #[sea_orm(has_one = "super::customers::Entity")]
    Customer,

    #[sea_orm(has_many = "super::sessions::Entity")]
    Sessions,
}

impl Related<super::employees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::customers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
