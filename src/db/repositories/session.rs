use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{sessions, users};

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Remove every session row for a user. Called at login to enforce the
    /// single-session-per-user invariant.
    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let res = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete sessions for user")?;

        Ok(res.rows_affected)
    }

    pub async fn insert(
        &self,
        user_id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<sessions::Model> {
        let active = sessions::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")
    }

    /// Session plus its user, resolved in one joined query.
    pub async fn get_with_user(
        &self,
        token: &str,
    ) -> Result<Option<(sessions::Model, users::Model)>> {
        let row = sessions::Entity::find()
            .filter(sessions::Column::Token.eq(token))
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query session by token")?;

        Ok(row.and_then(|(session, user)| user.map(|u| (session, u))))
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<u64> {
        let res = sessions::Entity::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session by token")?;

        Ok(res.rows_affected)
    }

    pub async fn update_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        use sea_orm::sea_query::Expr;

        sessions::Entity::update_many()
            .col_expr(sessions::Column::ExpiresAt, Expr::value(expires_at))
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to extend session expiry")?;

        Ok(())
    }
}
