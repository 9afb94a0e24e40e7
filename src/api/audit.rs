use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, AppState};

const DEFAULT_LIMIT: u64 = 200;
const MAX_LIMIT: u64 = 1000;

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActorDto {
    pub id: i32,
    pub email: String,
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub id: i64,
    pub user_id: Option<i32>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i32>,
    pub details: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub user: Option<AuditActorDto>,
}

/// GET /audit?limit=
/// Newest-first feed of administrative actions. Admin-only.
pub async fn list_audit(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let rows = state.store().list_audit(limit).await?;

    let dtos: Vec<AuditLogDto> = rows
        .into_iter()
        .map(|(entry, actor)| AuditLogDto {
            id: entry.id,
            user_id: entry.user_id,
            action: entry.action,
            entity: entry.entity,
            entity_id: entry.entity_id,
            details: entry.details,
            ip: entry.ip,
            user_agent: entry.user_agent,
            created_at: entry.created_at,
            user: actor.map(|u| AuditActorDto {
                id: u.id,
                email: u.email,
                name: u.name,
            }),
        })
        .collect();

    Ok(Json(dtos))
}
