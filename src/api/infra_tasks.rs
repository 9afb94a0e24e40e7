use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::session::{ClientMeta, MaybeUser};
use super::{ApiError, AppState};
use crate::db::{AuditEntry, InfraTaskDraft};
use crate::entities::infra_tasks::InfraStatus;
use crate::excel::parse_text_date;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraTaskInput {
    pub infra_phase: Option<String>,
    pub task_name: Option<String>,
    pub status: Option<InfraStatus>,
    pub percent_complete: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub owner: Option<String>,
}

fn draft_from_input(input: InfraTaskInput) -> Result<InfraTaskDraft, ApiError> {
    let parse_optional = |value: Option<&str>, field: &str| match value.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_text_date(raw)
            .map(Some)
            .ok_or_else(|| ApiError::validation(format!("Invalid {field}: {raw}"))),
        _ => Ok(None),
    };

    Ok(InfraTaskDraft {
        infra_phase: input.infra_phase.unwrap_or_default(),
        task_name: input.task_name.unwrap_or_default(),
        status: input.status.unwrap_or_default(),
        percent_complete: input.percent_complete.unwrap_or(0).clamp(0, 100),
        start_date: parse_optional(input.start_date.as_deref(), "startDate")?,
        end_date: parse_optional(input.end_date.as_deref(), "endDate")?,
        owner: input.owner.unwrap_or_default(),
    })
}

/// GET /infra-tasks
pub async fn list_infra_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.store().list_infra_tasks().await?;
    Ok(Json(tasks))
}

/// POST /infra-tasks
pub async fn create_infra_task(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    meta: ClientMeta,
    Json(payload): Json<InfraTaskInput>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = draft_from_input(payload)?;
    let task = state.store().insert_infra_task(draft).await?;

    state
        .audit()
        .record(AuditEntry {
            user_id: user.0.map(|a| a.user.id),
            action: "create".to_string(),
            entity: "InfraTask".to_string(),
            entity_id: Some(task.id),
            details: serde_json::to_string(&task).ok(),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /infra-tasks/:id
pub async fn update_infra_task(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    meta: ClientMeta,
    Path(id): Path<i32>,
    Json(payload): Json<InfraTaskInput>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = draft_from_input(payload)?;

    let task = state
        .store()
        .update_infra_task(id, draft)
        .await?
        .ok_or_else(|| ApiError::not_found("Infra task", id))?;

    state
        .audit()
        .record(AuditEntry {
            user_id: user.0.map(|a| a.user.id),
            action: "update".to_string(),
            entity: "InfraTask".to_string(),
            entity_id: Some(id),
            details: serde_json::to_string(&task).ok(),
            ip: meta.ip,
            user_agent: meta.user_agent,
        })
        .await;

    Ok(Json(task))
}
