use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::db::TaskDraft;
use crate::db::repositories::task::duration_days;
use crate::entities::tasks::TaskStatus;
use crate::excel::parse_text_date;

/// Inline-edit / add-row payload. Dates come in as strings from the grid
/// ("2024-01-01" or full RFC 3339); duration is always re-derived from the
/// date span, never trusted from the client.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub workstream: Option<String>,
    pub deliverable: Option<String>,
    pub status: Option<TaskStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub progress: Option<i32>,
    pub phase: Option<String>,
    pub milestone: Option<String>,
    pub owner: Option<String>,
}

fn parse_required_date(value: Option<&str>, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))?;

    parse_text_date(raw).ok_or_else(|| ApiError::validation(format!("Invalid {field}: {raw}")))
}

fn draft_from_input(input: TaskInput) -> Result<TaskDraft, ApiError> {
    let start_date = parse_required_date(input.start_date.as_deref(), "startDate")?;
    let end_date = match input.end_date.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_text_date(raw)
            .ok_or_else(|| ApiError::validation(format!("Invalid endDate: {raw}")))?,
        _ => start_date,
    };

    Ok(TaskDraft {
        workstream: input.workstream.unwrap_or_else(|| "General".to_string()),
        deliverable: input.deliverable.unwrap_or_else(|| "TBD".to_string()),
        status: input.status.unwrap_or_default(),
        duration: duration_days(start_date, end_date),
        start_date,
        end_date,
        progress: input.progress.unwrap_or(0).clamp(0, 100),
        phase: input.phase.unwrap_or_else(|| "Unknown".to_string()),
        milestone: input.milestone.unwrap_or_default(),
        owner: input.owner.unwrap_or_default(),
    })
}

/// GET /tasks
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let tasks = state.store().list_tasks().await?;
    Ok(Json(tasks))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TaskInput>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = draft_from_input(payload)?;
    let task = state.store().insert_task(draft).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /tasks/:id
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskInput>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = draft_from_input(payload)?;

    let task = state
        .store()
        .update_task(id, draft)
        .await?
        .ok_or_else(|| ApiError::not_found("Task", id))?;

    Ok(Json(task))
}

/// DELETE /tasks/:id
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.store().delete_task(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Task", id));
    }

    Ok(Json(serde_json::json!({ "message": "Task deleted successfully" })))
}
