use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState};

/// Pull the uploaded workbook out of the multipart body (field name
/// `file`, matching the SPA's FormData).
async fn file_bytes(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::validation("No file uploaded"))
}

/// POST /excel/replace
/// Destructive fuzzy-header ingestion: wipes the task table and loads the
/// sheet in its place, atomically.
pub async fn replace_from_excel(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = file_bytes(multipart).await?;
    let summary = state.ingest().replace_all(&bytes).await?;

    Ok(Json(serde_json::json!({
        "message": "Excel replaced successfully",
        "deleted": summary.deleted,
        "inserted": summary.inserted,
        "rowsRead": summary.rows_read,
    })))
}

/// POST /excel/upload
/// Additive strict-header ingestion: appends rows, skipping duplicates.
pub async fn upload_excel(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = file_bytes(multipart).await?;
    let summary = state.ingest().append_rows(&bytes).await?;

    Ok(Json(serde_json::json!({
        "message": "Excel uploaded successfully",
        "inserted": summary.inserted,
        "skipped": summary.skipped,
        "rowsRead": summary.rows_read,
    })))
}
