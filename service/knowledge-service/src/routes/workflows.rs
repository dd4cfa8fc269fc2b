//! `GET /workflows[/:id]` (spec.md §6). With `TokioWorkflowRuntime` as the
//! fallback runner (spec.md §9), a "workflow" is simply a per-source indexing
//! run; its id is the source name and its handle is the current `JobStatus`.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use knowledge_model::DataSource;
use serde_json::json;
use std::str::FromStr;

pub async fn list(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let statuses = state.cursor_store.get_all_job_status(&DataSource::ALL).await?;
    Ok(Json(json!(statuses
        .into_iter()
        .map(|s| json!({ "id": s.source.as_str(), "status": s.status, "documentsIndexed": s.documents_indexed }))
        .collect::<Vec<_>>())))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let src = DataSource::from_str(&id).map_err(|_| ApiError::BadRequest(format!("unknown workflow id: {id}")))?;
    let status = state.cursor_store.get_job_status(src).await?;
    Ok(Json(json!({ "id": src.as_str(), "status": status.status, "documentsIndexed": status.documents_indexed })))
}
