//! `POST /index/:source`, `POST /index`, `GET /index/status`,
//! `POST /index/:source/reset` (spec.md §6, §4.7).

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use knowledge_connectors::IndexRequest;
use knowledge_model::{DataSource, SourceFilter};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

#[derive(Debug, Deserialize, Default)]
pub struct IndexRequestBody {
    #[serde(default)]
    pub full_reindex: bool,
    #[serde(default)]
    pub filter: SourceFilter,
}

impl From<IndexRequestBody> for IndexRequest {
    fn from(body: IndexRequestBody) -> Self {
        IndexRequest { full_reindex: body.full_reindex, filter: body.filter }
    }
}

fn parse_source(raw: &str) -> Result<DataSource, ApiError> {
    DataSource::from_str(raw).map_err(|_| ApiError::BadRequest(format!("unknown data source: {raw}")))
}

pub async fn start_one(
    State(state): State<AppState>,
    Path(source): Path<String>,
    body: Option<Json<IndexRequestBody>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let src = parse_source(&source)?;
    let request: IndexRequest = body.map(|Json(b)| b).unwrap_or_default().into();
    state.engine.start_indexing(src, request).await?;
    Ok(Json(json!({ "source": src.as_str(), "started": true })))
}

pub async fn start_all(
    State(state): State<AppState>,
    body: Option<Json<IndexRequestBody>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: IndexRequest = body.map(|Json(b)| b).unwrap_or_default().into();
    let results = state.engine.clone().index_all(request).await?;
    let summary: Vec<serde_json::Value> = results
        .into_iter()
        .map(|(src, outcome)| json!({ "source": src.as_str(), "ok": outcome.is_ok() }))
        .collect();
    Ok(Json(json!({ "results": summary })))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let statuses = state.cursor_store.get_all_job_status(&DataSource::ALL).await?;
    Ok(Json(json!(statuses)))
}

pub async fn reset(State(state): State<AppState>, Path(source): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let src = parse_source(&source)?;
    state.cursor_store.reset_cursor(src).await?;
    state.cursor_store.release_lock(src).await?;
    state.cursor_store.save_job_status(&knowledge_model::JobStatus::idle(src)).await?;
    Ok(Json(json!({ "source": src.as_str(), "reset": true })))
}
