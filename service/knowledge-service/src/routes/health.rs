//! `GET /health` (spec.md §6): `{status, service, timestamp,
//! dependencies:{kv,index,workflow}}`, 200 while core deps are up.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use knowledge_model::DataSource;
use serde_json::json;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let kv_up = state.kv.get("index:disabled-sources").await.is_ok();
    let index_up = state.backend.count(DataSource::Wiki).await.is_ok();
    let workflow_up = !state.config.workflow.address.is_empty();

    let all_up = kv_up && index_up && workflow_up;
    let status = if all_up { "ok" } else { "partial" };
    let code = if all_up { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        code,
        Json(json!({
            "status": status,
            "service": "knowledge-service",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "dependencies": {
                "kv": kv_up,
                "index": index_up,
                "workflow": workflow_up,
            },
        })),
    )
}
