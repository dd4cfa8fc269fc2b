//! `GET /analytics/*`, `GET /analytics/health[/:source]`,
//! `GET/POST /analytics/config/...` (spec.md §6).
//!
//! Run history and per-day counts have no dedicated store beyond the
//! per-source `JobStatus` snapshot (spec.md §4.1 keeps no history log), so
//! "run history" here reports the current snapshot per source rather than
//! a persisted timeline — the store layer simply doesn't retain one.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use knowledge_engine::probe_all;
use knowledge_model::{DataSource, SourceFilter};
use serde_json::json;
use std::str::FromStr;

pub async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let statuses = state.cursor_store.get_all_job_status(&DataSource::ALL).await?;
    let per_source: Vec<serde_json::Value> = statuses
        .iter()
        .map(|s| {
            json!({
                "source": s.source.as_str(),
                "status": s.status,
                "documentsIndexed": s.documents_indexed,
                "lastSync": s.last_sync,
            })
        })
        .collect();
    let total_documents: u64 = statuses.iter().map(|s| s.documents_indexed).sum();
    Ok(Json(json!({ "perSource": per_source, "totalDocumentsIndexed": total_documents })))
}

pub async fn health_all(State(state): State<AppState>) -> Json<serde_json::Value> {
    let probes = probe_all(&state.registry, &DataSource::ALL).await;
    Json(json!(probes.iter().map(probe_json).collect::<Vec<_>>()))
}

pub async fn health_one(State(state): State<AppState>, Path(source): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let src = DataSource::from_str(&source).map_err(|_| ApiError::BadRequest(format!("unknown data source: {source}")))?;
    let probes = probe_all(&state.registry, &[src]).await;
    Ok(Json(probe_json(&probes[0])))
}

fn probe_json(probe: &knowledge_engine::HealthProbe) -> serde_json::Value {
    json!({
        "source": probe.source.as_str(),
        "configured": probe.configured,
        "connected": probe.connected,
        "authenticated": probe.authenticated,
        "latencyMs": probe.latency_ms,
        "error": probe.error,
        "checkedAt": probe.checked_at,
    })
}

pub async fn config_export(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let mut filters = serde_json::Map::new();
    for src in DataSource::ALL {
        if let Some(filter) = state.settings_store.get_filter(src).await? {
            filters.insert(src.as_str().to_string(), serde_json::to_value(filter).unwrap_or_default());
        }
    }
    let enabled = state.settings_store.enabled_sources().await?;
    Ok(Json(json!({
        "enabledSources": enabled.iter().map(DataSource::as_str).collect::<Vec<_>>(),
        "filters": filters,
    })))
}

#[derive(Debug, serde::Deserialize)]
pub struct ConfigImportBody {
    #[serde(default)]
    pub enabled_sources: Option<Vec<String>>,
    #[serde(default)]
    pub filters: std::collections::BTreeMap<String, SourceFilter>,
}

pub async fn config_import(
    State(state): State<AppState>,
    Json(body): Json<ConfigImportBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(enabled) = &body.enabled_sources {
        let enabled_set: std::collections::HashSet<&str> = enabled.iter().map(String::as_str).collect();
        for src in DataSource::ALL {
            state.settings_store.set_source_enabled(src, enabled_set.contains(src.as_str())).await?;
        }
    }
    for (src_name, filter) in &body.filters {
        let src = DataSource::from_str(src_name).map_err(|_| ApiError::BadRequest(format!("unknown data source: {src_name}")))?;
        state.settings_store.save_filter(src, filter).await?;
    }
    Ok(Json(json!({ "imported": true })))
}
