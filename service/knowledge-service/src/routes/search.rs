//! `GET /search` (spec.md §6: "query params mirror `SearchRequest`").

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use knowledge_model::DataSource;
use knowledge_search::{RankedHit, SearchRequest, SearchResponse};
use knowledge_store::SearchType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub sources: Option<String>,
    #[serde(default)]
    pub start_ts: Option<i64>,
    #[serde(default)]
    pub end_ts: Option<i64>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

fn parse_search_type(raw: Option<&str>) -> SearchType {
    match raw {
        Some("keyword") => SearchType::Keyword,
        Some("vector") => SearchType::Vector,
        _ => SearchType::Hybrid,
    }
}

#[derive(Debug, Serialize)]
pub struct HitDto {
    pub item: knowledge_model::EnrichedItem,
    pub score: f64,
    pub chunk_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponseDto {
    pub results: Vec<HitDto>,
    pub total: usize,
}

impl From<SearchResponse> for SearchResponseDto {
    fn from(response: SearchResponse) -> Self {
        Self {
            total: response.total,
            results: response
                .results
                .into_iter()
                .map(|RankedHit { item, score, chunk_count }| HitDto { item, score, chunk_count })
                .collect(),
        }
    }
}

pub async fn search(State(state): State<AppState>, Query(params): Query<SearchQuery>) -> Result<Json<SearchResponseDto>, ApiError> {
    let source_terms = params
        .sources
        .as_deref()
        .map(|csv| csv.split(',').filter_map(|s| DataSource::from_str(s.trim()).ok()).collect());

    let request = SearchRequest {
        search_type: parse_search_type(params.search_type.as_deref()),
        query: params.q,
        source_terms,
        where_scalars: Default::default(),
        start_ts: params.start_ts,
        end_ts: params.end_ts,
        limit: params.limit.unwrap_or(20),
        offset: params.offset.unwrap_or(0),
    };

    let response = state.search.search(request).await?;
    Ok(Json(response.into()))
}
