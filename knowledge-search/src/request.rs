//! Request/response shapes for the C8 search surface.

use knowledge_model::{DataSource, EnrichedItem, Metadata};
use knowledge_store::SearchType;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub search_type: SearchType,
    pub query: String,
    pub source_terms: Option<Vec<DataSource>>,
    pub where_scalars: Metadata,
    /// Inclusive range bounds, epoch-ms. `end_ts` should already be
    /// end-of-day (`T23:59:59.999Z`) when derived from a date-only input —
    /// callers at the HTTP edge are responsible for that conversion.
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            search_type: SearchType::Hybrid,
            query: String::new(),
            source_terms: None,
            where_scalars: Metadata::new(),
            start_ts: None,
            end_ts: None,
            limit: 20,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankedHit {
    pub item: EnrichedItem,
    pub score: f64,
    /// Number of chunks that were deduplicated into this hit (1 for
    /// standalone items).
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub results: Vec<RankedHit>,
    /// Deduplicated candidate count, not the raw hit count from the backend.
    pub total: usize,
}
