//! `SearchService`: thin orchestrator over C4 (spec.md §4.8) implementing
//! the three-stage ranking pipeline. Grounded on the teacher's
//! `HybridService::search_hybrid` (`service/hybrid-service/src/lib.rs`) for
//! the score-accumulator shape, generalized from a two-way lexical/vector
//! merge (owned by the backend here, per the additive-fusion decision
//! recorded in DESIGN.md) to this crate's extra dedup/rerank/personalize
//! stages.

use crate::dedup::dedupe_and_boost;
use crate::error::SearchError;
use crate::personalize;
use crate::request::{RankedHit, SearchRequest, SearchResponse};
use knowledge_embed::cache::QueryEmbeddingCache;
use knowledge_embed::reranker::Reranker;
use knowledge_embed::Embedder;
use knowledge_model::RERANK_CANDIDATE_CAP;
use knowledge_store::{backend::normalize_query, SearchBackend, SearchFilters, SearchOptions, SearchType};
use std::sync::Arc;
use tracing::warn;

pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn Embedder>,
    query_cache: Arc<QueryEmbeddingCache>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl SearchService {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        embedder: Arc<dyn Embedder>,
        query_cache: Arc<QueryEmbeddingCache>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Self {
        Self { backend, embedder, query_cache, reranker }
    }

    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
        let query = normalize_query(&request.query);

        let query_vector = match request.search_type {
            SearchType::Keyword => None,
            SearchType::Vector | SearchType::Hybrid => {
                Some(self.query_cache.get_or_compute(&query, self.embedder.as_ref()).await?)
            }
        };

        let options = SearchOptions {
            search_type: request.search_type,
            query: query.clone(),
            query_vector,
            filters: SearchFilters {
                source_terms: request.source_terms,
                where_scalars: request.where_scalars,
                start_ts: request.start_ts,
                end_ts: request.end_ts,
            },
            // Candidate fetch size = limit + offset (spec.md §4.4); dedup
            // happens after this fetch so the backend must overfetch.
            limit: request.limit + request.offset,
            offset: 0,
        };

        let raw = self.backend.search(&options).await?;
        let mut deduped = dedupe_and_boost(raw.results);
        deduped.sort_by(|a, b| b.hit.score.partial_cmp(&a.hit.score).unwrap_or(std::cmp::Ordering::Equal));

        if let Some(reranker) = &self.reranker {
            self.rerank_in_place(&query, &mut deduped, reranker.as_ref()).await;
        }

        let now = chrono::Utc::now();
        let mut ranked: Vec<RankedHit> = deduped
            .into_iter()
            .map(|d| {
                let multiplier = personalize::multiplier(&d.hit.item, now);
                RankedHit { score: d.hit.score * multiplier, chunk_count: d.chunk_count, item: d.hit.item }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let total = ranked.len();
        let start = request.offset.min(total);
        let end = (request.offset + request.limit).min(total);
        Ok(SearchResponse { results: ranked[start..end].to_vec(), total })
    }

    /// Reranks the top `min(N, 200)` candidates in place; failures and an
    /// unconfigured reranker are swallowed, leaving `deduped`'s existing
    /// order and scores untouched (spec.md §4.4, §7 `RerankError`).
    async fn rerank_in_place(
        &self,
        query: &str,
        deduped: &mut [crate::dedup::DedupedHit],
        reranker: &dyn Reranker,
    ) {
        let window = deduped.len().min(RERANK_CANDIDATE_CAP);
        if window == 0 {
            return;
        }
        let contents: Vec<&str> = deduped[..window].iter().map(|d| d.hit.item.content.as_str()).collect();

        match reranker.rerank(query, &contents, window).await {
            Ok(results) => {
                for result in results {
                    if let Some(hit) = deduped.get_mut(result.index) {
                        hit.hit.score = result.relevance_score;
                    }
                }
            }
            Err(err) => warn!(error = %err, "reranker call failed, keeping original ordering"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use knowledge_embed::{EmbedderError, EmbedderInfo, ProviderKind};
    use knowledge_kv::InMemoryKv;
    use knowledge_model::{DataSource, EnrichedItem};
    use knowledge_store::{BulkReport, ListOptions, PartialUpdate, SearchHit, SearchResults, StoreError};

    struct StubEmbedder;
    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(vec![0.1, 0.2])
        }
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2]).collect())
        }
        fn info(&self) -> &EmbedderInfo {
            static INFO: std::sync::OnceLock<EmbedderInfo> = std::sync::OnceLock::new();
            INFO.get_or_init(|| EmbedderInfo {
                provider: ProviderKind::Http,
                embedding_model_id: "stub".into(),
                dimension: 2,
                text_repr_version: "v1".into(),
            })
        }
    }

    struct FixtureBackend {
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl SearchBackend for FixtureBackend {
        async fn ensure_mapping(&self, _dimension: usize) -> Result<(), StoreError> {
            Ok(())
        }
        async fn bulk_upsert(&self, _items: &[EnrichedItem]) -> Result<BulkReport, StoreError> {
            Ok(BulkReport::default())
        }
        async fn bulk_partial_update(&self, _updates: &[PartialUpdate]) -> Result<BulkReport, StoreError> {
            Ok(BulkReport::default())
        }
        async fn mget_hashes(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError> {
            Ok(vec![None; ids.len()])
        }
        async fn search(&self, _options: &SearchOptions) -> Result<SearchResults, StoreError> {
            Ok(SearchResults { results: self.hits.clone(), total: self.hits.len() })
        }
        async fn list(&self, _src: DataSource, _options: &ListOptions) -> Result<SearchResults, StoreError> {
            Ok(SearchResults::default())
        }
        async fn count(&self, _src: DataSource) -> Result<usize, StoreError> {
            Ok(0)
        }
        async fn get(&self, _id: &str) -> Result<Option<EnrichedItem>, StoreError> {
            Ok(None)
        }
        async fn delete_document(&self, _src: DataSource, _id: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn delete_collection(&self, _src: DataSource) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn service(hits: Vec<SearchHit>) -> SearchService {
        SearchService::new(
            Arc::new(FixtureBackend { hits }),
            Arc::new(StubEmbedder),
            Arc::new(QueryEmbeddingCache::new(Arc::new(InMemoryKv::new()))),
            None,
        )
    }

    #[tokio::test]
    async fn scenario_4_standalone_outranks_boosted_chunked_doc() {
        let mut chunk0 = EnrichedItem::new("X_chunk_0", DataSource::Wiki, "c", "c", "h");
        chunk0.parent_doc_id = Some("X".into());
        let mut chunk1 = EnrichedItem::new("X_chunk_1", DataSource::Wiki, "c", "c", "h");
        chunk1.parent_doc_id = Some("X".into());
        let mut chunk2 = EnrichedItem::new("X_chunk_2", DataSource::Wiki, "c", "c", "h");
        chunk2.parent_doc_id = Some("X".into());
        let standalone = EnrichedItem::new("Y", DataSource::Wiki, "c", "c", "h");

        let hits = vec![
            SearchHit { item: chunk0, score: 0.80 },
            SearchHit { item: chunk1, score: 0.10 },
            SearchHit { item: chunk2, score: 0.20 },
            SearchHit { item: standalone, score: 0.90 },
        ];

        let svc = service(hits);
        let request = SearchRequest { search_type: SearchType::Keyword, query: "test".into(), ..Default::default() };
        let response = svc.search(request).await.unwrap();

        assert_eq!(response.total, 2);
        assert_eq!(response.results[0].item.id, "Y");
        assert_eq!(response.results[1].item.id, "X_chunk_0");
        let expected_x = 0.80 * (1.0 + (3.0_f64).ln() * 0.05);
        assert!((response.results[1].score - expected_x).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pagination_slices_the_deduplicated_set() {
        let hits: Vec<SearchHit> = (0..10)
            .map(|i| SearchHit { item: EnrichedItem::new(format!("id-{i}"), DataSource::Wiki, "c", "c", "h"), score: i as f64 })
            .collect();
        let svc = service(hits);
        let request = SearchRequest {
            search_type: SearchType::Keyword,
            query: "q".into(),
            limit: 3,
            offset: 2,
            ..Default::default()
        };
        let response = svc.search(request).await.unwrap();
        assert_eq!(response.total, 10);
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].item.id, "id-7");
    }
}
