//! C4 facade: the upsert pipeline (spec.md §4.4 steps 1–5) and stage-1
//! query dispatch, wired over a `SearchBackend` + an `Embedder` + the
//! query-embedding cache.

use crate::backend::{BulkReport, PartialUpdate, SearchBackend, SearchOptions, SearchResults, SearchType};
use crate::enrich;
use crate::error::StoreError;
use knowledge_embed::cache::QueryEmbeddingCache;
use knowledge_embed::Embedder;
use knowledge_kv::KeyValueStore;
use knowledge_model::{DataSource, Document, BULK_BATCH_SIZE};
use std::sync::Arc;
use tracing::warn;

pub struct IndexStore {
    backend: Arc<dyn SearchBackend>,
    embedder: Arc<dyn Embedder>,
    query_cache: QueryEmbeddingCache,
}

impl IndexStore {
    pub fn new(backend: Arc<dyn SearchBackend>, embedder: Arc<dyn Embedder>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { backend, embedder, query_cache: QueryEmbeddingCache::new(kv) }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// spec.md §4.4 `upsertDocuments`: sanitize+chunk, diff against stored
    /// hashes, route to re-embed or metadata-only-partial-update, bulk
    /// write. Bulk errors are counted/logged, never fatal to the call.
    pub async fn upsert_documents(&self, src: DataSource, docs: &[Document]) -> Result<BulkReport, StoreError> {
        let mut all_items = Vec::new();
        for doc in docs {
            all_items.extend(enrich::build_items(doc, src)?);
        }

        let mut report = BulkReport::default();
        for batch in all_items.chunks(BULK_BATCH_SIZE) {
            let ids: Vec<String> = batch.iter().map(|item| item.id.clone()).collect();
            let existing_hashes = self.backend.mget_hashes(&ids).await?;

            let mut to_embed = Vec::new();
            let mut to_partial = Vec::new();
            for (item, existing_hash) in batch.iter().zip(existing_hashes) {
                if existing_hash.as_deref() == Some(item.content_hash.as_str()) {
                    to_partial.push(PartialUpdate { item: item.clone() });
                } else {
                    to_embed.push(item.clone());
                }
            }

            if !to_embed.is_empty() {
                let texts: Vec<&str> = to_embed.iter().map(|item| item.content.as_str()).collect();
                match knowledge_embed::generate_embeddings(self.embedder.as_ref(), &texts).await {
                    Ok(vectors) => {
                        for (item, vector) in to_embed.iter_mut().zip(vectors) {
                            item.embedding = Some(vector);
                        }
                        report.merge(self.backend.bulk_upsert(&to_embed).await?);
                    }
                    Err(err) => {
                        warn!(source = %src, error = %err, count = to_embed.len(), "batch embedding failed");
                        for item in &to_embed {
                            report.record_failure(format!("embedding failed for {}: {err}", item.id));
                        }
                    }
                }
            }

            if !to_partial.is_empty() {
                report.merge(self.backend.bulk_partial_update(&to_partial).await?);
            }
        }
        Ok(report)
    }

    /// Stage 1 of spec.md §4.4 `search`: normalize the query, resolve a
    /// query embedding for vector/hybrid search (via the §4.5 cache), and
    /// delegate to the backend. Chunk-dedup/boost/rerank (stage 2) and
    /// personalization (stage 3) live in `knowledge-search`.
    pub async fn search(&self, mut options: SearchOptions) -> Result<SearchResults, StoreError> {
        options.query = crate::backend::normalize_query(&options.query);
        if options.search_type != SearchType::Keyword {
            let vector = self
                .query_cache
                .get_or_compute(&options.query, self.embedder.as_ref())
                .await
                .map_err(|e| StoreError::Embed(e.to_string()))?;
            options.query_vector = Some(vector);
        }
        self.backend.search(&options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ListOptions, SearchFilters};
    use crate::memory_backend::InMemoryBackend;
    use knowledge_kv::InMemoryKv;
    use knowledge_model::Document;

    struct StubEmbedder {
        info: knowledge_embed::EmbedderInfo,
    }

    #[async_trait::async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, knowledge_embed::EmbedderError> {
            Ok(vec![text.len() as f32, 1.0, 0.0])
        }
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, knowledge_embed::EmbedderError> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }
        fn info(&self) -> &knowledge_embed::EmbedderInfo {
            &self.info
        }
    }

    fn store() -> IndexStore {
        let backend: Arc<dyn SearchBackend> = Arc::new(InMemoryBackend::new());
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder {
            info: knowledge_embed::EmbedderInfo {
                provider: knowledge_embed::ProviderKind::Http,
                embedding_model_id: "stub".into(),
                dimension: 3,
                text_repr_version: "v1".into(),
            },
        });
        IndexStore::new(backend, embedder, Arc::new(InMemoryKv::new()))
    }

    #[tokio::test]
    async fn upsert_then_list_round_trips() {
        let store = store();
        let doc = Document::new("D1", DataSource::Wiki, "hello there");
        let report = store.upsert_documents(DataSource::Wiki, &[doc]).await.unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(report.succeeded_ids, vec!["D1".to_string()]);

        let listed = store
            .backend()
            .list(DataSource::Wiki, &ListOptions { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
    }

    #[tokio::test]
    async fn reupserting_unchanged_content_skips_embedding_but_keeps_metadata_fresh() {
        let store = store();
        let mut doc = Document::new("D1", DataSource::Wiki, "stable body");
        store.upsert_documents(DataSource::Wiki, &[doc.clone()]).await.unwrap();
        let first = store.backend().get("D1").await.unwrap().unwrap();
        assert!(first.embedding.is_some());

        doc.metadata.insert("status".into(), "archived".into());
        store.upsert_documents(DataSource::Wiki, &[doc]).await.unwrap();
        let second = store.backend().get("D1").await.unwrap().unwrap();
        assert_eq!(second.embedding, first.embedding);
        assert_eq!(second.status, Some("archived".to_string()));
    }

    #[tokio::test]
    async fn search_resolves_query_vector_for_hybrid_mode() {
        let store = store();
        let doc = Document::new("D1", DataSource::Wiki, "alpha beta gamma");
        store.upsert_documents(DataSource::Wiki, &[doc]).await.unwrap();

        let results = store
            .search(SearchOptions {
                search_type: SearchType::Hybrid,
                query: "alpha".into(),
                query_vector: None,
                filters: SearchFilters::default(),
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();
        assert_eq!(results.total, 1);
    }
}
