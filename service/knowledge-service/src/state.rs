//! Application state: wires C1/C2/C4/C6/C7/C8 together behind `Arc`s shared
//! across every request handler (spec.md §6). Grounded on the teacher's
//! `HybridService` struct (store+index+embedder wiring behind one owner).

use crate::config::Config;
use knowledge_connectors::ConnectorRegistry;
use knowledge_embed::http::HttpEmbedder;
use knowledge_embed::reranker::{HttpReranker, Reranker};
use knowledge_embed::Embedder;
use knowledge_engine::{IndexingEngine, TokioWorkflowRuntime, WorkflowRuntime};
use knowledge_kv::{InMemoryKv, KeyValueStore};
use knowledge_search::{NavigationService, SearchService};
use knowledge_store::{CursorStatusStore, IndexStore, InMemoryBackend, SearchBackend, SettingsStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub kv: Arc<dyn KeyValueStore>,
    pub backend: Arc<dyn SearchBackend>,
    pub cursor_store: Arc<CursorStatusStore>,
    pub settings_store: Arc<SettingsStore>,
    pub engine: Arc<IndexingEngine>,
    pub search: Arc<SearchService>,
    pub navigation: Arc<NavigationService>,
    pub registry: Arc<ConnectorRegistry>,
}

impl AppState {
    /// Wires every component from a loaded `Config`. The embedder/reranker
    /// fall back to a deterministic stub when their endpoint is unset, so the
    /// process still boots and serves keyword search (spec.md §6: "keys
    /// absent at start-up do not prevent boot").
    pub fn new(config: Config, registry: ConnectorRegistry) -> Self {
        let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKv::new());
        let backend: Arc<dyn SearchBackend> = Arc::new(InMemoryBackend::new());
        let embedder: Arc<dyn Embedder> = match &config.embedder {
            Some(cfg) => match HttpEmbedder::new(cfg.clone()) {
                Ok(e) => Arc::new(e),
                Err(_) => Arc::new(StubEmbedder::default()),
            },
            None => Arc::new(StubEmbedder::default()),
        };
        let reranker: Option<Arc<dyn Reranker>> =
            config.reranker.as_ref().map(|cfg| Arc::new(HttpReranker::new(cfg.clone())) as Arc<dyn Reranker>);

        let cursor_store = Arc::new(CursorStatusStore::new(kv.clone()));
        let settings_store = Arc::new(SettingsStore::new(kv.clone()));
        let index_store = Arc::new(IndexStore::new(backend.clone(), embedder.clone(), kv.clone()));
        let registry = Arc::new(registry);
        let runtime: Arc<dyn WorkflowRuntime> = Arc::new(TokioWorkflowRuntime::new());

        let engine = Arc::new(IndexingEngine::new(
            cursor_store.clone(),
            settings_store.clone(),
            index_store,
            registry.clone(),
            runtime,
        ));

        let query_cache = Arc::new(knowledge_embed::cache::QueryEmbeddingCache::new(kv.clone()));
        let search = Arc::new(SearchService::new(backend.clone(), embedder, query_cache, reranker));
        let navigation = Arc::new(NavigationService::new(backend.clone()));

        Self {
            config: Arc::new(config),
            kv,
            backend,
            cursor_store,
            settings_store,
            engine,
            search,
            navigation,
            registry,
        }
    }
}

/// Deterministic placeholder used when no embedder endpoint is configured —
/// keeps keyword search and the service boot path working without a live
/// embedding provider (spec.md §6: absent credentials never block boot).
#[derive(Default)]
struct StubEmbedder {
    info: std::sync::OnceLock<knowledge_embed::EmbedderInfo>,
}

impl StubEmbedder {
    fn info_ref(&self) -> &knowledge_embed::EmbedderInfo {
        self.info.get_or_init(|| knowledge_embed::EmbedderInfo {
            provider: knowledge_embed::ProviderKind::Http,
            embedding_model_id: "unconfigured-stub".into(),
            dimension: 8,
            text_repr_version: "v1".into(),
        })
    }
}

#[async_trait::async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, knowledge_embed::EmbedderError> {
        let dim = self.info_ref().dimension;
        let mut out = vec![0.0f32; dim];
        for (i, byte) in text.bytes().enumerate() {
            out[i % dim] += byte as f32;
        }
        Ok(out)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, knowledge_embed::EmbedderError> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    fn info(&self) -> &knowledge_embed::EmbedderInfo {
        self.info_ref()
    }
}
