//! C7 Indexing Engine (spec.md §4.7): per-source durable execution,
//! `startIndexing`/`indexAll`, lock/status book-keeping, settings merge,
//! configKey change detection, the fetch→diff→upsert→save loop with
//! intra-run retry/backoff, and the `MAX_BATCHES_PER_EXECUTION` continuation.
//!
//! Grounded on the teacher's `ingest_chunks_orchestrated`/
//! `delete_by_filter_orchestrated` batch loops (chunking-store/src/
//! orchestrator.rs): fetch-a-page, act, advance, repeat, with a report
//! accumulated across batches and errors folded in rather than raised.

use crate::error::EngineError;
use crate::runtime::WorkflowRuntime;
use knowledge_connectors::{ConnectorRegistry, IndexRequest};
use knowledge_model::{
    Cursor, DataSource, Document, JobStatus, JobStatusState, Metadata, MAX_BATCHES_PER_EXECUTION, MAX_CONSECUTIVE_ERRORS,
    INTER_BATCH_SLEEP_MILESTONE, INTER_BATCH_SLEEP_MILESTONE_MS, INTER_BATCH_SLEEP_MS, INDEX_ALL_STAGGER_MS,
};
use knowledge_store::{CursorStatusStore, IndexStore, SettingsStore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct IndexingEngine {
    cursor_store: Arc<CursorStatusStore>,
    settings_store: Arc<SettingsStore>,
    index_store: Arc<IndexStore>,
    registry: Arc<ConnectorRegistry>,
    runtime: Arc<dyn WorkflowRuntime>,
}

impl IndexingEngine {
    pub fn new(
        cursor_store: Arc<CursorStatusStore>,
        settings_store: Arc<SettingsStore>,
        index_store: Arc<IndexStore>,
        registry: Arc<ConnectorRegistry>,
        runtime: Arc<dyn WorkflowRuntime>,
    ) -> Self {
        Self { cursor_store, settings_store, index_store, registry, runtime }
    }

    /// Process-startup recovery: any source left `running` from a previous
    /// process is forced to `error` and its lock released (spec.md §4.7).
    pub async fn recover_on_startup(&self) -> Result<(), EngineError> {
        Ok(self.cursor_store.recover_interrupted_runs().await?)
    }

    /// Single-source entry point. Returns `AlreadyRunning` immediately if a
    /// run for `src` is already in flight (spec.md §4.7 `acquireLock`).
    pub async fn start_indexing(&self, src: DataSource, request: IndexRequest) -> Result<(), EngineError> {
        if !self.cursor_store.acquire_lock(src).await? {
            return Err(EngineError::AlreadyRunning(src));
        }
        let outcome = self.run_source(src, request).await;
        self.cursor_store.release_lock(src).await?;
        if let Err(err) = &outcome {
            let mut status = self.cursor_store.get_job_status(src).await.unwrap_or_else(|_| JobStatus::idle(src));
            status.status = JobStatusState::Error;
            status.error = Some(err.to_string());
            let _ = self.cursor_store.save_job_status(&status).await;
        }
        outcome
    }

    /// Fans out one `start_indexing` per enabled, configured source, staggered
    /// by `INDEX_ALL_STAGGER_MS` (spec.md §5 "Cross-source parallelism").
    /// A source already running (or whose connector errors) does not stop
    /// the others; their individual outcomes are returned in source order.
    pub async fn index_all(self: Arc<Self>, request: IndexRequest) -> Result<Vec<(DataSource, Result<(), EngineError>)>, EngineError> {
        let enabled = self.settings_store.enabled_sources().await?;
        let configured: Vec<DataSource> =
            enabled.into_iter().filter(|src| self.registry.get(*src).map(|c| c.is_configured()).unwrap_or(false)).collect();

        let mut handles = Vec::with_capacity(configured.len());
        for (i, src) in configured.into_iter().enumerate() {
            let engine = Arc::clone(&self);
            let request = request.clone();
            handles.push(tokio::spawn(async move {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(INDEX_ALL_STAGGER_MS * i as u64)).await;
                }
                (src, engine.start_indexing(src, request).await)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(pair) => results.push(pair),
                Err(join_err) => warn!(error = %join_err, "indexing task panicked"),
            }
        }
        Ok(results)
    }

    async fn run_source(&self, src: DataSource, mut request: IndexRequest) -> Result<(), EngineError> {
        let connector = self.registry.get(src).ok_or(EngineError::NoConnector(src))?.clone();
        if !connector.is_configured() {
            // ConnectorUnconfigured (spec.md §7): soft skip, status untouched.
            return Ok(());
        }

        if let Some(persisted) = self.settings_store.get_filter(src).await? {
            request.filter = request.filter.merged_over(&persisted);
        }
        let config_key = request.filter.config_key();

        let mut cursor = if request.full_reindex { None } else { self.cursor_store.get_cursor(src).await? };
        if !request.full_reindex {
            if let Some(existing) = &cursor {
                if existing.config_key() != Some(config_key.as_str()) {
                    info!(source = %src, "configuration changed, forcing full reindex");
                    request.full_reindex = true;
                    cursor = None;
                }
            }
        }

        let mut status = JobStatus::idle(src);
        status.status = JobStatusState::Running;
        self.cursor_store.save_job_status(&status).await?;

        let mut total_processed: u64 = 0;
        let mut batches_this_execution = 0usize;
        let mut consecutive_errors: u32 = 0;

        loop {
            let batch = match self.runtime.run_fetch(connector.as_ref(), cursor.as_ref(), &request).await {
                Ok(batch) => {
                    consecutive_errors = 0;
                    batch
                }
                Err(err) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        status.status = JobStatusState::Error;
                        status.error = Some(err.to_string());
                        self.cursor_store.save_job_status(&status).await?;
                        return Err(EngineError::Aborted {
                            source: src,
                            consecutive_errors,
                            last_error: err.to_string(),
                        });
                    }
                    tokio::time::sleep(Duration::from_secs(2u64.pow(consecutive_errors))).await;
                    continue;
                }
            };

            if !batch.documents.is_empty() {
                let changed =
                    if request.full_reindex { batch.documents.clone() } else { self.filter_by_hash_diff(src, &batch.documents).await? };

                if !changed.is_empty() {
                    match self.runtime.run_upsert(&self.index_store, src, &changed).await {
                        Ok(report) => {
                            consecutive_errors = 0;
                            if report.failed > 0 {
                                warn!(source = %src, failed = report.failed, first_errors = ?report.first_errors, "partial index write failure");
                            }
                            let hashes = self.hashes_for_successful(&changed, &report.succeeded_ids);
                            self.runtime.run_bulk_set_hashes(&self.cursor_store, src, &hashes).await?;
                            total_processed += changed.len() as u64;
                            status.documents_indexed = total_processed;
                            self.cursor_store.save_job_status(&status).await?;
                        }
                        Err(err) => {
                            consecutive_errors += 1;
                            if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                                status.status = JobStatusState::Error;
                                status.error = Some(err.to_string());
                                self.cursor_store.save_job_status(&status).await?;
                                return Err(err);
                            }
                            tokio::time::sleep(Duration::from_secs(2u64.pow(consecutive_errors))).await;
                            continue;
                        }
                    }
                }
            }

            let last_sync = batch
                .batch_last_sync
                .clone()
                .or_else(|| cursor.as_ref().map(|c| c.last_sync.clone()))
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
            let mut metadata: Metadata = batch.new_cursor.metadata.clone();
            metadata.insert("configKey".to_string(), config_key.clone().into());
            let new_cursor =
                Cursor { source: src, last_sync, sync_token: batch.new_cursor.sync_token.clone(), metadata };
            self.cursor_store.save_cursor(&new_cursor).await?;
            cursor = Some(new_cursor);

            let has_more = batch.has_more;
            batches_this_execution += 1;

            if !has_more {
                break;
            }

            if batches_this_execution >= MAX_BATCHES_PER_EXECUTION {
                info!(source = %src, total_processed, "continuing indexing run as a fresh execution");
                batches_this_execution = 0;
                continue;
            }

            let sleep_ms = if total_processed > 0 && total_processed % INTER_BATCH_SLEEP_MILESTONE as u64 == 0 {
                INTER_BATCH_SLEEP_MILESTONE_MS
            } else {
                INTER_BATCH_SLEEP_MS
            };
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }

        status.status = JobStatusState::Completed;
        self.cursor_store.save_job_status(&status).await?;
        Ok(())
    }

    /// `filterByHashDiff` (spec.md §4.7): `contentHash = SHA-256(JSON({content,
    /// metadata}))` per document, diffed against the C1 hash store. Items
    /// whose id does not yet exist are treated as differing.
    async fn filter_by_hash_diff(&self, src: DataSource, docs: &[Document]) -> Result<Vec<Document>, EngineError> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
        let existing = self.cursor_store.bulk_get_document_hashes(src, &ids).await?;
        let mut changed = Vec::new();
        for (doc, existing_hash) in docs.iter().zip(existing) {
            let hash = document_content_hash(doc);
            if existing_hash.as_deref() != Some(hash.as_str()) {
                changed.push(doc.clone());
            }
        }
        Ok(changed)
    }

    /// Restricts the C1 hash-map write to documents every one of whose
    /// enriched item ids made it into `succeeded_ids` (spec.md §7: "the hash
    /// map is only updated for items that were successfully indexed").
    fn hashes_for_successful(&self, changed: &[Document], succeeded_ids: &[String]) -> HashMap<String, String> {
        let succeeded: std::collections::HashSet<&str> = succeeded_ids.iter().map(String::as_str).collect();
        let mut out = HashMap::new();
        for doc in changed {
            let expected = match knowledge_store::expected_item_ids(doc) {
                Ok(ids) => ids,
                Err(_) => continue,
            };
            if !expected.is_empty() && expected.iter().all(|id| succeeded.contains(id.as_str())) {
                out.insert(doc.id.clone(), document_content_hash(doc));
            }
        }
        out
    }
}

fn document_content_hash(doc: &Document) -> String {
    #[derive(serde::Serialize)]
    struct HashShape<'a> {
        content: &'a str,
        metadata: &'a Metadata,
    }
    let shape = HashShape { content: &doc.content, metadata: &doc.metadata };
    let json = serde_json::to_string(&shape).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioWorkflowRuntime;
    use knowledge_connectors::FixtureConnector;
    use knowledge_embed::{Embedder, EmbedderError, EmbedderInfo, ProviderKind};
    use knowledge_kv::InMemoryKv;
    use knowledge_model::DataSource;
    use knowledge_store::InMemoryBackend;

    struct StubEmbedder {
        info: EmbedderInfo,
    }

    #[async_trait::async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
            Ok(vec![text.len() as f32, 0.0])
        }
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }
        fn info(&self) -> &EmbedderInfo {
            &self.info
        }
    }

    fn engine(registry: ConnectorRegistry) -> (Arc<IndexingEngine>, Arc<CursorStatusStore>) {
        let kv = Arc::new(InMemoryKv::new());
        let cursor_store = Arc::new(CursorStatusStore::new(kv.clone()));
        let settings_store = Arc::new(SettingsStore::new(kv.clone()));
        let backend: Arc<dyn knowledge_store::SearchBackend> = Arc::new(InMemoryBackend::new());
        let embedder: Arc<dyn Embedder> = Arc::new(StubEmbedder {
            info: EmbedderInfo { provider: ProviderKind::Http, embedding_model_id: "stub".into(), dimension: 2, text_repr_version: "v1".into() },
        });
        let index_store = Arc::new(IndexStore::new(backend, embedder, kv));
        let runtime: Arc<dyn WorkflowRuntime> = Arc::new(TokioWorkflowRuntime::new());
        let engine = Arc::new(IndexingEngine::new(cursor_store.clone(), settings_store, index_store, Arc::new(registry), runtime));
        (engine, cursor_store)
    }

    fn doc(id: &str, body: &str) -> Document {
        Document::new(id, DataSource::Wiki, body)
    }

    #[tokio::test]
    async fn fresh_run_indexes_all_documents_and_completes() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![doc("A", "alpha"), doc("B", "beta")]).with_page_size(10)));
        let (engine, cursor_store) = engine(registry);

        engine.start_indexing(DataSource::Wiki, IndexRequest::default()).await.unwrap();

        let status = cursor_store.get_job_status(DataSource::Wiki).await.unwrap();
        assert_eq!(status.status, JobStatusState::Completed);
        assert_eq!(status.documents_indexed, 2);
        let cursor = cursor_store.get_cursor(DataSource::Wiki).await.unwrap().unwrap();
        assert!(cursor.sync_token.is_some());
    }

    #[tokio::test]
    async fn incremental_rerun_with_unchanged_content_indexes_nothing_new() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![doc("A", "alpha"), doc("B", "beta")]).with_page_size(10)));
        let (engine, cursor_store) = engine(registry);

        engine.start_indexing(DataSource::Wiki, IndexRequest::default()).await.unwrap();
        // A fresh run with fullReindex=false starts from a null cursor only
        // the first time; force a second full pass over the same documents
        // to exercise the hash-diff path directly.
        let changed = engine.filter_by_hash_diff(DataSource::Wiki, &[doc("A", "alpha"), doc("B", "beta")]).await.unwrap();
        assert!(changed.is_empty());

        let status = cursor_store.get_job_status(DataSource::Wiki).await.unwrap();
        assert_eq!(status.documents_indexed, 2);
    }

    #[tokio::test]
    async fn concurrent_start_indexing_returns_already_running() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![doc("A", "alpha")])));
        let (engine, cursor_store) = engine(registry);

        cursor_store.acquire_lock(DataSource::Wiki).await.unwrap();
        let result = engine.start_indexing(DataSource::Wiki, IndexRequest::default()).await;
        assert!(matches!(result, Err(EngineError::AlreadyRunning(DataSource::Wiki))));
    }

    #[tokio::test]
    async fn index_all_runs_every_enabled_configured_source() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![doc("A", "alpha")])));
        registry.register(Arc::new(FixtureConnector::new(DataSource::Chat, vec![doc("B", "beta")])));
        let (engine, cursor_store) = engine(registry);

        let results = engine.index_all(IndexRequest::default()).await.unwrap();
        assert_eq!(results.len(), 2);
        for (src, outcome) in results {
            outcome.unwrap();
            let status = cursor_store.get_job_status(src).await.unwrap();
            assert_eq!(status.status, JobStatusState::Completed);
        }
    }

    #[tokio::test]
    async fn unconfigured_connector_is_skipped_without_touching_status() {
        struct Unconfigured;
        #[async_trait::async_trait]
        impl knowledge_connectors::Connector for Unconfigured {
            fn source_name(&self) -> DataSource {
                DataSource::Mail
            }
            fn is_configured(&self) -> bool {
                false
            }
            async fn fetch(
                &self,
                _cursor: Option<&Cursor>,
                _request: &IndexRequest,
            ) -> Result<knowledge_connectors::ConnectorResult, knowledge_connectors::ConnectorError> {
                panic!("must not be called");
            }
        }
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(Unconfigured));
        let (engine, cursor_store) = engine(registry);

        engine.start_indexing(DataSource::Mail, IndexRequest::default()).await.unwrap();
        let status = cursor_store.get_job_status(DataSource::Mail).await.unwrap();
        assert_eq!(status.status, JobStatusState::Idle);
    }
}
