//! spec.md §9 "Durability": a durable workflow engine is the intended host
//! for C7 (at-most-one-per-source execution, durable state, `continueAsNew`
//! history resets). "If such an engine is unavailable, a fallback in-process
//! runner may be provided, but it must implement the same state machine."
//!
//! `WorkflowRuntime` is that seam. It names exactly the three activities the
//! indexing loop retries individually (spec.md §4.7: "On any exception from
//! `fetch`/`upsert`/`bulkSet`"), so each can carry its own activity-level
//! retry policy (§5: "up to 3 attempts with initial 1 s, backoff ×2, cap
//! 30 s") independently of the loop's own consecutive-error/backoff counter.
//! `TokioWorkflowRuntime` is the fallback runner; a production deployment
//! swaps in an adapter over a real workflow engine without touching
//! `IndexingEngine`.

use crate::error::EngineError;
use async_trait::async_trait;
use knowledge_connectors::{Connector, CursorUpdate, IndexRequest};
use knowledge_model::{Cursor, DataSource, Document};
use knowledge_store::{BulkReport, CursorStatusStore, IndexStore};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Per-activity retry policy (spec.md §5: durable workflow-level retries).
#[derive(Debug, Clone, Copy)]
pub struct ActivityRetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for ActivityRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2,
            max_backoff: Duration::from_secs(30),
        }
    }
}

async fn with_retry<F, Fut, T, E>(policy: &ActivityRetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    let mut backoff = policy.initial_backoff;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * policy.backoff_multiplier).min(policy.max_backoff);
            }
        }
    }
}

/// The durable-workflow seam for the three retried activities of the
/// indexing loop. Not generic so a trait object (`Arc<dyn WorkflowRuntime>`)
/// stays usable from `IndexingEngine`.
#[async_trait]
pub trait WorkflowRuntime: Send + Sync {
    async fn run_fetch(
        &self,
        connector: &dyn Connector,
        cursor: Option<&Cursor>,
        request: &IndexRequest,
    ) -> Result<ConnectorBatch, EngineError>;

    async fn run_upsert(&self, index_store: &IndexStore, src: DataSource, docs: &[Document]) -> Result<BulkReport, EngineError>;

    async fn run_bulk_set_hashes(
        &self,
        cursor_store: &CursorStatusStore,
        src: DataSource,
        hashes: &HashMap<String, String>,
    ) -> Result<(), EngineError>;
}

/// Plain struct mirror of `knowledge_connectors::ConnectorResult` — kept
/// separate so this module does not need to re-export the connector crate's
/// result type through the runtime trait's return position.
pub struct ConnectorBatch {
    pub documents: Vec<Document>,
    pub new_cursor: CursorUpdate,
    pub has_more: bool,
    pub batch_last_sync: Option<String>,
}

/// In-process fallback runner (spec.md §9). Applies `ActivityRetryPolicy` to
/// each activity; does not provide cross-process durability or history
/// resets beyond what `IndexingEngine`'s own loop already does in-memory.
#[derive(Default)]
pub struct TokioWorkflowRuntime {
    policy: ActivityRetryPolicy,
}

impl TokioWorkflowRuntime {
    pub fn new() -> Self {
        Self { policy: ActivityRetryPolicy::default() }
    }

    pub fn with_policy(policy: ActivityRetryPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl WorkflowRuntime for TokioWorkflowRuntime {
    async fn run_fetch(
        &self,
        connector: &dyn Connector,
        cursor: Option<&Cursor>,
        request: &IndexRequest,
    ) -> Result<ConnectorBatch, EngineError> {
        let result = with_retry(&self.policy, || connector.fetch(cursor, request)).await?;
        Ok(ConnectorBatch {
            documents: result.documents,
            new_cursor: result.new_cursor,
            has_more: result.has_more,
            batch_last_sync: result.batch_last_sync,
        })
    }

    async fn run_upsert(&self, index_store: &IndexStore, src: DataSource, docs: &[Document]) -> Result<BulkReport, EngineError> {
        Ok(with_retry(&self.policy, || index_store.upsert_documents(src, docs)).await?)
    }

    async fn run_bulk_set_hashes(
        &self,
        cursor_store: &CursorStatusStore,
        src: DataSource,
        hashes: &HashMap<String, String>,
    ) -> Result<(), EngineError> {
        Ok(with_retry(&self.policy, || cursor_store.bulk_set_document_hashes(src, hashes)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let policy = ActivityRetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            backoff_multiplier: 2,
            max_backoff: Duration::from_millis(4),
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), &str> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("boom") }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_returns_first_success() {
        let policy = ActivityRetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            backoff_multiplier: 2,
            max_backoff: Duration::from_millis(4),
        };
        let calls = AtomicU32::new(0);
        let result = with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 1 { Err("boom") } else { Ok::<_, &str>(42) } }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
