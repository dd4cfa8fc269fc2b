//! Query-embedding cache (spec.md §4.5 `getQueryEmbedding`): key =
//! `"search:embedding:" + sha256(q)[0..31]`, value = raw little-endian
//! float32 bytes, TTL 300s. Cache errors on read or write are swallowed —
//! a miss or a failed `set` must never fail the call.

use crate::{Embedder, EmbedderError};
use knowledge_kv::KeyValueStore;
use knowledge_model::QUERY_EMBEDDING_CACHE_TTL_SECS;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

pub struct QueryEmbeddingCache {
    kv: Arc<dyn KeyValueStore>,
}

impl QueryEmbeddingCache {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    fn key(query: &str) -> String {
        let digest = hex::encode(Sha256::digest(query.as_bytes()));
        let prefix: String = digest.chars().take(31).collect();
        format!("search:embedding:{prefix}")
    }

    /// Returns the cached vector, proceeding as a miss on any decode or
    /// backend error.
    async fn get(&self, query: &str) -> Option<Vec<f32>> {
        let bytes = match self.kv.get(&Self::key(query)).await {
            Ok(Some(bytes)) => bytes,
            _ => return None,
        };
        if bytes.len() % 4 != 0 {
            return None;
        }
        Some(bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
    }

    /// Best-effort write; failures are swallowed.
    async fn set(&self, query: &str, vector: &[f32]) {
        let mut bytes = Vec::with_capacity(vector.len() * 4);
        for v in vector {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let _ = self
            .kv
            .set(&Self::key(query), bytes, Some(Duration::from_secs(QUERY_EMBEDDING_CACHE_TTL_SECS)))
            .await;
    }

    /// Cache-through: returns the cached vector if present, else embeds the
    /// (already normalized) query via `embedder` and stores the result.
    pub async fn get_or_compute(
        &self,
        query: &str,
        embedder: &dyn Embedder,
    ) -> Result<Vec<f32>, EmbedderError> {
        if let Some(cached) = self.get(query).await {
            return Ok(cached);
        }
        let vector = embedder.embed(query).await?;
        self.set(query, &vector).await;
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Embedder, EmbedderInfo, ProviderKind};
    use async_trait::async_trait;
    use knowledge_kv::InMemoryKv;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        info: EmbedderInfo,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 2.0, 3.0])
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

    #[tokio::test]
    async fn second_call_for_same_query_hits_cache() {
        let cache = QueryEmbeddingCache::new(Arc::new(InMemoryKv::new()));
        let embedder = CountingEmbedder {
            info: EmbedderInfo {
                provider: ProviderKind::Http,
                embedding_model_id: "x".into(),
                dimension: 3,
                text_repr_version: "v1".into(),
            },
            calls: AtomicUsize::new(0),
        };

        let first = cache.get_or_compute("hello world", &embedder).await.unwrap();
        let second = cache.get_or_compute("hello world", &embedder).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_queries_do_not_collide() {
        assert_ne!(QueryEmbeddingCache::key("alpha"), QueryEmbeddingCache::key("beta"));
    }
}
