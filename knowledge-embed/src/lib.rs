//! C5 Embedding & Rerank Client (spec.md §4.5). Grounded on the teacher's
//! `embedder` module: same `ProviderKind`/`EmbedderInfo`/`EmbedderError`
//! shape and the stub-default / feature-gated-real-backend split, widened
//! to an async trait since the default provider talks HTTP.

pub mod cache;
pub mod error;
pub mod http;
#[cfg(feature = "onnx-local")]
pub mod onnx;
pub mod reranker;

pub use error::EmbedderError;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Http,
    OnnxLocal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderInfo {
    pub provider: ProviderKind,
    pub embedding_model_id: String,
    pub dimension: usize,
    pub text_repr_version: String,
}

/// Core interface for all embedder implementations (spec.md §4.5
/// `generateEmbeddings`). `embed_batch` must preserve input order — callers
/// may assume `result[i]` corresponds to `texts[i]` regardless of how the
/// underlying provider orders its response.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;
    fn info(&self) -> &EmbedderInfo;
}

/// Splits `texts` into batches of 100 (spec.md §4.5) and concatenates the
/// per-batch results, preserving overall order.
pub async fn generate_embeddings(
    embedder: &dyn Embedder,
    texts: &[&str],
) -> Result<Vec<Vec<f32>>, EmbedderError> {
    const BATCH: usize = knowledge_model::BULK_BATCH_SIZE;
    let mut out = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(BATCH) {
        out.extend(embedder.embed_batch(chunk).await?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    /// Deterministic stand-in embedder, hashing text into a fixed-size
    /// vector — used only to exercise `generate_embeddings`' batching
    /// without a network round trip.
    struct FakeEmbedder {
        info: EmbedderInfo,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
            let mut out = Vec::with_capacity(self.info.dimension);
            for i in 0..self.info.dimension {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                i.hash(&mut hasher);
                out.push((hasher.finish() % 1000) as f32 / 1000.0);
            }
            Ok(out)
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
    async fn generate_embeddings_preserves_order_across_batches() {
        let embedder = FakeEmbedder {
            info: EmbedderInfo {
                provider: ProviderKind::Http,
                embedding_model_id: "fake".into(),
                dimension: 4,
                text_repr_version: "v1".into(),
            },
        };
        let texts = ["alpha", "beta", "gamma"];
        let result = generate_embeddings(&embedder, &texts).await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], embedder.embed("alpha").await.unwrap());
        assert_eq!(result[1], embedder.embed("beta").await.unwrap());
    }
}
