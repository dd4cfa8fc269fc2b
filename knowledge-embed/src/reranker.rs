//! Cross-encoder reranker (spec.md §4.5): one batched call over
//! `{query, documents[:4096 chars], topN}` returning `[{index,
//! relevanceScore}]`. No counterpart in the teacher; the HTTP shape mirrors
//! `http::HttpEmbedder` since both are thin wrappers over a remote model.

use async_trait::async_trait;
use knowledge_model::RERANK_DOC_CHARS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankError {
    #[error("reranker request failed: {0}")]
    Request(String),
    #[error("reranker response decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    pub index: usize,
    pub relevance_score: f64,
}

#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, query: &str, documents: &[&str], top_n: usize) -> Result<Vec<RerankResult>, RerankError>;
}

#[derive(Debug, Clone)]
pub struct HttpRerankerConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
}

pub struct HttpReranker {
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: Vec<&'a str>,
    #[serde(rename = "topN")]
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponseEntry {
    index: usize,
    #[serde(rename = "relevanceScore")]
    relevance_score: f64,
}

impl HttpReranker {
    pub fn new(config: HttpRerankerConfig) -> Self {
        Self { endpoint: config.endpoint, auth_token: config.auth_token, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, documents: &[&str], top_n: usize) -> Result<Vec<RerankResult>, RerankError> {
        let truncated: Vec<&str> = documents
            .iter()
            .map(|d| {
                let cut = d.char_indices().nth(RERANK_DOC_CHARS).map(|(i, _)| i).unwrap_or(d.len());
                &d[..cut]
            })
            .collect();

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&RerankRequest { query, documents: truncated, top_n });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| RerankError::Request(e.to_string()))?;
        let entries: Vec<RerankResponseEntry> =
            response.json().await.map_err(|e| RerankError::Decode(e.to_string()))?;
        Ok(entries
            .into_iter()
            .map(|e| RerankResult { index: e.index, relevance_score: e.relevance_score })
            .collect())
    }
}
