use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("kv store unavailable: {0}")]
    KvUnavailable(String),
    #[error("search backend timeout: {0}")]
    SearchBackendTimeout(String),
    #[error("search backend error: {0}")]
    SearchBackend(String),
    #[error("chunker error: {0}")]
    Chunker(#[from] knowledge_chunker::ChunkerError),
    #[error("embedding error: {0}")]
    Embed(String),
}

impl From<knowledge_kv::KvError> for StoreError {
    fn from(e: knowledge_kv::KvError) -> Self {
        StoreError::KvUnavailable(e.to_string())
    }
}
