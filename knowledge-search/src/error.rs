//! Error taxonomy for the C8 search/navigation surface (spec.md §7
//! "errors inside the search/navigation path propagate to the HTTP caller
//! as 5xx with a short message").

use knowledge_embed::EmbedderError;
use knowledge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend error: {0}")]
    Backend(#[from] StoreError),
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedderError),
}
