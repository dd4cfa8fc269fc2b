use crate::document::Metadata;
use crate::DataSource;
use serde::{Deserialize, Serialize};

/// What the index actually stores: a document or one of its chunks
/// (spec.md §3 "Enriched Item").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedItem {
    /// The document id, or `{parent_id}_chunk_{i}` for chunks.
    pub id: String,
    pub source: DataSource,
    /// Enriched content: context header prepended to the chunk text.
    pub content: String,
    /// First 8000 chars of the pre-enrichment chunk, stored unindexed.
    pub original_content: String,
    /// First 16 hex chars of SHA-256 over the pre-enrichment chunk.
    pub content_hash: String,
    /// Dense embedding vector, dimensionality fixed for the life of an index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// ISO-8601 timestamps plus their epoch-ms mirrors (§3: "the engine
    /// must maintain both whenever it sees an ISO timestamp").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at_ts: Option<i64>,

    /// Present only on chunk items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,

    /// Personalization signals (§3/§4.4 stage 3).
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_assigned_to_me: bool,
    #[serde(default)]
    pub is_author: bool,
    #[serde(default)]
    pub is_organizer: bool,
    #[serde(default)]
    pub reaction_count: u32,
    #[serde(default)]
    pub mention_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub priority_weight: f64,
    #[serde(default)]
    pub label_count: u32,
    #[serde(default)]
    pub relevance_score: f64,

    /// Additional per-source keyword facets not promoted to a named field
    /// (dynamic mapping extension point, §4.4).
    #[serde(default)]
    pub extra: Metadata,
}

impl EnrichedItem {
    /// Builds a bare item with every personalization/optional field at its
    /// zero value, ready for a caller to fill in via metadata flattening.
    pub fn new(
        id: impl Into<String>,
        source: DataSource,
        content: impl Into<String>,
        original_content: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            content: content.into(),
            original_content: original_content.into(),
            content_hash: content_hash.into(),
            embedding: None,
            title: None,
            author: None,
            project: None,
            channel: None,
            channel_id: None,
            space: None,
            labels: Vec::new(),
            status: None,
            priority: None,
            url: None,
            item_type: None,
            created_at: None,
            created_at_ts: None,
            updated_at: None,
            updated_at_ts: None,
            parent_doc_id: None,
            chunk_index: None,
            total_chunks: None,
            is_owner: false,
            is_assigned_to_me: false,
            is_author: false,
            is_organizer: false,
            reaction_count: 0,
            mention_count: 0,
            thread_depth: None,
            thread_ts: None,
            priority_weight: 0.0,
            label_count: 0,
            relevance_score: 0.0,
            extra: Metadata::new(),
        }
    }

    /// `true` if this item is a chunk (has a `parentDocId`).
    pub fn is_chunk(&self) -> bool {
        self.parent_doc_id.is_some()
    }

    /// The "logical id" this item belongs to for navigation/grouping
    /// purposes: the parent doc id for a chunk, or its own id otherwise.
    pub fn logical_id(&self) -> &str {
        self.parent_doc_id.as_deref().unwrap_or(&self.id)
    }
}
