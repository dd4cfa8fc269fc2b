//! Structural navigation (spec.md §4.8): prev/next/siblings/parent/children
//! across chunk, datapoint, and context scopes.

use crate::error::SearchError;
use knowledge_model::{chunk_id, DataSource, EnrichedItem};
use knowledge_store::{ListOptions, SearchBackend};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
    Siblings,
    Parent,
    Children,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Chunk,
    Datapoint,
    Context,
}

#[derive(Debug, Clone)]
pub struct NavigateRequest {
    pub id: String,
    pub direction: Direction,
    pub scope: Scope,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationMeta {
    pub has_prev: bool,
    pub has_next: bool,
    pub parent_id: Option<String>,
    pub context_type: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NavigateResponse {
    pub current: Option<EnrichedItem>,
    pub related: Vec<EnrichedItem>,
    pub navigation: NavigationMeta,
}

impl NavigateResponse {
    fn unknown() -> Self {
        Self {
            current: None,
            related: Vec::new(),
            navigation: NavigationMeta { has_prev: false, has_next: false, parent_id: None, context_type: "unknown".into() },
        }
    }
}

pub struct NavigationService {
    backend: Arc<dyn SearchBackend>,
}

impl NavigationService {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    pub async fn navigate(&self, request: NavigateRequest) -> Result<NavigateResponse, SearchError> {
        let current = match self.backend.get(&request.id).await? {
            Some(item) => Some(item),
            // A chunked document's own id is never stored as a row (only its
            // chunks are); resolve navigation against it anyway by
            // synthesizing a logical-parent view from its first chunk.
            None => self.backend.get(&chunk_id(&request.id, 0)).await?.map(|first_chunk| EnrichedItem {
                id: request.id.clone(),
                parent_doc_id: None,
                chunk_index: None,
                ..first_chunk
            }),
        };
        let Some(current) = current else {
            return Ok(NavigateResponse::unknown());
        };

        let parent_id = resolve_parent_id(&current);
        let context_type = derive_context_type(&current);

        let related = match request.direction {
            Direction::Parent => match &parent_id {
                Some(pid) => self.backend.get(pid).await?.into_iter().collect(),
                None => Vec::new(),
            },
            Direction::Children => self.children(&current, request.limit).await?,
            Direction::Prev | Direction::Next => match request.scope {
                Scope::Chunk => self.chunk_step(&current, request.direction).await?,
                Scope::Datapoint | Scope::Context => self.context_step(&current, request.direction, request.limit).await?,
            },
            Direction::Siblings => match request.scope {
                Scope::Chunk => self.siblings(&current, request.limit).await?,
                Scope::Datapoint | Scope::Context => self.context_correlated(&current, request.limit).await?,
            },
        };

        let (has_prev, has_next) = match (request.direction, request.scope) {
            (Direction::Next, Scope::Chunk) => (false, !related.is_empty()),
            (Direction::Prev, Scope::Chunk) => (!related.is_empty(), false),
            _ => (false, false),
        };

        Ok(NavigateResponse {
            current: Some(current),
            related,
            navigation: NavigationMeta { has_prev, has_next, parent_id, context_type },
        })
    }

    async fn chunk_step(&self, current: &EnrichedItem, direction: Direction) -> Result<Vec<EnrichedItem>, SearchError> {
        let (Some(parent), Some(idx), Some(total)) = (&current.parent_doc_id, current.chunk_index, current.total_chunks) else {
            return Ok(Vec::new());
        };
        let target = match direction {
            Direction::Next => idx.checked_add(1),
            Direction::Prev => idx.checked_sub(1),
            _ => unreachable!(),
        };
        let Some(target) = target else { return Ok(Vec::new()) };
        if target >= total {
            return Ok(Vec::new());
        }
        let id = chunk_id(parent, target);
        Ok(self.backend.get(&id).await?.into_iter().collect())
    }

    /// All chunks sharing `current`'s parent (spec.md §4.8: "siblings: all
    /// chunks with the same parentDocId") — not capped by `limit`.
    async fn siblings(&self, current: &EnrichedItem, _limit: usize) -> Result<Vec<EnrichedItem>, SearchError> {
        let Some(parent) = &current.parent_doc_id else { return Ok(Vec::new()) };
        let total = current.total_chunks.unwrap_or(0);
        let mut out = Vec::new();
        for i in 0..total {
            let id = chunk_id(parent, i);
            if id == current.id {
                continue;
            }
            if let Some(item) = self.backend.get(&id).await? {
                out.push(item);
            }
        }
        Ok(out)
    }

    async fn children(&self, current: &EnrichedItem, limit: usize) -> Result<Vec<EnrichedItem>, SearchError> {
        // Union of items whose `parentId` metadata points at the current
        // logical id, and chunks whose `parentDocId == currentId`.
        let logical_id = current.logical_id();
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }
        if let Some(total) = current.total_chunks {
            for i in 0..total {
                let id = chunk_id(&current.id, i);
                if let Some(item) = self.backend.get(&id).await? {
                    out.push(item);
                    if out.len() >= limit {
                        return Ok(out);
                    }
                }
            }
        }
        let options = ListOptions { limit, offset: 0, ..Default::default() };
        let listed = self.backend.list(current.source, &options).await?;
        for hit in listed.results {
            if resolve_parent_id(&hit.item).as_deref() == Some(logical_id) {
                out.push(hit.item);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Datapoint/context scope prev/next: no stable total ordering exists
    /// outside chunk scope, so this resolves to the correlated set and lets
    /// the caller treat it as "the adjacent context" (spec.md §4.8).
    async fn context_step(
        &self,
        current: &EnrichedItem,
        _direction: Direction,
        limit: usize,
    ) -> Result<Vec<EnrichedItem>, SearchError> {
        self.context_correlated(current, limit).await
    }

    async fn context_correlated(&self, current: &EnrichedItem, limit: usize) -> Result<Vec<EnrichedItem>, SearchError> {
        let Some(key) = correlation_key(current) else { return Ok(Vec::new()) };
        let options = ListOptions { limit, offset: 0, ..Default::default() };
        let listed = self.backend.list(current.source, &options).await?;
        Ok(listed
            .results
            .into_iter()
            .map(|h| h.item)
            .filter(|item| item.id != current.id && correlation_key(item).as_deref() == Some(key.as_str()))
            .take(limit)
            .collect())
    }
}

/// `metadata.parentId ?? metadata.parentDocId`, with the wiki-comment
/// rewrite: a wiki comment's parent id is prefixed with `"wiki_"` to match
/// the id form the connector actually stores it under.
fn resolve_parent_id(item: &EnrichedItem) -> Option<String> {
    let raw = item
        .extra
        .get("parentId")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| item.parent_doc_id.clone());

    raw.map(|id| {
        if item.source == DataSource::Wiki && item.item_type.as_deref() == Some("comment") {
            format!("wiki_{id}")
        } else {
            id
        }
    })
}

/// Per-source correlation key for datapoint/context scope (spec.md §4.8):
/// chat → threadTs or channelId; mail → threadId; code-host → parentId or
/// repo; drive → folder path or its prefix. `None` when nothing correlates.
fn correlation_key(item: &EnrichedItem) -> Option<String> {
    match item.source {
        DataSource::Chat => item.thread_ts.clone().or_else(|| item.channel_id.clone()),
        DataSource::Mail => item.extra.get("threadId").and_then(|v| v.as_str()).map(str::to_string),
        DataSource::CodeHost => item
            .extra
            .get("parentId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| item.extra.get("repo").and_then(|v| v.as_str()).map(str::to_string)),
        DataSource::Drive => item.extra.get("folderPath").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}

/// `contextType` derivation (spec.md §4.8): source-specific and stable.
fn derive_context_type(item: &EnrichedItem) -> String {
    match item.source {
        DataSource::Chat => {
            if item.thread_ts.is_some() {
                "thread".into()
            } else {
                "channel".into()
            }
        }
        DataSource::IssueTracker => {
            if item.item_type.as_deref() == Some("comment") {
                "issue".into()
            } else {
                "project".into()
            }
        }
        DataSource::CodeHost => match item.item_type.as_deref() {
            Some("pr-comment") | Some("pr-review") => "pull_request".into(),
            _ => "repository".into(),
        },
        DataSource::Mail => "thread".into(),
        DataSource::Drive => "folder".into(),
        DataSource::Wiki => "space".into(),
        DataSource::Calendar => "calendar".into(),
    }
}
