//! In-memory reference `SearchBackend` — good enough to make every testable
//! property in spec.md §8 checkable without a running search cluster.
//! Grounded on the teacher's `chunking_store::sqlite_repo::SqliteRepo`
//! ("stubbed ... in-memory for now").

use crate::backend::{
    BulkReport, ListOptions, PartialUpdate, SearchBackend, SearchFilters, SearchHit,
    SearchOptions, SearchResults, SearchType,
};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use knowledge_model::{DataSource, EnrichedItem};

#[derive(Default)]
pub struct InMemoryBackend {
    items: DashMap<String, EnrichedItem>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn passes_filters(item: &EnrichedItem, filters: &SearchFilters) -> bool {
        if let Some(sources) = &filters.source_terms {
            if !sources.contains(&item.source) {
                return false;
            }
        }
        for (key, expected) in &filters.where_scalars {
            let matches = field_value(item, key).as_ref() == Some(expected);
            if !matches {
                return false;
            }
        }
        if let Some(start) = filters.start_ts {
            if item.created_at_ts.unwrap_or(i64::MIN) < start {
                return false;
            }
        }
        if let Some(end) = filters.end_ts {
            if item.created_at_ts.unwrap_or(i64::MAX) > end {
                return false;
            }
        }
        true
    }

    fn keyword_score(item: &EnrichedItem, query: &str) -> f64 {
        if query.is_empty() {
            return 0.0;
        }
        let q = query.to_lowercase();
        let content_hits = item.content.to_lowercase().matches(&q).count() as f64;
        let title_hits = item
            .title
            .as_deref()
            .map(|t| t.to_lowercase().matches(&q).count())
            .unwrap_or(0) as f64;
        content_hits + title_hits * 3.0
    }

    fn vector_score(item: &EnrichedItem, query_vector: &[f32]) -> f64 {
        match &item.embedding {
            Some(emb) => cosine_similarity(emb, query_vector),
            None => 0.0,
        }
    }
}

fn field_value(item: &EnrichedItem, key: &str) -> Option<knowledge_model::MetaValue> {
    use knowledge_model::MetaValue;
    match key {
        "project" => item.project.clone().map(MetaValue::Str),
        "channel" => item.channel.clone().map(MetaValue::Str),
        "channelId" => item.channel_id.clone().map(MetaValue::Str),
        "space" => item.space.clone().map(MetaValue::Str),
        "status" => item.status.clone().map(MetaValue::Str),
        "priority" => item.priority.clone().map(MetaValue::Str),
        "author" => item.author.clone().map(MetaValue::Str),
        _ => item.extra.get(key).cloned(),
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn ensure_mapping(&self, _dimension: usize) -> Result<(), StoreError> {
        // The in-memory backend has no schema to declare up front.
        Ok(())
    }

    async fn bulk_upsert(&self, items: &[EnrichedItem]) -> Result<BulkReport, StoreError> {
        let mut report = BulkReport::default();
        for item in items {
            self.items.insert(item.id.clone(), item.clone());
            report.record_success(item.id.clone());
        }
        Ok(report)
    }

    async fn bulk_partial_update(&self, updates: &[PartialUpdate]) -> Result<BulkReport, StoreError> {
        let mut report = BulkReport::default();
        for update in updates {
            let mut new_item = update.item.clone();
            if let Some(existing) = self.items.get(&update.item.id) {
                new_item.embedding = existing.embedding.clone();
            } else {
                report.record_failure(format!("no existing row for id {}", update.item.id));
                continue;
            }
            self.items.insert(new_item.id.clone(), new_item);
            report.record_success(update.item.id.clone());
        }
        Ok(report)
    }

    async fn mget_hashes(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        Ok(ids
            .iter()
            .map(|id| self.items.get(id).map(|i| i.content_hash.clone()))
            .collect())
    }

    async fn search(&self, options: &SearchOptions) -> Result<SearchResults, StoreError> {
        let fetch_size = options.limit + options.offset;
        let mut scored: Vec<SearchHit> = self
            .items
            .iter()
            .filter(|entry| Self::passes_filters(entry.value(), &options.filters))
            .map(|entry| {
                let item = entry.value().clone();
                let score = match options.search_type {
                    SearchType::Keyword => Self::keyword_score(&item, &options.query),
                    SearchType::Vector => options
                        .query_vector
                        .as_deref()
                        .map(|qv| Self::vector_score(&item, qv))
                        .unwrap_or(0.0),
                    SearchType::Hybrid => {
                        let keyword = Self::keyword_score(&item, &options.query);
                        let vector = options
                            .query_vector
                            .as_deref()
                            .map(|qv| Self::vector_score(&item, qv))
                            .unwrap_or(0.0);
                        keyword + vector
                    }
                };
                SearchHit { item, score }
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let total = scored.len();
        scored.truncate(fetch_size.max(1));
        Ok(SearchResults { results: scored, total })
    }

    async fn list(&self, src: DataSource, options: &ListOptions) -> Result<SearchResults, StoreError> {
        let filters = SearchFilters {
            source_terms: Some(vec![src]),
            where_scalars: options.where_scalars.clone(),
            start_ts: options.start_ts,
            end_ts: options.end_ts,
        };
        let mut matched: Vec<SearchHit> = self
            .items
            .iter()
            .filter(|e| e.value().source == src && !e.value().is_chunk())
            .filter(|e| Self::passes_filters(e.value(), &filters))
            .map(|e| SearchHit { item: e.value().clone(), score: 0.0 })
            .collect();
        matched.sort_by(|a, b| a.item.id.cmp(&b.item.id));
        let total = matched.len();
        let page = matched
            .into_iter()
            .skip(options.offset)
            .take(options.limit.max(1))
            .collect();
        Ok(SearchResults { results: page, total })
    }

    async fn count(&self, src: DataSource) -> Result<usize, StoreError> {
        Ok(self.items.iter().filter(|e| e.value().source == src).count())
    }

    async fn get(&self, id: &str) -> Result<Option<EnrichedItem>, StoreError> {
        Ok(self.items.get(id).map(|i| i.clone()))
    }

    async fn delete_document(&self, _src: DataSource, id: &str) -> Result<(), StoreError> {
        self.items.remove(id);
        self.items.retain(|_, item| item.parent_doc_id.as_deref() != Some(id));
        Ok(())
    }

    async fn delete_collection(&self, src: DataSource) -> Result<(), StoreError> {
        self.items.retain(|_, item| item.source != src);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_model::chunk_id;

    fn item(id: &str, source: DataSource, content: &str) -> EnrichedItem {
        EnrichedItem {
            id: id.to_string(),
            source,
            content: content.to_string(),
            original_content: content.to_string(),
            content_hash: "hash".to_string(),
            embedding: None,
            title: None,
            author: None,
            project: None,
            channel: None,
            channel_id: None,
            space: None,
            labels: vec![],
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
            extra: Default::default(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let backend = InMemoryBackend::new();
        let doc = item("PROJ-1", DataSource::IssueTracker, "hello world");
        backend.bulk_upsert(&[doc.clone()]).await.unwrap();
        let back = backend.get("PROJ-1").await.unwrap().unwrap();
        assert_eq!(back.content, doc.content);
    }

    #[tokio::test]
    async fn delete_document_removes_row_and_its_chunks() {
        let backend = InMemoryBackend::new();
        let mut parent = item("P", DataSource::Wiki, "parent");
        parent.total_chunks = Some(2);
        let mut c0 = item(&chunk_id("P", 0), DataSource::Wiki, "chunk 0");
        c0.parent_doc_id = Some("P".to_string());
        let mut c1 = item(&chunk_id("P", 1), DataSource::Wiki, "chunk 1");
        c1.parent_doc_id = Some("P".to_string());
        backend.bulk_upsert(&[parent, c0, c1]).await.unwrap();

        backend.delete_document(DataSource::Wiki, "P").await.unwrap();

        assert!(backend.get("P").await.unwrap().is_none());
        assert!(backend.get(&chunk_id("P", 0)).await.unwrap().is_none());
        assert!(backend.get(&chunk_id("P", 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_update_preserves_existing_embedding() {
        let backend = InMemoryBackend::new();
        let mut doc = item("PROJ-1", DataSource::IssueTracker, "hello world");
        doc.embedding = Some(vec![1.0, 2.0, 3.0]);
        backend.bulk_upsert(&[doc.clone()]).await.unwrap();

        let mut updated = doc.clone();
        updated.embedding = None;
        updated.status = Some("closed".to_string());
        backend
            .bulk_partial_update(&[PartialUpdate { item: updated }])
            .await
            .unwrap();

        let back = backend.get("PROJ-1").await.unwrap().unwrap();
        assert_eq!(back.embedding, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(back.status, Some("closed".to_string()));
    }

    #[tokio::test]
    async fn list_excludes_chunks() {
        let backend = InMemoryBackend::new();
        let parent = item("P", DataSource::Wiki, "parent");
        let mut c0 = item(&chunk_id("P", 0), DataSource::Wiki, "chunk");
        c0.parent_doc_id = Some("P".to_string());
        backend.bulk_upsert(&[parent, c0]).await.unwrap();

        let results = backend
            .list(DataSource::Wiki, &ListOptions { limit: 10, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.results[0].item.id, "P");
    }

    #[tokio::test]
    async fn delete_collection_removes_only_matching_source() {
        let backend = InMemoryBackend::new();
        backend
            .bulk_upsert(&[
                item("A", DataSource::Chat, "a"),
                item("B", DataSource::Mail, "b"),
            ])
            .await
            .unwrap();
        backend.delete_collection(DataSource::Chat).await.unwrap();
        assert!(backend.get("A").await.unwrap().is_none());
        assert!(backend.get("B").await.unwrap().is_some());
    }
}
