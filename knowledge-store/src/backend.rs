//! The C4 "Index Store" wire contract (spec.md §4.4): mapping, bulk
//! upsert/update, lexical+kNN+hybrid query builder, list/count/get/delete.

use crate::error::StoreError;
use async_trait::async_trait;
use knowledge_model::{DataSource, EnrichedItem, Metadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Keyword,
    Vector,
    Hybrid,
}

/// Filters shared by `search` and `list` (spec.md §4.4 "Filters").
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub source_terms: Option<Vec<DataSource>>,
    pub where_scalars: Metadata,
    /// Inclusive start of `createdAtTs` range, epoch-ms.
    pub start_ts: Option<i64>,
    /// Inclusive end of `createdAtTs` range, epoch-ms (end-of-day per §4.4).
    pub end_ts: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub search_type: SearchType,
    /// Normalized query text (keyword/hybrid).
    pub query: String,
    /// Query embedding (vector/hybrid).
    pub query_vector: Option<Vec<f32>>,
    pub filters: SearchFilters,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub item: EnrichedItem,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub where_scalars: Metadata,
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

/// A metadata-only change (no new embedding) applied via partial update:
/// the full re-enriched item, minus its embedding, which the backend must
/// preserve from the existing stored row (spec.md §4.4: "if a chunk's text
/// is unchanged, no embedding call is made even if metadata changed").
#[derive(Debug, Clone)]
pub struct PartialUpdate {
    pub item: EnrichedItem,
}

/// Outcome of a bulk write; errors are counted and logged, never fatal to
/// the caller (spec.md §4.4 step 5, §7 `IndexBulkPartialError`).
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    pub attempted: usize,
    pub succeeded_ids: Vec<String>,
    pub failed: usize,
    pub first_errors: Vec<String>,
}

impl BulkReport {
    pub fn record_success(&mut self, id: String) {
        self.attempted += 1;
        self.succeeded_ids.push(id);
    }

    pub fn record_failure(&mut self, reason: String) {
        self.attempted += 1;
        self.failed += 1;
        if self.first_errors.len() < 3 {
            self.first_errors.push(reason);
        }
    }

    pub fn merge(&mut self, other: BulkReport) {
        self.attempted += other.attempted;
        self.failed += other.failed;
        self.succeeded_ids.extend(other.succeeded_ids);
        for reason in other.first_errors {
            if self.first_errors.len() < 3 {
                self.first_errors.push(reason);
            }
        }
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn ensure_mapping(&self, dimension: usize) -> Result<(), StoreError>;

    async fn bulk_upsert(&self, items: &[EnrichedItem]) -> Result<BulkReport, StoreError>;

    async fn bulk_partial_update(&self, updates: &[PartialUpdate]) -> Result<BulkReport, StoreError>;

    /// Batched hash lookup; positional, `None` for missing ids.
    async fn mget_hashes(&self, ids: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    async fn search(&self, options: &SearchOptions) -> Result<SearchResults, StoreError>;

    /// Parent-only listing: items with no `parentDocId`.
    async fn list(&self, src: DataSource, options: &ListOptions) -> Result<SearchResults, StoreError>;

    async fn count(&self, src: DataSource) -> Result<usize, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<EnrichedItem>, StoreError>;

    /// Removes the row `id` then purges chunks (`parentDocId == id`).
    async fn delete_document(&self, src: DataSource, id: &str) -> Result<(), StoreError>;

    /// Delete-by-query on `source == src`.
    async fn delete_collection(&self, src: DataSource) -> Result<(), StoreError>;
}

/// Normalizes a raw query string per spec.md §4.4: trim, collapse
/// whitespace; pass through unchanged if it looks like an id
/// (`^[A-Z]+-\d+$` or `^#?\d+$`).
pub fn normalize_query(raw: &str) -> String {
    let trimmed = raw.trim();
    if looks_like_id(trimmed) {
        return trimmed.to_string();
    }
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_id(s: &str) -> bool {
    let is_ticket_id = {
        let mut chars = s.chars();
        let mut saw_letter = false;
        let mut ok = true;
        let mut saw_dash = false;
        let mut saw_digit_after_dash = false;
        for c in chars.by_ref() {
            if !saw_dash {
                if c.is_ascii_uppercase() {
                    saw_letter = true;
                } else if c == '-' && saw_letter {
                    saw_dash = true;
                } else {
                    ok = false;
                    break;
                }
            } else if c.is_ascii_digit() {
                saw_digit_after_dash = true;
            } else {
                ok = false;
                break;
            }
        }
        ok && saw_letter && saw_dash && saw_digit_after_dash
    };
    if is_ticket_id {
        return true;
    }
    let digits = s.strip_prefix('#').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_query("  hello   world  "), "hello world");
    }

    #[test]
    fn normalize_passes_through_ticket_ids() {
        assert_eq!(normalize_query("PROJ-123"), "PROJ-123");
    }

    #[test]
    fn normalize_passes_through_numeric_ids() {
        assert_eq!(normalize_query("#456"), "#456");
        assert_eq!(normalize_query("456"), "456");
    }

    #[test]
    fn normalize_still_collapses_non_id_looking_text_with_numbers() {
        assert_eq!(normalize_query("  issue  42  please  "), "issue 42 please");
    }
}
