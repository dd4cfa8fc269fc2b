//! Turns a connector-supplied `Document` into its `EnrichedItem`(s): chunk
//! (C3), prepend the context header (spec.md §4.3/§4.4 — "the engine, not
//! the chunker" — done here in C4 since this is where chunk ids/hashes are
//! minted), flatten metadata onto named fields.

use knowledge_chunker::ChunkHint;
use knowledge_model::{
    chunk_id, DataSource, Document, EnrichedItem, Metadata, CONTENT_HASH_HEX_LEN, ORIGINAL_CONTENT_CHARS,
};
use sha2::{Digest, Sha256};

/// Named metadata keys promoted to `EnrichedItem` fields; anything else
/// lands in `extra`.
const KNOWN_KEYS: &[&str] = &[
    "title",
    "author",
    "project",
    "channel",
    "channelId",
    "space",
    "status",
    "priority",
    "url",
    "itemType",
    "createdAt",
    "updatedAt",
    "labels",
    "isOwner",
    "isAssignedToMe",
    "isAuthor",
    "isOrganizer",
    "reactionCount",
    "mentionCount",
    "threadDepth",
    "threadTs",
    "priorityWeight",
    "labelCount",
    "relevanceScore",
];

pub fn content_hash(text: &str) -> String {
    let digest = hex::encode(Sha256::digest(text.as_bytes()));
    digest.chars().take(CONTENT_HASH_HEX_LEN).collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn epoch_ms(iso: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(iso).ok().map(|dt| dt.timestamp_millis())
}

/// Before upsert, a short multi-line block naming the document title,
/// source, and source-specific fields is prepended to the stored content
/// and the embedder input — never hashed (spec.md §4.3).
pub fn build_context_header(doc: &Document) -> String {
    let mut lines = Vec::new();
    if let Some(title) = doc.metadata.get("title").and_then(|v| v.as_str()) {
        lines.push(format!("Title: {title}"));
    }
    lines.push(format!("Source: {}", doc.source.as_str()));
    for (label, key) in [
        ("Project", "project"),
        ("Channel", "channel"),
        ("Sender", "author"),
        ("Path", "path"),
        ("Space", "space"),
    ] {
        if let Some(v) = doc.metadata.get(key).and_then(|v| v.as_str()) {
            lines.push(format!("{label}: {v}"));
        }
    }
    if let Some(time) = doc
        .metadata
        .get("updatedAt")
        .or_else(|| doc.metadata.get("createdAt"))
        .and_then(|v| v.as_str())
    {
        lines.push(format!("Time: {time}"));
    }
    format!("{}\n\n", lines.join("\n"))
}

/// Copies well-known metadata keys onto `item`'s named fields; everything
/// else (including any source-specific facet the connector added) stays in
/// `item.extra` for dynamic-mapping lookups.
pub fn apply_metadata(item: &mut EnrichedItem, meta: &Metadata) {
    let mut extra = meta.clone();
    for key in KNOWN_KEYS {
        extra.remove(*key);
    }
    item.extra = extra;

    item.title = meta.get("title").and_then(|v| v.as_str()).map(str::to_string);
    item.author = meta.get("author").and_then(|v| v.as_str()).map(str::to_string);
    item.project = meta.get("project").and_then(|v| v.as_str()).map(str::to_string);
    item.channel = meta.get("channel").and_then(|v| v.as_str()).map(str::to_string);
    item.channel_id = meta.get("channelId").and_then(|v| v.as_str()).map(str::to_string);
    item.space = meta.get("space").and_then(|v| v.as_str()).map(str::to_string);
    item.status = meta.get("status").and_then(|v| v.as_str()).map(str::to_string);
    item.priority = meta.get("priority").and_then(|v| v.as_str()).map(str::to_string);
    item.url = meta.get("url").and_then(|v| v.as_str()).map(str::to_string);
    item.item_type = meta.get("itemType").and_then(|v| v.as_str()).map(str::to_string);
    if let Some(knowledge_model::MetaValue::StringArray(labels)) = meta.get("labels") {
        item.labels = labels.clone();
    }

    item.created_at = meta.get("createdAt").and_then(|v| v.as_str()).map(str::to_string);
    item.created_at_ts = item.created_at.as_deref().and_then(epoch_ms);
    item.updated_at = meta.get("updatedAt").and_then(|v| v.as_str()).map(str::to_string);
    item.updated_at_ts = item.updated_at.as_deref().and_then(epoch_ms);

    item.is_owner = meta.get("isOwner").and_then(|v| v.as_bool()).unwrap_or(false);
    item.is_assigned_to_me = meta.get("isAssignedToMe").and_then(|v| v.as_bool()).unwrap_or(false);
    item.is_author = meta.get("isAuthor").and_then(|v| v.as_bool()).unwrap_or(false);
    item.is_organizer = meta.get("isOrganizer").and_then(|v| v.as_bool()).unwrap_or(false);
    item.reaction_count = meta.get("reactionCount").and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
    item.mention_count = meta.get("mentionCount").and_then(|v| v.as_f64()).unwrap_or(0.0) as u32;
    item.thread_depth = meta.get("threadDepth").and_then(|v| v.as_f64()).map(|n| n as u32);
    item.thread_ts = meta.get("threadTs").and_then(|v| v.as_str()).map(str::to_string);
    item.priority_weight = meta.get("priorityWeight").and_then(|v| v.as_f64()).unwrap_or(0.0);
    item.label_count = meta.get("labelCount").and_then(|v| v.as_f64()).unwrap_or(item.labels.len() as f64) as u32;
    item.relevance_score = meta.get("relevanceScore").and_then(|v| v.as_f64()).unwrap_or(0.0);
}

/// Sanitizes, chunks, and builds the full `EnrichedItem` list for one
/// document (spec.md §4.4 upsert step 1). The content hash is always taken
/// over the pre-header chunk text; the header is appended only to `content`.
pub fn build_items(doc: &Document, src: DataSource) -> Result<Vec<EnrichedItem>, knowledge_chunker::ChunkerError> {
    let path = doc.metadata.get("path").and_then(|v| v.as_str());
    let hint = ChunkHint { path, pre_chunked: doc.pre_chunked.as_deref() };
    let raw_chunks = knowledge_chunker::chunk(&doc.content, &hint)?;
    let total = raw_chunks.len();
    let header = build_context_header(doc);

    let mut items = Vec::with_capacity(total);
    for (i, raw_chunk) in raw_chunks.into_iter().enumerate() {
        let hash = content_hash(&raw_chunk);
        let original_content = truncate_chars(&raw_chunk, ORIGINAL_CONTENT_CHARS);
        let content = format!("{header}{raw_chunk}");
        let id = if total > 1 { chunk_id(&doc.id, i) } else { doc.id.clone() };

        let mut item = EnrichedItem::new(id, src, content, original_content, hash);
        apply_metadata(&mut item, &doc.metadata);
        if total > 1 {
            item.parent_doc_id = Some(doc.id.clone());
            item.chunk_index = Some(i);
            item.total_chunks = Some(total);
        }
        items.push(item);
    }
    Ok(items)
}

/// The ids `build_items` would mint for `doc`, without paying for hashing or
/// metadata flattening. Used by the indexing engine (C7) to restrict a
/// document-level hash write to ids that actually made it into the index
/// (spec.md §7 `IndexBulkPartialError`: "caller restricts `bulkSet` to
/// known-successful ids").
pub fn expected_item_ids(doc: &Document) -> Result<Vec<String>, knowledge_chunker::ChunkerError> {
    let path = doc.metadata.get("path").and_then(|v| v.as_str());
    let hint = ChunkHint { path, pre_chunked: doc.pre_chunked.as_deref() };
    let raw_chunks = knowledge_chunker::chunk(&doc.content, &hint)?;
    let total = raw_chunks.len();
    Ok(if total > 1 {
        (0..total).map(|i| chunk_id(&doc.id, i)).collect()
    } else {
        vec![doc.id.clone()]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_model::MetaValue;

    #[test]
    fn content_hash_is_stable_and_trimmed_to_16_hex_chars() {
        let hash = content_hash("hello world");
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, content_hash("hello world"));
    }

    #[test]
    fn header_includes_title_and_source_but_not_missing_fields() {
        let mut doc = Document::new("D1", DataSource::Wiki, "body text");
        doc.metadata.insert("title".into(), MetaValue::Str("Runbook".into()));
        let header = build_context_header(&doc);
        assert!(header.contains("Title: Runbook"));
        assert!(header.contains("Source: wiki"));
        assert!(!header.contains("Project:"));
    }

    #[test]
    fn build_items_hashes_pre_header_text_only() {
        let doc = Document::new("D1", DataSource::Wiki, "short body");
        let items = build_items(&doc, DataSource::Wiki).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_hash, content_hash("short body"));
        assert!(items[0].content.ends_with("short body"));
        assert!(items[0].content.starts_with("Source: wiki"));
    }

    #[test]
    fn expected_item_ids_matches_build_items_ids() {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running. ";
        let doc = Document::new("D1", DataSource::Wiki, sentence.repeat(400));
        let expected = expected_item_ids(&doc).unwrap();
        let built: Vec<String> = build_items(&doc, DataSource::Wiki).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(expected, built);
    }

    #[test]
    fn multi_chunk_documents_get_parent_linkage() {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running. ";
        let doc = Document::new("D1", DataSource::Wiki, sentence.repeat(400));
        let items = build_items(&doc, DataSource::Wiki).unwrap();
        assert!(items.len() > 1);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.parent_doc_id.as_deref(), Some("D1"));
            assert_eq!(item.chunk_index, Some(i));
            assert_eq!(item.id, chunk_id("D1", i));
        }
    }
}
