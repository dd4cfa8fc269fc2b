//! Tunables fixed by spec.md §4.3, §4.4, §4.7.

/// Target chunk size in BPE tokens.
pub const CHUNK_TOKENS: usize = 512;
/// Sentence-granular overlap seeded into the next chunk, in BPE tokens.
pub const OVERLAP_TOKENS: usize = 64;
/// Below this token count, content is emitted as a single chunk.
pub const MIN_TOKENS_FOR_CHUNKING: usize = 600;
/// Batch size for `mget`/bulk-index/bulk-embed operations (C4, C5).
pub const BULK_BATCH_SIZE: usize = 100;
/// Cap on successful batches before the indexing engine continues as a new
/// durable-workflow execution (C7).
pub const MAX_BATCHES_PER_EXECUTION: usize = 50;
/// Consecutive-error cap before a run is aborted with `error` status (C7).
pub const MAX_CONSECUTIVE_ERRORS: u32 = 3;
/// Stagger between per-source task starts in `indexAll` (C7, §5).
pub const INDEX_ALL_STAGGER_MS: u64 = 1_000;
/// Sleep between batches; longer every 500th processed document (C7).
pub const INTER_BATCH_SLEEP_MS: u64 = 500;
pub const INTER_BATCH_SLEEP_MILESTONE_MS: u64 = 2_000;
pub const INTER_BATCH_SLEEP_MILESTONE: usize = 500;
/// TTL for persisted `JobStatus` records (C1).
pub const JOB_STATUS_TTL_SECS: u64 = 24 * 60 * 60;
/// TTL for the query-embedding cache (C5, §6).
pub const QUERY_EMBEDDING_CACHE_TTL_SECS: u64 = 300;
/// Number of leading characters of the pre-enrichment chunk kept in
/// `_originalContent` for display (§3).
pub const ORIGINAL_CONTENT_CHARS: usize = 8_000;
/// Number of leading hex characters of the content SHA-256 kept as
/// `_contentHash` (§3).
pub const CONTENT_HASH_HEX_LEN: usize = 16;
/// Character cap applied to reranker document inputs (§4.5).
pub const RERANK_DOC_CHARS: usize = 4_096;
/// Cap on candidates considered for reranking (§4.4 stage 2).
pub const RERANK_CANDIDATE_CAP: usize = 200;
/// `knn` candidate counts used by the vector query builder (§4.4).
pub const KNN_K: usize = 200;
pub const KNN_NUM_CANDIDATES: usize = 400;
