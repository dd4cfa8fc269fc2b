//! C1 (cursor/status), C2 (settings) and C4 (index store) of the design —
//! the durable-state and search-index layer. Grounded on the teacher's
//! `chunking_store` crate: same stub-default `SqliteRepo`-style reference
//! implementation, generalized from a single `ChunkStore` trait into the
//! full spec.md §4.4 `SearchBackend` contract.

pub mod backend;
pub mod cursor_store;
#[cfg(feature = "elasticsearch-backend")]
pub mod elasticsearch_backend;
pub mod enrich;
pub mod error;
pub mod index_store;
pub mod keys;
pub mod memory_backend;
pub mod settings_store;

pub use backend::{
    BulkReport, ListOptions, PartialUpdate, SearchBackend, SearchFilters, SearchHit, SearchOptions, SearchResults,
    SearchType,
};
pub use cursor_store::CursorStatusStore;
#[cfg(feature = "elasticsearch-backend")]
pub use elasticsearch_backend::ElasticsearchBackend;
pub use enrich::expected_item_ids;
pub use error::StoreError;
pub use index_store::IndexStore;
pub use memory_backend::InMemoryBackend;
pub use settings_store::SettingsStore;
