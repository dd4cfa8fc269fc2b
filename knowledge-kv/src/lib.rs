//! Shared key-value store abstraction backing C1 (cursors/status/locks), C2
//! (settings) and the C5 query-embedding cache. Grounded on the teacher's
//! stub-default / feature-gated-real-backend split (see DESIGN.md).

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis_backend;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory::InMemoryKv;
#[cfg(feature = "redis-backend")]
pub use redis_backend::RedisKv;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value backend unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A minimal async key-value store: get/set-with-ttl/delete/scan-prefix.
/// Every method that can fail returns `Result`; callers in C1/C5 are
/// expected to treat errors as cache misses rather than propagate them,
/// except where spec.md explicitly calls for `KVUnavailable` to be fatal
/// (the indexing loop's hash/cursor writes).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), KvError>;

    async fn delete(&self, key: &str) -> Result<(), KvError>;

    /// Lists keys with the given prefix, in no particular order. Used for
    /// bounded hash-map scans (C1 `removeDocumentHashes`).
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError>;
}

/// JSON convenience helpers layered over any `KeyValueStore`. Kept off the
/// base trait so `KeyValueStore` stays object-safe (`Arc<dyn KeyValueStore>`
/// is how every other crate holds it).
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    async fn set_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), KvError> {
        let bytes = serde_json::to_vec(value).map_err(|e| KvError::Serialization(e.to_string()))?;
        self.set(key, bytes, ttl).await
    }

    /// Get and deserialize a JSON value. A deserialize failure is treated as
    /// "absent" (spec.md §4.2: "corrupt persisted blobs return null/empty
    /// rather than surfacing parse errors").
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, KvError> {
        match self.get(key).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes).ok()),
            None => Ok(None),
        }
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStoreExt for T {}
