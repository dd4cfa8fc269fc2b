use crate::{KeyValueStore, KvError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if at <= Instant::now())
    }
}

/// `dashmap`-backed in-memory `KeyValueStore`: the zero-config default used
/// in tests and anywhere a real KV backend isn't wired up. Grounded on the
/// teacher's `SqliteRepo` ("stubbed ... in-memory for now") reference-impl
/// pattern.
#[derive(Default)]
pub struct InMemoryKv {
    entries: DashMap<String, Entry>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(key);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), KvError> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let now = Instant::now();
        Ok(self
            .entries
            .iter()
            .filter(|kv| kv.key().starts_with(prefix))
            .filter(|kv| !matches!(kv.value().expires_at, Some(at) if at <= now))
            .map(|kv| kv.key().clone())
            .collect())
    }
}
