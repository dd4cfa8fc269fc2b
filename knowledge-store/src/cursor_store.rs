//! C1 Cursor & Status Store (spec.md §4.1).

use crate::error::StoreError;
use crate::keys;
use knowledge_model::{Cursor, JobStatus, JobStatusState, DataSource, BULK_BATCH_SIZE, JOB_STATUS_TTL_SECS};
use knowledge_kv::{KeyValueStore, KeyValueStoreExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const LOCK_TTL_SECS: u64 = 15 * 60;

pub struct CursorStatusStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CursorStatusStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn get_cursor(&self, src: DataSource) -> Result<Option<Cursor>, StoreError> {
        Ok(self.kv.get_json(&keys::cursor(src)).await?)
    }

    pub async fn save_cursor(&self, cursor: &Cursor) -> Result<(), StoreError> {
        self.kv.set_json(&keys::cursor(cursor.source), cursor, None).await?;
        Ok(())
    }

    /// Atomically clears cursor and hash map; status is left untouched
    /// (spec.md §4.1: "status is separately cleared by caller if desired").
    pub async fn reset_cursor(&self, src: DataSource) -> Result<(), StoreError> {
        self.kv.delete(&keys::cursor(src)).await?;
        let prefix = keys::hashes_prefix(src);
        let all_keys = self.kv.scan_prefix(&prefix).await?;
        for batch in all_keys.chunks(BULK_BATCH_SIZE) {
            for key in batch {
                self.kv.delete(key).await?;
            }
        }
        Ok(())
    }

    /// Positional lookup; empty input short-circuits without I/O.
    pub async fn bulk_get_document_hashes(
        &self,
        src: DataSource,
        ids: &[String],
    ) -> Result<Vec<Option<String>>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let bytes = self.kv.get(&keys::hash_entry(src, id)).await?;
            out.push(bytes.map(|b| String::from_utf8_lossy(&b).to_string()));
        }
        Ok(out)
    }

    /// No-op on an empty map.
    pub async fn bulk_set_document_hashes(
        &self,
        src: DataSource,
        map: &HashMap<String, String>,
    ) -> Result<(), StoreError> {
        if map.is_empty() {
            return Ok(());
        }
        for (id, hash) in map {
            self.kv
                .set(&keys::hash_entry(src, id), hash.as_bytes().to_vec(), None)
                .await?;
        }
        Ok(())
    }

    /// Removes the entry `id` and every entry whose key matches `id_*`
    /// (all chunks of the same parent), bounded by `BULK_BATCH_SIZE` so
    /// large hash maps do not block (spec.md §4.1).
    pub async fn remove_document_hashes(&self, src: DataSource, id: &str) -> Result<(), StoreError> {
        let prefix = keys::hashes_prefix(src);
        let all_keys = self.kv.scan_prefix(&prefix).await?;
        let chunk_prefix = format!("{id}_");
        let matching: Vec<String> = all_keys
            .into_iter()
            .filter(|key| {
                let Some(suffix) = key.strip_prefix(&prefix) else {
                    return false;
                };
                suffix == id || suffix.starts_with(&chunk_prefix)
            })
            .collect();
        for batch in matching.chunks(BULK_BATCH_SIZE) {
            for key in batch {
                self.kv.delete(key).await?;
            }
        }
        Ok(())
    }

    /// Non-blocking acquire with a TTL safety net. Returns `true` if the
    /// lock was acquired, `false` if already held.
    pub async fn acquire_lock(&self, src: DataSource) -> Result<bool, StoreError> {
        let key = keys::lock(src);
        if self.kv.get(&key).await?.is_some() {
            return Ok(false);
        }
        self.kv
            .set(&key, b"1".to_vec(), Some(Duration::from_secs(LOCK_TTL_SECS)))
            .await?;
        Ok(true)
    }

    pub async fn release_lock(&self, src: DataSource) -> Result<(), StoreError> {
        self.kv.delete(&keys::lock(src)).await?;
        Ok(())
    }

    pub async fn get_job_status(&self, src: DataSource) -> Result<JobStatus, StoreError> {
        Ok(self
            .kv
            .get_json(&keys::status(src))
            .await?
            .unwrap_or_else(|| JobStatus::idle(src)))
    }

    /// Returns an idle default for sources with no record.
    pub async fn get_all_job_status(&self, sources: &[DataSource]) -> Result<Vec<JobStatus>, StoreError> {
        let mut out = Vec::with_capacity(sources.len());
        for &src in sources {
            out.push(self.get_job_status(src).await?);
        }
        Ok(out)
    }

    pub async fn save_job_status(&self, status: &JobStatus) -> Result<(), StoreError> {
        self.kv
            .set_json(
                &keys::status(status.source),
                status,
                Some(Duration::from_secs(JOB_STATUS_TTL_SECS)),
            )
            .await?;
        Ok(())
    }

    /// On process start-up: any source whose persisted status is `running`
    /// is forcibly transitioned to `error` with an explanatory message and
    /// its lock released (spec.md §4.7).
    pub async fn recover_interrupted_runs(&self) -> Result<(), StoreError> {
        for src in DataSource::ALL {
            let mut status = self.get_job_status(src).await?;
            if status.status == JobStatusState::Running {
                status.status = JobStatusState::Error;
                status.error = Some("service restarted during indexing".to_string());
                self.save_job_status(&status).await?;
                self.release_lock(src).await?;
            }
        }
        Ok(())
    }
}
