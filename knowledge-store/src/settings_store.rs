//! C2 Settings Store (spec.md §4.2).

use crate::error::StoreError;
use crate::keys;
use knowledge_model::{DataSource, SourceFilter};
use knowledge_kv::{KeyValueStore, KeyValueStoreExt};
use std::collections::HashSet;
use std::sync::Arc;

pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Corrupt persisted blobs return `None` rather than surfacing a parse
    /// error (spec.md §4.2) — `get_json` already folds that in.
    pub async fn get_filter(&self, src: DataSource) -> Result<Option<SourceFilter>, StoreError> {
        Ok(self.kv.get_json(&keys::settings(src)).await?)
    }

    pub async fn save_filter(&self, src: DataSource, filter: &SourceFilter) -> Result<(), StoreError> {
        self.kv.set_json(&keys::settings(src), filter, None).await?;
        Ok(())
    }

    async fn disabled_set(&self) -> Result<HashSet<DataSource>, StoreError> {
        Ok(self
            .kv
            .get_json::<Vec<DataSource>>(keys::disabled_sources())
            .await?
            .unwrap_or_default()
            .into_iter()
            .collect())
    }

    /// Idempotent: enabling an already-enabled source (or disabling an
    /// already-disabled one) is a no-op change to the persisted set.
    pub async fn set_source_enabled(&self, src: DataSource, enabled: bool) -> Result<(), StoreError> {
        let mut disabled = self.disabled_set().await?;
        if enabled {
            disabled.remove(&src);
        } else {
            disabled.insert(src);
        }
        let list: Vec<DataSource> = disabled.into_iter().collect();
        self.kv.set_json(keys::disabled_sources(), &list, None).await?;
        Ok(())
    }

    /// Effective enabled sources = `ALL_SOURCES \ disabled`.
    pub async fn enabled_sources(&self) -> Result<Vec<DataSource>, StoreError> {
        let disabled = self.disabled_set().await?;
        Ok(DataSource::ALL.into_iter().filter(|s| !disabled.contains(s)).collect())
    }
}
