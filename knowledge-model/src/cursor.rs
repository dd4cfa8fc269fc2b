use crate::document::Metadata;
use crate::DataSource;
use serde::{Deserialize, Serialize};

/// Per-source resumption token (spec.md §3/GLOSSARY).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cursor {
    pub source: DataSource,
    /// ISO-8601 timestamp of the most recent successful batch.
    pub last_sync: String,
    /// Opaque, connector-chosen resumption handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_token: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Cursor {
    pub fn new(source: DataSource, last_sync: impl Into<String>) -> Self {
        Self {
            source,
            last_sync: last_sync.into(),
            sync_token: None,
            metadata: Metadata::new(),
        }
    }

    /// The `configKey` persisted into `cursor.metadata.configKey` after each
    /// successful batch (spec.md §4.7).
    pub fn config_key(&self) -> Option<&str> {
        self.metadata.get("configKey").and_then(|v| v.as_str())
    }
}
