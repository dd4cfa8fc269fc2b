use crate::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed metadata scalar (spec.md §9 Design Notes: "the free-form metadata
/// map is replaced by a small sum type ... plus a raw JSON escape hatch").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Str(String),
    Bool(bool),
    Number(f64),
    StringArray(Vec<String>),
    Raw(serde_json::Value),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Str(value.to_string())
    }
}
impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Str(value)
    }
}
impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}
impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}
impl From<Vec<String>> for MetaValue {
    fn from(value: Vec<String>) -> Self {
        MetaValue::StringArray(value)
    }
}

/// Free-form mapping of typed metadata values, keyed by field name.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A document as handed to the core by a connector, pre-index (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable, per-source id.
    pub id: String,
    pub source: DataSource,
    /// UTF-8 text content.
    pub content: String,
    pub metadata: Metadata,
    /// Ordered sequence of text chunks supplied by the connector, if any.
    /// When present the chunker uses these verbatim (after sanitization).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_chunked: Option<Vec<String>>,
}

impl Document {
    pub fn new(id: impl Into<String>, source: DataSource, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source,
            content: content.into(),
            metadata: Metadata::new(),
            pre_chunked: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_pre_chunked(mut self, chunks: Vec<String>) -> Self {
        self.pre_chunked = Some(chunks);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_value_json_round_trips() {
        let v = MetaValue::StringArray(vec!["a".into(), "b".into()]);
        let json = serde_json::to_string(&v).unwrap();
        let back: MetaValue = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn document_json_round_trips() {
        let mut doc = Document::new("PROJ-1", DataSource::IssueTracker, "hello world");
        doc.metadata.insert("project".into(), "PROJ".into());
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, doc.id);
        assert_eq!(back.metadata.get("project").unwrap().as_str(), Some("PROJ"));
    }
}
