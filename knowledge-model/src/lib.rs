//! Shared data model for the knowledge-collector workspace: the types every
//! other crate exchanges across its boundary (C1–C9 of the design).

pub mod constants;
pub mod cursor;
pub mod document;
pub mod error;
pub mod item;
pub mod job_status;
pub mod settings;

pub use constants::*;
pub use cursor::Cursor;
pub use document::{Document, MetaValue, Metadata};
pub use error::ModelError;
pub use item::EnrichedItem;
pub use job_status::{JobStatus, JobStatusState};
pub use settings::{MailFilter, Settings, SourceFilter};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of source tags (spec.md §3 "DataSource").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    IssueTracker,
    Chat,
    Mail,
    Drive,
    Wiki,
    Calendar,
    CodeHost,
}

impl DataSource {
    pub const ALL: [DataSource; 7] = [
        DataSource::IssueTracker,
        DataSource::Chat,
        DataSource::Mail,
        DataSource::Drive,
        DataSource::Wiki,
        DataSource::Calendar,
        DataSource::CodeHost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::IssueTracker => "issue-tracker",
            DataSource::Chat => "chat",
            DataSource::Mail => "mail",
            DataSource::Drive => "drive",
            DataSource::Wiki => "wiki",
            DataSource::Calendar => "calendar",
            DataSource::CodeHost => "code-host",
        }
    }

    /// Half-life (days) used by the recency personalization signal (spec.md §4.4).
    pub fn recency_half_life_days(&self) -> f64 {
        match self {
            DataSource::Chat => 7.0,
            DataSource::Mail => 14.0,
            DataSource::Calendar => 14.0,
            DataSource::IssueTracker => 30.0,
            DataSource::CodeHost => 60.0,
            DataSource::Wiki => 90.0,
            DataSource::Drive => 90.0,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataSource {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "issue-tracker" => DataSource::IssueTracker,
            "chat" => DataSource::Chat,
            "mail" => DataSource::Mail,
            "drive" => DataSource::Drive,
            "wiki" => DataSource::Wiki,
            "calendar" => DataSource::Calendar,
            "code-host" => DataSource::CodeHost,
            other => return Err(ModelError::UnknownDataSource(other.to_string())),
        })
    }
}

/// Builds the canonical chunk id form `{parent_id}_chunk_{i}` (spec.md §3/§6:
/// "a bit-level contract; changing it requires a full reindex").
pub fn chunk_id(parent_id: &str, index: usize) -> String {
    format!("{parent_id}_chunk_{index}")
}

/// Splits a canonical chunk id back into `(parent_id, index)`, if it is one.
pub fn parse_chunk_id(id: &str) -> Option<(&str, usize)> {
    let marker = "_chunk_";
    let pos = id.rfind(marker)?;
    let idx_str = &id[pos + marker.len()..];
    let idx: usize = idx_str.parse().ok()?;
    Some((&id[..pos], idx))
}
