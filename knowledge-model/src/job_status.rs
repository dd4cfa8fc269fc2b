use crate::DataSource;
use serde::{Deserialize, Serialize};

/// spec.md §3 "JobStatus". TTL-bounded (24h) at the store layer, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusState {
    Idle,
    Running,
    Completed,
    Error,
}

impl Default for JobStatusState {
    fn default() -> Self {
        JobStatusState::Idle
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobStatus {
    pub source: DataSource,
    pub status: JobStatusState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(default)]
    pub documents_indexed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<String>,
}

impl JobStatus {
    pub fn idle(source: DataSource) -> Self {
        Self {
            source,
            status: JobStatusState::Idle,
            last_sync: None,
            documents_indexed: 0,
            error: None,
            last_error: None,
            last_error_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_default_has_zero_documents() {
        let s = JobStatus::idle(DataSource::Wiki);
        assert_eq!(s.status, JobStatusState::Idle);
        assert_eq!(s.documents_indexed, 0);
    }

    #[test]
    fn round_trips_through_json() {
        let mut s = JobStatus::idle(DataSource::Mail);
        s.status = JobStatusState::Error;
        s.last_error = Some("boom".into());
        let json = serde_json::to_string(&s).unwrap();
        let back: JobStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
