//! C6 Connector Contract (spec.md §4.6). No teacher precedent — the
//! `async_trait` shape follows the pack's own HTTP-facing traits. Every
//! connector is handed a previous `Cursor` (or none) plus an `IndexRequest`
//! and must never throw on a stale resumption token.

pub mod error;
pub mod fixture;
pub mod registry;
pub mod stale_token;

pub use error::ConnectorError;
pub use fixture::FixtureConnector;
pub use registry::ConnectorRegistry;
pub use stale_token::StaleTokenConnector;

use async_trait::async_trait;
use knowledge_model::{Cursor, DataSource, Document, Metadata, SourceFilter};

/// Request options for one `fetch`/`startIndexing` call (spec.md §4.7: the
/// per-run `request`, merged over persisted `Settings` before the loop).
#[derive(Debug, Clone, Default)]
pub struct IndexRequest {
    pub full_reindex: bool,
    pub filter: SourceFilter,
}

/// Partial cursor fields a connector reports back (spec.md §4.6
/// `ConnectorResult.newCursor`): `sync_token` is the sole resumption handle.
#[derive(Debug, Clone, Default)]
pub struct CursorUpdate {
    pub sync_token: Option<String>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectorResult {
    pub documents: Vec<Document>,
    pub new_cursor: CursorUpdate,
    pub has_more: bool,
    /// Max "modified" timestamp seen in the batch; becomes the cursor's
    /// `lastSync` if present (spec.md §4.6).
    pub batch_last_sync: Option<String>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    fn source_name(&self) -> DataSource;

    fn is_configured(&self) -> bool;

    /// Idempotent per `(cursor, request)` when upstream data is stable.
    /// On a stale `syncToken` (e.g. upstream "410 Gone"), returns an empty,
    /// `hasMore=false` batch preserving the previous `lastSync` rather than
    /// erroring — the next run starts over.
    async fn fetch(&self, cursor: Option<&Cursor>, request: &IndexRequest) -> Result<ConnectorResult, ConnectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_connector_reports_configured() {
        let connector = FixtureConnector::new(DataSource::Wiki, vec![]);
        assert!(connector.is_configured());
        assert_eq!(connector.source_name(), DataSource::Wiki);
    }
}
