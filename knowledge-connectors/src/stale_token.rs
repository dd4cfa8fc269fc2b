//! Reference connector exercising spec.md §4.6's stale-token recovery rule:
//! when the saved `syncToken` no longer matches what upstream considers
//! valid, return an empty, `hasMore=false` batch preserving `lastSync`
//! rather than erroring.

use crate::{Connector, ConnectorError, ConnectorResult, CursorUpdate, IndexRequest};
use async_trait::async_trait;
use knowledge_model::{Cursor, DataSource, Document};

pub struct StaleTokenConnector {
    source: DataSource,
    valid_token: String,
    documents: Vec<Document>,
}

impl StaleTokenConnector {
    pub fn new(source: DataSource, valid_token: impl Into<String>, documents: Vec<Document>) -> Self {
        Self { source, valid_token: valid_token.into(), documents }
    }
}

#[async_trait]
impl Connector for StaleTokenConnector {
    fn source_name(&self) -> DataSource {
        self.source
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, cursor: Option<&Cursor>, _request: &IndexRequest) -> Result<ConnectorResult, ConnectorError> {
        let Some(cursor) = cursor else {
            return Ok(ConnectorResult {
                documents: self.documents.clone(),
                new_cursor: CursorUpdate { sync_token: Some(self.valid_token.clone()), metadata: Default::default() },
                has_more: false,
                batch_last_sync: None,
            });
        };

        let token_is_stale = cursor.sync_token.as_deref() != Some(self.valid_token.as_str());
        if token_is_stale {
            return Ok(ConnectorResult {
                documents: Vec::new(),
                new_cursor: CursorUpdate { sync_token: None, metadata: Default::default() },
                has_more: false,
                batch_last_sync: Some(cursor.last_sync.clone()),
            });
        }

        Ok(ConnectorResult {
            documents: Vec::new(),
            new_cursor: CursorUpdate { sync_token: Some(self.valid_token.clone()), metadata: Default::default() },
            has_more: false,
            batch_last_sync: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_token_yields_empty_batch_preserving_last_sync() {
        let connector = StaleTokenConnector::new(DataSource::Mail, "good-token", vec![]);
        let mut cursor = Cursor::new(DataSource::Mail, "2026-01-01T00:00:00Z");
        cursor.sync_token = Some("expired-token".to_string());

        let result = connector.fetch(Some(&cursor), &IndexRequest::default()).await.unwrap();
        assert!(result.documents.is_empty());
        assert!(!result.has_more);
        assert_eq!(result.batch_last_sync, Some("2026-01-01T00:00:00Z".to_string()));
        assert_eq!(result.new_cursor.sync_token, None);
    }

    #[tokio::test]
    async fn valid_token_proceeds_normally() {
        let connector = StaleTokenConnector::new(DataSource::Mail, "good-token", vec![]);
        let mut cursor = Cursor::new(DataSource::Mail, "2026-01-01T00:00:00Z");
        cursor.sync_token = Some("good-token".to_string());

        let result = connector.fetch(Some(&cursor), &IndexRequest::default()).await.unwrap();
        assert_eq!(result.new_cursor.sync_token, Some("good-token".to_string()));
    }
}
