//! Deterministic paginated connector over an in-memory document list — used
//! in tests and local development in place of a live vendor API.

use crate::{Connector, ConnectorError, ConnectorResult, CursorUpdate, IndexRequest};
use async_trait::async_trait;
use knowledge_model::{Cursor, DataSource, Document};

pub struct FixtureConnector {
    source: DataSource,
    documents: Vec<Document>,
    page_size: usize,
}

impl FixtureConnector {
    pub fn new(source: DataSource, documents: Vec<Document>) -> Self {
        Self { source, documents, page_size: 10 }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn offset_of(cursor: Option<&Cursor>) -> usize {
        cursor
            .and_then(|c| c.sync_token.as_deref())
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Connector for FixtureConnector {
    fn source_name(&self) -> DataSource {
        self.source
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, cursor: Option<&Cursor>, _request: &IndexRequest) -> Result<ConnectorResult, ConnectorError> {
        let offset = Self::offset_of(cursor);
        let end = (offset + self.page_size).min(self.documents.len());
        let page: Vec<Document> = self.documents.get(offset..end).unwrap_or_default().to_vec();
        let has_more = end < self.documents.len();

        Ok(ConnectorResult {
            documents: page,
            new_cursor: CursorUpdate { sync_token: Some(end.to_string()), metadata: Default::default() },
            has_more,
            batch_last_sync: None,
        })
    }
}
