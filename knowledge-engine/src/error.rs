use knowledge_connectors::ConnectorError;
use knowledge_model::DataSource;
use knowledge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),
    #[error("no connector registered for source {0}")]
    NoConnector(DataSource),
    #[error("indexing run already in progress for source {0}")]
    AlreadyRunning(DataSource),
    #[error("run for source {source} aborted after {consecutive_errors} consecutive errors: {last_error}")]
    Aborted { source: DataSource, consecutive_errors: u32, last_error: String },
}
