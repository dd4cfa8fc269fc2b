use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown data source: {0}")]
    UnknownDataSource(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
