use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("connector is not configured")]
    NotConfigured,
    #[error("upstream request failed: {0}")]
    Upstream(String),
}
