//! C9 Health Probes (spec.md §4.9). The `Connector` contract has no
//! dedicated probe method, so connectivity/auth are inferred from a
//! lightweight `fetch(None, IndexRequest::default())` call — the same
//! cheapest idempotent operation every connector already implements.
//! Probes never propagate an error: any failure becomes `connected: false`.

use knowledge_connectors::{Connector, ConnectorRegistry, IndexRequest};
use knowledge_model::DataSource;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct HealthProbe {
    pub source: DataSource,
    pub configured: bool,
    pub connected: bool,
    pub authenticated: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub checked_at: String,
}

impl HealthProbe {
    fn unconfigured(source: DataSource) -> Self {
        Self {
            source,
            configured: false,
            connected: false,
            authenticated: false,
            latency_ms: 0,
            error: None,
            checked_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Probes a single connector. Never panics or returns `Err`.
pub async fn probe(connector: &dyn Connector) -> HealthProbe {
    let source = connector.source_name();
    if !connector.is_configured() {
        return HealthProbe::unconfigured(source);
    }

    let start = Instant::now();
    let result = connector.fetch(None, &IndexRequest::default()).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let checked_at = chrono::Utc::now().to_rfc3339();

    match result {
        Ok(_) => HealthProbe { source, configured: true, connected: true, authenticated: true, latency_ms, error: None, checked_at },
        Err(err) => HealthProbe {
            source,
            configured: true,
            connected: false,
            authenticated: false,
            latency_ms,
            error: Some(err.to_string()),
            checked_at,
        },
    }
}

/// Probes every source in `sources` against `registry`, independently and in
/// parallel (spec.md §4.9). A source with no registered connector reports as
/// unconfigured rather than panicking.
pub async fn probe_all(registry: &ConnectorRegistry, sources: &[DataSource]) -> Vec<HealthProbe> {
    let futures_iter = sources.iter().map(|&source| async move {
        match registry.get(source) {
            Some(connector) => probe(connector.as_ref()).await,
            None => HealthProbe::unconfigured(source),
        }
    });
    futures::future::join_all(futures_iter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_connectors::FixtureConnector;
    use std::sync::Arc;

    #[tokio::test]
    async fn unconfigured_source_skips_the_network_call() {
        struct NeverConfigured;
        #[async_trait::async_trait]
        impl Connector for NeverConfigured {
            fn source_name(&self) -> DataSource {
                DataSource::Mail
            }
            fn is_configured(&self) -> bool {
                false
            }
            async fn fetch(
                &self,
                _cursor: Option<&knowledge_model::Cursor>,
                _request: &IndexRequest,
            ) -> Result<knowledge_connectors::ConnectorResult, knowledge_connectors::ConnectorError> {
                panic!("must not be called when unconfigured");
            }
        }

        let result = probe(&NeverConfigured).await;
        assert!(!result.configured);
        assert!(!result.connected);
    }

    #[tokio::test]
    async fn configured_fixture_reports_connected() {
        let connector = FixtureConnector::new(DataSource::Wiki, vec![]);
        let result = probe(&connector).await;
        assert!(result.configured);
        assert!(result.connected);
    }

    #[tokio::test]
    async fn probe_all_reports_unconfigured_for_missing_connectors() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![])));

        let results = probe_all(&registry, &[DataSource::Wiki, DataSource::Mail]).await;
        assert_eq!(results.len(), 2);
        let mail = results.iter().find(|p| p.source == DataSource::Mail).unwrap();
        assert!(!mail.configured);
    }
}
