//! "A plain constructor-injected map suffices" (spec.md §9 design note) —
//! no plugin discovery, just a map the caller populates at start-up.

use crate::Connector;
use knowledge_model::DataSource;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<DataSource, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.insert(connector.source_name(), connector);
    }

    pub fn get(&self, source: DataSource) -> Option<&Arc<dyn Connector>> {
        self.connectors.get(&source)
    }

    /// Sources with a registered, configured connector.
    pub fn enabled_sources(&self) -> Vec<DataSource> {
        self.connectors
            .iter()
            .filter(|(_, c)| c.is_configured())
            .map(|(src, _)| *src)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixtureConnector;

    #[test]
    fn registered_connector_is_retrievable_by_source() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![])));
        assert!(registry.get(DataSource::Wiki).is_some());
        assert!(registry.get(DataSource::Chat).is_none());
    }

    #[test]
    fn enabled_sources_reflects_is_configured() {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixtureConnector::new(DataSource::Wiki, vec![])));
        assert_eq!(registry.enabled_sources(), vec![DataSource::Wiki]);
    }
}
