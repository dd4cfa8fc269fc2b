//! C7 Indexing Engine + C9 Health Probes (spec.md §4.7, §4.9). Wires C1
//! (`knowledge_store::CursorStatusStore`), C2 (`SettingsStore`), C4
//! (`IndexStore`) and C6 (`knowledge_connectors`) into the per-source
//! durable execution loop.

pub mod engine;
pub mod error;
pub mod health;
pub mod runtime;

pub use engine::IndexingEngine;
pub use error::EngineError;
pub use health::{probe, probe_all, HealthProbe};
pub use runtime::{ActivityRetryPolicy, ConnectorBatch, TokioWorkflowRuntime, WorkflowRuntime};
