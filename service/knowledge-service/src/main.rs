//! Process entrypoint (spec.md §6). Exit codes: 0 normal, non-zero on fatal
//! initialization failure — today that's only a missing workflow-engine
//! address (`ConfigError::Missing`).

use knowledge_connectors::ConnectorRegistry;
use knowledge_service::{build_router, AppState, Config};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "fatal initialization failure");
            return ExitCode::FAILURE;
        }
    };

    let port = config.port;
    // No vendor connectors ship with this binary (spec.md §4.6/§9 treats the
    // connector contract as the deliverable, not a specific implementation);
    // a deployment wires real connectors in before serving traffic.
    let registry = ConnectorRegistry::new();
    let state = AppState::new(config, registry);

    if let Err(err) = state.engine.recover_on_startup().await {
        tracing::error!(%err, "startup recovery failed");
        return ExitCode::FAILURE;
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%err, %addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "knowledge-service listening");
    if let Err(err) = axum::serve(listener, router).await {
        tracing::error!(%err, "server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
