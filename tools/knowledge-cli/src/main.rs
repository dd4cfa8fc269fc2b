//! Operator CLI over `knowledge-service`'s HTTP surface (spec.md §6). Replaces
//! the teacher's hand-rolled positional-arg parsing in `hybrid-orchestrator`
//! with `clap` derive subcommands, one per route the service exposes.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "knowledge-cli", about = "Operator CLI for knowledge-service")]
struct Cli {
    /// Base URL of a running knowledge-service instance.
    #[arg(long, env = "KNOWLEDGE_SERVICE_URL", default_value = "http://127.0.0.1:8087")]
    base_url: String,

    /// API prefix the service was configured with (spec.md §6 `API_PREFIX`).
    #[arg(long, env = "KNOWLEDGE_API_PREFIX", default_value = "api/v1")]
    prefix: String,

    /// Shared-secret header value, if the service requires one.
    #[arg(long, env = "KNOWLEDGE_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// GET /health
    Health,
    /// POST /index/:source
    Index {
        source: String,
        #[arg(long)]
        full_reindex: bool,
    },
    /// POST /index
    IndexAll {
        #[arg(long)]
        full_reindex: bool,
    },
    /// GET /index/status
    Status,
    /// POST /index/:source/reset
    Reset { source: String },
    /// GET /search
    Search {
        query: String,
        #[arg(long, default_value = "hybrid")]
        search_type: String,
        #[arg(long)]
        sources: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// POST /navigate
    Navigate {
        id: String,
        direction: String,
        #[arg(long, default_value = "chunk")]
        scope: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// GET /analytics/stats
    Stats,
    /// GET /analytics/health[/:source]
    AnalyticsHealth { source: Option<String> },
    /// GET /workflows[/:id]
    Workflows { id: Option<String> },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: failed to build http client: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&client, &cli).await;
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &reqwest::Client, cli: &Cli) -> Result<Value, String> {
    let prefixed = |path: &str| format!("{}/{}{}", cli.base_url.trim_end_matches('/'), cli.prefix.trim_matches('/'), path);

    let request = match &cli.command {
        Command::Health => client.get(format!("{}/health", cli.base_url.trim_end_matches('/'))),
        Command::Index { source, full_reindex } => client
            .post(prefixed(&format!("/index/{source}")))
            .json(&serde_json::json!({ "fullReindex": full_reindex })),
        Command::IndexAll { full_reindex } => {
            client.post(prefixed("/index")).json(&serde_json::json!({ "fullReindex": full_reindex }))
        }
        Command::Status => client.get(prefixed("/index/status")),
        Command::Reset { source } => client.post(prefixed(&format!("/index/{source}/reset"))),
        Command::Search { query, search_type, sources, limit, offset } => {
            let mut req = client
                .get(prefixed("/search"))
                .query(&[("q", query.as_str()), ("search_type", search_type.as_str())])
                .query(&[("limit", limit), ("offset", offset)]);
            if let Some(sources) = sources {
                req = req.query(&[("sources", sources.as_str())]);
            }
            req
        }
        Command::Navigate { id, direction, scope, limit } => client.post(prefixed("/navigate")).json(&serde_json::json!({
            "id": id,
            "direction": direction,
            "scope": scope,
            "limit": limit,
        })),
        Command::Stats => client.get(prefixed("/analytics/stats")),
        Command::AnalyticsHealth { source } => match source {
            Some(source) => client.get(prefixed(&format!("/analytics/health/{source}"))),
            None => client.get(prefixed("/analytics/health")),
        },
        Command::Workflows { id } => match id {
            Some(id) => client.get(prefixed(&format!("/workflows/{id}"))),
            None => client.get(prefixed("/workflows")),
        },
    };

    let request = match &cli.api_key {
        Some(key) => request.header("x-api-key", key),
        None => request,
    };

    let response = request.send().await.map_err(|err| format!("request failed: {err}"))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        return Err(format!("service returned {status}: {body}"));
    }
    Ok(body)
}
