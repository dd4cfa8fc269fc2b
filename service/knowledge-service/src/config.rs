//! Environment-based configuration (spec.md §6): "keys absent at start-up do
//! not prevent boot" except for the workflow-engine address, which is the
//! one `ConfigMissing` (spec.md §7) that fails fast.

use knowledge_embed::http::HttpEmbedderConfig;
use knowledge_embed::reranker::HttpRerankerConfig;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEnv {
    Development,
    Production,
    Test,
}

impl NodeEnv {
    fn from_env() -> Self {
        match env::var("NODE_ENV").as_deref() {
            Ok("production") => NodeEnv::Production,
            Ok("test") => NodeEnv::Test,
            _ => NodeEnv::Development,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// spec.md §7 `ConfigMissing`: "a required dependency url is absent →
    /// fail fast at boot". The only such dependency is the workflow engine.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub address: String,
    pub namespace: String,
    pub task_queue: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node_env: NodeEnv,
    pub port: u16,
    pub api_prefix: String,
    pub api_key: Option<String>,
    pub kv_url: Option<String>,
    pub workflow: WorkflowConfig,
    pub index_backend_url: Option<String>,
    pub index_name: String,
    pub embedder: Option<HttpEmbedderConfig>,
    pub reranker: Option<HttpRerankerConfig>,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

impl Config {
    /// Loads from the process environment (spec.md §6 "Environment").
    /// Fails only when the workflow-engine address is missing; every other
    /// key defaults to "unconfigured" and is resolved lazily by the caller
    /// (an unconfigured embedder/reranker/connector simply never runs).
    pub fn from_env() -> Result<Self, ConfigError> {
        let workflow_address = env_opt("WORKFLOW_ENGINE_ADDRESS").ok_or(ConfigError::Missing("WORKFLOW_ENGINE_ADDRESS"))?;

        let port = env_opt("PORT").and_then(|p| p.parse().ok()).unwrap_or(8087);
        let api_prefix = env_opt("API_PREFIX").unwrap_or_else(|| "api/v1".to_string());

        let embedder = env_opt("EMBEDDER_ENDPOINT").map(|endpoint| HttpEmbedderConfig {
            endpoint,
            auth_token: env_opt("EMBEDDER_API_KEY"),
            dimension: env_opt("EMBEDDER_DIMENSION").and_then(|d| d.parse().ok()).unwrap_or(1536),
            max_input_length: env_opt("EMBEDDER_MAX_INPUT_LENGTH").and_then(|d| d.parse().ok()).unwrap_or(8000),
            embedding_model_id: env_opt("EMBEDDER_MODEL_ID").unwrap_or_else(|| "text-embedding-3-small".to_string()),
            text_repr_version: env_opt("EMBEDDER_TEXT_REPR_VERSION").unwrap_or_else(|| "v1".to_string()),
        });

        let reranker = env_opt("RERANKER_ENDPOINT")
            .map(|endpoint| HttpRerankerConfig { endpoint, auth_token: env_opt("RERANKER_API_KEY") });

        Ok(Self {
            node_env: NodeEnv::from_env(),
            port,
            api_prefix,
            api_key: env_opt("API_KEY"),
            kv_url: env_opt("KV_URL"),
            workflow: WorkflowConfig {
                address: workflow_address,
                namespace: env_opt("WORKFLOW_NAMESPACE").unwrap_or_else(|| "default".to_string()),
                task_queue: env_opt("WORKFLOW_TASK_QUEUE").unwrap_or_else(|| "knowledge-indexing".to_string()),
            },
            index_backend_url: env_opt("INDEX_BACKEND_URL"),
            index_name: env_opt("INDEX_NAME").unwrap_or_else(|| "knowledge-items".to_string()),
            embedder,
            reranker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_workflow_address_fails_fast() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var("WORKFLOW_ENGINE_ADDRESS");
        assert!(matches!(Config::from_env(), Err(ConfigError::Missing("WORKFLOW_ENGINE_ADDRESS"))));
    }

    #[test]
    fn defaults_apply_when_optional_keys_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("WORKFLOW_ENGINE_ADDRESS", "localhost:7233");
        env::remove_var("PORT");
        env::remove_var("API_PREFIX");
        env::remove_var("EMBEDDER_ENDPOINT");
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.port, 8087);
        assert_eq!(cfg.api_prefix, "api/v1");
        assert!(cfg.embedder.is_none());
        env::remove_var("WORKFLOW_ENGINE_ADDRESS");
    }
}
