//! Persisted-state key layout, exactly as enumerated in spec.md §6.

use knowledge_model::DataSource;

pub fn cursor(src: DataSource) -> String {
    format!("index:cursor:{}", src.as_str())
}

pub fn status(src: DataSource) -> String {
    format!("index:status:{}", src.as_str())
}

pub fn hashes_prefix(src: DataSource) -> String {
    format!("index:hashes:{}:", src.as_str())
}

pub fn hash_entry(src: DataSource, id: &str) -> String {
    format!("{}{}", hashes_prefix(src), id)
}

pub fn lock(src: DataSource) -> String {
    format!("index:lock:{}", src.as_str())
}

pub fn settings(src: DataSource) -> String {
    format!("index:settings:{}", src.as_str())
}

pub fn disabled_sources() -> &'static str {
    "index:disabled-sources"
}

pub fn query_embedding(sha256_32: &str) -> String {
    format!("search:embedding:{sha256_32}")
}
