use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkerError {
    #[error("tokenizer initialization failed: {0}")]
    TokenizerInit(String),
    #[error("code splitter failed: {0}")]
    CodeSplit(String),
}
