//! Process-wide lazy BPE tokenizer singleton (spec.md §4.3/§5/§9: "Tokenizer
//! singleton: lazy, process-wide, thread-safe; no per-call construction").
//! Grounded on the teacher's own singleton pattern for ONNX Runtime
//! initialization (`embedding_provider::embedder::ensure_ort_initialized`,
//! a `static OnceLock<PathBuf>`), generalized to a `OnceLock<CoreBPE>`.

use crate::ChunkerError;
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;

static ENCODER: OnceLock<CoreBPE> = OnceLock::new();

fn encoder() -> Result<&'static CoreBPE, ChunkerError> {
    if let Some(enc) = ENCODER.get() {
        return Ok(enc);
    }
    let built = tiktoken_rs::cl100k_base().map_err(|e| ChunkerError::TokenizerInit(e.to_string()))?;
    Ok(ENCODER.get_or_init(|| built))
}

/// Counts BPE tokens in `text`.
pub fn count_tokens(text: &str) -> Result<usize, ChunkerError> {
    Ok(encoder()?.encode_with_special_tokens(text).len())
}

/// Counts tokens for each string in `texts`, preserving order.
pub fn count_tokens_batch(texts: &[&str]) -> Result<Vec<usize>, ChunkerError> {
    let enc = encoder()?;
    Ok(texts
        .iter()
        .map(|t| enc.encode_with_special_tokens(t).len())
        .collect())
}
