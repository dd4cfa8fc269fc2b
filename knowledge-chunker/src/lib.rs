//! C3 Chunker: token-bounded splitter. Language-aware for code, sentence/
//! paragraph-aware for prose; sentence-granular overlap; pre-chunked
//! passthrough (spec.md §4.3).

pub mod code_splitter;
pub mod error;
pub mod sanitize;
pub mod text_splitter;
pub mod tokenizer;

pub use error::ChunkerError;

use knowledge_model::{CHUNK_TOKENS, MIN_TOKENS_FOR_CHUNKING, OVERLAP_TOKENS};

/// Extensions treated as source code for the purposes of the language-aware
/// splitter (spec.md §4.3: "For code files (detected by extension)").
const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "tsx", "jsx", "go", "java", "kt", "c", "h", "cpp", "hpp", "cc", "cs",
    "rb", "php", "swift", "scala", "sh", "sql",
];

/// A hint about the content being chunked: its file path (for code-extension
/// detection) and any connector-supplied pre-chunked segments.
#[derive(Debug, Clone, Default)]
pub struct ChunkHint<'a> {
    pub path: Option<&'a str>,
    pub pre_chunked: Option<&'a [String]>,
}

/// Splits `content` into an ordered sequence of non-empty text chunks.
/// Deterministic (spec.md §4.3 contract).
pub fn chunk(content: &str, hint: &ChunkHint<'_>) -> Result<Vec<String>, ChunkerError> {
    if let Some(pre) = hint.pre_chunked {
        return Ok(pre
            .iter()
            .map(|c| sanitize::sanitize(c))
            .filter(|c| !c.is_empty())
            .collect());
    }

    let sanitized = sanitize::sanitize(content);
    if sanitized.is_empty() {
        return Ok(Vec::new());
    }

    let token_count = tokenizer::count_tokens(&sanitized)?;
    if token_count <= MIN_TOKENS_FOR_CHUNKING {
        return Ok(vec![sanitized]);
    }

    let is_code = hint
        .path
        .and_then(|p| p.rsplit('.').next())
        .map(|ext| CODE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);

    if is_code {
        match code_splitter::split(&sanitized, CHUNK_TOKENS, OVERLAP_TOKENS) {
            Ok(chunks) if !chunks.is_empty() => return Ok(chunks),
            _ => {} // fall back to the text splitter on failure or empty result
        }
    }

    text_splitter::split(&sanitized, CHUNK_TOKENS, OVERLAP_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_a_single_chunk() {
        let content = "a short sentence.";
        let chunks = chunk(content, &ChunkHint::default()).unwrap();
        assert_eq!(chunks, vec![content.to_string()]);
    }

    #[test]
    fn pre_chunked_is_used_verbatim_after_sanitization() {
        let hint = ChunkHint {
            path: None,
            pre_chunked: Some(&["first".to_string(), "second".to_string()]),
        };
        let chunks = chunk("ignored raw content", &hint).unwrap();
        assert_eq!(chunks, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn long_content_produces_multiple_chunks_within_token_bounds() {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running. ";
        let content = sentence.repeat(400);
        let chunks = chunk(&content, &ChunkHint::default()).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            let tokens = tokenizer::count_tokens(c).unwrap();
            assert!(tokens <= CHUNK_TOKENS, "chunk exceeded CHUNK_TOKENS: {tokens}");
        }
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        let chunks = chunk("", &ChunkHint::default()).unwrap();
        assert!(chunks.is_empty());
    }
}
