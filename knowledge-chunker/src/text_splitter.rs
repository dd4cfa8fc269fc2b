//! Sentence/paragraph splitter with sentence-granular overlap (spec.md
//! §4.3). Grounded on the teacher's `file-chunker::text_segmenter`
//! character-budget boundary scorer, generalized here to token budgets.

use crate::tokenizer;
use crate::ChunkerError;

/// Splits `content` into "sentences": segments ending in `.`, `!`, `?`, a
/// single or double newline, or end-of-string.
fn split_sentences(content: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let chars: Vec<(usize, char)> = content.char_indices().collect();

    let mut i = 0usize;
    while i < chars.len() {
        let (byte_idx, ch) = chars[i];
        if matches!(ch, '.' | '!' | '?') {
            let end = byte_idx + ch.len_utf8();
            push_if_non_empty(&mut sentences, &content[start..end]);
            start = end;
        } else if ch == '\n' {
            // Consume a run of consecutive newlines as a single boundary
            // (covers both single and double newline, per spec.md §4.3).
            let seg_end = byte_idx;
            let mut j = i;
            while j < chars.len() && chars[j].1 == '\n' {
                j += 1;
            }
            push_if_non_empty(&mut sentences, &content[start..seg_end]);
            start = if j < chars.len() { chars[j].0 } else { content.len() };
            i = j;
            continue;
        }
        i += 1;
    }
    push_if_non_empty(&mut sentences, &content[start..]);
    sentences
}

fn push_if_non_empty(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Greedily accumulates sentences into token-bounded chunks, seeding each
/// new chunk with a sentence-granular overlap tail of the previous one.
pub fn split(content: &str, chunk_tokens: usize, overlap_tokens: usize) -> Result<Vec<String>, ChunkerError> {
    let sentences = split_sentences(content);
    if sentences.is_empty() {
        return Ok(Vec::new());
    }

    let sentence_refs: Vec<&str> = sentences.iter().map(|s| s.as_str()).collect();
    let sentence_tokens = tokenizer::count_tokens_batch(&sentence_refs)?;

    let mut chunks: Vec<String> = Vec::new();
    let mut current: Vec<usize> = Vec::new(); // indices into `sentences`
    let mut current_tokens = 0usize;

    for (idx, &tokens) in sentence_tokens.iter().enumerate() {
        if !current.is_empty() && current_tokens + tokens > chunk_tokens {
            chunks.push(join_sentences(&sentences, &current));
            current = overlap_tail(&sentences, &sentence_tokens, &current, overlap_tokens);
            current_tokens = current.iter().map(|&i| sentence_tokens[i]).sum();
        }
        current.push(idx);
        current_tokens += tokens;
    }
    if !current.is_empty() {
        chunks.push(join_sentences(&sentences, &current));
    }

    Ok(chunks)
}

fn join_sentences(sentences: &[String], indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Takes the trailing sentences of `indices` (from the end backwards) whose
/// cumulative token count stays within `overlap_tokens`.
fn overlap_tail(
    _sentences: &[String],
    sentence_tokens: &[usize],
    indices: &[usize],
    overlap_tokens: usize,
) -> Vec<usize> {
    let mut tail = Vec::new();
    let mut total = 0usize;
    for &idx in indices.iter().rev() {
        let t = sentence_tokens[idx];
        if total + t > overlap_tokens {
            break;
        }
        tail.push(idx);
        total += t;
    }
    tail.reverse();
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_model::{CHUNK_TOKENS, OVERLAP_TOKENS};

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("One. Two! Three?");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?"]);
    }

    #[test]
    fn splits_on_newlines() {
        let sentences = split_sentences("para one\n\npara two\nstill two");
        assert_eq!(sentences, vec!["para one", "para two", "still two"]);
    }

    #[test]
    fn chunks_respect_token_budget_and_overlap() {
        let sentence = "The quick brown fox jumps over the lazy dog and keeps running.";
        let content = std::iter::repeat(sentence).take(200).collect::<Vec<_>>().join(" ");
        let chunks = split(&content, CHUNK_TOKENS, OVERLAP_TOKENS).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            let tokens = tokenizer::count_tokens(c).unwrap();
            assert!(tokens <= CHUNK_TOKENS);
        }
    }

    #[test]
    fn single_short_sentence_yields_one_chunk() {
        let chunks = split("Just one short sentence.", CHUNK_TOKENS, OVERLAP_TOKENS).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
