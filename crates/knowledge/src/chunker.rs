//! Sentence-based chunking with word overlap.

use once_cell::sync::Lazy;
use regex::Regex;

// A sentence ends at `.`, `!` or `?` followed by whitespace
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("Invalid sentence regex"));

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in SENTENCE_END.find_iter(text) {
        let sentence = text[last_end..mat.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        last_end = mat.end();
    }

    let tail = text[last_end..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Group sentences into chunks of at most `chunk_size` words.
///
/// When a sentence would overflow the current chunk, the chunk is closed and
/// the next one starts with the last `overlap` words of the closed chunk,
/// followed by that sentence. The full overlap is always carried, so a chunk
/// opened by a long sentence may exceed `chunk_size`. Sentences are never
/// split.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for sentence in split_sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();

        if !current.is_empty() && current.len() + words.len() > chunk_size {
            chunks.push(current.join(" "));

            let carry = overlap.min(current.len());
            current = current.split_off(current.len() - carry);
        }

        current.extend(words);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
