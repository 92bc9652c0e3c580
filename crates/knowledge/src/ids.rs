//! Deterministic chunk identifiers.
//!
//! Ids depend only on the document id, chunk position and chunk text, so
//! re-ingesting unchanged content overwrites the same points. The scheme
//! (MD5 content hash inside the key, SHA-256 of the key for the id) matches
//! ids already stored by earlier ingestion tooling for the same textbook.

use md5::Md5;
use sha2::{Digest, Sha256};

/// Ids are kept below this bound.
pub const POINT_ID_MODULUS: u64 = 1_000_000_000;

/// First 8 hex characters of the MD5 of `text`.
pub fn content_hash(text: &str) -> String {
    let digest = Md5::digest(text.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Human-readable key a point id is derived from.
pub fn chunk_key(doc_id: &str, chunk_number: u32, text: &str) -> String {
    format!("{}-{}-{}", doc_id, chunk_number, content_hash(text))
}

/// Numeric point id: SHA-256 of the chunk key, read as a big-endian
/// integer, modulo [`POINT_ID_MODULUS`].
pub fn point_id(doc_id: &str, chunk_number: u32, text: &str) -> u64 {
    let digest = Sha256::digest(chunk_key(doc_id, chunk_number, text).as_bytes());
    digest
        .iter()
        .fold(0u64, |acc, b| (acc * 256 + *b as u64) % POINT_ID_MODULUS)
}
