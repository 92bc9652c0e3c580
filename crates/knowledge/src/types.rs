//! Core types for retrieval and ingestion.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use tutor_core::AppConfig;

/// Fallback chapter path for points stored without one.
pub const UNKNOWN_CHAPTER: &str = "Unknown";

/// Payload stored alongside every vector in the index.
///
/// This layout is shared by ingestion and retrieval. Fields that are
/// missing, null or of the wrong type in a stored point fall back to their
/// defaults instead of failing the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub text: String,

    #[serde(default, deserialize_with = "lenient")]
    pub doc_id: String,

    #[serde(default, deserialize_with = "lenient")]
    pub title: String,

    #[serde(default = "unknown_chapter", deserialize_with = "lenient_chapter")]
    pub chapter_path: String,

    #[serde(default, deserialize_with = "lenient")]
    pub chunk_number: u32,
}

fn unknown_chapter() -> String {
    UNKNOWN_CHAPTER.to_string()
}

/// Deserialize `T`, mapping null or unusable values to `T::default()`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default())
}

fn lenient_chapter<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value::<String>(v).ok())
        .unwrap_or_else(unknown_chapter))
}

impl Default for ChunkPayload {
    fn default() -> Self {
        Self {
            text: String::new(),
            doc_id: String::new(),
            title: String::new(),
            chapter_path: unknown_chapter(),
            chunk_number: 0,
        }
    }
}

/// Identifier of a stored point.
///
/// Points written by ingestion always use numeric ids, but an index may hold
/// points written by other tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Uuid(s) => f.write_str(s),
        }
    }
}

/// A point to write into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// One nearest-neighbour result of a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PointId,

    /// Similarity score, higher is more relevant
    pub score: f32,

    #[serde(default)]
    pub payload: ChunkPayload,
}

/// A source reference surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub chapter_path: String,
    pub score: f32,
}

impl From<&SearchHit> for Citation {
    fn from(hit: &SearchHit) -> Self {
        Self {
            title: hit.payload.title.clone(),
            chapter_path: hit.payload.chapter_path.clone(),
            score: hit.score,
        }
    }
}

/// The answer to a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResult {
    /// Generated answer; never empty
    pub response: String,

    /// Sources that cleared the relevance threshold, best first
    pub citations: Vec<Citation>,

    /// True iff at least one hit cleared the relevance threshold
    pub has_textbook_context: bool,
}

/// Similarity metric of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

/// Read-only diagnostics about the vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,

    /// Approximate number of stored points
    pub points_count: Option<u64>,

    /// Backend-reported status (e.g. "green")
    pub status: String,
}

/// Options for an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Root of the document tree
    pub docs_path: PathBuf,

    /// Maximum words per chunk (a single longer sentence may exceed it)
    pub chunk_size: usize,

    /// Words carried over from the end of one chunk into the next
    pub chunk_overlap: usize,

    /// File extensions to read, without the dot
    pub extensions: Vec<String>,

    /// Chunk and count only; no embedding calls and no index writes
    pub dry_run: bool,
}

impl IngestOptions {
    /// Build options from the `ingestion` config section.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            docs_path: config.docs_path(),
            chunk_size: config.ingestion.chunk_size,
            chunk_overlap: config.ingestion.chunk_overlap,
            extensions: config.ingestion.extensions.clone(),
            dry_run: false,
        }
    }
}

/// Statistics from an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Documents read and chunked
    pub documents: u32,

    /// Chunks produced
    pub chunks: u32,

    /// Points written to the index
    pub points_upserted: u32,

    /// Chunks dropped because embedding returned nothing
    pub skipped_chunks: u32,

    /// Whether the collection had to be created
    pub collection_created: bool,

    pub duration_secs: f64,

    pub completed_at: DateTime<Utc>,
}
