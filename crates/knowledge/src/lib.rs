//! Retrieval and ingestion for the textbook tutor.
//!
//! - [`RagEngine`] answers a question from retrieved textbook chunks, with
//!   a two-tier fallback when services fail
//! - [`IngestionPipeline`] chunks, embeds and upserts the document tree
//! - [`EmbeddingClient`], [`VectorIndexClient`] and [`CompletionClient`] wrap
//!   the external services and turn failures into degraded values

pub mod chunker;
pub mod completion;
pub mod document;
pub mod embeddings;
pub mod ids;
pub mod ingest;
pub mod progress;
pub mod rag;
pub mod stores;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use completion::{CompletionClient, Generation, COMPLETION_FAILED_MESSAGE};
pub use embeddings::{create_provider, EmbeddingClient, EmbeddingProvider};
pub use ingest::IngestionPipeline;
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{RagEngine, APOLOGY_MESSAGE};
pub use stores::{MemoryStore, QdrantStore};
pub use types::{
    ChunkPayload, Citation, CollectionInfo, Distance, IngestOptions, IngestStats, PointId,
    PointRecord, RagResult, SearchHit,
};
pub use vector_index::{create_store, VectorIndexClient, VectorStore};
