//! Vector index abstraction.
//!
//! `VectorStore` is the raw backend seam (Qdrant or in-memory) and reports
//! errors. `VectorIndexClient` is the retrieval-side wrapper that turns
//! search failures into an empty result.

use crate::stores::{MemoryStore, QdrantStore};
use crate::types::{CollectionInfo, Distance, PointRecord, SearchHit};
use std::sync::Arc;
use std::time::Duration;
use tutor_core::config::VectorStoreSettings;
use tutor_core::{AppConfig, AppError, AppResult};

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name ("qdrant", "memory")
    fn backend_name(&self) -> &str;

    /// Name of the collection this store reads and writes
    fn collection_name(&self) -> &str;

    /// Return the `limit` nearest points, best match first.
    async fn search(&self, vector: &[f32], limit: usize) -> AppResult<Vec<SearchHit>>;

    async fn collection_info(&self) -> AppResult<CollectionInfo>;

    async fn collection_exists(&self) -> AppResult<bool>;

    async fn create_collection(&self, dimension: usize, distance: Distance) -> AppResult<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, points: Vec<PointRecord>) -> AppResult<()>;
}

/// Create a vector store from the `vector_store` config section.
///
/// The memory backend keeps a JSON snapshot under `.tutor/` so that an
/// `ingest` run and later `chat` runs see the same points.
pub fn create_store(config: &AppConfig) -> AppResult<Arc<dyn VectorStore>> {
    let settings: &VectorStoreSettings = &config.vector_store;

    match settings.provider.to_lowercase().as_str() {
        "qdrant" => Ok(Arc::new(QdrantStore::new(
            &settings.url,
            &settings.collection,
            config.vector_store_api_key(),
            Duration::from_secs(settings.timeout_secs),
        )?)),
        "memory" => {
            let snapshot = config
                .tutor_dir()
                .join("index")
                .join(format!("{}.json", settings.collection));
            Ok(Arc::new(MemoryStore::with_snapshot(
                &settings.collection,
                snapshot,
            )?))
        }
        other => Err(AppError::Config(format!(
            "Unknown vector store: '{}'. Supported: qdrant, memory",
            other
        ))),
    }
}

/// Failure-absorbing search client used by the retrieval pipeline.
#[derive(Clone)]
pub struct VectorIndexClient {
    store: Arc<dyn VectorStore>,
}

impl VectorIndexClient {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub fn collection_name(&self) -> &str {
        self.store.collection_name()
    }

    /// Nearest stored chunks, best first. Errors yield an empty sequence.
    pub async fn search(&self, vector: &[f32], limit: usize) -> Vec<SearchHit> {
        if vector.is_empty() {
            tracing::warn!("Refusing to search with an empty vector");
            return Vec::new();
        }

        match self.store.search(vector, limit).await {
            Ok(mut hits) => {
                // Stable: ties keep the backend's order
                hits.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                hits.truncate(limit);
                tracing::debug!(
                    hits = hits.len(),
                    top_score = hits.first().map(|h| h.score),
                    "Vector search completed"
                );
                hits
            }
            Err(e) => {
                tracing::error!(
                    backend = self.store.backend_name(),
                    collection = self.store.collection_name(),
                    "Vector search failed: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Collection name, approximate point count and status.
    pub async fn describe(&self) -> AppResult<CollectionInfo> {
        self.store.collection_info().await
    }
}
