//! In-process vector store.
//!
//! Brute-force cosine search over a `BTreeMap`, optionally persisted to a
//! JSON snapshot. Used for offline runs and tests.

use crate::types::{ChunkPayload, CollectionInfo, Distance, PointId, PointRecord, SearchHit};
use crate::vector_index::VectorStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tutor_core::{AppError, AppResult};

#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryState {
    collection: Option<CollectionSpec>,
    points: BTreeMap<u64, StoredPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CollectionSpec {
    dimension: usize,
    distance: Distance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    vector: Vec<f32>,
    payload: ChunkPayload,
}

pub struct MemoryStore {
    name: String,
    snapshot: Option<PathBuf>,
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// An empty store with no collection; nothing is persisted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snapshot: None,
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// A store backed by a JSON snapshot, loaded now if the file exists.
    pub fn with_snapshot(name: impl Into<String>, path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            load_snapshot(&path)?
        } else {
            MemoryState::default()
        };

        Ok(Self {
            name: name.into(),
            snapshot: Some(path),
            state: RwLock::new(state),
        })
    }

    fn missing_collection(&self) -> AppError {
        AppError::VectorIndex(format!("Collection '{}' not found", self.name))
    }

    async fn persist(&self, state: &MemoryState) -> AppResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(state)?;
        tokio::fs::write(path, json).await?;
        tracing::debug!("Wrote vector snapshot {:?}", path);
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> AppResult<MemoryState> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::VectorIndex(format!("Failed to read snapshot {:?}: {}", path, e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        AppError::VectorIndex(format!("Failed to parse snapshot {:?}: {}", path, e))
    })
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    fn collection_name(&self) -> &str {
        &self.name
    }

    async fn search(&self, vector: &[f32], limit: usize) -> AppResult<Vec<SearchHit>> {
        let state = self.state.read().await;
        let spec = state.collection.ok_or_else(|| self.missing_collection())?;

        if vector.len() != spec.dimension {
            return Err(AppError::VectorIndex(format!(
                "Query vector has {} dimensions, collection expects {}",
                vector.len(),
                spec.dimension
            )));
        }

        let mut hits: Vec<SearchHit> = state
            .points
            .iter()
            .map(|(id, point)| SearchHit {
                id: PointId::Num(*id),
                score: cosine_similarity(vector, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    async fn collection_info(&self) -> AppResult<CollectionInfo> {
        let state = self.state.read().await;
        if state.collection.is_none() {
            return Err(self.missing_collection());
        }

        Ok(CollectionInfo {
            name: self.name.clone(),
            points_count: Some(state.points.len() as u64),
            status: "green".to_string(),
        })
    }

    async fn collection_exists(&self) -> AppResult<bool> {
        Ok(self.state.read().await.collection.is_some())
    }

    async fn create_collection(&self, dimension: usize, distance: Distance) -> AppResult<()> {
        if distance != Distance::Cosine {
            return Err(AppError::VectorIndex(format!(
                "Memory store only supports cosine distance, got {:?}",
                distance
            )));
        }

        let mut state = self.state.write().await;
        if state.collection.is_some() {
            return Err(AppError::VectorIndex(format!(
                "Collection '{}' already exists",
                self.name
            )));
        }

        state.collection = Some(CollectionSpec {
            dimension,
            distance,
        });
        self.persist(&state).await
    }

    async fn upsert(&self, points: Vec<PointRecord>) -> AppResult<()> {
        let mut state = self.state.write().await;
        let spec = state.collection.ok_or_else(|| self.missing_collection())?;

        if let Some(bad) = points.iter().find(|p| p.vector.len() != spec.dimension) {
            return Err(AppError::VectorIndex(format!(
                "Point {} has {} dimensions, collection expects {}",
                bad.id,
                bad.vector.len(),
                spec.dimension
            )));
        }

        for point in points {
            state.points.insert(
                point.id,
                StoredPoint {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }

        self.persist(&state).await
    }
}
