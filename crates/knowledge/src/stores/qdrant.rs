//! Qdrant vector store over its REST API.
//!
//! API reference: https://api.qdrant.tech/api-reference

use crate::types::{
    lenient, ChunkPayload, CollectionInfo, Distance, PointId, PointRecord, SearchHit,
};
use crate::vector_index::VectorStore;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::instrument;
use tutor_core::{AppError, AppResult};

/// Every Qdrant response wraps its payload in `result`.
#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionResult {
    status: String,
    #[serde(default)]
    points_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f32,
    #[serde(default, deserialize_with = "lenient")]
    payload: Option<ChunkPayload>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

pub struct QdrantStore {
    base_url: String,
    collection: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl QdrantStore {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::VectorIndex(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key,
            client,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<reqwest::Response> {
        self.authorize(builder)
            .send()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Failed to reach Qdrant: {}", e)))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::VectorIndex(format!(
                "Qdrant API error ({}): {}",
                status, error_text
            )));
        }

        let body: QdrantResponse<T> = response
            .json()
            .await
            .map_err(|e| AppError::VectorIndex(format!("Failed to parse Qdrant response: {}", e)))?;
        Ok(body.result)
    }
}

fn into_hits(points: Vec<ScoredPoint>) -> Vec<SearchHit> {
    points
        .into_iter()
        .map(|p| SearchHit {
            id: p.id,
            score: p.score,
            payload: p.payload.unwrap_or_default(),
        })
        .collect()
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    fn backend_name(&self) -> &str {
        "qdrant"
    }

    fn collection_name(&self) -> &str {
        &self.collection
    }

    #[instrument(skip(self, vector), fields(collection = %self.collection, dims = vector.len()))]
    async fn search(&self, vector: &[f32], limit: usize) -> AppResult<Vec<SearchHit>> {
        let url = format!("{}/points/search", self.collection_url());
        let request = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };

        let response = self.send(self.client.post(&url).json(&request)).await?;
        let points: Vec<ScoredPoint> = Self::parse(response).await?;

        Ok(into_hits(points))
    }

    async fn collection_info(&self) -> AppResult<CollectionInfo> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        let result: CollectionResult = Self::parse(response).await?;

        Ok(CollectionInfo {
            name: self.collection.clone(),
            points_count: result.points_count,
            status: result.status,
        })
    }

    async fn collection_exists(&self) -> AppResult<bool> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::parse::<CollectionResult>(response).await?;
        Ok(true)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn create_collection(&self, dimension: usize, distance: Distance) -> AppResult<()> {
        let body = json!({
            "vectors": { "size": dimension, "distance": distance }
        });

        let response = self
            .send(self.client.put(self.collection_url()).json(&body))
            .await?;
        Self::parse::<serde_json::Value>(response).await?;

        tracing::info!(dimension, ?distance, "Created collection {}", self.collection);
        Ok(())
    }

    #[instrument(skip(self, points), fields(collection = %self.collection, points = points.len()))]
    async fn upsert(&self, points: Vec<PointRecord>) -> AppResult<()> {
        let url = format!("{}/points?wait=true", self.collection_url());
        let body = json!({ "points": points });

        let response = self.send(self.client.put(&url).json(&body)).await?;
        Self::parse::<serde_json::Value>(response).await?;

        Ok(())
    }
}
