//! Scriptable stand-ins for the external services.

use crate::completion::CompletionClient;
use crate::embeddings::{EmbeddingClient, EmbeddingProvider};
use crate::rag::RagEngine;
use crate::types::{ChunkPayload, CollectionInfo, Distance, PointId, PointRecord, SearchHit};
use crate::vector_index::{VectorIndexClient, VectorStore};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tutor_core::{AppConfig, AppError, AppResult};
use tutor_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use tutor_prompt::{PromptBuilder, PromptDefinition};

pub const DIMS: usize = 3;

/// Embedding provider that returns one fixed vector, or fails.
#[derive(Debug)]
pub struct FakeEmbedder {
    vector: Option<Vec<f32>>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn returning(vector: Vec<f32>) -> Arc<Self> {
        Arc::new(Self {
            vector: Some(vector),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            vector: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn provider_name(&self) -> &str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.vector {
            Some(v) => Ok(texts.iter().map(|_| v.clone()).collect()),
            None => Err(AppError::Embedding("connection refused".to_string())),
        }
    }
}

/// Vector store that answers every search with the same hits, or fails.
pub struct FakeStore {
    hits: Option<Vec<SearchHit>>,
    pub searches: AtomicUsize,
}

impl FakeStore {
    pub fn with_hits(hits: Vec<SearchHit>) -> Arc<Self> {
        Arc::new(Self {
            hits: Some(hits),
            searches: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            hits: None,
            searches: AtomicUsize::new(0),
        })
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VectorStore for FakeStore {
    fn backend_name(&self) -> &str {
        "fake"
    }

    fn collection_name(&self) -> &str {
        "textbook"
    }

    async fn search(&self, _vector: &[f32], limit: usize) -> AppResult<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match &self.hits {
            Some(hits) => Ok(hits.iter().take(limit).cloned().collect()),
            None => Err(AppError::VectorIndex("timed out".to_string())),
        }
    }

    async fn collection_info(&self) -> AppResult<CollectionInfo> {
        match &self.hits {
            Some(hits) => Ok(CollectionInfo {
                name: "textbook".to_string(),
                points_count: Some(hits.len() as u64),
                status: "green".to_string(),
            }),
            None => Err(AppError::VectorIndex("timed out".to_string())),
        }
    }

    async fn collection_exists(&self) -> AppResult<bool> {
        Ok(self.hits.is_some())
    }

    async fn create_collection(&self, _dimension: usize, _distance: Distance) -> AppResult<()> {
        Ok(())
    }

    async fn upsert(&self, _points: Vec<PointRecord>) -> AppResult<()> {
        Ok(())
    }
}

/// LLM that plays back scripted outcomes in order and records prompts.
///
/// Once the script runs out every call fails.
pub struct FakeLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn scripted(script: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::scripted(vec![Ok(text)])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
                usage: LlmUsage::default(),
                finish_reason: Some("stop".to_string()),
            }),
            Some(Err(message)) => Err(AppError::Llm(message)),
            None => Err(AppError::Llm("script exhausted".to_string())),
        }
    }
}

pub fn hit(id: u64, score: f32, text: &str, title: &str, chapter_path: &str) -> SearchHit {
    SearchHit {
        id: PointId::Num(id),
        score,
        payload: ChunkPayload {
            text: text.to_string(),
            doc_id: title.to_lowercase(),
            title: title.to_string(),
            chapter_path: chapter_path.to_string(),
            chunk_number: 0,
        },
    }
}

pub fn engine(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    llm: Arc<FakeLlm>,
) -> RagEngine {
    let config = AppConfig::default();
    let dims = embedder.dimensions();
    RagEngine::new(
        EmbeddingClient::new(embedder, dims),
        VectorIndexClient::new(store),
        CompletionClient::new(llm, &config.llm),
        PromptBuilder::new(
            PromptDefinition::textbook_default(),
            config.retrieval.history_window,
        )
        .unwrap(),
        &config.retrieval,
    )
}
