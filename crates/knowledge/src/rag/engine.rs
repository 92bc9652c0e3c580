//! The retrieval-augmented chat pipeline.
//!
//! A request runs embed, retrieve, compose, generate and package in order.
//! Failures in the first two stages only remove context. A failure in
//! compose or generate switches to the bare fallback prompt, and if that
//! also fails the caller gets [`APOLOGY_MESSAGE`].

use crate::completion::{CompletionClient, Generation};
use crate::embeddings::{create_provider, EmbeddingClient};
use crate::types::{Citation, CollectionInfo, RagResult, SearchHit};
use crate::vector_index::{create_store, VectorIndexClient};
use tracing::instrument;
use tutor_core::config::RetrievalSettings;
use tutor_core::{AppConfig, AppError, AppResult};
use tutor_prompt::{load_prompt, ChatTurn, PromptBuilder};

/// Response when both the full pipeline and the fallback prompt failed.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again in a moment.";

/// Keep hits scoring strictly above `threshold`, preserving order.
pub fn relevant_hits(hits: Vec<SearchHit>, threshold: f32) -> Vec<SearchHit> {
    hits.into_iter().filter(|h| h.score > threshold).collect()
}

/// Retrieval orchestrator.
///
/// Holds no per-request state, so one engine can serve concurrent requests.
pub struct RagEngine {
    embedder: EmbeddingClient,
    index: VectorIndexClient,
    completion: CompletionClient,
    prompts: PromptBuilder,
    top_k: usize,
    relevance_threshold: f32,
}

impl RagEngine {
    pub fn new(
        embedder: EmbeddingClient,
        index: VectorIndexClient,
        completion: CompletionClient,
        prompts: PromptBuilder,
        retrieval: &RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            index,
            completion,
            prompts,
            top_k: retrieval.top_k,
            relevance_threshold: retrieval.relevance_threshold,
        }
    }

    /// Build every collaborator from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let provider = create_provider(&config.embedding, config.embedding_api_key().as_deref())?;
        let embedder = EmbeddingClient::new(provider, config.embedding.dimensions);

        let index = VectorIndexClient::new(create_store(config)?);

        let llm = tutor_llm::create_client(&config.llm, config.llm_api_key().as_deref())?;
        let completion = CompletionClient::new(llm, &config.llm);

        let definition = load_prompt(&config.workspace, &config.retrieval.prompt_id)?;
        let prompts = PromptBuilder::new(definition, config.retrieval.history_window)?;

        tracing::debug!(
            embedding = embedder.provider_name(),
            collection = index.collection_name(),
            model = completion.model(),
            "Retrieval engine ready"
        );

        Ok(Self::new(
            embedder,
            index,
            completion,
            prompts,
            &config.retrieval,
        ))
    }

    /// Answer `query` using retrieved textbook content and recent history.
    ///
    /// Only an empty query is reported as an error; every service failure
    /// degrades into a weaker but non-empty answer.
    #[instrument(skip(self, query, history), fields(query_len = query.len(), history_turns = history.len()))]
    pub async fn chat(&self, query: &str, history: &[ChatTurn]) -> AppResult<RagResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
        }

        match self.answer_with_context(query, history).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("Retrieval pipeline failed, using fallback prompt: {}", e);
                Ok(self.answer_without_context(query).await)
            }
        }
    }

    /// Diagnostics for health checks.
    pub async fn collection_info(&self) -> AppResult<CollectionInfo> {
        self.index.describe().await
    }

    pub fn collection_name(&self) -> &str {
        self.index.collection_name()
    }

    async fn answer_with_context(&self, query: &str, history: &[ChatTurn]) -> AppResult<RagResult> {
        let embedding = self.embedder.embed(query).await;

        let retrieved = if embedding.is_empty() {
            tracing::info!("No query embedding, answering without textbook context");
            Vec::new()
        } else {
            let hits = self.index.search(&embedding, self.top_k).await;
            let returned = hits.len();
            let relevant = relevant_hits(hits, self.relevance_threshold);
            tracing::info!(
                returned,
                relevant = relevant.len(),
                threshold = self.relevance_threshold,
                "Retrieved textbook chunks"
            );
            relevant
        };
        let has_context = !retrieved.is_empty();

        let context: Vec<String> = retrieved.iter().map(|h| h.payload.text.clone()).collect();
        let prompt = self.prompts.build(query, &context, history, has_context)?;
        tracing::debug!(prompt_len = prompt.text.len(), "Composed prompt");

        let response = match self.completion.try_complete(&prompt.text).await {
            Generation::Answer(text) => text,
            Generation::Failed { reason } => return Err(AppError::Llm(reason)),
        };

        Ok(RagResult {
            response,
            citations: retrieved.iter().map(Citation::from).collect(),
            has_textbook_context: has_context,
        })
    }

    async fn answer_without_context(&self, query: &str) -> RagResult {
        let response = match self.prompts.build_fallback(query) {
            Ok(prompt) => match self.completion.try_complete(&prompt.text).await {
                Generation::Answer(text) => text,
                Generation::Failed { reason } => {
                    tracing::error!("Fallback completion failed: {}", reason);
                    APOLOGY_MESSAGE.to_string()
                }
            },
            Err(e) => {
                tracing::error!("Failed to build fallback prompt: {}", e);
                APOLOGY_MESSAGE.to_string()
            }
        };

        RagResult {
            response,
            citations: Vec::new(),
            has_textbook_context: false,
        }
    }
}
