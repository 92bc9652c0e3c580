//! Embedding provider trait and factory.

use super::providers::{MockProvider, OllamaProvider, OpenAiEmbeddingProvider};
use std::sync::Arc;
use std::time::Duration;
use tutor_core::config::{EmbeddingSettings, GEMINI_OPENAI_ENDPOINT};
use tutor_core::{AppError, AppResult};
use tutor_llm::providers::ollama::DEFAULT_OLLAMA_URL;

/// Trait for embedding providers.
///
/// Providers report failures as errors; [`EmbeddingClient`](super::EmbeddingClient)
/// is the layer that absorbs them.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get expected embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from the `embedding` config section.
pub fn create_provider(
    settings: &EmbeddingSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    match settings.provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(settings.dimensions))),

        "openai" | "gemini" => {
            let key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "Embedding provider '{}' requires an API key (set {})",
                    settings.provider, settings.api_key_env
                ))
            })?;
            let endpoint = settings
                .endpoint
                .as_deref()
                .unwrap_or(GEMINI_OPENAI_ENDPOINT);
            Ok(Arc::new(OpenAiEmbeddingProvider::new(
                endpoint,
                key,
                &settings.model,
                settings.dimensions,
                timeout,
            )?))
        }

        "ollama" => {
            let endpoint = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaProvider::new(
                endpoint,
                &settings.model,
                settings.dimensions,
                timeout,
            )?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, gemini, ollama, mock",
            settings.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&settings("mock"), None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_create_openai_requires_key() {
        let err = create_provider(&settings("openai"), None).unwrap_err();
        assert!(err.to_string().contains("requires an API key"));

        let provider = create_provider(&settings("gemini"), Some("k")).unwrap();
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.model_name(), "text-embedding-004");
    }

    #[test]
    fn test_create_ollama_provider() {
        let provider = create_provider(&settings("ollama"), None).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&settings("unknown"), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&settings("mock"), None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 768);
    }
}
