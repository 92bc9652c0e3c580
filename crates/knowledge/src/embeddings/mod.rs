//! Embedding generation.
//!
//! Providers talk to an embedding service and return errors. `EmbeddingClient`
//! wraps a provider for the retrieval and ingestion paths and never fails:
//! an empty vector means "no embedding available".

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use std::sync::Arc;

/// Failure-absorbing embedding client.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    expected_dimensions: usize,
}

impl EmbeddingClient {
    /// Wrap a provider; vectors of any other length than `expected_dimensions`
    /// are accepted but logged.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, expected_dimensions: usize) -> Self {
        Self {
            provider,
            expected_dimensions,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn expected_dimensions(&self) -> usize {
        self.expected_dimensions
    }

    /// Embed `text`.
    ///
    /// Empty or whitespace-only input returns an empty vector without calling
    /// the provider. Provider errors are logged and also yield an empty vector.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if text.trim().is_empty() {
            tracing::debug!("Skipping embedding of empty text");
            return Vec::new();
        }

        match self.provider.embed(text).await {
            Ok(vector) => {
                if !vector.is_empty() && vector.len() != self.expected_dimensions {
                    tracing::warn!(
                        provider = self.provider.provider_name(),
                        model = self.provider.model_name(),
                        expected = self.expected_dimensions,
                        actual = vector.len(),
                        "Embedding has unexpected dimensions"
                    );
                }
                vector
            }
            Err(e) => {
                tracing::error!(
                    provider = self.provider.provider_name(),
                    "Embedding failed: {}",
                    e
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tutor_core::{AppError, AppResult};

    #[derive(Debug)]
    struct FixedProvider {
        calls: AtomicUsize,
        result: Option<Vec<f32>>,
    }

    impl FixedProvider {
        fn returning(result: Option<Vec<f32>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result,
            })
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        fn model_name(&self) -> &str {
            "fixed-v1"
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some(v) => Ok(texts.iter().map(|_| v.clone()).collect()),
                None => Err(AppError::Embedding("service unavailable".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let provider = FixedProvider::returning(Some(vec![1.0, 0.0, 0.0]));
        let client = EmbeddingClient::new(provider.clone(), 3);

        assert!(client.embed("").await.is_empty());
        assert!(client.embed("   ").await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_provider_error_becomes_empty_vector() {
        let provider = FixedProvider::returning(None);
        let client = EmbeddingClient::new(provider.clone(), 3);

        assert!(client.embed("what is torque?").await.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_accepted() {
        let provider = FixedProvider::returning(Some(vec![0.5, 0.5]));
        let client = EmbeddingClient::new(provider, 3);

        assert_eq!(client.embed("gait").await, vec![0.5, 0.5]);
    }
}
