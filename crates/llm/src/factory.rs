//! LLM provider factory.
//!
//! Builds an `LlmClient` from the `llm` section of the application config.

use crate::client::LlmClient;
use crate::providers::{ollama::DEFAULT_OLLAMA_URL, OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;
use tutor_core::config::{LlmSettings, GEMINI_OPENAI_ENDPOINT};
use tutor_core::{AppError, AppResult};

/// Create an LLM client based on the configured provider.
///
/// # Arguments
/// * `settings` - The `llm` configuration section
/// * `api_key` - API key for providers that require one
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// key is missing, `AppError::Llm` if the HTTP client cannot be built.
pub fn create_client(
    settings: &LlmSettings,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider).ok_or_else(|| {
        AppError::Config(format!("Unknown LLM provider: {}", settings.provider))
    })?;
    let timeout = Duration::from_secs(settings.timeout_secs);

    match provider {
        ProviderType::OpenAI => {
            let key = api_key.ok_or_else(|| {
                AppError::Config(format!(
                    "OpenAI-compatible provider requires an API key (set {})",
                    settings.api_key_env
                ))
            })?;
            let endpoint = settings
                .endpoint
                .as_deref()
                .unwrap_or(GEMINI_OPENAI_ENDPOINT);
            tracing::debug!("Creating OpenAI-compatible client for {}", endpoint);
            Ok(Arc::new(OpenAiClient::new(
                endpoint,
                Some(key.to_string()),
                timeout,
            )?))
        }
        ProviderType::Ollama => {
            let endpoint = settings.endpoint.as_deref().unwrap_or(DEFAULT_OLLAMA_URL);
            tracing::debug!("Creating Ollama client for {}", endpoint);
            Ok(Arc::new(OllamaClient::with_base_url(endpoint, timeout)?))
        }
    }
}
