//! Completion client with fixed sampling parameters.

use std::sync::Arc;
use tutor_core::config::LlmSettings;
use tutor_llm::{LlmClient, LlmRequest};

/// Text returned by [`CompletionClient::complete`] when generation fails.
pub const COMPLETION_FAILED_MESSAGE: &str = "Error: The AI model failed to generate a response.";

/// Outcome of a completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Non-empty generated text
    Answer(String),

    /// The service failed or produced no text
    Failed { reason: String },
}

impl Generation {
    pub fn is_answer(&self) -> bool {
        matches!(self, Generation::Answer(_))
    }
}

/// Wraps an [`LlmClient`] with the configured model and sampling parameters.
#[derive(Clone)]
pub struct CompletionClient {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(llm: Arc<dyn LlmClient>, settings: &LlmSettings) -> Self {
        Self {
            llm,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text for `prompt`, reporting failure as a value.
    ///
    /// Empty or whitespace-only output counts as a failure.
    pub async fn try_complete(&self, prompt: &str) -> Generation {
        let request = LlmRequest::new(prompt, &self.model)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        match self.llm.complete(&request).await {
            Ok(response) if !response.content.trim().is_empty() => {
                Generation::Answer(response.content)
            }
            Ok(response) => {
                tracing::warn!(
                    provider = self.llm.provider_name(),
                    finish_reason = ?response.finish_reason,
                    "Completion returned no text"
                );
                Generation::Failed {
                    reason: "empty completion".to_string(),
                }
            }
            Err(e) => {
                tracing::error!(provider = self.llm.provider_name(), "Completion failed: {}", e);
                Generation::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Generate text for `prompt`; failures become [`COMPLETION_FAILED_MESSAGE`].
    pub async fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt).await {
            Generation::Answer(text) => text,
            Generation::Failed { .. } => COMPLETION_FAILED_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tutor_core::{AppError, AppResult};
    use tutor_llm::{LlmResponse, LlmUsage};

    struct ScriptedLlm {
        reply: Option<String>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                    finish_reason: Some("stop".to_string()),
                }),
                None => Err(AppError::Llm("503 Service Unavailable".to_string())),
            }
        }
    }

    fn client(reply: Option<&str>) -> (CompletionClient, Arc<ScriptedLlm>) {
        let llm = Arc::new(ScriptedLlm {
            reply: reply.map(str::to_string),
            requests: Mutex::new(Vec::new()),
        });
        (CompletionClient::new(llm.clone(), &LlmSettings::default()), llm)
    }

    #[tokio::test]
    async fn test_fixed_sampling_parameters() {
        let (completion, llm) = client(Some("Torque is rotational force."));
        let text = completion.complete("What is torque?").await;

        assert_eq!(text, "Torque is rotational force.");
        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].model, "gemini-2.5-flash");
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].max_tokens, Some(1500));
    }

    #[tokio::test]
    async fn test_failure_returns_fixed_message() {
        let (completion, _) = client(None);
        assert_eq!(
            completion.complete("q").await,
            COMPLETION_FAILED_MESSAGE
        );
        assert!(!completion.try_complete("q").await.is_answer());
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let (completion, _) = client(Some("  \n"));
        assert!(matches!(
            completion.try_complete("q").await,
            Generation::Failed { .. }
        ));
    }
}
