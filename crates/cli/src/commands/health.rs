//! Health command handler.
//!
//! Reports the vector collection and provider configuration. A failing
//! service degrades the report; the command itself still succeeds.

use clap::Args;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{create_provider, create_store, CollectionInfo, VectorIndexClient};
use tutor_prompt::{list_prompts, load_prompt};

/// Report vector collection and provider status
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one health check.
#[derive(Debug)]
struct Check<T> {
    name: &'static str,
    outcome: Result<T, String>,
}

impl<T> Check<T> {
    fn new(name: &'static str, outcome: AppResult<T>) -> Self {
        Self {
            name,
            outcome: outcome.map_err(|e| e.to_string()),
        }
    }

    fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing health command");

        let llm = Check::new(
            "llm",
            tutor_llm::create_client(&config.llm, config.llm_api_key().as_deref()).map(|_| ()),
        );
        let embedding = Check::new(
            "embedding",
            create_provider(&config.embedding, config.embedding_api_key().as_deref()).map(|_| ()),
        );
        let prompts = Check::new("prompt", available_prompts(config));
        let collection = Check::new("collection", describe_collection(config).await);

        let healthy = llm.is_ok() && embedding.is_ok() && prompts.is_ok() && collection.is_ok();
        let status = if healthy { "ok" } else { "degraded" };

        for check in [&llm, &embedding] {
            if let Some(error) = check.error() {
                tracing::warn!("{} unavailable: {}", check.name, error);
            }
        }
        if let Some(error) = prompts.error() {
            tracing::warn!("{} unavailable: {}", prompts.name, error);
        }
        if let Some(error) = collection.error() {
            tracing::warn!("{} unavailable: {}", collection.name, error);
        }

        if self.json {
            let info = collection.outcome.as_ref().ok();
            let output = serde_json::json!({
                "status": status,
                "llm": {
                    "provider": config.llm.provider,
                    "model": config.llm.model,
                    "error": llm.error(),
                },
                "embedding": {
                    "provider": config.embedding.provider,
                    "model": config.embedding.model,
                    "dimensions": config.embedding.dimensions,
                    "error": embedding.error(),
                },
                "prompt": {
                    "id": config.retrieval.prompt_id,
                    "available": prompts.outcome.as_ref().ok(),
                    "error": prompts.error(),
                },
                "vectorStore": {
                    "provider": config.vector_store.provider,
                    "collection": config.vector_store.collection,
                    "pointsCount": info.and_then(|i| i.points_count),
                    "status": info.map(|i| i.status.as_str()),
                    "error": collection.error(),
                },
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("Status: {}", status);
        println!(
            "LLM:          {} / {} {}",
            config.llm.provider,
            config.llm.model,
            mark(llm.error())
        );
        println!(
            "Embedding:    {} / {} ({} dims) {}",
            config.embedding.provider,
            config.embedding.model,
            config.embedding.dimensions,
            mark(embedding.error())
        );
        match &prompts.outcome {
            Ok(available) => println!(
                "Prompt:       {} [ok] (available: {})",
                config.retrieval.prompt_id,
                available.join(", ")
            ),
            Err(error) => println!(
                "Prompt:       {} [unavailable: {}]",
                config.retrieval.prompt_id, error
            ),
        }
        match &collection.outcome {
            Ok(info) => println!(
                "Vector store: {} '{}' status={} points={}",
                config.vector_store.provider,
                info.name,
                info.status,
                info.points_count
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            Err(error) => println!(
                "Vector store: {} '{}' [unavailable: {}]",
                config.vector_store.provider, config.vector_store.collection, error
            ),
        }

        Ok(())
    }
}

/// Prompt ids in the workspace, checking that the configured one loads.
fn available_prompts(config: &AppConfig) -> AppResult<Vec<String>> {
    let available = list_prompts(&config.workspace)?;
    load_prompt(&config.workspace, &config.retrieval.prompt_id)?;
    Ok(available)
}

async fn describe_collection(config: &AppConfig) -> AppResult<CollectionInfo> {
    let index = VectorIndexClient::new(create_store(config)?);
    index.describe().await
}

fn mark(error: Option<&str>) -> String {
    match error {
        Some(error) => format!("[unavailable: {}]", error),
        None => "[ok]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_keeps_error_text() {
        let check: Check<()> = Check::new("llm", Err(AppError::Config("no key".to_string())));
        assert!(!check.is_ok());
        assert_eq!(check.error(), Some("Configuration error: no key"));
    }

    #[test]
    fn test_available_prompts_include_workspace_files() {
        let temp = TempDir::new().unwrap();
        let prompts = temp.path().join(".tutor/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(
            prompts.join("textbook.rag.concise.yaml"),
            "id: textbook.rag.concise\ntitle: Concise\napiVersion: v1.0\nsystem: Answer briefly.\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();
        config.retrieval.prompt_id = "textbook.rag.concise".to_string();

        let available = available_prompts(&config).unwrap();
        assert_eq!(available, vec!["textbook.rag.default", "textbook.rag.concise"]);
    }

    #[test]
    fn test_unknown_configured_prompt_is_reported() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();
        config.retrieval.prompt_id = "textbook.rag.missing".to_string();

        assert!(available_prompts(&config).is_err());
    }

    #[tokio::test]
    async fn test_missing_memory_collection_is_degraded_not_fatal() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();
        config.vector_store.provider = "memory".to_string();
        config.embedding.provider = "mock".to_string();

        assert!(describe_collection(&config).await.is_err());
        assert!(HealthCommand { json: true }.execute(&config).await.is_ok());
    }
}
