//! Text-generation integration for the textbook tutor.
//!
//! A provider-agnostic `LlmClient` trait with two implementations:
//! - **OpenAI-compatible** endpoints (default: Gemini)
//! - **Ollama** for local models
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use tutor_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(Duration::from_secs(60))?;
//! let request = LlmRequest::new("What is a servo motor?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::{ChatMessage, ProviderType};
