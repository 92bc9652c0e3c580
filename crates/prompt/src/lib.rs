//! Prompt system for the textbook tutor.
//!
//! This crate provides:
//! - YAML prompt definitions with a built-in textbook assistant default
//! - Handlebars rendering of the RAG prompt in a fixed section order
//! - The degraded fallback prompt used when retrieval fails

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{recent_history, PromptBuilder, CONTEXT_DELIMITER};
pub use loader::{list_prompts, load_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, ChatTurn, PromptContextText, PromptDefinition,
    DEFAULT_PROMPT_ID,
};
