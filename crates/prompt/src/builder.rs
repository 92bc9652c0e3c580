//! Prompt builder for assembling the RAG prompt and the fallback prompt.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, ChatTurn, PromptDefinition};
use handlebars::Handlebars;
use serde_json::json;
use tutor_core::{AppError, AppResult};

/// Separator placed between retrieved passages.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

const RAG_TEMPLATE_NAME: &str = "rag";
const FALLBACK_TEMPLATE_NAME: &str = "fallback";

// Section order is fixed: system, history, context (or notice), question, guidance.
// Block tags never sit alone on a line so rendered whitespace stays predictable.
const RAG_TEMPLATE: &str = "{{system}}\n\n\
{{#if history}}## Previous Conversation:{{#each history}}\nUser: {{this.user}}\nAI: {{this.ai}}{{/each}}\n\n{{/if}}\
{{#if has_context}}## {{context_header}}:\n{{context}}\n\n{{context_instructions}}{{else}}## Note:\n{{no_context_notice}}{{/if}}\n\n\
## User's Question:\n{{query}}\n\n\
## Your Response:\n{{response_guidance}}";

const FALLBACK_TEMPLATE: &str =
    "{{system}}\n\n{{fallback_notice}}\n\n{{query}}\n\nProvide a helpful, accurate answer.";

/// Returns the last `window` turns of `history`, oldest first.
pub fn recent_history(history: &[ChatTurn], window: usize) -> &[ChatTurn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Builds prompts from a [`PromptDefinition`].
///
/// Templates are registered once and reused for every request.
pub struct PromptBuilder {
    definition: PromptDefinition,
    history_window: usize,
    registry: Handlebars<'static>,
}

impl PromptBuilder {
    /// Create a builder that renders at most `history_window` history turns.
    pub fn new(definition: PromptDefinition, history_window: usize) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Prompts are plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(RAG_TEMPLATE_NAME, RAG_TEMPLATE)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;
        registry
            .register_template_string(FALLBACK_TEMPLATE_NAME, FALLBACK_TEMPLATE)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            definition,
            history_window,
            registry,
        })
    }

    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Build the full prompt for a query.
    ///
    /// The textbook-context section is used only when `has_context` is set and
    /// at least one passage is supplied; otherwise the no-context notice is
    /// rendered. The query is inserted verbatim.
    ///
    /// # Example
    /// ```no_run
    /// use tutor_prompt::{PromptBuilder, PromptDefinition};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let builder = PromptBuilder::new(PromptDefinition::textbook_default(), 3)?;
    /// let context = vec!["Forward kinematics maps joint angles to poses.".to_string()];
    /// let built = builder.build("What is forward kinematics?", &context, &[], true)?;
    /// println!("{}", built.text);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(
        &self,
        query: &str,
        context_chunks: &[String],
        history: &[ChatTurn],
        has_context: bool,
    ) -> AppResult<BuiltPrompt> {
        let history = recent_history(history, self.history_window);
        let has_context = has_context && !context_chunks.is_empty();
        let def = &self.definition;

        tracing::debug!(
            prompt_id = %def.id,
            history_turns = history.len(),
            context_chunks = context_chunks.len(),
            has_context,
            "Building prompt"
        );

        let data = json!({
            "system": def.system,
            "history": history,
            "has_context": has_context,
            "context_header": def.context.header,
            "context": context_chunks.join(CONTEXT_DELIMITER),
            "context_instructions": def.context.instructions,
            "no_context_notice": def.context.no_context_notice,
            "query": query,
            "response_guidance": def.response_guidance,
        });

        let text = self
            .registry
            .render(RAG_TEMPLATE_NAME, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        Ok(BuiltPrompt {
            text,
            metadata: BuiltPromptMetadata {
                source_prompt_id: def.id.clone(),
                history_turns: history.len(),
                context_chunks: if has_context { context_chunks.len() } else { 0 },
                has_context,
                fallback: false,
            },
        })
    }

    /// Build the degraded prompt used when the main pipeline failed.
    pub fn build_fallback(&self, query: &str) -> AppResult<BuiltPrompt> {
        let def = &self.definition;
        let data = json!({
            "system": def.system,
            "fallback_notice": def.fallback_notice,
            "query": query,
        });

        let text = self
            .registry
            .render(FALLBACK_TEMPLATE_NAME, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        Ok(BuiltPrompt {
            text,
            metadata: BuiltPromptMetadata {
                source_prompt_id: def.id.clone(),
                history_turns: 0,
                context_chunks: 0,
                has_context: false,
                fallback: true,
            },
        })
    }
}
