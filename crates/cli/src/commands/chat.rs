//! Chat command handler.
//!
//! Answers questions through the retrieval pipeline, either once or in an
//! interactive session that keeps its own history.

use clap::Args;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{RagEngine, RagResult};
use tutor_prompt::ChatTurn;

/// Ask the textbook a question
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// The question to ask
    #[arg(required_unless_present = "interactive")]
    pub query: Option<String>,

    /// JSON file with earlier turns: `[{"user": "...", "ai": "..."}]`
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Read questions from stdin until `exit` or end of input
    #[arg(short, long)]
    pub interactive: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");
        tracing::debug!("Chat options: {:?}", self);

        let window = config.retrieval.history_window;
        let mut history = match &self.history {
            Some(path) => load_history(path)?,
            None => Vec::new(),
        };

        let engine = RagEngine::from_config(config)?;

        if let Some(query) = &self.query {
            let result = engine.chat(query, &history).await?;
            self.print_result(&result)?;
            remember(&mut history, ChatTurn::new(query.clone(), result.response), window);
        }

        if self.interactive {
            self.run_session(&engine, history, window).await?;
        }

        Ok(())
    }

    async fn run_session(
        &self,
        engine: &RagEngine,
        mut history: Vec<ChatTurn>,
        window: usize,
    ) -> AppResult<()> {
        let mut turns = 0usize;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            if !self.json {
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
            }

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query == "exit" || query == "quit" {
                break;
            }

            let result = engine.chat(query, &history).await?;
            self.print_result(&result)?;
            remember(&mut history, ChatTurn::new(query, result.response), window);
            turns += 1;
        }

        tracing::debug!("Session ended after {} turns", turns);
        Ok(())
    }

    fn print_result(&self, result: &RagResult) -> AppResult<()> {
        if self.json {
            let json = serde_json::to_string(result)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("{}", result.response);
        if !result.citations.is_empty() {
            println!();
            println!("Sources:");
            for citation in &result.citations {
                println!(
                    "  - {} ({}) [{:.2}]",
                    citation.title, citation.chapter_path, citation.score
                );
            }
        }
        Ok(())
    }
}

/// Append a turn, keeping only the `window` most recent ones.
fn remember(history: &mut Vec<ChatTurn>, turn: ChatTurn, window: usize) {
    history.push(turn);
    let excess = history.len().saturating_sub(window);
    history.drain(..excess);
}

/// Read prior turns from a JSON file.
fn load_history(path: &Path) -> AppResult<Vec<ChatTurn>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::InvalidInput(format!("Failed to read history file {:?}: {}", path, e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::InvalidInput(format!(
            "History file {:?} is not a list of turns: {}",
            path, e
        ))
    })
}
