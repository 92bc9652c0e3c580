//! Ingest command handler.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tutor_core::{config::AppConfig, AppError, AppResult};
use tutor_knowledge::{IngestOptions, IngestionPipeline, ProgressReporter};

/// Chunk, embed and index the textbook documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Document root (default: ingestion.docsPath from config)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Maximum words per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Words shared between consecutive chunks
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Chunk and count only; nothing is embedded or written
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    fn options(&self, config: &AppConfig) -> AppResult<IngestOptions> {
        let mut options = IngestOptions::from_config(config);
        if let Some(path) = &self.path {
            options.docs_path = path.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size = chunk_size;
        }
        if let Some(overlap) = self.overlap {
            options.chunk_overlap = overlap;
        }
        options.dry_run = self.dry_run;

        if options.chunk_size == 0 || options.chunk_overlap >= options.chunk_size {
            return Err(AppError::InvalidInput(format!(
                "Overlap ({}) must be smaller than chunk size ({})",
                options.chunk_overlap, options.chunk_size
            )));
        }
        Ok(options)
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let options = self.options(config)?;
        tracing::debug!("Ingest options: {:?}", options);

        let mut pipeline = IngestionPipeline::from_config(config)?;
        if !self.json {
            pipeline = pipeline.with_progress(ProgressReporter::new(Arc::new(|event| {
                eprintln!("{}", event.format_simple());
            })));
        }

        let stats = pipeline.run(&options).await?;

        if self.json {
            let output = serde_json::json!({
                "documents": stats.documents,
                "chunks": stats.chunks,
                "pointsUpserted": stats.points_upserted,
                "skippedChunks": stats.skipped_chunks,
                "collectionCreated": stats.collection_created,
                "dryRun": options.dry_run,
                "durationSecs": stats.duration_secs,
                "completedAt": stats.completed_at.to_rfc3339(),
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else if options.dry_run {
            println!(
                "Dry run: {} documents would produce {} chunks",
                stats.documents, stats.chunks
            );
        } else {
            println!(
                "Ingested {} documents ({} chunks, {} points, {} skipped) in {:.2}s",
                stats.documents,
                stats.chunks,
                stats.points_upserted,
                stats.skipped_chunks,
                stats.duration_secs
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> IngestCommand {
        IngestCommand {
            path: None,
            chunk_size: None,
            overlap: None,
            dry_run: false,
            json: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = AppConfig::default();
        let cmd = IngestCommand {
            path: Some(PathBuf::from("/tmp/book")),
            chunk_size: Some(300),
            overlap: Some(50),
            dry_run: true,
            ..command()
        };

        let options = cmd.options(&config).unwrap();
        assert_eq!(options.docs_path, PathBuf::from("/tmp/book"));
        assert_eq!(options.chunk_size, 300);
        assert_eq!(options.chunk_overlap, 50);
        assert!(options.dry_run);
    }

    #[test]
    fn test_defaults_come_from_config() {
        let config = AppConfig::default();
        let options = command().options(&config).unwrap();
        assert_eq!(options.chunk_size, config.ingestion.chunk_size);
        assert_eq!(options.chunk_overlap, config.ingestion.chunk_overlap);
        assert_eq!(options.docs_path, config.docs_path());
    }

    #[test]
    fn test_overlap_must_fit_in_chunk() {
        let cmd = IngestCommand {
            chunk_size: Some(100),
            overlap: Some(100),
            ..command()
        };
        assert!(cmd.options(&AppConfig::default()).is_err());
    }
}
