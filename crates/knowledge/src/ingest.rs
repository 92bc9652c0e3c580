//! Offline ingestion: documents to chunks to embedded points in the index.

use crate::chunker::chunk_text;
use crate::document::Document;
use crate::embeddings::{create_provider, EmbeddingClient};
use crate::ids::point_id;
use crate::progress::ProgressReporter;
use crate::types::{ChunkPayload, Distance, IngestOptions, IngestStats, PointRecord};
use crate::vector_index::{create_store, VectorStore};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;
use tutor_core::{AppConfig, AppError, AppResult};
use walkdir::WalkDir;

/// Find documents below `root` with one of `extensions`, in file-name order.
pub fn discover_documents(root: &Path, extensions: &[String]) -> AppResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::Knowledge(format!(
            "Document directory does not exist: {:?}",
            root
        )));
    }

    let documents = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
                .unwrap_or(false)
        })
        .collect();

    Ok(documents)
}

/// Batch pipeline that populates the vector index.
pub struct IngestionPipeline {
    embedder: EmbeddingClient,
    store: Arc<dyn VectorStore>,
    progress: ProgressReporter,
}

impl IngestionPipeline {
    pub fn new(embedder: EmbeddingClient, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let provider = create_provider(&config.embedding, config.embedding_api_key().as_deref())?;
        let embedder = EmbeddingClient::new(provider, config.embedding.dimensions);
        Ok(Self::new(embedder, create_store(config)?))
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Create the collection if it is missing. Returns whether it was created.
    async fn ensure_collection(&self) -> AppResult<bool> {
        if self.store.collection_exists().await? {
            tracing::info!("Reusing collection {}", self.store.collection_name());
            return Ok(false);
        }

        let dimension = self.embedder.expected_dimensions();
        tracing::info!(
            dimension,
            "Creating collection {}",
            self.store.collection_name()
        );
        self.store
            .create_collection(dimension, Distance::Cosine)
            .await?;
        Ok(true)
    }

    /// Ingest every matching document below `options.docs_path`.
    ///
    /// Unreadable documents and chunks whose embedding comes back empty are
    /// skipped. Index errors abort the run.
    #[instrument(skip(self, options), fields(docs = %options.docs_path.display(), dry_run = options.dry_run))]
    pub async fn run(&self, options: &IngestOptions) -> AppResult<IngestStats> {
        let start = Instant::now();
        let root = options.docs_path.as_path();

        let paths = discover_documents(root, &options.extensions)?;
        let total = paths.len() as u64;
        self.progress.discover(total, &root.display().to_string());
        tracing::info!("Found {} documents", total);

        let collection_created = if options.dry_run {
            false
        } else {
            self.ensure_collection().await?
        };

        let mut documents = 0u32;
        let mut chunks_total = 0u32;
        let mut skipped_chunks = 0u32;
        let mut staged: Vec<PointRecord> = Vec::new();

        for (i, path) in paths.iter().enumerate() {
            let current = i as u64 + 1;
            let display = path.strip_prefix(root).unwrap_or(path).display().to_string();
            self.progress.parse(current, total, &display);

            let raw = match tokio::fs::read_to_string(path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping unreadable document {:?}: {}", path, e);
                    continue;
                }
            };

            let document = Document::parse(root, path, &raw);
            let chunks = chunk_text(&document.body, options.chunk_size, options.chunk_overlap);
            documents += 1;
            chunks_total += chunks.len() as u32;
            self.progress.chunk(current, total, chunks.len());

            tracing::debug!(
                doc_id = %document.doc_id,
                chapter = %document.chapter_path,
                chunks = chunks.len(),
                "Chunked document"
            );

            if options.dry_run {
                continue;
            }

            for (chunk_number, text) in chunks.into_iter().enumerate() {
                let chunk_number = chunk_number as u32;
                let vector = self.embedder.embed(&text).await;
                if vector.is_empty() {
                    tracing::warn!(
                        doc_id = %document.doc_id,
                        chunk_number,
                        "Skipping chunk without embedding"
                    );
                    skipped_chunks += 1;
                    continue;
                }

                staged.push(PointRecord {
                    id: point_id(&document.doc_id, chunk_number, &text),
                    vector,
                    payload: ChunkPayload {
                        text,
                        doc_id: document.doc_id.clone(),
                        title: document.title.clone(),
                        chapter_path: document.chapter_path.clone(),
                        chunk_number,
                    },
                });
            }
            self.progress
                .embed(current, total, self.embedder.model_name());
        }

        let points_upserted = staged.len() as u32;
        if !staged.is_empty() {
            self.progress
                .upsert(staged.len() as u64, self.store.collection_name());
            self.store.upsert(staged).await?;
        }

        let duration = start.elapsed();
        tracing::info!(
            documents,
            chunks = chunks_total,
            points_upserted,
            skipped_chunks,
            "Ingestion completed in {:.2}s",
            duration.as_secs_f64()
        );

        Ok(IngestStats {
            documents,
            chunks: chunks_total,
            points_upserted,
            skipped_chunks,
            collection_created,
            duration_secs: duration.as_secs_f64(),
            completed_at: Utc::now(),
        })
    }
}
