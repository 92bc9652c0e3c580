//! Configuration management for the textbook tutor.
//!
//! Configuration is layered, later layers winning:
//! - Built-in defaults
//! - Config file (`.tutor/config.yaml`, or the path in `TUTOR_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Retrieval thresholds and window sizes live here rather than as literals in
//! the pipeline so that deployments can tune them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Completion providers the LLM factory can build.
pub const KNOWN_LLM_PROVIDERS: [&str; 3] = ["openai", "gemini", "ollama"];

/// Embedding providers the embedding factory can build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 4] = ["openai", "gemini", "ollama", "mock"];

/// Vector store backends.
pub const KNOWN_VECTOR_STORES: [&str; 2] = ["qdrant", "memory"];

/// Gemini's OpenAI-compatible endpoint.
pub const GEMINI_OPENAI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .tutor/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub json_logs: bool,

    /// Text-generation settings
    pub llm: LlmSettings,

    /// Embedding settings
    pub embedding: EmbeddingSettings,

    /// Vector index settings
    pub vector_store: VectorStoreSettings,

    /// Retrieval pipeline knobs
    pub retrieval: RetrievalSettings,

    /// Offline ingestion knobs
    pub ingestion: IngestionSettings,
}

/// Text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// Base URL; `None` selects the provider's default endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected vector length (EMBED_DIM)
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStoreSettings {
    #[serde(default = "default_vector_store")]
    pub provider: String,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_qdrant_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

/// Retrieval pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of nearest chunks requested from the index
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hits must score strictly above this to count as context
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,

    /// Number of trailing chat turns rendered into the prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Prompt definition id
    #[serde(default = "default_prompt_id")]
    pub prompt_id: String,
}

/// Offline ingestion knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSettings {
    /// Document root, relative to the workspace unless absolute
    #[serde(default = "default_docs_path")]
    pub docs_path: PathBuf,

    /// Maximum words per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words carried from the end of one chunk into the next
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// File extensions treated as documents
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_vector_store() -> String {
    "qdrant".to_string()
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_qdrant_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

fn default_collection() -> String {
    "rag_chatbot_collection".to_string()
}

fn default_index_timeout() -> u64 {
    30
}

fn default_top_k() -> usize {
    5
}

fn default_relevance_threshold() -> f32 {
    0.5
}

fn default_history_window() -> usize {
    3
}

fn default_prompt_id() -> String {
    "textbook.rag.default".to_string()
}

fn default_docs_path() -> PathBuf {
    PathBuf::from("docusaurus/docs")
}

fn default_chunk_size() -> usize {
    700
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "mdx".to_string()]
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: default_vector_store(),
            url: default_qdrant_url(),
            api_key_env: default_qdrant_key_env(),
            collection: default_collection(),
            timeout_secs: default_index_timeout(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            relevance_threshold: default_relevance_threshold(),
            history_window: default_history_window(),
            prompt_id: default_prompt_id(),
        }
    }
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            docs_path: default_docs_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            extensions: default_extensions(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    vector_store: Option<VectorStoreSettings>,
    retrieval: Option<RetrievalSettings>,
    ingestion: Option<IngestionSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            vector_store: VectorStoreSettings::default(),
            retrieval: RetrievalSettings::default(),
            ingestion: IngestionSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `TUTOR_WORKSPACE`: Override workspace path
    /// - `TUTOR_CONFIG`: Path to config file
    /// - `TUTOR_MODEL`: Completion model identifier
    /// - `QDRANT_URL`: Vector index base URL
    /// - `QDRANT_COLLECTION_NAME`: Collection name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// wins over the environment. The CLI uses this so `--workspace` picks
    /// up that workspace's `.tutor/config.yaml`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        match workspace {
            Some(workspace) => config.workspace = workspace,
            None => {
                if let Ok(workspace) = std::env::var("TUTOR_WORKSPACE") {
                    config.workspace = PathBuf::from(workspace);
                }
            }
        }

        match config_file {
            Some(config_file) => config.config_file = Some(config_file),
            None => {
                if let Ok(config_file) = std::env::var("TUTOR_CONFIG") {
                    config.config_file = Some(PathBuf::from(config_file));
                }
            }
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.tutor_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("TUTOR_MODEL") {
            self.llm.model = model;
        }

        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.vector_store.url = url;
        }

        if let Ok(collection) = std::env::var("QDRANT_COLLECTION_NAME") {
            self.vector_store.collection = collection;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merged config file {:?}", path);

        Ok(self.clone().merge_file(config_file))
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(vector_store) = file.vector_store {
            self.vector_store = vector_store;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(ingestion) = file.ingestion {
            self.ingestion = ingestion;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.json_logs = json;
            }
        }
        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the environment and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        json_logs: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Get the path to the .tutor directory.
    pub fn tutor_dir(&self) -> PathBuf {
        self.workspace.join(".tutor")
    }

    /// Document root resolved against the workspace.
    pub fn docs_path(&self) -> PathBuf {
        if self.ingestion.docs_path.is_absolute() {
            self.ingestion.docs_path.clone()
        } else {
            self.workspace.join(&self.ingestion.docs_path)
        }
    }

    /// Resolve the completion API key.
    ///
    /// Falls back to `GOOGLE_API_KEY` when the configured variable is unset.
    pub fn llm_api_key(&self) -> Option<String> {
        resolve_key(&self.llm.api_key_env)
    }

    /// Resolve the embedding API key.
    pub fn embedding_api_key(&self) -> Option<String> {
        resolve_key(&self.embedding.api_key_env)
    }

    /// Resolve the vector index API key.
    pub fn vector_store_api_key(&self) -> Option<String> {
        std::env::var(&self.vector_store.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    /// Validate configuration.
    pub fn validate(&self) -> AppResult<()> {
        check_known("LLM provider", &self.llm.provider, &KNOWN_LLM_PROVIDERS)?;
        check_known(
            "embedding provider",
            &self.embedding.provider,
            &KNOWN_EMBEDDING_PROVIDERS,
        )?;
        check_known(
            "vector store",
            &self.vector_store.provider,
            &KNOWN_VECTOR_STORES,
        )?;

        if !(0.0..=1.0).contains(&self.retrieval.relevance_threshold) {
            return Err(AppError::Config(format!(
                "relevanceThreshold must be within [0, 1], got {}",
                self.retrieval.relevance_threshold
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be at least 1".to_string(),
            ));
        }

        if self.ingestion.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be at least 1".to_string()));
        }

        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.ingestion.chunk_overlap, self.ingestion.chunk_size
            )));
        }

        Ok(())
    }
}

fn resolve_key(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .or_else(|_| std::env::var("GOOGLE_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty())
}

fn check_known(kind: &str, value: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&value.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {}: {}. Supported: {}",
            kind,
            value,
            known.join(", ")
        )))
    }
}
