use std::fmt;

use serde::{Deserialize, Serialize};

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Populated from the environment only, never from the config file.
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub gemini_api_key: Option<Secret>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_sentences_per_chunk")]
    pub sentences_per_chunk: usize,
    #[serde(default = "default_min_chunk_length")]
    pub min_chunk_length: usize,
}

/// Embedding model backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// BERT sentence-transformers model run with candle.
    Candle,
    /// Deterministic feature hashing, no model weights.
    Hashing,
}

impl EmbeddingBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Candle => "candle",
            Self::Hashing => "hashing",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// `auto`, `cpu`, `cuda` or `metal`. Only used by the candle backend.
    #[serde(default = "default_device")]
    pub device: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_vector_backend")]
    pub backend: VectorBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
    #[serde(default = "default_true")]
    pub exact_search: bool,
}

/// Generation provider selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Mock => "mock",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Override of the provider endpoint, mostly for proxies and tests.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// Per-HTTP-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Overall budget for one generation, retries included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_summary_chunks")]
    pub summary_chunks: usize,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_sentences_per_chunk() -> usize {
    lexrag_memory::chunker::DEFAULT_SENTENCES_PER_CHUNK
}

fn default_min_chunk_length() -> usize {
    lexrag_memory::chunker::DEFAULT_MIN_CHUNK_LENGTH
}

fn default_embedding_backend() -> EmbeddingBackend {
    if cfg!(feature = "candle") {
        EmbeddingBackend::Candle
    } else {
        EmbeddingBackend::Hashing
    }
}

fn default_embedding_model() -> String {
    lexrag_llm::embed::DEFAULT_EMBED_MODEL.into()
}

fn default_dimensions() -> usize {
    lexrag_llm::embed::DEFAULT_DIMENSIONS
}

fn default_batch_size() -> usize {
    lexrag_llm::embed::DEFAULT_BATCH_SIZE
}

fn default_device() -> String {
    "auto".into()
}

fn default_vector_backend() -> VectorBackend {
    VectorBackend::Qdrant
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    lexrag_memory::index::DEFAULT_COLLECTION.into()
}

fn default_upsert_batch_size() -> usize {
    lexrag_memory::index::DEFAULT_UPSERT_BATCH_SIZE
}

fn default_true() -> bool {
    true
}

fn default_provider() -> ProviderKind {
    ProviderKind::Gemini
}

fn default_llm_model() -> String {
    lexrag_llm::gemini::DEFAULT_MODEL.into()
}

fn default_max_retries() -> u32 {
    lexrag_llm::retry::DEFAULT_MAX_RETRIES
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_top_k() -> usize {
    5
}

fn default_summary_chunks() -> usize {
    10
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            sentences_per_chunk: default_sentences_per_chunk(),
            min_chunk_length: default_min_chunk_length(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            batch_size: default_batch_size(),
            device: default_device(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            upsert_batch_size: default_upsert_batch_size(),
            exact_search: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_llm_model(),
            base_url: None,
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            summary_chunks: default_summary_chunks(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            llm: LlmConfig::default(),
            answer: AnswerConfig::default(),
            log_level: default_log_level(),
            secrets: ResolvedSecrets::default(),
        }
    }
}
