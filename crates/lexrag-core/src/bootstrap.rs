//! Wire stores, the embedding model, the generation provider and the pipelines
//! from a loaded [`Config`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use lexrag_llm::embed::{HashingEmbedModel, ModelCell};
use lexrag_llm::gemini::GeminiProvider;
use lexrag_llm::{AnyProvider, Embedder, RetryPolicy};
use lexrag_memory::{
    ChunkerConfig, InMemoryVectorStore, IngestionPipeline, QdrantStore, SentenceChunker,
    VectorIndex, VectorStore,
};

use crate::answer::AnswerComposer;
use crate::config::{Config, EmbeddingBackend, EmbeddingConfig, ProviderKind, VectorBackend};

/// Priority: explicit path > `LEXRAG_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("LEXRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Shared components built once per process.
pub struct App {
    config: Config,
    embedder: Embedder,
    index: VectorIndex,
}

impl App {
    /// Build the vector store and the (lazily loaded) embedding model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured backend is not compiled in or the Qdrant
    /// client cannot be constructed.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = create_store(&config)?;
        let index = VectorIndex::new(store, config.vector_store.collection.clone())
            .with_upsert_batch_size(config.vector_store.upsert_batch_size);
        let cell = create_model_cell(&config.embedding)?;
        let embedder = Embedder::new(Arc::new(cell), config.embedding.batch_size);
        tracing::info!(
            vector_backend = ?config.vector_store.backend,
            embedding_backend = config.embedding.backend.as_str(),
            collection = %config.vector_store.collection,
            "components initialized"
        );
        Ok(Self {
            config,
            embedder,
            index,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    #[must_use]
    pub fn pipeline(&self) -> IngestionPipeline {
        let chunker = SentenceChunker::new(ChunkerConfig {
            sentences_per_chunk: self.config.chunking.sentences_per_chunk,
            min_chunk_length: self.config.chunking.min_chunk_length,
        });
        IngestionPipeline::new(chunker, self.embedder.clone(), self.index.clone())
    }

    /// # Errors
    ///
    /// Returns an error if the provider cannot be created, e.g. a missing API key.
    pub fn composer(&self) -> anyhow::Result<AnswerComposer<AnyProvider>> {
        let provider = create_provider(&self.config)?;
        Ok(
            AnswerComposer::new(self.embedder.clone(), self.index.clone(), provider)
                .with_generation_timeout(Duration::from_secs(self.config.llm.timeout_secs)),
        )
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("index", &self.index)
            .field("embedder", &self.embedder)
            .finish_non_exhaustive()
    }
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be built from the configured URL.
pub fn create_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    let vs = &config.vector_store;
    match vs.backend {
        VectorBackend::Qdrant => {
            let store = QdrantStore::new(&vs.qdrant_url)
                .with_context(|| format!("failed to create qdrant client for {}", vs.qdrant_url))?
                .with_exact_search(vs.exact_search);
            Ok(Arc::new(store))
        }
        VectorBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
    }
}

/// The model itself is loaded on first use, not here.
///
/// # Errors
///
/// Returns an error if the candle backend is requested without the `candle` feature.
pub fn create_model_cell(config: &EmbeddingConfig) -> anyhow::Result<ModelCell> {
    match config.backend {
        EmbeddingBackend::Hashing => Ok(ModelCell::preloaded(Arc::new(HashingEmbedModel::new(
            config.dimensions,
        )))),
        #[cfg(feature = "candle")]
        EmbeddingBackend::Candle => {
            use lexrag_llm::EmbeddingModel;
            use lexrag_llm::embed::BertEmbedModel;

            let device = select_device(&config.device)?;
            let repo_id = config.model.clone();
            let expected = config.dimensions;
            Ok(ModelCell::new(move || {
                let model = BertEmbedModel::load(&repo_id, &device)?;
                if model.dimensions() != expected {
                    return Err(lexrag_llm::LlmError::DimensionMismatch {
                        expected,
                        actual: model.dimensions(),
                    });
                }
                Ok(Arc::new(model) as Arc<dyn EmbeddingModel>)
            }))
        }
        #[cfg(not(feature = "candle"))]
        EmbeddingBackend::Candle => {
            bail!("embedding backend \"candle\" requires building with the candle feature")
        }
    }
}

/// # Errors
///
/// Returns an error if the requested accelerator is not compiled in or not present.
#[cfg(feature = "candle")]
pub fn select_device(preference: &str) -> anyhow::Result<candle_core::Device> {
    use candle_core::Device;

    match preference {
        "metal" => {
            #[cfg(feature = "metal")]
            return Ok(Device::new_metal(0)?);
            #[cfg(not(feature = "metal"))]
            bail!("candle compiled without metal feature");
        }
        "cuda" => {
            #[cfg(feature = "cuda")]
            return Ok(Device::new_cuda(0)?);
            #[cfg(not(feature = "cuda"))]
            bail!("candle compiled without cuda feature");
        }
        "auto" => {
            #[cfg(feature = "metal")]
            if let Ok(device) = Device::new_metal(0) {
                return Ok(device);
            }
            #[cfg(feature = "cuda")]
            if let Ok(device) = Device::new_cuda(0) {
                return Ok(device);
            }
            Ok(Device::Cpu)
        }
        _ => Ok(Device::Cpu),
    }
}

/// # Errors
///
/// Returns an error if the Gemini API key is missing, the HTTP client cannot be
/// built, or the mock provider is requested without the `mock` feature.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Gemini => {
            let key = config
                .secrets
                .gemini_api_key
                .as_ref()
                .context("LEXRAG_GEMINI_API_KEY is not set")?;
            let retry = RetryPolicy::new(llm.max_retries, Duration::from_millis(llm.backoff_ms));
            let mut provider = GeminiProvider::new(
                key.expose().to_owned(),
                llm.model.clone(),
                Duration::from_secs(llm.request_timeout_secs),
            )?
            .with_retry(retry);
            if let Some(ref url) = llm.base_url {
                provider = provider.with_base_url(url.clone());
            }
            Ok(AnyProvider::Gemini(provider))
        }
        #[cfg(feature = "mock")]
        ProviderKind::Mock => Ok(AnyProvider::Mock(lexrag_llm::mock::MockProvider::default())),
        #[cfg(not(feature = "mock"))]
        ProviderKind::Mock => bail!("llm provider \"mock\" requires building with the mock feature"),
    }
}
