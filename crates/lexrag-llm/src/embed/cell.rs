use std::sync::Arc;

use tokio::sync::OnceCell;

use super::EmbeddingModel;
use crate::error::LlmError;

/// Factory producing the shared embedding model. Runs on the blocking pool.
pub type ModelLoader =
    Arc<dyn Fn() -> Result<Arc<dyn EmbeddingModel>, LlmError> + Send + Sync>;

/// Lazily initialized, process-wide embedding model.
///
/// The loader runs at most once to completion even when many tasks race on the
/// first call. A failed load leaves the cell empty, so the next call retries.
pub struct ModelCell {
    model: OnceCell<Arc<dyn EmbeddingModel>>,
    loader: ModelLoader,
}

impl std::fmt::Debug for ModelCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCell")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl ModelCell {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn EmbeddingModel>, LlmError> + Send + Sync + 'static,
    {
        Self {
            model: OnceCell::new(),
            loader: Arc::new(loader),
        }
    }

    /// A cell that is already initialized with `model`.
    #[must_use]
    pub fn preloaded(model: Arc<dyn EmbeddingModel>) -> Self {
        let loaded = Arc::clone(&model);
        Self {
            model: OnceCell::new_with(Some(model)),
            loader: Arc::new(move || Ok(Arc::clone(&loaded))),
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Return the shared model, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails or its task panics.
    pub async fn get(&self) -> Result<Arc<dyn EmbeddingModel>, LlmError> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tracing::info!("loading embedding model");
                let model = tokio::task::spawn_blocking(move || loader())
                    .await
                    .map_err(|e| LlmError::ModelLoad(format!("model loader task failed: {e}")))??;
                tracing::info!(dimensions = model.dimensions(), "embedding model ready");
                Ok::<_, LlmError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }
}
