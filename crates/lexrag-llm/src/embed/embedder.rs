use std::sync::Arc;

use super::ModelCell;
use crate::error::LlmError;

pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Batching front-end over the shared embedding model.
///
/// Inputs are embedded in sequential batches on the blocking pool and concatenated in
/// input order.
#[derive(Debug, Clone)]
pub struct Embedder {
    model: Arc<ModelCell>,
    batch_size: usize,
}

impl Embedder {
    #[must_use]
    pub fn new(model: Arc<ModelCell>, batch_size: usize) -> Self {
        Self {
            model,
            batch_size: batch_size.max(1),
        }
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed `texts`, one vector per input in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded, inference fails, or the model
    /// returns the wrong number or size of vectors.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model.get().await?;
        let dimensions = model.dimensions();
        let mut out = Vec::with_capacity(texts.len());

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            let expected = batch.len();
            let batch = batch.to_vec();
            let model = Arc::clone(&model);
            let vectors = tokio::task::spawn_blocking(move || model.embed_batch(&batch))
                .await
                .map_err(|e| LlmError::Inference(format!("embedding task failed: {e}")))??;

            if vectors.len() != expected {
                return Err(LlmError::Inference(format!(
                    "model returned {} vectors for {expected} inputs",
                    vectors.len()
                )));
            }
            if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
                return Err(LlmError::DimensionMismatch {
                    expected: dimensions,
                    actual: bad.len(),
                });
            }
            tracing::debug!(batch = batch_no, size = expected, "embedded batch");
            out.extend(vectors);
        }

        Ok(out)
    }

    /// Embed a single query string.
    ///
    /// # Errors
    ///
    /// See [`Embedder::embed`].
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[text.to_owned()])
            .await?
            .pop()
            .ok_or(LlmError::EmptyResponse {
                provider: "embedder",
            })
    }
}
